// ============================================================================
// Structure : App
// ============================================================================
// État du formulaire, détenu uniquement par le thread UI
//
// CONCEPTS RUST :
// 1. State Management : tout l'état du formulaire dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Pas de Arc<Mutex<>> : le worker ne touche jamais App, il poste un
//    WorkerMessage que la boucle principale applique ici
// ============================================================================

use crate::models::Request;
use crate::preferences::Preferences;
use crate::worker::WorkerMessage;

/// Texte du bouton au repos
pub const SUBMIT_LABEL: &str = "開始抓取並存檔";

/// Texte du bouton pendant une requête
pub const BUSY_LABEL: &str = "處理中...";

// ============================================================================
// Enum : Field
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul champ a le focus à la fois
// - next()/previous() parcourent les champs en boucle
// ============================================================================

/// Champs du formulaire, dans l'ordre d'affichage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Ticker,
    StartDate,
    EndDate,
    Adjusted,
    Submit,
}

impl Field {
    const ALL: [Field; 5] = [
        Field::Ticker,
        Field::StartDate,
        Field::EndDate,
        Field::Adjusted,
        Field::Submit,
    ];

    fn index(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    /// Champ suivant (boucle)
    pub fn next(&self) -> Field {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Champ précédent (boucle)
    pub fn previous(&self) -> Field {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Type de boîte de dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

/// Boîte de dialogue modale : bloque le formulaire jusqu'à fermeture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub body: String,
}

impl Dialog {
    pub fn new(kind: DialogKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Champ qui a le focus
    pub focus: Field,

    pub ticker: String,
    pub start_date: String,
    pub end_date: String,
    pub use_adjusted: bool,

    /// Une requête est en cours : le bouton est désactivé
    pub busy: bool,

    /// Ligne de statut sous le bouton
    pub status: String,

    /// Dialogue modal affiché, s'il y en a un
    pub dialog: Option<Dialog>,

    /// Première pression sur Échap : attend la confirmation pour quitter
    pub confirm_quit: bool,
}

impl App {
    /// Crée un formulaire vide
    pub fn new() -> Self {
        Self {
            running: true,
            focus: Field::Ticker,
            ticker: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            use_adjusted: false,
            busy: false,
            status: "準備就緒".to_string(),
            dialog: None,
            confirm_quit: false,
        }
    }

    /// Crée un formulaire pré-rempli avec les préférences chargées
    pub fn with_preferences(preferences: Preferences) -> Self {
        Self {
            ticker: preferences.stock,
            start_date: preferences.start_date,
            use_adjusted: preferences.use_adj,
            ..Self::new()
        }
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Navigation et saisie
    // ========================================================================

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    /// Buffer du champ texte qui a le focus
    ///
    /// CONCEPT RUST : Option<&mut String>
    /// - Emprunt mutable d'un seul champ à la fois
    /// - None pour la case à cocher et le bouton
    fn focused_buffer(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Ticker => Some(&mut self.ticker),
            Field::StartDate => Some(&mut self.start_date),
            Field::EndDate => Some(&mut self.end_date),
            Field::Adjusted | Field::Submit => None,
        }
    }

    /// Ajoute un caractère au champ texte actif
    pub fn append_char(&mut self, c: char) {
        if let Some(buffer) = self.focused_buffer() {
            buffer.push(c);
        }
    }

    /// Supprime le dernier caractère du champ texte actif
    pub fn backspace(&mut self) {
        if let Some(buffer) = self.focused_buffer() {
            buffer.pop();
        }
    }

    pub fn toggle_adjusted(&mut self) {
        self.use_adjusted = !self.use_adjusted;
    }

    // ========================================================================
    // Soumission et résultats
    // ========================================================================

    /// Valide le formulaire et passe en mode "occupé"
    ///
    /// Retourne la requête à envoyer au worker, ou None si :
    /// - une requête est déjà en cours (bouton désactivé)
    /// - la date de début est vide (un avertissement est affiché)
    pub fn submit(&mut self) -> Option<Request> {
        if self.busy {
            return None;
        }

        if self.start_date.trim().is_empty() {
            self.dialog = Some(Dialog::new(DialogKind::Warning, "提示", "請至少輸入「開始日期」！"));
            return None;
        }

        self.busy = true;
        self.status = "正在連線抓取資料，請稍候...".to_string();

        Some(Request::new(
            self.ticker.clone(),
            self.start_date.clone(),
            Some(self.end_date.clone()),
            self.use_adjusted,
        ))
    }

    /// Le worker n'a pas pu être lancé : on réactive le bouton
    pub fn abort_submit(&mut self, reason: &str) {
        self.busy = false;
        self.status = "發生錯誤".to_string();
        self.dialog = Some(Dialog::new(DialogKind::Error, "錯誤", format!("系統錯誤: {}", reason)));
    }

    /// Applique le résultat du worker
    ///
    /// Retourne les préférences à enregistrer (succès uniquement).
    pub fn apply_worker_message(&mut self, message: WorkerMessage) -> Option<Preferences> {
        self.busy = false;

        match message {
            WorkerMessage::FetchSucceeded { request, outcome } => {
                let path = outcome.path.display().to_string();
                self.status = format!("完成！檔案已存至:\n{}", path);
                self.dialog = Some(Dialog::new(
                    DialogKind::Info,
                    "成功",
                    format!("{}\n\n檔案已儲存:\n{}", outcome.message, path),
                ));
                Some(Preferences::from_request(&request))
            }
            WorkerMessage::FetchFailed { message, .. } => {
                self.status = "發生錯誤".to_string();
                self.dialog = Some(Dialog::new(DialogKind::Error, "錯誤", message));
                None
            }
        }
    }

    pub fn has_dialog(&self) -> bool {
        self.dialog.is_some()
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    /// Libellé courant du bouton
    pub fn submit_label(&self) -> &'static str {
        if self.busy {
            BUSY_LABEL
        } else {
            SUBMIT_LABEL
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::NaiveDate;

    use super::*;
    use crate::fetcher::{FetchOutcome, StartResolution};
    use crate::models::PriceColumn;

    fn outcome() -> FetchOutcome {
        FetchOutcome {
            path: PathBuf::from("/tmp/2330_20240102_20240304_150607.csv"),
            message: "成功！".to_string(),
            ticker: "2330.TW".to_string(),
            column: PriceColumn::Close,
            resolution: StartResolution::Exact(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
        }
    }

    #[test]
    fn test_preferences_prefill_form() {
        let app = App::with_preferences(Preferences {
            stock: "2330".to_string(),
            start_date: "2024/01/02".to_string(),
            use_adj: true,
        });

        assert_eq!(app.ticker, "2330");
        assert_eq!(app.start_date, "2024/01/02");
        assert!(app.end_date.is_empty());
        assert!(app.use_adjusted);
        assert!(app.is_running());
    }

    #[test]
    fn test_focus_cycles() {
        let mut app = App::new();
        assert_eq!(app.focus, Field::Ticker);

        app.focus_previous();
        assert_eq!(app.focus, Field::Submit);

        app.focus_next();
        app.focus_next();
        assert_eq!(app.focus, Field::StartDate);
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut app = App::new();
        app.append_char('2');
        app.append_char('3');
        app.focus_next();
        app.append_char('2');
        app.backspace();
        app.append_char('9');

        assert_eq!(app.ticker, "23");
        assert_eq!(app.start_date, "9");

        // La case à cocher n'accepte pas de texte
        app.focus = Field::Adjusted;
        app.append_char('x');
        assert_eq!(app.ticker, "23");
    }

    #[test]
    fn test_submit_requires_start_date() {
        let mut app = App::new();
        assert!(app.submit().is_none());
        assert!(!app.busy);
        assert_eq!(app.dialog.as_ref().unwrap().kind, DialogKind::Warning);
    }

    #[test]
    fn test_submit_disables_until_result() {
        let mut app = App::new();
        app.ticker = "2330".to_string();
        app.start_date = "2024/01/02".to_string();

        let request = app.submit().unwrap();
        assert_eq!(request.end_date, None);
        assert!(app.busy);
        assert_eq!(app.submit_label(), BUSY_LABEL);

        // Deuxième soumission ignorée pendant la requête
        assert!(app.submit().is_none());

        let prefs = app
            .apply_worker_message(WorkerMessage::FetchSucceeded {
                request,
                outcome: outcome(),
            })
            .unwrap();

        assert!(!app.busy);
        assert_eq!(app.submit_label(), SUBMIT_LABEL);
        assert_eq!(prefs.stock, "2330");
        assert!(app.status.starts_with("完成！"));
        assert_eq!(app.dialog.as_ref().unwrap().kind, DialogKind::Info);
    }

    #[test]
    fn test_failure_does_not_save_preferences() {
        let mut app = App::new();
        app.start_date = "2024/01/02".to_string();
        let request = app.submit().unwrap();

        let prefs = app.apply_worker_message(WorkerMessage::FetchFailed {
            request,
            message: "找不到 00631L 的資料，請檢查代碼。".to_string(),
        });

        assert!(prefs.is_none());
        assert!(!app.busy);
        assert_eq!(app.status, "發生錯誤");
        let dialog = app.dialog.clone().unwrap();
        assert_eq!(dialog.kind, DialogKind::Error);
        assert!(dialog.body.contains("00631L"));

        app.close_dialog();
        assert!(!app.has_dialog());
    }
}
