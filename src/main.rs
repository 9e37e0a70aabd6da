// ============================================================================
// twfetch - 台股資料抓取助手
// ============================================================================
// Formulaire TUI : ticker, date de début, date de fin, clôture ajustée
// Télécharge l'historique depuis Yahoo Finance et l'écrit en CSV
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements, résultats du worker et rendu
// 3. Un thread worker par soumission, résultat reçu par channel
// 4. Restauration du terminal même en cas d'erreur
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::{mpsc, Arc};

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use twfetch::api::YahooSource;
use twfetch::app::{App, Field};
use twfetch::config::AppConfig;
use twfetch::fetcher::Fetcher;
use twfetch::models::Request;
use twfetch::preferences;
use twfetch::ui::{render, Event, EventHandler};
use twfetch::worker::{spawn_fetch, WorkerMessage};

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place, avec rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans `config.log_dir` :
/// - Linux : ~/.local/share/twfetch/logs/twfetch.log
/// - macOS : ~/Library/Application Support/twfetch/logs/twfetch.log
/// - Windows : C:\Users\<user>\AppData\Local\twfetch\logs\twfetch.log
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/twfetch/logs/twfetch.log
/// RUST_LOG=twfetch=trace cargo run
/// ```
fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "twfetch.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true)
                .with_thread_names(true) // "fetch-worker" vs "main"
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour twfetch, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twfetch=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber tracing")?;

    info!(log_dir = %log_dir.display(), "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = AppConfig::from_env();

    // Si l'init échoue, on affiche l'erreur et on continue sans logs
    init_logging(&config.log_dir).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(?config, "twfetch starting up");

    // Préférences : lues une fois, passées explicitement à l'App
    let prefs = preferences::load(&config.preferences_path);
    debug!(?prefs, "Loaded preferences");

    let source = YahooSource::new()?;
    let fetcher = Arc::new(Fetcher::new(source, config.output_dir.clone()));

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let mut app = App::with_preferences(prefs);
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &fetcher, &config);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Appliquer les résultats du worker (file de messages)
//   1. Dessiner l'interface
//   2. Traiter un événement clavier (et lancer un worker si soumission)
//
// Seul ce thread modifie App : le worker ne fait que poster un message.
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    fetcher: &Arc<Fetcher<YahooSource>>,
    config: &AppConfig,
) -> Result<()> {
    let (result_tx, result_rx) = mpsc::channel::<WorkerMessage>();

    while app.is_running() {
        // ========================================
        // 0. RÉSULTATS : messages du worker
        // ========================================
        // try_recv ne bloque pas ; Empty est le cas normal.
        // Disconnected n'arrive pas : on garde result_tx ici.
        while let Ok(message) = result_rx.try_recv() {
            if let Some(prefs) = app.apply_worker_message(message) {
                // Échec d'écriture des préférences : jamais bloquant
                match preferences::save(&config.preferences_path, &prefs) {
                    Ok(()) => debug!(?prefs, "Preferences saved"),
                    Err(e) => warn!(error = ?e, "Failed to save preferences"),
                }
            }
        }

        // ========================================
        // 1. RENDER
        // ========================================
        terminal.draw(|frame| render(frame, app))?;

        // ========================================
        // 2. INPUT
        // ========================================
        let event = match events.next() {
            Ok(event) => event,
            Err(e) => {
                warn!(error = ?e, "Failed to read terminal event");
                continue;
            }
        };

        if let Some(request) = handle_event(app, event) {
            info!(?request, "Dispatching fetch");
            if let Err(e) = spawn_fetch(Arc::clone(fetcher), request, result_tx.clone()) {
                error!(error = %e, "Failed to spawn worker thread");
                app.abort_submit(&e.to_string());
            }
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état du formulaire
///
/// Retourne une Request quand l'utilisateur soumet un formulaire valide.
///
/// CONCEPT RUST : Pattern matching avec guards
/// - L'ordre des bras compte : le dialogue modal capture tout en premier
fn handle_event(app: &mut App, event: Event) -> Option<Request> {
    use twfetch::ui::events::{
        get_char_from_event, is_backspace_event, is_enter_event, is_escape_event,
        is_force_quit_event, is_form_char_event, is_next_field_event, is_previous_field_event,
        is_toggle_event,
    };

    match event {
        Event::Key(_) if is_force_quit_event(&event) => {
            info!("User forced quit");
            app.quit();
        }

        // Dialogue affiché : seules Entrée et Échap le ferment
        Event::Key(_) if app.has_dialog() => {
            if is_enter_event(&event) || is_escape_event(&event) {
                app.close_dialog();
            }
        }

        // Échap : quit confirmation two-step
        Event::Key(_) if is_escape_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                app.request_quit();
            }
        }

        Event::Key(_) if is_next_field_event(&event) => {
            app.cancel_quit();
            app.focus_next();
        }

        Event::Key(_) if is_previous_field_event(&event) => {
            app.cancel_quit();
            app.focus_previous();
        }

        // Entrée : soumission depuis n'importe quel champ
        Event::Key(_) if is_enter_event(&event) => {
            app.cancel_quit();
            return app.submit();
        }

        Event::Key(_) if is_toggle_event(&event) && app.focus == Field::Adjusted => {
            app.cancel_quit();
            app.toggle_adjusted();
        }

        Event::Key(_) if is_backspace_event(&event) => {
            app.cancel_quit();
            app.backspace();
        }

        Event::Key(_) if is_form_char_event(&event) => {
            app.cancel_quit();
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation de quit
            app.cancel_quit();
        }

        Event::Tick => {}
    }

    None
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
