// ============================================================================
// Structures : Request / ResolvedQuery
// ============================================================================
// Request : ce que l'utilisateur a saisi dans le formulaire (texte brut)
// ResolvedQuery : la requête normalisée, prête à interroger la source
//
// CONCEPT RUST : Séparer "entrée brute" et "entrée validée"
// - Request garde les String telles que saisies
// - ResolvedQuery ne contient que des types forts (NaiveDate, Vec<String>)
// ============================================================================

use chrono::{Duration, NaiveDate};

/// Nombre de jours calendaires demandés en plus avant la date de début
///
/// Garantit la présence du jour de bourse précédent malgré week-ends et fériés.
pub const BUFFER_DAYS: i64 = 7;

/// Demande de téléchargement construite à chaque soumission du formulaire
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Request {
    /// Ticker tel que saisi (peut être vide, sans suffixe, en minuscules...)
    pub raw_ticker: String,

    /// Date de début au format utilisateur ("2024/01/02" ou "2024-01-02")
    pub start_date: String,

    /// Date de fin optionnelle (None = aujourd'hui)
    pub end_date: Option<String>,

    /// Utiliser la clôture ajustée (還原權息) ?
    pub use_adjusted: bool,
}

impl Request {
    pub fn new(
        raw_ticker: impl Into<String>,
        start_date: impl Into<String>,
        end_date: Option<String>,
        use_adjusted: bool,
    ) -> Self {
        Self {
            raw_ticker: raw_ticker.into(),
            start_date: start_date.into(),
            // Un champ vide compte comme absent
            end_date: end_date.filter(|s| !s.trim().is_empty()),
            use_adjusted,
        }
    }
}

/// Requête résolue : tickers candidats et bornes de dates normalisées
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    /// Ticker normalisé (trim + majuscules), utilisé dans les messages
    pub symbol: String,

    /// Tickers à essayer dans l'ordre (ex: ["2330.TW", "2330.TWO"])
    pub candidate_tickers: Vec<String>,

    /// Date de début demandée
    pub normalized_start: NaiveDate,

    /// Date de fin (exclusive côté source)
    pub normalized_end: NaiveDate,

    /// normalized_start - BUFFER_DAYS
    pub buffer_start: NaiveDate,
}

impl ResolvedQuery {
    pub fn new(
        symbol: String,
        candidate_tickers: Vec<String>,
        normalized_start: NaiveDate,
        normalized_end: NaiveDate,
    ) -> Self {
        Self {
            symbol,
            candidate_tickers,
            normalized_start,
            normalized_end,
            buffer_start: normalized_start - Duration::days(BUFFER_DAYS),
        }
    }
}
