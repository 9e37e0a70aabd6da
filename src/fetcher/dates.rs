// ============================================================================
// Dates saisies par l'utilisateur
// ============================================================================
// Deux conventions acceptées : "2022/01/01" et "2022-01-01"
// Forme interne : "2022-01-01" puis NaiveDate
// ============================================================================

use chrono::NaiveDate;

use super::FetchError;

/// Format interne après normalisation
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Unifie le séparateur : "2022/01/01" → "2022-01-01", "" → None
pub fn process_date(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.replace('/', "-"))
}

/// Parse une date utilisateur déjà présente
///
/// CONCEPT RUST : map_err
/// - Transforme chrono::ParseError en notre FetchError
/// - On garde la saisie d'origine pour le message
pub fn parse_user_date(input: &str) -> Result<Option<NaiveDate>, FetchError> {
    match process_date(input) {
        None => Ok(None),
        Some(normalized) => NaiveDate::parse_from_str(&normalized, DATE_FORMAT)
            .map(Some)
            .map_err(|source| FetchError::InvalidDate {
                input: input.to_string(),
                source,
            }),
    }
}
