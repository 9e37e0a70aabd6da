// ============================================================================
// Tickers : normalisation et choix du marché
// ============================================================================
// Un code taïwanais ("2330", "00631L") peut être coté sur deux marchés :
// - .TW  : TWSE (marché principal, 上市)
// - .TWO : TPEx (marché OTC, 上櫃)
// Sans suffixe, on essaie les deux dans cet ordre.
// ============================================================================

/// Ticker utilisé quand le champ est vide
pub const DEFAULT_TICKER: &str = "00631L";

/// Suffixes de marché reconnus, par ordre de priorité
pub const VENUE_SUFFIXES: [&str; 2] = [".TW", ".TWO"];

/// Trim + majuscules, avec le ticker par défaut si vide
pub fn normalize_ticker(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_TICKER.to_string()
    } else {
        trimmed.to_uppercase()
    }
}

/// Retourne le suffixe de marché porté par le ticker, s'il y en a un
fn venue_suffix(ticker: &str) -> Option<&'static str> {
    VENUE_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| ticker.ends_with(*suffix))
}

/// Tickers à essayer pour un symbole normalisé
///
/// - "2330.TW"  → ["2330.TW"]
/// - "2330"     → ["2330.TW", "2330.TWO"]
pub fn candidate_tickers(symbol: &str) -> Vec<String> {
    if venue_suffix(symbol).is_some() {
        vec![symbol.to_string()]
    } else {
        VENUE_SUFFIXES
            .iter()
            .map(|suffix| format!("{}{}", symbol, suffix))
            .collect()
    }
}

/// Retire le suffixe de marché ("6488.TWO" → "6488")
pub fn strip_venue_suffix(ticker: &str) -> &str {
    match venue_suffix(ticker) {
        Some(suffix) => &ticker[..ticker.len() - suffix.len()],
        None => ticker,
    }
}
