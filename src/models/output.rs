// ============================================================================
// Structures : PriceColumn / OutputRecord
// ============================================================================
// Ce qui est réellement écrit dans le CSV : date, prix arrondi, volume
// ============================================================================

use chrono::NaiveDate;

/// En-tête CSV de la colonne date
pub const DATE_LABEL: &str = "日期";

/// En-tête CSV de la colonne volume
pub const VOLUME_LABEL: &str = "交易次數(成交量)";

/// Colonne de prix retenue pour la sortie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceColumn {
    /// Clôture brute ("Close")
    Close,
    /// Clôture ajustée ("Adj Close")
    AdjustedClose,
}

impl PriceColumn {
    /// Libellé de l'en-tête CSV
    pub fn label(&self) -> &'static str {
        match self {
            PriceColumn::Close => "收盤價",
            PriceColumn::AdjustedClose => "收盤價(還原權息)",
        }
    }
}

/// Une ligne du fichier de sortie
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub date: NaiveDate,
    /// Prix arrondi à 2 décimales
    pub price: f64,
    pub volume: u64,
}

impl OutputRecord {
    /// Champs CSV : date ISO, prix avec 2 décimales, volume entier
    pub fn to_fields(&self) -> [String; 3] {
        [
            self.date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", self.price),
            self.volume.to_string(),
        ]
    }
}
