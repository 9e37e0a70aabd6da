// ============================================================================
// Structure : PriceSeries
// ============================================================================
// Série de cours journaliers renvoyée par la source distante
//
// CONCEPTS RUST :
// 1. NaiveDate : date de chrono sans timezone (un jour de bourse)
// 2. Option<f64> : la clôture ajustée peut manquer pour une ligne
// 3. Slices (&[T]) : lecture sans copie des lignes
// ============================================================================

use chrono::NaiveDate;

/// Une ligne de la série : un jour de bourse
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    /// Date du jour de bourse
    pub date: NaiveDate,

    /// Prix de clôture brut
    pub close: f64,

    /// Clôture ajustée (dividendes, splits), None si absente pour ce jour
    pub adj_close: Option<f64>,

    /// Volume échangé
    pub volume: u64,
}

impl PriceBar {
    /// Crée une ligne sans clôture ajustée
    pub fn new(date: NaiveDate, close: f64, volume: u64) -> Self {
        Self {
            date,
            close,
            adj_close: None,
            volume,
        }
    }

    /// Ajoute la clôture ajustée (builder)
    pub fn with_adj_close(mut self, adj_close: f64) -> Self {
        self.adj_close = Some(adj_close);
        self
    }
}

/// Série de cours pour un ticker, triée par date croissante
///
/// CONCEPT : Colonne optionnelle
/// - has_adjusted_close indique si la source a fourni la colonne "Adj Close"
/// - C'est une propriété de la série entière, pas de chaque ligne
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    /// Ticker interrogé (avec suffixe de marché, ex: "2330.TW")
    pub ticker: String,

    /// La source a-t-elle fourni une colonne de clôture ajustée ?
    pub has_adjusted_close: bool,

    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Crée une série vide
    pub fn new(ticker: impl Into<String>, has_adjusted_close: bool) -> Self {
        Self {
            ticker: ticker.into(),
            has_adjusted_close,
            bars: Vec::new(),
        }
    }

    /// Construit une série à partir de lignes déjà chargées
    ///
    /// Les lignes sont triées par date : la logique de recul au jour de bourse
    /// précédent suppose un ordre croissant.
    pub fn from_bars(ticker: impl Into<String>, has_adjusted_close: bool, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        Self {
            ticker: ticker.into(),
            has_adjusted_close,
            bars,
        }
    }

    /// Ajoute une ligne (doit être postérieure à la dernière)
    pub fn push(&mut self, bar: PriceBar) {
        self.bars.push(bar);
    }

    /// Toutes les lignes
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Nombre de lignes
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Vérifie si la série est vide
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
