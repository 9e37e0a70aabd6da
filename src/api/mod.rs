// ============================================================================
// Module : api
// ============================================================================
// Sources distantes de cours historiques
//
// Le Fetcher ne connaît que le trait PriceSource : en production c'est
// YahooSource, dans les tests une source en mémoire.
// ============================================================================

pub mod yahoo; // Client API Yahoo Finance (chart v8)

use anyhow::Result;
use chrono::NaiveDate;

use crate::models::PriceSeries;

pub use yahoo::YahooSource;

/// Source de cours journaliers
///
/// CONCEPT RUST : async fn dans un trait (Rust 1.75+)
/// - Chaque implémentation retourne sa propre Future
/// - Utilisé via un générique (Fetcher<S: PriceSource>), pas via dyn
///
/// Une série vide et une erreur ont le même sens pour l'appelant :
/// "ce ticker n'a rien donné, essayer le suivant".
#[allow(async_fn_in_trait)]
pub trait PriceSource {
    /// Télécharge les cours de `ticker` entre `start` (inclus) et `end` (exclu)
    async fn download(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries>;
}
