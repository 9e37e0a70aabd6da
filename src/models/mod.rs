// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module public (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod output;       // Lignes et colonnes du CSV de sortie
pub mod price_series; // Série de cours renvoyée par la source
pub mod request;      // Saisie utilisateur et requête résolue

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use twfetch::models::request::Request;
// On peut faire : use twfetch::models::Request;
pub use output::{OutputRecord, PriceColumn};
pub use price_series::{PriceBar, PriceSeries};
pub use request::{Request, ResolvedQuery, BUFFER_DAYS};
