// ============================================================================
// twfetch - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests d'intégration
// ============================================================================

pub mod api;         // Sources de cours (Yahoo Finance)
pub mod app;         // État du formulaire
pub mod config;      // Chemins des fichiers (préférences, CSV, logs)
pub mod fetcher;     // Normalisation, recul au jour de bourse, écriture CSV
pub mod models;      // Structures de données
pub mod preferences; // user_config.json
pub mod ui;          // Interface utilisateur
pub mod worker;      // Thread de téléchargement
