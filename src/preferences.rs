// ============================================================================
// Préférences utilisateur (user_config.json)
// ============================================================================
// Dernière saisie réussie : ticker, date de début, case "還原權息"
//
// Lue une fois au démarrage, réécrite en entier après chaque succès.
// Une lecture ou écriture ratée n'interrompt jamais l'application :
// load() retombe sur les valeurs par défaut, l'appelant de save() se
// contente de logger l'erreur.
// ============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fetcher::DEFAULT_TICKER;
use crate::models::Request;

/// Nom du fichier de préférences par défaut
pub const PREFERENCES_FILE: &str = "user_config.json";

/// Contenu du fichier de préférences
///
/// CONCEPT SERDE : #[serde(default)]
/// - Un champ absent du JSON prend sa valeur par défaut
/// - Un ancien fichier sans "use_adj" reste lisible
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub stock: String,
    pub start_date: String,
    pub use_adj: bool,
}

impl Preferences {
    /// Préférences à enregistrer après une requête réussie
    ///
    /// Un ticker vide est enregistré comme le ticker par défaut.
    pub fn from_request(request: &Request) -> Self {
        let stock = if request.raw_ticker.trim().is_empty() {
            DEFAULT_TICKER.to_string()
        } else {
            request.raw_ticker.clone()
        };

        Self {
            stock,
            start_date: request.start_date.clone(),
            use_adj: request.use_adjusted,
        }
    }
}

/// Charge les préférences
///
/// Fichier absent ou JSON invalide : valeurs par défaut, sans erreur.
pub fn load(path: &Path) -> Preferences {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            debug!(path = %path.display(), error = %e, "Ignoring malformed preferences file");
            Preferences::default()
        }),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No preferences file");
            Preferences::default()
        }
    }
}

/// Écrit les préférences (écriture unique du fichier complet)
pub fn save(path: &Path, preferences: &Preferences) -> Result<()> {
    let json = serde_json::to_string(preferences).context("Échec de la sérialisation des préférences")?;
    std::fs::write(path, json)
        .with_context(|| format!("Échec de l'écriture de {}", path.display()))?;
    Ok(())
}
