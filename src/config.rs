// ============================================================================
// Configuration de l'application
// ============================================================================
// Emplacements des fichiers :
// - préférences : ./user_config.json
// - CSV         : répertoire courant
// - logs        : ~/.local/share/twfetch/logs (Linux), ./logs à défaut
//
// Chaque chemin peut être remplacé par une variable d'environnement :
//   TWFETCH_PREFERENCES, TWFETCH_OUTPUT_DIR, TWFETCH_LOG_DIR
// ============================================================================

use std::path::PathBuf;

use crate::preferences::PREFERENCES_FILE;

pub const ENV_PREFERENCES: &str = "TWFETCH_PREFERENCES";
pub const ENV_OUTPUT_DIR: &str = "TWFETCH_OUTPUT_DIR";
pub const ENV_LOG_DIR: &str = "TWFETCH_LOG_DIR";

/// Chemins utilisés par l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub preferences_path: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Valeurs par défaut, surchargées par l'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// CONCEPT RUST : injection d'une fonction de lecture
    /// - En production : std::env::var
    /// - En test : une closure sur une HashMap (pas de variables globales)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let path_or = |key: &str, default: PathBuf| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };

        Self {
            preferences_path: path_or(ENV_PREFERENCES, defaults.preferences_path),
            output_dir: path_or(ENV_OUTPUT_DIR, defaults.output_dir),
            log_dir: path_or(ENV_LOG_DIR, defaults.log_dir),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let log_dir = dirs::data_local_dir()
            .map(|dir| dir.join("twfetch").join("logs"))
            .unwrap_or_else(|| PathBuf::from("./logs"));

        Self {
            preferences_path: PathBuf::from(PREFERENCES_FILE),
            output_dir: PathBuf::from("."),
            log_dir,
        }
    }
}
