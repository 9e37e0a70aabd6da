// ============================================================================
// Écriture du fichier CSV
// ============================================================================
// UTF-8 avec BOM : Excel détecte l'encodage et affiche correctement les
// en-têtes en chinois.
// ============================================================================

use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use super::FetchError;
use crate::models::output::{DATE_LABEL, VOLUME_LABEL};
use crate::models::{OutputRecord, PriceColumn};

/// Byte-order mark UTF-8
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Nom du fichier de sortie
///
/// `{symbole}_{début AAAAMMJJ}{_Adj}_{AAAAMMJJ_HHMMSS}.csv`
pub fn output_filename(symbol: &str, start: NaiveDate, use_adjusted: bool, now: NaiveDateTime) -> String {
    let suffix = if use_adjusted { "_Adj" } else { "" };
    format!(
        "{}_{}{}_{}.csv",
        symbol,
        start.format("%Y%m%d"),
        suffix,
        now.format("%Y%m%d_%H%M%S")
    )
}

/// Écrit les lignes dans `path` (en-tête + une ligne par jour)
pub fn write_csv(path: &Path, column: PriceColumn, records: &[OutputRecord]) -> Result<(), FetchError> {
    let io_error = |source: std::io::Error| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(UTF8_BOM).map_err(io_error)?;

    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record([DATE_LABEL, column.label(), VOLUME_LABEL])?;

    for record in records {
        wtr.write_record(record.to_fields())?;
    }

    wtr.flush().map_err(io_error)?;
    Ok(())
}

/// Rend un chemin absolu par rapport au répertoire courant
///
/// Les composants "." sont retirés : `./out.csv` donne `/cwd/out.csv`.
pub fn absolute_path(path: PathBuf) -> Result<PathBuf, FetchError> {
    let absolute = if path.is_absolute() {
        path
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(&path),
            Err(source) => return Err(FetchError::Io { path, source }),
        }
    };

    Ok(absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ^[A-Z0-9]+_\d{8}(_Adj)?_\d{8}_\d{6}\.csv$
    fn is_output_filename(name: &str) -> bool {
        let digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());

        let Some(stem) = name.strip_suffix(".csv") else {
            return false;
        };
        let Some((rest, time)) = stem.rsplit_once('_') else {
            return false;
        };
        let Some((rest, day)) = rest.rsplit_once('_') else {
            return false;
        };
        let rest = rest.strip_suffix("_Adj").unwrap_or(rest);
        let Some((symbol, start)) = rest.split_once('_') else {
            return false;
        };

        !symbol.is_empty()
            && symbol.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
            && digits(start, 8)
            && digits(day, 8)
            && digits(time, 6)
    }

    #[test]
    fn test_filename_checker_rejects_malformed_names() {
        assert!(!is_output_filename("23_30_20240102_20240304_150607.csv"));
        assert!(!is_output_filename("2330.TW_20240102_20240304_150607.csv"));
        assert!(!is_output_filename("abc_20240102_20240304_150607.csv"));
        assert!(!is_output_filename("2330_2024010_20240304_150607.csv"));
        assert!(!is_output_filename("2330_20240102_adj_20240304_150607.csv"));
        assert!(!is_output_filename("2330_20240102_20240304_150607.txt"));
        assert!(!is_output_filename("_20240102_20240304_150607.csv"));
    }

    #[test]
    fn test_output_filename_pattern() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(15, 6, 7)
            .unwrap();

        let plain = output_filename("2330", start, false, now);
        assert_eq!(plain, "2330_20240102_20240304_150607.csv");
        assert!(is_output_filename(&plain));

        let adjusted = output_filename("00631L", start, true, now);
        assert_eq!(adjusted, "00631L_20240102_Adj_20240304_150607.csv");
        assert!(is_output_filename(&adjusted));
    }

    #[test]
    fn test_write_csv_with_bom_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = vec![OutputRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            price: 593.0,
            volume: 100,
        }];

        write_csv(&path, PriceColumn::AdjustedClose, &records).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "日期,收盤價(還原權息),交易次數(成交量)");
        assert_eq!(lines[1], "2024-01-02,593.00,100");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_absolute_path_drops_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        let path = absolute_path(Path::new(".").join("2330_20240102_20240304_150607.csv")).unwrap();

        // PathBuf compare par composants : on vérifie le texte affiché
        assert_eq!(
            path.display().to_string(),
            cwd.join("2330_20240102_20240304_150607.csv").display().to_string()
        );
        assert!(!path.display().to_string().contains("/./"));
    }

    #[test]
    fn test_absolute_path_keeps_absolute_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".").join("out.csv");

        assert_eq!(
            absolute_path(path).unwrap().display().to_string(),
            dir.path().join("out.csv").display().to_string()
        );
    }

    #[test]
    fn test_write_csv_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");

        let err = write_csv(&path, PriceColumn::Close, &[]).unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
