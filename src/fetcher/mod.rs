// ============================================================================
// Module : fetcher
// ============================================================================
// Cœur de l'application : de la saisie brute au fichier CSV
//
//   Request ──resolve_query──▶ ResolvedQuery
//           ──download (candidats .TW puis .TWO)──▶ PriceSeries
//           ──snap_to_trading_day / choose_column / shape_records──▶ lignes
//           ──write_csv──▶ fichier + message
//
// CONCEPTS RUST :
// 1. Générique Fetcher<S: PriceSource> : la source est injectée (tests)
// 2. thiserror : erreurs typées, chaque variante a son message
// 3. #[instrument] : toutes les étapes loggées dans le span de la requête
// ============================================================================

pub mod dates;
pub mod selection;
pub mod ticker;
pub mod writer;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::PriceSource;
use crate::models::{PriceColumn, PriceSeries, Request, ResolvedQuery};

pub use dates::{parse_user_date, process_date};
pub use selection::{choose_column, round2, shape_records, snap_to_trading_day, StartResolution};
pub use ticker::{candidate_tickers, normalize_ticker, strip_venue_suffix, DEFAULT_TICKER};
pub use writer::output_filename;

// ============================================================================
// Erreurs
// ============================================================================

/// Erreurs d'un téléchargement
///
/// Les messages sont ceux affichés à l'utilisateur (en chinois traditionnel).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Aucun candidat n'a renvoyé de données
    #[error("找不到 {symbol} 的資料，請檢查代碼。")]
    TickerNotFound { symbol: String },

    /// Date de début vide (le formulaire l'empêche normalement)
    #[error("請至少輸入「開始日期」！")]
    MissingStartDate,

    /// Date illisible
    #[error("日期格式錯誤 '{input}': {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("無法寫入檔案 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV 寫入錯誤: {0}")]
    Csv(#[from] csv::Error),
}

impl FetchError {
    /// Message pour la boîte de dialogue
    ///
    /// "Ticker introuvable" est un résultat attendu ; le reste est une
    /// erreur système.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::TickerNotFound { .. } => self.to_string(),
            _ => format!("系統錯誤: {}", self),
        }
    }
}

// ============================================================================
// Résultat
// ============================================================================

/// Téléchargement réussi
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Chemin absolu du CSV écrit
    pub path: PathBuf,

    /// Message de succès, avec la remarque éventuelle sur la date de début
    pub message: String,

    /// Ticker qui a répondu (ex: "6488.TWO")
    pub ticker: String,

    /// Colonne de prix réellement écrite
    pub column: PriceColumn,

    /// Comment la date de début a été résolue
    pub resolution: StartResolution,
}

// ============================================================================
// Résolution de la requête
// ============================================================================

/// Construit la requête normalisée
///
/// `today` remplace une date de fin absente.
pub fn resolve_query(request: &Request, today: NaiveDate) -> Result<ResolvedQuery, FetchError> {
    let symbol = normalize_ticker(&request.raw_ticker);
    let candidates = candidate_tickers(&symbol);

    let start = parse_user_date(&request.start_date)?.ok_or(FetchError::MissingStartDate)?;

    let end = match request.end_date.as_deref() {
        Some(end) => parse_user_date(end)?.unwrap_or(today),
        None => today,
    };

    Ok(ResolvedQuery::new(symbol, candidates, start, end))
}

// ============================================================================
// Fetcher
// ============================================================================

/// Télécharge une série et l'écrit en CSV
pub struct Fetcher<S> {
    source: S,
    output_dir: PathBuf,
}

impl<S: PriceSource> Fetcher<S> {
    /// Crée un Fetcher qui écrit ses fichiers dans `output_dir`
    pub fn new(source: S, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output_dir: output_dir.into(),
        }
    }

    /// Exécute une requête complète
    ///
    /// Le fichier n'est écrit qu'une fois toute la sélection terminée :
    /// une erreur avant l'écriture ne laisse aucun fichier partiel.
    #[instrument(skip(self, request), fields(ticker = %request.raw_ticker, start = %request.start_date))]
    pub async fn fetch(&self, request: &Request) -> Result<FetchOutcome, FetchError> {
        let now = Local::now().naive_local();
        let query = resolve_query(request, now.date())?;
        debug!(?query, "Resolved query");

        let (ticker, series) = self.download_first_available(&query).await?;

        let snapped = snap_to_trading_day(&series, query.normalized_start);
        let column = choose_column(&series, request.use_adjusted);
        if request.use_adjusted && column == PriceColumn::Close {
            debug!(ticker = %ticker, "No adjusted close column, using close");
        }
        let records = shape_records(snapped.bars, column);

        let filename = output_filename(
            strip_venue_suffix(&ticker),
            query.normalized_start,
            request.use_adjusted,
            now,
        );
        let path = writer::absolute_path(self.output_dir.join(filename))?;
        writer::write_csv(&path, column, &records)?;

        let message = format!("成功！{}", snapped.resolution.notice().unwrap_or_default());
        info!(
            path = %path.display(),
            rows = records.len(),
            resolution = ?snapped.resolution,
            "CSV written"
        );

        Ok(FetchOutcome {
            path,
            message,
            ticker,
            column,
            resolution: snapped.resolution,
        })
    }

    /// Essaie chaque candidat dans l'ordre, garde la première série non vide
    ///
    /// Un candidat en erreur ou vide n'est pas fatal : on passe au suivant.
    /// Seul l'épuisement de tous les candidats est une erreur.
    async fn download_first_available(
        &self,
        query: &ResolvedQuery,
    ) -> Result<(String, PriceSeries), FetchError> {
        for ticker in &query.candidate_tickers {
            match self
                .source
                .download(ticker, query.buffer_start, query.normalized_end)
                .await
            {
                Ok(series) if !series.is_empty() => {
                    info!(ticker = %ticker, rows = series.len(), "Candidate returned data");
                    return Ok((ticker.clone(), series));
                }
                Ok(_) => {
                    debug!(ticker = %ticker, "Candidate returned no rows");
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Candidate lookup failed");
                }
            }
        }

        Err(FetchError::TickerNotFound {
            symbol: query.symbol.clone(),
        })
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::models::PriceBar;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Source en mémoire : ticker → lignes (absent = erreur HTTP)
    struct StubSource {
        series: HashMap<String, PriceSeries>,
        calls: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                series: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with(mut self, ticker: &str, series: PriceSeries) -> Self {
            self.series.insert(ticker.to_string(), series);
            self
        }

        fn called_tickers(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|c| c.0.clone()).collect()
        }
    }

    impl PriceSource for StubSource {
        async fn download(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries> {
            self.calls.lock().unwrap().push((ticker.to_string(), start, end));
            self.series
                .get(ticker)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("HTTP 404 Not Found"))
        }
    }

    fn sample_series(ticker: &str) -> PriceSeries {
        PriceSeries::from_bars(
            ticker,
            false,
            vec![
                PriceBar::new(date(2024, 1, 5), 580.0, 1000),
                PriceBar::new(date(2024, 1, 8), 590.123, 2000),
            ],
        )
    }

    #[test]
    fn test_resolve_query() {
        let request = Request::new(" 2330 ", "2024/01/06", None, false);
        let query = resolve_query(&request, date(2024, 2, 1)).unwrap();

        assert_eq!(query.symbol, "2330");
        assert_eq!(query.candidate_tickers, vec!["2330.TW", "2330.TWO"]);
        assert_eq!(query.normalized_start, date(2024, 1, 6));
        assert_eq!(query.normalized_end, date(2024, 2, 1));
        assert_eq!(query.buffer_start, date(2023, 12, 30));
    }

    #[test]
    fn test_resolve_query_with_end_date() {
        let request = Request::new("", "2024-01-02", Some("2024/01/31".to_string()), true);
        let query = resolve_query(&request, date(2024, 6, 1)).unwrap();

        assert_eq!(query.symbol, DEFAULT_TICKER);
        assert_eq!(query.normalized_end, date(2024, 1, 31));
    }

    #[test]
    fn test_resolve_query_rejects_bad_start() {
        let request = Request::new("2330", "2024/02/30", None, false);
        let err = resolve_query(&request, date(2024, 6, 1)).unwrap_err();

        assert!(matches!(err, FetchError::InvalidDate { .. }));
        assert!(err.user_message().starts_with("系統錯誤"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_end_date_before_download() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new().with("2330.TW", sample_series("2330.TW"));
        let fetcher = Fetcher::new(source, dir.path());

        let err = fetcher
            .fetch(&Request::new("2330", "2024/01/05", Some("2024/13/40".into()), false))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::InvalidDate { ref input, .. } if input == "2024/13/40"));
        assert!(err.user_message().starts_with("系統錯誤: "));
        assert!(fetcher.source.called_tickers().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_resolve_query_requires_start() {
        let request = Request::new("2330", "", None, false);
        let err = resolve_query(&request, date(2024, 6, 1)).unwrap_err();
        assert!(matches!(err, FetchError::MissingStartDate));
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_otc_venue() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new().with("6488.TWO", sample_series("6488.TWO"));
        let fetcher = Fetcher::new(source, dir.path());

        let request = Request::new("6488", "2024/01/06", None, false);
        let outcome = fetcher.fetch(&request).await.unwrap();

        assert_eq!(fetcher.source.called_tickers(), vec!["6488.TW", "6488.TWO"]);
        assert_eq!(outcome.ticker, "6488.TWO");
        assert_eq!(outcome.resolution, StartResolution::SnappedBack(date(2024, 1, 5)));
        assert!(outcome.message.starts_with("成功！"));
        assert!(outcome.message.contains("2024-01-05"));

        let name = outcome.path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("6488_20240106_"), "unexpected name {}", name);
        assert!(outcome.path.is_absolute());
    }

    #[tokio::test]
    async fn test_fetch_stops_at_first_venue() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new()
            .with("2330.TW", sample_series("2330.TW"))
            .with("2330.TWO", sample_series("2330.TWO"));
        let fetcher = Fetcher::new(source, dir.path());

        let outcome = fetcher
            .fetch(&Request::new("2330", "2024-01-05", None, false))
            .await
            .unwrap();

        assert_eq!(fetcher.source.called_tickers(), vec!["2330.TW"]);
        assert_eq!(outcome.ticker, "2330.TW");
        assert_eq!(outcome.message, "成功！");
    }

    #[tokio::test]
    async fn test_fetch_requests_buffered_range() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new().with("2330.TW", sample_series("2330.TW"));
        let fetcher = Fetcher::new(source, dir.path());

        fetcher
            .fetch(&Request::new("2330.tw", "2024/01/06", Some("2024/01/20".into()), false))
            .await
            .unwrap();

        let calls = fetcher.source.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("2330.TW".to_string(), date(2023, 12, 30), date(2024, 1, 20))]);
    }

    #[tokio::test]
    async fn test_fetch_not_found_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new().with("9999.TW", PriceSeries::new("9999.TW", true));
        let fetcher = Fetcher::new(source, dir.path());

        let err = fetcher
            .fetch(&Request::new("9999", "2024/01/02", None, false))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::TickerNotFound { ref symbol } if symbol == "9999"));
        assert_eq!(err.user_message(), "找不到 9999 的資料，請檢查代碼。");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_adjusted_without_column_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::new().with("2330.TW", sample_series("2330.TW"));
        let fetcher = Fetcher::new(source, dir.path());

        let outcome = fetcher
            .fetch(&Request::new("2330", "2024/01/05", None, true))
            .await
            .unwrap();

        assert_eq!(outcome.column, PriceColumn::Close);
        let name = outcome.path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.contains("_Adj_"));
    }
}
