// ============================================================================
// API Client : Yahoo Finance
// ============================================================================
// Récupère les cours journaliers (clôture, clôture ajustée, volume)
// depuis l'API chart v8 de Yahoo Finance
//
// CONCEPTS RUST :
// 1. async/await : requête HTTP non-bloquante
// 2. Result<T, E> + Context : erreurs avec contexte
// 3. Serde : désérialisation JSON automatique
// ============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::api::PriceSource;
use crate::models::{PriceBar, PriceSeries};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// ============================================================================
// Structures pour parser la réponse JSON de Yahoo Finance
// ============================================================================
// Yahoo retourne un JSON imbriqué, on définit des structures qui matchent
// exactement la structure JSON pour que serde puisse désérialiser
// ============================================================================

/// Réponse complète de l'API Yahoo Finance
#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    /// null quand le symbole est inconnu
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Meta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

/// Métadonnées du ticker
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    symbol: String,
    /// Décalage du fuseau de la place de cotation en secondes (+28800 pour Taipei)
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    /// Présent seulement avec includeAdjustedClose=true
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

// ============================================================================
// YahooSource
// ============================================================================

/// Source de cours Yahoo Finance
///
/// Le client HTTP est créé une seule fois et partagé entre les requêtes
/// (reqwest::Client est Send + Sync et réutilise ses connexions).
#[derive(Debug, Clone)]
pub struct YahooSource {
    client: reqwest::Client,
    base_url: String,
}

impl YahooSource {
    /// Crée une source pointant vers query1.finance.yahoo.com
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Crée une source vers une autre URL de base (miroir, proxy)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        // Ajout d'un User-Agent pour éviter le blocage par Yahoo
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn chart_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        build_chart_url(&self.base_url, ticker, start, end)
    }
}

impl PriceSource for YahooSource {
    #[instrument(skip(self), fields(start = %start, end = %end))]
    async fn download(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let url = self.chart_url(ticker, start, end);
        debug!(url = %url, "Built Yahoo Finance chart URL");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Échec de la requête HTTP vers Yahoo Finance")?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        // Vérifie que la réponse est un succès HTTP (200-299)
        // Un symbole inconnu donne un 404 : l'appelant passera au candidat suivant
        if !status.is_success() {
            warn!(status = %status, "Yahoo Finance returned error status");
            anyhow::bail!("Yahoo Finance a retourné une erreur : HTTP {}", status);
        }

        let yahoo_response: YahooResponse = response
            .json()
            .await
            .context("Échec du parsing JSON de la réponse Yahoo")?;

        let series = parse_chart_response(yahoo_response, ticker)?;
        info!(rows = series.len(), adjusted = series.has_adjusted_close, "Fetched daily prices");
        Ok(series)
    }
}

/// Construit l'URL de l'API chart
///
/// period1 = début à 00:00 UTC, period2 = fin à 00:00 UTC.
/// Les séances de Taipei sont horodatées vers 01:00 UTC, donc le jour de début
/// est inclus et le jour de fin exclu.
fn build_chart_url(base_url: &str, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
    let period1 = midnight_utc(start);
    let period2 = midnight_utc(end);

    format!(
        "{}/v8/finance/chart/{}?interval=1d&period1={}&period2={}&includeAdjustedClose=true&events=div%2Csplit",
        base_url.trim_end_matches('/'),
        ticker,
        period1,
        period2
    )
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Convertit la réponse Yahoo en PriceSeries
///
/// Une réponse "Not Found" devient une erreur ; une réponse sans timestamps
/// devient une série vide (le Fetcher traite les deux comme un échec).
fn parse_chart_response(yahoo_response: YahooResponse, ticker: &str) -> Result<PriceSeries> {
    let chart = yahoo_response.chart;

    if let Some(err) = chart.error {
        anyhow::bail!("Yahoo Finance : {} ({})", err.description, err.code);
    }

    let result = chart
        .result
        .and_then(|results| results.into_iter().next())
        .context("Aucune donnée retournée par Yahoo Finance")?;

    let offset = result.meta.gmtoffset.unwrap_or(0);
    debug!(symbol = %result.meta.symbol, gmtoffset = offset, "Parsing chart result");

    let timestamps = result.timestamp.unwrap_or_default();

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .context("Pas de données de cotation dans la réponse")?;

    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    // CONCEPT RUST : and_then + flatten pour descendre dans les Option imbriquées
    let adj_closes = result
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .and_then(|a| a.adjclose);

    let mut series = PriceSeries::new(ticker, adj_closes.is_some());
    let mut skipped_count = 0;

    for (i, &timestamp) in timestamps.iter().enumerate() {
        // Jour férié ou séance vide : pas de clôture, on saute la ligne
        let close = match closes.get(i).copied().flatten() {
            Some(v) => v,
            None => {
                skipped_count += 1;
                continue;
            }
        };

        let volume = volumes.get(i).copied().flatten().unwrap_or(0);

        // La date de séance est celle de la place de cotation, pas celle d'UTC
        let date = DateTime::from_timestamp(timestamp + offset, 0)
            .context("Timestamp invalide")?
            .date_naive();

        let mut bar = PriceBar::new(date, close, volume);
        if let Some(adj) = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten()) {
            bar = bar.with_adj_close(adj);
        }
        series.push(bar);
    }

    if skipped_count > 0 {
        warn!(
            skipped = skipped_count,
            total = timestamps.len(),
            "Skipped rows with missing close"
        );
    }

    if series.is_empty() {
        error!(ticker = %ticker, "No valid rows in Yahoo response");
    }

    Ok(series)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parse(json: &str) -> Result<PriceSeries> {
        let response: YahooResponse = serde_json::from_str(json).unwrap();
        parse_chart_response(response, "2330.TW")
    }

    #[test]
    fn test_build_chart_url() {
        let url = build_chart_url(DEFAULT_BASE_URL, "2330.TW", date(2023, 12, 26), date(2024, 1, 10));
        assert!(url.starts_with("https://query1.finance.yahoo.com/v8/finance/chart/2330.TW?"));
        assert!(url.contains("interval=1d"));
        assert!(url.contains("period1=1703548800"));
        assert!(url.contains("period2=1704844800"));
        assert!(url.contains("includeAdjustedClose=true"));
    }

    #[test]
    fn test_parse_uses_exchange_local_date() {
        // 1704157200 = 2024-01-02 01:00 UTC = 09:00 à Taipei
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "2330.TW", "gmtoffset": 28800},
                    "timestamp": [1704157200, 1704243600],
                    "indicators": {
                        "quote": [{"close": [593.0, 586.0], "volume": [26059058, 37106763]}],
                        "adjclose": [{"adjclose": [572.1, null]}]
                    }
                }],
                "error": null
            }
        }"#;

        let series = parse(json).unwrap();
        assert!(series.has_adjusted_close);
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date, date(2024, 1, 2));
        assert_eq!(series.bars()[0].adj_close, Some(572.1));
        assert_eq!(series.bars()[1].date, date(2024, 1, 3));
        assert_eq!(series.bars()[1].adj_close, None);
        assert_eq!(series.bars()[1].volume, 37106763);
    }

    #[test]
    fn test_parse_skips_rows_without_close() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "2330.TW", "gmtoffset": 28800},
                    "timestamp": [1704157200, 1704243600],
                    "indicators": {"quote": [{"close": [null, 586.0], "volume": [null, 100]}]}
                }],
                "error": null
            }
        }"#;

        let series = parse(json).unwrap();
        assert!(!series.has_adjusted_close);
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].close, 586.0);
    }

    #[test]
    fn test_parse_not_found_is_error() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;

        let err = parse(json).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_parse_without_timestamps_is_empty() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "2330.TW"},
                    "indicators": {"quote": [{}]}
                }],
                "error": null
            }
        }"#;

        let series = parse(json).unwrap();
        assert!(series.is_empty());
    }
}
