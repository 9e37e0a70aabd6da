// ============================================================================
// Sélection des lignes et de la colonne de prix
// ============================================================================
// 1. Recul au jour de bourse : la première ligne du fichier est le dernier
//    jour de bourse <= date demandée
// 2. Choix de la colonne : clôture ajustée si demandée ET disponible
// 3. Mise en forme : arrondi à 2 décimales
// ============================================================================

use chrono::NaiveDate;

use crate::models::{OutputRecord, PriceBar, PriceColumn, PriceSeries};

/// Comment la date de début demandée a été résolue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartResolution {
    /// La date demandée est un jour de bourse
    Exact(NaiveDate),

    /// La date demandée n'est pas un jour de bourse : recul au précédent
    SnappedBack(NaiveDate),

    /// Aucune ligne <= date demandée : toute la série est conservée
    NoPriorData,
}

impl StartResolution {
    /// Remarque ajoutée au message de succès
    pub fn notice(&self) -> Option<String> {
        match self {
            StartResolution::Exact(_) => None,
            StartResolution::SnappedBack(date) => Some(format!(
                "(已自動回溯至前一交易日: {})",
                date.format("%Y-%m-%d")
            )),
            StartResolution::NoPriorData => Some("(注意: 指定日期無資料，已抓取最近數據)".to_string()),
        }
    }
}

/// Lignes retenues + résolution de la date de début
///
/// CONCEPT RUST : Lifetime 'a
/// - `bars` emprunte une tranche de la série, sans copie
/// - La série doit vivre au moins aussi longtemps que Snapped
#[derive(Debug)]
pub struct Snapped<'a> {
    pub bars: &'a [PriceBar],
    pub resolution: StartResolution,
}

/// Recule la date de début au dernier jour de bourse <= `requested`
///
/// La série est triée par date : le jour effectif est la dernière ligne
/// <= `requested`, et on garde tout à partir de ce jour.
pub fn snap_to_trading_day(series: &PriceSeries, requested: NaiveDate) -> Snapped<'_> {
    let bars = series.bars();

    let effective = bars
        .iter()
        .rev()
        .find(|bar| bar.date <= requested)
        .map(|bar| bar.date);

    match effective {
        None => Snapped {
            bars,
            resolution: StartResolution::NoPriorData,
        },
        Some(date) => {
            // partition_point : premier index dont la date est >= jour effectif
            let from = bars.partition_point(|bar| bar.date < date);
            let resolution = if date < requested {
                StartResolution::SnappedBack(date)
            } else {
                StartResolution::Exact(date)
            };
            Snapped {
                bars: &bars[from..],
                resolution,
            }
        }
    }
}

/// Colonne de prix à écrire
///
/// Sans colonne ajustée dans la série, on retombe silencieusement sur Close.
pub fn choose_column(series: &PriceSeries, use_adjusted: bool) -> PriceColumn {
    if use_adjusted && series.has_adjusted_close {
        PriceColumn::AdjustedClose
    } else {
        PriceColumn::Close
    }
}

/// Arrondi à 2 décimales (demi vers l'extérieur, comme f64::round)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convertit les lignes retenues en lignes de sortie
pub fn shape_records(bars: &[PriceBar], column: PriceColumn) -> Vec<OutputRecord> {
    bars.iter()
        .map(|bar| {
            let price = match column {
                PriceColumn::Close => bar.close,
                // Ligne isolée sans valeur ajustée : on garde la clôture brute
                PriceColumn::AdjustedClose => bar.adj_close.unwrap_or(bar.close),
            };
            OutputRecord {
                date: bar.date,
                price: round2(price),
                volume: bar.volume,
            }
        })
        .collect()
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

    fn series(dates: &[NaiveDate]) -> PriceSeries {
        let bars = dates
            .iter()
            .enumerate()
            .map(|(i, &d)| PriceBar::new(d, 100.0 + i as f64, 1000 + i as u64))
            .collect();
        PriceSeries::from_bars("2330.TW", false, bars)
    }

    #[test]
    fn test_snap_back_from_saturday_to_friday() {
        // 2024-01-06 est un samedi
        let s = series(&[date(2024, 1, 3), date(2024, 1, 4), date(2024, 1, 5), date(2024, 1, 8)]);
        let snapped = snap_to_trading_day(&s, date(2024, 1, 6));

        assert_eq!(snapped.resolution, StartResolution::SnappedBack(date(2024, 1, 5)));
        assert_eq!(snapped.bars.len(), 2);
        assert_eq!(snapped.bars[0].date, date(2024, 1, 5));
        assert_eq!(snapped.bars[1].date, date(2024, 1, 8));
        assert_eq!(
            snapped.resolution.notice().unwrap(),
            "(已自動回溯至前一交易日: 2024-01-05)"
        );
    }

    #[test]
    fn test_exact_trading_day_has_no_notice() {
        let s = series(&[date(2023, 12, 29), date(2024, 1, 2), date(2024, 1, 3)]);
        let snapped = snap_to_trading_day(&s, date(2024, 1, 2));

        assert_eq!(snapped.resolution, StartResolution::Exact(date(2024, 1, 2)));
        assert_eq!(snapped.bars.len(), 2);
        assert!(snapped.resolution.notice().is_none());
    }

    #[test]
    fn test_no_prior_data_keeps_whole_series() {
        let s = series(&[date(2024, 1, 8), date(2024, 1, 9)]);
        let snapped = snap_to_trading_day(&s, date(2024, 1, 6));

        assert_eq!(snapped.resolution, StartResolution::NoPriorData);
        assert_eq!(snapped.bars.len(), 2);
        assert!(snapped.resolution.notice().unwrap().contains("指定日期無資料"));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(123.456), 123.46);
        assert_eq!(round2(123.454), 123.45);
        assert_eq!(round2(590.0), 590.0);
    }

    #[test]
    fn test_adjusted_falls_back_to_close_without_column() {
        let s = series(&[date(2024, 1, 2)]);
        assert_eq!(choose_column(&s, true), PriceColumn::Close);
        assert_eq!(choose_column(&s, false), PriceColumn::Close);
    }

    #[test]
    fn test_adjusted_column_used_when_present() {
        let s = PriceSeries::from_bars(
            "2330.TW",
            true,
            vec![PriceBar::new(date(2024, 1, 2), 593.0, 10).with_adj_close(571.234)],
        );
        assert_eq!(choose_column(&s, true), PriceColumn::AdjustedClose);
        assert_eq!(choose_column(&s, false), PriceColumn::Close);

        let records = shape_records(s.bars(), PriceColumn::AdjustedClose);
        assert_eq!(records[0].price, 571.23);
    }

    #[test]
    fn test_shape_records_rounds_price() {
        let bars = vec![PriceBar::new(date(2024, 1, 2), 123.456, 42)];
        let records = shape_records(&bars, PriceColumn::Close);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, 123.46);
        assert_eq!(records[0].volume, 42);
        assert_eq!(records[0].to_fields()[1], "123.46");
    }
}
