//! Per-instrument metrics and market breadth for price domains

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::constants::narrative::*;
use crate::constants::sentiment::*;
use crate::constants::VOLUME_OUTLIER_RATIO;
use crate::models::{CategoryStats, MarketSummary, MetricsSnapshot, PriceBar, Sentiment, Series, TopMovers};

/// Latest-day metrics for one instrument; `None` with fewer than two bars,
/// a zero prior close or a non-finite return.
pub fn compute_snapshot(id: &str, series: &Series<PriceBar>, window: usize) -> Option<MetricsSnapshot> {
    let bars = series.observations();
    if bars.len() < 2 {
        return None;
    }

    let last = &bars[bars.len() - 1];
    let prior = &bars[bars.len() - 2];
    if prior.close == 0.0 {
        return None;
    }

    let daily_return_pct = (last.close / prior.close - 1.0) * 100.0;
    if !daily_return_pct.is_finite() {
        return None;
    }

    let baseline_volume = volume_baseline(bars, window);
    let volume_ratio = baseline_volume
        .filter(|b| *b > 0.0)
        .map(|b| last.volume as f64 / b);

    Some(MetricsSnapshot {
        id: id.to_string(),
        last_date: last.date,
        last_close: last.close,
        prior_close: prior.close,
        daily_return_pct,
        last_volume: last.volume,
        baseline_volume,
        volume_ratio,
    })
}

/// Mean volume of the `window` bars before the last one (all of them when
/// the history is shorter)
fn volume_baseline(bars: &[PriceBar], window: usize) -> Option<f64> {
    let prior = &bars[..bars.len().saturating_sub(1)];
    let take = window.max(1).min(prior.len());
    if take == 0 {
        return None;
    }

    let sum: f64 = prior[prior.len() - take..].iter().map(|b| b.volume as f64).sum();
    Some(sum / take as f64)
}

/// Snapshots for a collection, in collection order
pub fn compute_snapshots<'a, I>(collection: I, window: usize) -> Vec<MetricsSnapshot>
where
    I: IntoIterator<Item = (&'a str, &'a Series<PriceBar>)>,
{
    collection
        .into_iter()
        .filter_map(|(id, series)| compute_snapshot(id, series, window))
        .collect()
}

/// Breadth and return statistics; `None` on empty input
pub fn summarize(snapshots: &[MetricsSnapshot]) -> Option<MarketSummary> {
    if snapshots.is_empty() {
        return None;
    }

    let returns: Vec<f64> = snapshots.iter().map(|s| s.daily_return_pct).collect();
    let advances = returns.iter().filter(|r| **r > 0.0).count();
    let declines = returns.iter().filter(|r| **r < 0.0).count();
    let unchanged = returns.len() - advances - declines;

    let ad_ratio = if declines == 0 {
        f64::INFINITY
    } else {
        advances as f64 / declines as f64
    };

    let mean_return = mean(&returns);
    let sentiment = classify_sentiment(ad_ratio, mean_return);

    Some(MarketSummary {
        total: returns.len(),
        advances,
        declines,
        unchanged,
        ad_ratio,
        mean_return,
        median_return: median(&returns),
        std_return: sample_std(&returns),
        sentiment,
    })
}

/// First matching bucket wins
pub fn classify_sentiment(ad_ratio: f64, mean_return: f64) -> Sentiment {
    if ad_ratio >= BROAD_BULL_RATIO && mean_return >= BROAD_BULL_MEAN {
        Sentiment::BroadBullish
    } else if ad_ratio >= MODERATE_BULL_RATIO && mean_return >= MODERATE_BULL_MEAN {
        Sentiment::ModerateBullish
    } else if ad_ratio <= BROAD_BEAR_RATIO && mean_return <= BROAD_BEAR_MEAN {
        Sentiment::BroadBearish
    } else if ad_ratio <= MODERATE_BEAR_RATIO && mean_return <= MODERATE_BEAR_MEAN {
        Sentiment::ModerateBearish
    } else {
        Sentiment::Mixed
    }
}

/// Per-category aggregates, best mean return first. Instruments without a
/// category are left out, as are categories with fewer than `min_count`
/// members.
pub fn category_breakdown(
    snapshots: &[MetricsSnapshot],
    categories: &HashMap<String, String>,
    min_count: usize,
) -> Vec<CategoryStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<f64>> = HashMap::new();

    for snapshot in snapshots {
        let Some(category) = categories.get(&snapshot.id) else {
            continue;
        };
        let entry = grouped.entry(category.as_str()).or_insert_with(|| {
            order.push(category.as_str());
            Vec::new()
        });
        entry.push(snapshot.daily_return_pct);
    }

    let mut stats: Vec<CategoryStats> = order
        .into_iter()
        .filter_map(|category| {
            let returns = grouped.get(category)?;
            if returns.len() < min_count {
                return None;
            }
            Some(CategoryStats {
                category: category.to_string(),
                count: returns.len(),
                advances: returns.iter().filter(|r| **r > 0.0).count(),
                declines: returns.iter().filter(|r| **r < 0.0).count(),
                mean_return: mean(returns),
            })
        })
        .collect();

    stats.sort_by(|a, b| b.mean_return.partial_cmp(&a.mean_return).unwrap_or(Ordering::Equal));
    stats
}

/// `n` best and `n` worst daily returns; ties keep collection order
pub fn top_movers(snapshots: &[MetricsSnapshot], n: usize) -> TopMovers {
    let mut gainers: Vec<MetricsSnapshot> = snapshots.to_vec();
    gainers.sort_by(|a, b| {
        b.daily_return_pct
            .partial_cmp(&a.daily_return_pct)
            .unwrap_or(Ordering::Equal)
    });
    gainers.truncate(n);

    let mut losers: Vec<MetricsSnapshot> = snapshots.to_vec();
    losers.sort_by(|a, b| {
        a.daily_return_pct
            .partial_cmp(&b.daily_return_pct)
            .unwrap_or(Ordering::Equal)
    });
    losers.truncate(n);

    TopMovers { gainers, losers }
}

/// Instruments whose last volume is at least `min_ratio` times their
/// baseline, highest ratio first, at most `n`. Instruments without a ratio
/// are skipped; ties keep collection order.
pub fn volume_outliers(snapshots: &[MetricsSnapshot], min_ratio: f64, n: usize) -> Vec<MetricsSnapshot> {
    let mut outliers: Vec<MetricsSnapshot> = snapshots
        .iter()
        .filter(|s| s.volume_ratio.is_some_and(|r| r >= min_ratio))
        .cloned()
        .collect();

    outliers.sort_by(|a, b| {
        let ra = a.volume_ratio.unwrap_or(0.0);
        let rb = b.volume_ratio.unwrap_or(0.0);
        rb.partial_cmp(&ra).unwrap_or(Ordering::Equal)
    });
    outliers.truncate(n);
    outliers
}

/// One-paragraph Spanish summary of the session.
///
/// `categories` is expected best mean first, as `category_breakdown`
/// returns it; `outliers` is the number of volume outliers.
pub fn executive_summary(
    panel: &str,
    summary: &MarketSummary,
    movers: &TopMovers,
    categories: &[CategoryStats],
    outliers: usize,
) -> String {
    let ratio = if summary.ad_ratio.is_finite() {
        format!("{:.2}", summary.ad_ratio)
    } else {
        "∞".to_string()
    };

    let mut text = format!(
        "{}: {} instrumentos analizados, {} alcistas / {} bajistas (ratio A/D {}), cambio promedio {:+.2}%.",
        panel, summary.total, summary.advances, summary.declines, ratio, summary.mean_return
    );

    text.push_str(if summary.ad_ratio >= POSITIVE_BREADTH_RATIO {
        " La amplitud es positiva: el avance es de base amplia y no se concentra en pocos nombres."
    } else if summary.ad_ratio <= NEGATIVE_BREADTH_RATIO {
        " La amplitud es negativa: la mayoría de los instrumentos cedió terreno, un deterioro generalizado."
    } else {
        " La amplitud es mixta: sin una dirección dominante, lo que suele indicar rotación o falta de catalizadores."
    });

    if let Some(best) = movers.gainers.first() {
        text.push_str(&format!(
            " Mayor ganador: {} ({:+.2}%).",
            best.id, best.daily_return_pct
        ));
    }
    if let Some(worst) = movers.losers.first() {
        text.push_str(&format!(
            " Mayor perdedor: {} ({:+.2}%).",
            worst.id, worst.daily_return_pct
        ));
    }

    if let (Some(leading), Some(lagging)) = (categories.first(), categories.last()) {
        text.push_str(&format!(
            " Mejor categoría: {} ({:+.2}%); peor categoría: {} ({:+.2}%).",
            leading.category, leading.mean_return, lagging.category, lagging.mean_return
        ));
    }

    if let Some(std) = summary.std_return {
        let spread = if std > HIGH_DISPERSION_STD {
            "elevada, con alta selectividad entre instrumentos"
        } else {
            "moderada, con movimientos relativamente homogéneos"
        };
        text.push_str(&format!(" La dispersión (desvío {:.2}%) es {}.", std, spread));
    }

    if outliers > 0 {
        text.push_str(&format!(
            " {} instrumentos operaron con volumen de al menos {:.0}x su promedio.",
            outliers, VOLUME_OUTLIER_RATIO
        ));
    }

    text
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn series(closes: &[f64], volumes: &[u64]) -> Series<PriceBar> {
        Series::from_unsorted(
            closes
                .iter()
                .zip(volumes)
                .enumerate()
                .map(|(i, (c, v))| PriceBar::new(day(i as u32 + 1), *c, *c, *c, *c, *v))
                .collect(),
        )
    }

    fn snapshot(id: &str, ret: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            id: id.to_string(),
            last_date: day(2),
            last_close: 100.0 + ret,
            prior_close: 100.0,
            daily_return_pct: ret,
            last_volume: 0,
            baseline_volume: None,
            volume_ratio: None,
        }
    }

    #[test]
    fn test_daily_return() {
        let s = series(&[100.0, 105.0], &[1_000, 3_000]);
        let snap = compute_snapshot("GGAL", &s, 20).unwrap();

        assert!((snap.daily_return_pct - 5.0).abs() < 1e-9);
        assert_eq!(snap.baseline_volume, Some(1_000.0));
        assert_eq!(snap.volume_ratio, Some(3.0));
        assert_eq!(snap.last_date, day(2));
    }

    #[test]
    fn test_single_observation_excluded() {
        let s = series(&[100.0], &[1_000]);
        assert!(compute_snapshot("GGAL", &s, 20).is_none());

        let two = series(&[100.0, 101.0], &[1, 1]);
        let snaps = compute_snapshots(vec![("A", &s), ("B", &two)], 20);
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].id, "B");
    }

    #[test]
    fn test_zero_prior_close_excluded() {
        let s = series(&[0.0, 5.0], &[1, 1]);
        assert!(compute_snapshot("X", &s, 20).is_none());
    }

    #[test]
    fn test_volume_baseline_window() {
        // 25 bars: volumes 1..=25; baseline = mean of 5..=24 with a window of 20
        let closes: Vec<f64> = (1..=25).map(|c| c as f64).collect();
        let volumes: Vec<u64> = (1..=25).collect();
        let snap = compute_snapshot("X", &series(&closes, &volumes), 20).unwrap();

        assert_eq!(snap.baseline_volume, Some(14.5));
        assert_eq!(snap.last_volume, 25);

        // short history uses all prior bars
        let short = compute_snapshot("X", &series(&[1.0, 2.0, 3.0], &[2, 4, 9]), 20).unwrap();
        assert_eq!(short.baseline_volume, Some(3.0));
        assert_eq!(short.volume_ratio, Some(3.0));
    }

    #[test]
    fn test_zero_baseline_has_no_ratio() {
        let snap = compute_snapshot("X", &series(&[1.0, 2.0], &[0, 500]), 20).unwrap();
        assert_eq!(snap.baseline_volume, Some(0.0));
        assert_eq!(snap.volume_ratio, None);
    }

    #[test]
    fn test_summarize_no_declines() {
        let snaps: Vec<MetricsSnapshot> = (0..10).map(|i| snapshot(&format!("T{}", i), 1.0)).collect();
        let summary = summarize(&snaps).unwrap();

        assert_eq!(summary.advances, 10);
        assert_eq!(summary.declines, 0);
        assert!(summary.ad_ratio.is_infinite());
        assert_eq!(summary.sentiment, Sentiment::BroadBullish);
        assert_eq!(summary.std_return, Some(0.0));
    }

    #[test]
    fn test_summarize_statistics() {
        let snaps = vec![
            snapshot("A", 2.0),
            snapshot("B", -1.0),
            snapshot("C", 0.0),
            snapshot("D", 3.0),
        ];
        let summary = summarize(&snaps).unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.advances, 2);
        assert_eq!(summary.declines, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.ad_ratio, 2.0);
        assert_eq!(summary.mean_return, 1.0);
        assert_eq!(summary.median_return, 1.0);
        // sample variance: (1 + 4 + 1 + 4) / 3
        assert!((summary.std_return.unwrap() - (10.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(summary.sentiment, Sentiment::BroadBullish);
    }

    #[test]
    fn test_summarize_empty_and_single() {
        assert!(summarize(&[]).is_none());

        let summary = summarize(&[snapshot("A", -2.0)]).unwrap();
        assert_eq!(summary.std_return, None);
        assert_eq!(summary.ad_ratio, 0.0);
        assert_eq!(summary.sentiment, Sentiment::BroadBearish);
    }

    #[test]
    fn test_sentiment_priority() {
        assert_eq!(classify_sentiment(2.0, 0.5), Sentiment::BroadBullish);
        assert_eq!(classify_sentiment(2.5, 0.1), Sentiment::ModerateBullish);
        assert_eq!(classify_sentiment(1.2, 0.0), Sentiment::ModerateBullish);
        assert_eq!(classify_sentiment(0.5, -0.5), Sentiment::BroadBearish);
        assert_eq!(classify_sentiment(0.5, -0.1), Sentiment::ModerateBearish);
        assert_eq!(classify_sentiment(0.8, 0.0), Sentiment::ModerateBearish);
        assert_eq!(classify_sentiment(1.0, 0.0), Sentiment::Mixed);
        assert_eq!(classify_sentiment(1.5, -0.2), Sentiment::Mixed);
        assert_eq!(classify_sentiment(f64::INFINITY, -1.0), Sentiment::Mixed);
    }

    #[test]
    fn test_category_breakdown() {
        let snaps = vec![
            snapshot("GD30", 1.0),
            snapshot("GD35", 2.0),
            snapshot("GD41", 3.0),
            snapshot("AL30", -1.0),
            snapshot("AL35", -2.0),
            snapshot("AE38", 0.0),
            snapshot("BPY26", 5.0),
            snapshot("NOCAT", 9.0),
        ];
        let categories: HashMap<String, String> = [
            ("GD30", "Global"),
            ("GD35", "Global"),
            ("GD41", "Global"),
            ("AL30", "Soberano"),
            ("AL35", "Soberano"),
            ("AE38", "Soberano"),
            ("BPY26", "Otros"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let stats = category_breakdown(&snaps, &categories, 3);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].category, "Global");
        assert_eq!(stats[0].mean_return, 2.0);
        assert_eq!(stats[0].advances, 3);
        assert_eq!(stats[1].category, "Soberano");
        assert_eq!(stats[1].declines, 2);
        assert_eq!(stats[1].count, 3);
    }

    #[test]
    fn test_top_movers_stable() {
        let snaps = vec![
            snapshot("A", 1.0),
            snapshot("B", 3.0),
            snapshot("C", 1.0),
            snapshot("D", -2.0),
        ];
        let movers = top_movers(&snaps, 3);

        let gainers: Vec<&str> = movers.gainers.iter().map(|s| s.id.as_str()).collect();
        let losers: Vec<&str> = movers.losers.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(gainers, vec!["B", "A", "C"]);
        assert_eq!(losers, vec!["D", "A", "C"]);
    }

    fn with_ratio(id: &str, ratio: Option<f64>) -> MetricsSnapshot {
        MetricsSnapshot {
            volume_ratio: ratio,
            ..snapshot(id, 1.0)
        }
    }

    #[test]
    fn test_volume_outliers() {
        let snaps = vec![
            with_ratio("A", Some(1.9)),
            with_ratio("B", Some(3.5)),
            with_ratio("C", None),
            with_ratio("D", Some(2.0)),
            with_ratio("E", Some(3.5)),
            with_ratio("F", Some(2.4)),
        ];

        let ids = |v: Vec<MetricsSnapshot>| v.into_iter().map(|s| s.id).collect::<Vec<_>>();
        assert_eq!(ids(volume_outliers(&snaps, 2.0, 10)), vec!["B", "E", "F", "D"]);
        assert_eq!(ids(volume_outliers(&snaps, 2.0, 2)), vec!["B", "E"]);
        assert!(volume_outliers(&snaps, 5.0, 10).is_empty());
    }

    #[test]
    fn test_executive_summary() {
        let snaps = vec![snapshot("GGAL", 4.0), snapshot("YPFD", -1.5), snapshot("PAMP", 0.5)];
        let summary = summarize(&snaps).unwrap();
        let text = executive_summary("Panel de acciones", &summary, &top_movers(&snaps, 10), &[], 0);

        assert!(text.starts_with("Panel de acciones: 3 instrumentos analizados, 2 alcistas / 1 bajistas (ratio A/D 2.00)"));
        assert!(text.contains("cambio promedio +1.00%"));
        assert!(text.contains("La amplitud es positiva"));
        assert!(text.contains("Mayor ganador: GGAL (+4.00%)"));
        assert!(text.contains("Mayor perdedor: YPFD (-1.50%)"));
        // std of [4, -1.5, 0.5] is about 2.78
        assert!(text.contains("es elevada"));
        assert!(!text.contains("categoría"));
        assert!(!text.contains("volumen"));
    }

    #[test]
    fn test_executive_summary_categories_and_outliers() {
        let snaps = vec![
            snapshot("A", -0.2),
            snapshot("B", -0.4),
            snapshot("C", 0.3),
            snapshot("D", -0.1),
        ];
        let summary = summarize(&snaps).unwrap();
        let categories = vec![
            CategoryStats {
                category: "Energía".to_string(),
                count: 3,
                advances: 2,
                declines: 1,
                mean_return: 0.8,
            },
            CategoryStats {
                category: "Bancos".to_string(),
                count: 4,
                advances: 0,
                declines: 4,
                mean_return: -1.25,
            },
        ];

        let text = executive_summary("Bonos", &summary, &top_movers(&snaps, 10), &categories, 2);

        // 1 advance / 3 declines
        assert!(text.contains("La amplitud es negativa"));
        assert!(text.contains("Mejor categoría: Energía (+0.80%); peor categoría: Bancos (-1.25%)."));
        assert!(text.contains("es moderada"));
        assert!(text.contains("2 instrumentos operaron con volumen de al menos 2x su promedio."));

        let mixed = summarize(&[snapshot("A", 1.0), snapshot("B", -1.0)]).unwrap();
        let text = executive_summary("Mixto", &mixed, &TopMovers::default(), &[], 0);
        assert!(text.contains("La amplitud es mixta"));
    }
}
