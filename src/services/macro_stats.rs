use chrono::Duration;

use crate::models::{MacroPoint, MacroSnapshot, Series};

/// Percent change of the last value against the latest observation dated
/// at least `days` before it. `None` without such an observation or when
/// the reference value is zero.
pub fn change_over(series: &Series<MacroPoint>, days: i64) -> Option<f64> {
    let last = series.last()?;
    let cutoff = last.date - Duration::days(days);

    let reference = series.iter().rev().find(|p| p.date <= cutoff)?;
    if reference.value == 0.0 {
        return None;
    }

    let change = (last.value - reference.value) / reference.value.abs() * 100.0;
    change.is_finite().then_some(change)
}

/// Latest value with 30-day and 1-year variations; `None` for an empty series
pub fn macro_snapshot(id: &str, series: &Series<MacroPoint>) -> Option<MacroSnapshot> {
    let last = series.last()?;
    Some(MacroSnapshot {
        id: id.to_string(),
        last_value: last.value,
        last_date: last.date,
        change_30d_pct: change_over(series, 30),
        change_1y_pct: change_over(series, 365),
    })
}
