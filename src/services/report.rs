//! Dashboard export
//!
//! Every domain produces `{output_dir}/{domain}/data.json` (compact JSON) and
//! `{output_dir}/{domain}/index.html` (the same JSON embedded in a static
//! page; charts are drawn client-side).
//!
//! Rounding happens here and only here: prices, percentages and ratios to
//! 2 decimals, macro values to 4, volumes and counts as integers.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{MIN_CATEGORY_SIZE, VOLUME_OUTLIER_RATIO};
use crate::error::Error;
use crate::models::{
    CategoryStats, Domain, Instrument, InstrumentCatalog, MacroPoint, MarketSummary, MetricsSnapshot, PriceBar,
    Series,
};
use crate::services::macro_stats::macro_snapshot;
use crate::services::market_stats::{
    category_breakdown, compute_snapshot, executive_summary, summarize, top_movers, volume_outliers,
};
use crate::utils::{format_day, round_to};

const CHART_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";

fn r2(value: f64) -> f64 {
    round_to(value, 2)
}

fn r4(value: f64) -> f64 {
    round_to(value, 4)
}

/// Serialize a ratio, writing `"Infinity"` for an infinite value
fn serialize_ratio<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        serializer.serialize_f64(r2(*value))
    }
}

/// Report timestamp in the reference timezone
pub fn generated_at(now: DateTime<Utc>, timezone: Tz) -> String {
    now.with_timezone(&timezone).format("%Y-%m-%d %H:%M").to_string()
}

// ---------------------------------------------------------------------------
// Price domains
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SummaryExport {
    pub total: usize,
    pub advances: usize,
    pub declines: usize,
    pub unchanged: usize,
    #[serde(serialize_with = "serialize_ratio")]
    pub ad_ratio: f64,
    pub avg_change: f64,
    pub median_change: f64,
    pub std_change: Option<f64>,
    pub sentiment: String,
    pub sentiment_color: String,
    pub executive_summary: String,
}

impl SummaryExport {
    fn new(summary: &MarketSummary, text: String) -> Self {
        Self {
            total: summary.total,
            advances: summary.advances,
            declines: summary.declines,
            unchanged: summary.unchanged,
            ad_ratio: summary.ad_ratio,
            avg_change: r2(summary.mean_return),
            median_change: r2(summary.median_return),
            std_change: summary.std_return.map(r2),
            sentiment: summary.sentiment.label().to_string(),
            sentiment_color: summary.sentiment.color().to_string(),
            executive_summary: text,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoverExport {
    pub ticker: String,
    pub close_last: f64,
    pub daily_ret: f64,
}

impl From<&MetricsSnapshot> for MoverExport {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        Self {
            ticker: snapshot.id.clone(),
            close_last: r2(snapshot.last_close),
            daily_ret: r2(snapshot.daily_return_pct),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OutlierExport {
    pub ticker: String,
    pub daily_ret: f64,
    pub volume_last: u64,
    pub vol_avg: Option<u64>,
    pub vol_rel: f64,
}

impl From<&MetricsSnapshot> for OutlierExport {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        Self {
            ticker: snapshot.id.clone(),
            daily_ret: r2(snapshot.daily_return_pct),
            volume_last: snapshot.last_volume,
            vol_avg: snapshot.baseline_volume.map(|v| v.round() as u64),
            vol_rel: snapshot.volume_ratio.map(r2).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryExport {
    pub category: String,
    pub count: usize,
    pub advances: usize,
    pub declines: usize,
    pub avg_change: f64,
}

impl From<&CategoryStats> for CategoryExport {
    fn from(stats: &CategoryStats) -> Self {
        Self {
            category: stats.category.clone(),
            count: stats.count,
            advances: stats.advances,
            declines: stats.declines,
            avg_change: r2(stats.mean_return),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryRow {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl From<&PriceBar> for HistoryRow {
    fn from(bar: &PriceBar) -> Self {
        Self {
            date: format_day(bar.date),
            open: r2(bar.open),
            high: r2(bar.high),
            low: r2(bar.low),
            close: r2(bar.close),
            volume: bar.volume,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TickerExport {
    pub ticker: String,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub last_date: String,
    pub close_last: f64,
    pub daily_ret: f64,
    pub volume_last: u64,
    pub vol_avg: Option<u64>,
    /// Last volume over the baseline of the configured window
    pub vol_rel: Option<f64>,
    pub history: Vec<HistoryRow>,
}

#[derive(Debug, Serialize)]
pub struct MarketExport {
    pub generated_at: String,
    pub title: String,
    pub market_summary: SummaryExport,
    pub top_gainers: Vec<MoverExport>,
    pub top_losers: Vec<MoverExport>,
    pub categories: Vec<CategoryExport>,
    pub volume_outliers: Vec<OutlierExport>,
    pub tickers: Vec<TickerExport>,
}

/// Metrics and export for a price domain; `None` when no instrument has
/// enough history for a snapshot
pub fn build_market_export(
    catalog: &InstrumentCatalog,
    collection: &[(Instrument, Series<PriceBar>)],
    window: usize,
    top_n: usize,
    generated_at: String,
) -> Option<MarketExport> {
    let mut snapshots = Vec::with_capacity(collection.len());
    let mut tickers = Vec::with_capacity(collection.len());

    for (instrument, series) in collection {
        let Some(snapshot) = compute_snapshot(&instrument.id, series, window) else {
            continue;
        };

        tickers.push(TickerExport {
            ticker: instrument.id.clone(),
            name: instrument.display_name().to_string(),
            category: instrument.category_or_default().to_string(),
            color: instrument.color.clone(),
            last_date: format_day(snapshot.last_date),
            close_last: r2(snapshot.last_close),
            daily_ret: r2(snapshot.daily_return_pct),
            volume_last: snapshot.last_volume,
            vol_avg: snapshot.baseline_volume.map(|v| v.round() as u64),
            vol_rel: snapshot.volume_ratio.map(r2),
            history: series.iter().map(HistoryRow::from).collect(),
        });
        snapshots.push(snapshot);
    }

    let summary = summarize(&snapshots)?;
    let movers = top_movers(&snapshots, top_n);
    let categories = category_breakdown(&snapshots, &catalog.categories(), MIN_CATEGORY_SIZE);
    let outliers = volume_outliers(&snapshots, VOLUME_OUTLIER_RATIO, top_n);
    let text = executive_summary(&catalog.title, &summary, &movers, &categories, outliers.len());

    Some(MarketExport {
        generated_at,
        title: catalog.title.clone(),
        market_summary: SummaryExport::new(&summary, text),
        top_gainers: movers.gainers.iter().map(MoverExport::from).collect(),
        top_losers: movers.losers.iter().map(MoverExport::from).collect(),
        categories: categories.iter().map(CategoryExport::from).collect(),
        volume_outliers: outliers.iter().map(OutlierExport::from).collect(),
        tickers,
    })
}

// ---------------------------------------------------------------------------
// Macro domain
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct VariableExport {
    pub name: String,
    pub unit: String,
    pub group: String,
    pub color: String,
    pub dates: Vec<String>,
    pub values: Vec<f64>,
    pub last: f64,
    pub last_date: String,
    pub var_30d: Option<f64>,
    pub var_1y: Option<f64>,
}

/// Variables keyed by id, serialized in catalog order
#[derive(Debug, Default)]
pub struct OrderedVariables(pub Vec<(String, VariableExport)>);

impl Serialize for OrderedVariables {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, variable) in &self.0 {
            map.serialize_entry(id, variable)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct MacroExport {
    pub generated_at: String,
    pub title: String,
    pub kpi_ids: Vec<String>,
    pub variables: OrderedVariables,
}

/// Export for the macro domain; `None` when no variable has data
pub fn build_macro_export(
    catalog: &InstrumentCatalog,
    collection: &[(Instrument, Series<MacroPoint>)],
    generated_at: String,
) -> Option<MacroExport> {
    let mut variables = Vec::with_capacity(collection.len());

    for (instrument, series) in collection {
        let Some(snapshot) = macro_snapshot(&instrument.id, series) else {
            continue;
        };

        variables.push((
            instrument.id.clone(),
            VariableExport {
                name: instrument.display_name().to_string(),
                unit: instrument.unit.clone().unwrap_or_default(),
                group: instrument.category_or_default().to_string(),
                color: instrument.color.clone().unwrap_or_else(|| "#60a5fa".to_string()),
                dates: series.iter().map(|p| format_day(p.date)).collect(),
                values: series.iter().map(|p| r4(p.value)).collect(),
                last: r4(snapshot.last_value),
                last_date: format_day(snapshot.last_date),
                var_30d: snapshot.change_30d_pct.map(r2),
                var_1y: snapshot.change_1y_pct.map(r2),
            },
        ));
    }

    if variables.is_empty() {
        return None;
    }

    let kpi_ids = catalog
        .kpi_ids
        .iter()
        .filter(|id| variables.iter().any(|(v, _)| v == *id))
        .cloned()
        .collect();

    Some(MacroExport {
        generated_at,
        title: catalog.title.clone(),
        kpi_ids,
        variables: OrderedVariables(variables),
    })
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON that is safe inside a `<script>` element
fn embeddable_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn fmt_opt(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{:+.2}{}", v, suffix),
        None => "–".to_string(),
    }
}

fn ret_class(value: f64) -> &'static str {
    if value > 0.0 {
        "up"
    } else if value < 0.0 {
        "down"
    } else {
        "flat"
    }
}

const STYLE: &str = r#"
body{font-family:system-ui,sans-serif;background:#0f172a;color:#e2e8f0;margin:0;padding:24px}
h1{margin:0 0 4px}small{color:#94a3b8}
.badge{display:inline-block;padding:4px 10px;border-radius:999px;color:#0f172a;font-weight:600}
.cards{display:flex;flex-wrap:wrap;gap:12px;margin:16px 0}
.card{background:#1e293b;border-radius:8px;padding:12px 16px;min-width:140px}
.card b{display:block;font-size:1.4em}
table{border-collapse:collapse;width:100%;margin-top:16px}
th,td{padding:6px 8px;border-bottom:1px solid #334155;text-align:right}
th:first-child,td:first-child,td.l{text-align:left}
tr{cursor:pointer}.up{color:#22c55e}.down{color:#ef4444}.flat{color:#94a3b8}
#chart-box{background:#1e293b;border-radius:8px;padding:12px;height:320px}
"#;

/// Static dashboard for a price domain
pub fn render_market_html(export: &MarketExport, json: &str) -> String {
    let summary = &export.market_summary;
    let ratio = if summary.ad_ratio.is_finite() {
        format!("{:.2}", summary.ad_ratio)
    } else {
        "∞".to_string()
    };

    let mut rows = String::new();
    for t in &export.tickers {
        rows.push_str(&format!(
            "<tr data-id=\"{id}\"><td>{id}</td><td class=\"l\">{cat}</td><td>{close:.2}</td><td class=\"{cls}\">{ret:+.2}%</td><td>{vol}</td><td>{rel}</td></tr>\n",
            id = escape_html(&t.ticker),
            cat = escape_html(&t.category),
            close = t.close_last,
            cls = ret_class(t.daily_ret),
            ret = t.daily_ret,
            vol = t.volume_last,
            rel = t.vol_rel.map(|v| format!("{:.2}x", v)).unwrap_or_else(|| "–".to_string()),
        ));
    }

    let mut categories = String::new();
    for c in &export.categories {
        categories.push_str(&format!(
            "<div class=\"card\">{name}<b class=\"{cls}\">{avg:+.2}%</b><small>{adv}↑ {dec}↓ de {count}</small></div>\n",
            name = escape_html(&c.category),
            cls = ret_class(c.avg_change),
            avg = c.avg_change,
            adv = c.advances,
            dec = c.declines,
            count = c.count,
        ));
    }

    let mut outliers = String::new();
    for o in &export.volume_outliers {
        outliers.push_str(&format!(
            "<div class=\"card\">{id}<b>{rel:.2}x</b><small class=\"{cls}\">{ret:+.2}%</small></div>\n",
            id = escape_html(&o.ticker),
            rel = o.vol_rel,
            cls = ret_class(o.daily_ret),
            ret = o.daily_ret,
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
<style>{style}</style>
</head>
<body>
<h1>{title}</h1>
<small>Actualizado: {generated}</small>
<p><span class="badge" style="background:{color}">{sentiment}</span></p>
<p>{text}</p>
<div class="cards">
<div class="card">Alcistas<b class="up">{adv}</b></div>
<div class="card">Bajistas<b class="down">{dec}</b></div>
<div class="card">Sin cambio<b class="flat">{unch}</b></div>
<div class="card">Ratio A/D<b>{ratio}</b></div>
<div class="card">Cambio promedio<b class="{avg_cls}">{avg:+.2}%</b></div>
<div class="card">Mediana<b>{median:+.2}%</b></div>
<div class="card">Desvío<b>{std}</b></div>
</div>
<div class="cards">
{categories}</div>
<div class="cards">
{outliers}</div>
<div id="chart-box"><canvas id="chart"></canvas></div>
<table>
<thead><tr><th>Ticker</th><th>Categoría</th><th>Cierre</th><th>Var. diaria</th><th>Volumen</th><th>Vol. rel.</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<script id="data" type="application/json">{json}</script>
<script>
const DATA = JSON.parse(document.getElementById('data').textContent);
let chart = null;
function show(id) {{
  const t = DATA.tickers.find(x => x.ticker === id);
  if (!t || typeof Chart === 'undefined') return;
  if (chart) chart.destroy();
  chart = new Chart(document.getElementById('chart'), {{
    type: 'line',
    data: {{ labels: t.history.map(h => h.date),
             datasets: [{{ label: t.ticker, data: t.history.map(h => h.close),
                           borderColor: t.color || '#60a5fa', pointRadius: 0 }}] }},
    options: {{ maintainAspectRatio: false }}
  }});
}}
document.querySelectorAll('tr[data-id]').forEach(r => r.addEventListener('click', () => show(r.dataset.id)));
if (DATA.top_gainers.length) show(DATA.top_gainers[0].ticker);
</script>
</body>
</html>
"#,
        title = escape_html(&export.title),
        cdn = CHART_JS_CDN,
        style = STYLE,
        generated = escape_html(&export.generated_at),
        color = summary.sentiment_color,
        sentiment = escape_html(&summary.sentiment),
        text = escape_html(&summary.executive_summary),
        adv = summary.advances,
        dec = summary.declines,
        unch = summary.unchanged,
        ratio = ratio,
        avg_cls = ret_class(summary.avg_change),
        avg = summary.avg_change,
        median = summary.median_change,
        std = summary.std_change.map(|s| format!("{:.2}", s)).unwrap_or_else(|| "–".to_string()),
        categories = categories,
        outliers = outliers,
        rows = rows,
        json = embeddable_json(json),
    )
}

/// Static dashboard for the macro domain
pub fn render_macro_html(export: &MacroExport, json: &str) -> String {
    let mut kpis = String::new();
    for id in &export.kpi_ids {
        if let Some((_, v)) = export.variables.0.iter().find(|(vid, _)| vid == id) {
            kpis.push_str(&format!(
                "<div class=\"card\" style=\"border-top:3px solid {color}\">{name}<b>{last}</b><small>{unit} · {date} · 30d {v30}</small></div>\n",
                color = escape_html(&v.color),
                name = escape_html(&v.name),
                last = v.last,
                unit = escape_html(&v.unit),
                date = v.last_date,
                v30 = fmt_opt(v.var_30d, "%"),
            ));
        }
    }

    let mut rows = String::new();
    for (id, v) in &export.variables.0 {
        rows.push_str(&format!(
            "<tr data-id=\"{id}\"><td>{name}</td><td class=\"l\">{group}</td><td>{last}</td><td class=\"l\">{unit}</td><td>{date}</td><td>{v30}</td><td>{v1y}</td></tr>\n",
            id = escape_html(id),
            name = escape_html(&v.name),
            group = escape_html(&v.group),
            last = v.last,
            unit = escape_html(&v.unit),
            date = v.last_date,
            v30 = fmt_opt(v.var_30d, "%"),
            v1y = fmt_opt(v.var_1y, "%"),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
<style>{style}</style>
</head>
<body>
<h1>{title}</h1>
<small>Actualizado: {generated}</small>
<div class="cards">
{kpis}</div>
<div id="chart-box"><canvas id="chart"></canvas></div>
<table>
<thead><tr><th>Variable</th><th>Grupo</th><th>Último</th><th>Unidad</th><th>Fecha</th><th>Var. 30d</th><th>Var. 1a</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<script id="data" type="application/json">{json}</script>
<script>
const DATA = JSON.parse(document.getElementById('data').textContent);
let chart = null;
function show(id) {{
  const v = DATA.variables[id];
  if (!v || typeof Chart === 'undefined') return;
  if (chart) chart.destroy();
  chart = new Chart(document.getElementById('chart'), {{
    type: 'line',
    data: {{ labels: v.dates, datasets: [{{ label: v.name, data: v.values, borderColor: v.color, pointRadius: 0 }}] }},
    options: {{ maintainAspectRatio: false }}
  }});
}}
document.querySelectorAll('tr[data-id]').forEach(r => r.addEventListener('click', () => show(r.dataset.id)));
const first = DATA.kpi_ids[0] || Object.keys(DATA.variables)[0];
if (first) show(first);
</script>
</body>
</html>
"#,
        title = escape_html(&export.title),
        cdn = CHART_JS_CDN,
        style = STYLE,
        generated = escape_html(&export.generated_at),
        kpis = kpis,
        rows = rows,
        json = embeddable_json(json),
    )
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Write `data.json` and `index.html` for a domain, returning the directory
pub fn write_report(output_dir: &Path, domain: Domain, json: &str, html: &str) -> Result<PathBuf, Error> {
    let dir = domain.dir_in(output_dir);
    fs::create_dir_all(&dir)
        .map_err(|e| Error::Io(format!("Failed to create {}: {}", dir.display(), e)))?;

    fs::write(dir.join("data.json"), json)
        .map_err(|e| Error::Io(format!("Failed to write data.json in {}: {}", dir.display(), e)))?;
    fs::write(dir.join("index.html"), html)
        .map_err(|e| Error::Io(format!("Failed to write index.html in {}: {}", dir.display(), e)))?;

    Ok(dir)
}

/// Build, serialize and write a price-domain report. `Ok(None)` when there
/// was nothing to report.
pub fn emit_market_report(
    output_dir: &Path,
    domain: Domain,
    catalog: &InstrumentCatalog,
    collection: &[(Instrument, Series<PriceBar>)],
    window: usize,
    top_n: usize,
    generated_at: String,
) -> Result<Option<(PathBuf, MarketExport)>, Error> {
    let Some(export) = build_market_export(catalog, collection, window, top_n, generated_at) else {
        return Ok(None);
    };

    let json = serde_json::to_string(&export)?;
    let html = render_market_html(&export, &json);
    let dir = write_report(output_dir, domain, &json, &html)?;
    Ok(Some((dir, export)))
}

/// Build, serialize and write the macro report. `Ok(None)` when there was
/// nothing to report.
pub fn emit_macro_report(
    output_dir: &Path,
    catalog: &InstrumentCatalog,
    collection: &[(Instrument, Series<MacroPoint>)],
    generated_at: String,
) -> Result<Option<(PathBuf, MacroExport)>, Error> {
    let Some(export) = build_macro_export(catalog, collection, generated_at) else {
        return Ok(None);
    };

    let json = serde_json::to_string(&export)?;
    let html = render_macro_html(&export, &json);
    let dir = write_report(output_dir, Domain::Macro, &json, &html)?;
    Ok(Some((dir, export)))
}

/// Last date covered by any series of a collection
pub fn latest_day<T: crate::models::Dated>(collection: &[(Instrument, Series<T>)]) -> Option<NaiveDate> {
    collection.iter().filter_map(|(_, s)| s.latest_date()).max()
}
