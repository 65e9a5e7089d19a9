// ---------------------------------------------------------------------------
// Feed row parsing
// ---------------------------------------------------------------------------
//
// Connectivity layers export bars as a JSON array whose rows are either
// objects or exchange kline arrays `[open_time_ms, open, high, low, close,
// volume, ...]`. Prices may be encoded as numbers or as numeric strings,
// timestamps as RFC 3339 strings or epoch milliseconds, and any field may be
// null or absent. Absent values stay `None` so the validator can report them.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};

use super::bar::RawBar;

/// Parse a JSON array of bar rows into raw rows.
///
/// Accepted shapes, freely mixed:
/// ```json
/// [ { "timestamp": "2024-01-01T00:00:00Z", "open": "1.0841", "high": 1.0850,
///     "low": 1.0832, "close": 1.0846, "volume": 1520 },
///   [1704067200000, "1.0846", "1.0858", "1.0840", "1.0851", "1733.5"] ]
/// ```
pub fn parse_bar_rows(text: &str) -> Result<Vec<RawBar>> {
    let root: serde_json::Value = serde_json::from_str(text).context("failed to parse bar JSON")?;

    let rows = root.as_array().context("bar JSON must be an array")?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| parse_row(row).with_context(|| format!("bad bar row {i}")))
        .collect()
}

/// Minimum elements of a kline row: open time, OHLC and volume.
const KLINE_FIELDS: usize = 6;

fn parse_row(row: &serde_json::Value) -> Result<RawBar> {
    if let Some(arr) = row.as_array() {
        return parse_kline(arr);
    }
    if !row.is_object() {
        bail!("bar row must be an object or a kline array");
    }

    let ts_field = if row.get("timestamp").is_some() {
        &row["timestamp"]
    } else {
        &row["time"]
    };

    Ok(RawBar {
        timestamp: parse_timestamp(ts_field)?,
        open: parse_optional_f64(&row["open"], "open")?,
        high: parse_optional_f64(&row["high"], "high")?,
        low: parse_optional_f64(&row["low"], "low")?,
        close: parse_optional_f64(&row["close"], "close")?,
        volume: parse_optional_f64(&row["volume"], "volume")?,
    })
}

fn parse_kline(arr: &[serde_json::Value]) -> Result<RawBar> {
    if arr.len() < KLINE_FIELDS {
        bail!(
            "kline row has {} elements, need at least {KLINE_FIELDS}",
            arr.len()
        );
    }

    Ok(RawBar {
        timestamp: parse_timestamp(&arr[0])?,
        open: parse_optional_f64(&arr[1], "open")?,
        high: parse_optional_f64(&arr[2], "high")?,
        low: parse_optional_f64(&arr[3], "low")?,
        close: parse_optional_f64(&arr[4], "close")?,
        volume: parse_optional_f64(&arr[5], "volume")?,
    })
}

fn parse_timestamp(val: &serde_json::Value) -> Result<Option<DateTime<Utc>>> {
    match val {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .with_context(|| format!("failed to parse timestamp: {s}")),
        serde_json::Value::Number(n) => {
            let millis = n.as_i64().context("timestamp is not an integer")?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(Some)
                .with_context(|| format!("timestamp out of range: {millis}"))
        }
        _ => bail!("timestamp has unexpected JSON type"),
    }
}

/// Numbers may arrive as JSON strings; null and absent fields map to `None`.
fn parse_optional_f64(val: &serde_json::Value, name: &str) -> Result<Option<f64>> {
    match val {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Some)
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => bail!("field {name} has unexpected JSON type"),
    }
}
