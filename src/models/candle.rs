use crate::constants::CANDLE_ARRAY_KEY;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One chart candle as used by the indicator computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Closing price
    pub close: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Trading volume
    pub volume: f64,
}

impl Candle {
    pub fn new(close: f64, high: f64, low: f64, volume: f64) -> Self {
        Self {
            close,
            high,
            low,
            volume,
        }
    }
}

/// Chronological candle sequence, oldest first
pub type CandleSeries = Vec<Candle>;

/// Field names tried, in order, for each candle value
const CLOSE_KEYS: &[&str] = &["cur_prc", "close"];
const HIGH_KEYS: &[&str] = &["high_pric", "high"];
const LOW_KEYS: &[&str] = &["low_pric", "low"];
const VOLUME_KEYS: &[&str] = &["trde_qty", "volume"];
const DATE_KEYS: &[&str] = &["dt", "date"];

/// Parse a numeric field that may arrive as a JSON number or as text
///
/// Text may carry thousands separators and a leading `+`/`-` direction marker
/// (the chart feed signs prices by daily direction). The sign never carries
/// magnitude, so the absolute value is returned for numbers and text alike.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().map(f64::abs),
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            let unsigned = cleaned.trim_start_matches(['+', '-']);
            if unsigned.is_empty() {
                return None;
            }
            unsigned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| record.get(*k))
}

fn numeric_field(record: &Value, keys: &[&str], index: usize) -> Result<f64, Error> {
    let raw = field(record, keys).ok_or_else(|| {
        Error::Parse(format!("Candle {} missing '{}' field", index, keys[0]))
    })?;
    parse_number(raw).ok_or_else(|| {
        Error::Parse(format!(
            "Candle {} has non-numeric '{}' field: {}",
            index, keys[0], raw
        ))
    })
}

/// Extract a chronological candle series from a chart service response
///
/// The array lives under [`CANDLE_ARRAY_KEY`]; a bare top-level array is also
/// accepted. When every row carries a date the series is sorted by it,
/// otherwise the upstream order is kept as-is.
pub fn parse_candle_series(body: &Value) -> Result<CandleSeries, Error> {
    let rows = body
        .get(CANDLE_ARRAY_KEY)
        .or(Some(body))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Parse(format!("Missing '{}' candle array", CANDLE_ARRAY_KEY)))?;

    let mut dated: Vec<(Option<String>, Candle)> = Vec::with_capacity(rows.len());
    for (index, record) in rows.iter().enumerate() {
        let candle = Candle {
            close: numeric_field(record, CLOSE_KEYS, index)?,
            high: numeric_field(record, HIGH_KEYS, index)?,
            low: numeric_field(record, LOW_KEYS, index)?,
            volume: numeric_field(record, VOLUME_KEYS, index)?,
        };
        let date = field(record, DATE_KEYS).and_then(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        dated.push((date, candle));
    }

    if !dated.is_empty() && dated.iter().all(|(date, _)| date.is_some()) {
        // Stable sort keeps upstream order for equal dates
        dated.sort_by(|a, b| a.0.cmp(&b.0));
    }

    Ok(dated.into_iter().map(|(_, candle)| candle).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number(&json!(70100)), Some(70100.0));
        assert_eq!(parse_number(&json!("70100")), Some(70100.0));
        assert_eq!(parse_number(&json!("-70,100")), Some(70100.0));
        assert_eq!(parse_number(&json!("+1.5")), Some(1.5));
        assert_eq!(parse_number(&json!(-70100)), Some(70100.0));
        assert_eq!(parse_number(&json!(-1.5)), parse_number(&json!("-1.5")));
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!("")), None);
        assert_eq!(parse_number(&json!(null)), None);
    }

    #[test]
    fn test_parse_candle_series_sorts_by_date() {
        let body = json!({
            "stk_dt_pole_chart_qry": [
                {"dt": "20240103", "cur_prc": "-300", "high_pric": "310", "low_pric": "290", "trde_qty": "1000"},
                {"dt": "20240102", "cur_prc": "+200", "high_pric": "210", "low_pric": "190", "trde_qty": "900"},
                {"dt": "20240101", "cur_prc": "100", "high_pric": "110", "low_pric": "90", "trde_qty": "800"}
            ]
        });
        let series = parse_candle_series(&body).unwrap();
        let closes: Vec<f64> = series.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![100.0, 200.0, 300.0]);
        assert_eq!(series[2].volume, 1000.0);
    }

    #[test]
    fn test_parse_candle_series_generic_fields_keep_order() {
        let body = json!([
            {"close": 1, "high": 2, "low": 0.5, "volume": 10},
            {"close": 3, "high": 4, "low": 2.5, "volume": 20}
        ]);
        let series = parse_candle_series(&body).unwrap();
        assert_eq!(series, vec![Candle::new(1.0, 2.0, 0.5, 10.0), Candle::new(3.0, 4.0, 2.5, 20.0)]);
    }

    #[test]
    fn test_parse_candle_series_rejects_bad_field() {
        let body = json!({"stk_dt_pole_chart_qry": [{"cur_prc": "n/a", "high_pric": "1", "low_pric": "1", "trde_qty": "1"}]});
        assert!(matches!(parse_candle_series(&body), Err(Error::Parse(_))));

        let missing = json!({"stk_dt_pole_chart_qry": [{"cur_prc": "1"}]});
        assert!(parse_candle_series(&missing).is_err());
    }

    #[test]
    fn test_parse_candle_series_missing_array() {
        assert!(parse_candle_series(&json!({"other": []})).is_err());
    }
}
