use crate::metrics::{coerce_numeric, numeric_value};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ── Fundamental metrics ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CurrentPrice,
    TrailingPe,
    PriceToBook,
    ReturnOnEquity,
    DebtToEquity,
    TotalDebt,
    MarketCap,
    Revenue,
    NetIncome,
    OperatingCashflow,
    FreeCashflow,
    TotalAssets,
    TotalEquity,
    TotalCash,
}

impl Metric {
    pub const ALL: [Metric; 14] = [
        Metric::CurrentPrice,
        Metric::TrailingPe,
        Metric::PriceToBook,
        Metric::ReturnOnEquity,
        Metric::DebtToEquity,
        Metric::TotalDebt,
        Metric::MarketCap,
        Metric::Revenue,
        Metric::NetIncome,
        Metric::OperatingCashflow,
        Metric::FreeCashflow,
        Metric::TotalAssets,
        Metric::TotalEquity,
        Metric::TotalCash,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::CurrentPrice => "Current Price",
            Metric::TrailingPe => "PER",
            Metric::PriceToBook => "PBV",
            Metric::ReturnOnEquity => "ROE",
            Metric::DebtToEquity => "Debt/Equity",
            Metric::TotalDebt => "Total Debt",
            Metric::MarketCap => "Market Cap",
            Metric::Revenue => "Revenue",
            Metric::NetIncome => "Net Income",
            Metric::OperatingCashflow => "Operating Cash Flow",
            Metric::FreeCashflow => "Free Cash Flow",
            Metric::TotalAssets => "Total Assets",
            Metric::TotalEquity => "Total Equity",
            Metric::TotalCash => "Cash",
        }
    }
}

/// Why a metric fell back to its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricIssue {
    Missing,
    NonNumeric,
}

// ── Raw fundamentals bag ──────────────────────────────────────────────────────

/// Fundamentals exactly as the provider returned them.
///
/// Values are kept raw and only coerced when read, so every read goes through
/// [`RawFundamentals::get_or`] with an explicit default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFundamentals {
    pub symbol: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    fields: BTreeMap<Metric, Value>,
}

impl RawFundamentals {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn with(mut self, metric: Metric, value: impl Into<Value>) -> Self {
        self.insert(metric, value.into());
        self
    }

    pub fn insert(&mut self, metric: Metric, value: Value) {
        self.fields.insert(metric, value);
    }

    pub fn raw(&self, metric: Metric) -> Option<&Value> {
        self.fields.get(&metric)
    }

    pub fn get_or(&self, metric: Metric, default: f64) -> f64 {
        coerce_numeric(self.raw(metric), default)
    }

    /// `Some` only when the provider supplied a usable number.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.raw(metric).and_then(numeric_value)
    }

    pub fn issues(&self) -> Vec<(Metric, MetricIssue)> {
        Metric::ALL
            .iter()
            .filter_map(|&m| match self.raw(m) {
                None | Some(Value::Null) => Some((m, MetricIssue::Missing)),
                Some(v) if numeric_value(v).is_none() => Some((m, MetricIssue::NonNumeric)),
                Some(_) => None,
            })
            .collect()
    }
}

// ── Price history ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series ordered by date. Later duplicates of a date win.
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        points.reverse();
        points.dedup_by_key(|p| p.date);
        points.reverse();
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Period-over-period returns. The first sample has no return; pairs whose
    /// previous close is not a positive finite number are skipped.
    pub fn returns(&self) -> Vec<PeriodReturn> {
        self.points
            .windows(2)
            .filter_map(|w| {
                let (prev, cur) = (w[0], w[1]);
                if !(prev.close.is_finite() && prev.close > 0.0 && cur.close.is_finite()) {
                    return None;
                }
                Some(PeriodReturn {
                    date: cur.date,
                    value: (cur.close - prev.close) / prev.close,
                })
            })
            .collect()
    }

    /// Keeps the last close of every calendar month.
    pub fn resample_monthly(&self) -> PriceSeries {
        let mut monthly: Vec<PricePoint> = Vec::new();
        for p in &self.points {
            match monthly.last_mut() {
                Some(last) if (last.date.year(), last.date.month()) == (p.date.year(), p.date.month()) => {
                    *last = *p;
                }
                _ => monthly.push(*p),
            }
        }
        PriceSeries {
            symbol: self.symbol.clone(),
            points: monthly,
        }
    }
}

// ── Raw CSV rows ──────────────────────────────────────────────────────────────

/// investing.com equity CSV: Date, Price, Open, High, Low, Volume, Change%
#[derive(Debug, Clone, Default)]
pub struct RawCsvRow {
    pub date: Option<String>,
    pub price: Option<String>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_get_or_defaults_missing_and_garbage() {
        let f = RawFundamentals::new("BBCA.JK")
            .with(Metric::TrailingPe, "abc")
            .with(Metric::PriceToBook, json!({"raw": 4.2, "fmt": "4.20"}));

        assert_eq!(f.get_or(Metric::ReturnOnEquity, 0.0), 0.0);
        assert_eq!(f.get_or(Metric::TrailingPe, -1.0), -1.0);
        assert_eq!(f.get_or(Metric::PriceToBook, 0.0), 4.2);
        assert_eq!(f.get(Metric::TrailingPe), None);
    }

    #[test]
    fn test_issues_classifies_fields() {
        let f = RawFundamentals::new("BBRI.JK")
            .with(Metric::CurrentPrice, 4_500)
            .with(Metric::TrailingPe, "n/a")
            .with(Metric::PriceToBook, Value::Null);

        let issues = f.issues();
        assert!(issues.contains(&(Metric::TrailingPe, MetricIssue::NonNumeric)));
        assert!(issues.contains(&(Metric::PriceToBook, MetricIssue::Missing)));
        assert!(issues.contains(&(Metric::TotalCash, MetricIssue::Missing)));
        assert!(!issues.iter().any(|(m, _)| *m == Metric::CurrentPrice));
        assert_eq!(issues.len(), Metric::ALL.len() - 1);
    }

    #[test]
    fn test_series_sorted_and_deduped() {
        let s = PriceSeries::new(
            "TLKM.JK",
            vec![
                PricePoint { date: d(2024, 3, 1), close: 3.0 },
                PricePoint { date: d(2024, 1, 1), close: 1.0 },
                PricePoint { date: d(2024, 3, 1), close: 3.5 },
            ],
        );
        assert_eq!(s.len(), 2);
        assert_eq!(s.points()[0].date, d(2024, 1, 1));
        assert_eq!(s.points()[1].close, 3.5);
    }

    #[test]
    fn test_returns_skip_first_and_non_positive() {
        let s = PriceSeries::new(
            "X",
            vec![
                PricePoint { date: d(2024, 1, 1), close: 100.0 },
                PricePoint { date: d(2024, 2, 1), close: 110.0 },
                PricePoint { date: d(2024, 3, 1), close: 0.0 },
                PricePoint { date: d(2024, 4, 1), close: 50.0 },
            ],
        );
        let r = s.returns();
        assert_eq!(r.len(), 2);
        assert!((r[0].value - 0.10).abs() < 1e-12);
        assert_eq!(r[0].date, d(2024, 2, 1));
        assert_eq!(r[1].value, -1.0);
    }

    #[test]
    fn test_resample_monthly_keeps_last_close() {
        let s = PriceSeries::new(
            "X",
            vec![
                PricePoint { date: d(2024, 1, 2), close: 10.0 },
                PricePoint { date: d(2024, 1, 31), close: 12.0 },
                PricePoint { date: d(2024, 2, 15), close: 11.0 },
                PricePoint { date: d(2025, 1, 3), close: 20.0 },
            ],
        );
        let m = s.resample_monthly();
        let closes: Vec<f64> = m.points().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![12.0, 11.0, 20.0]);
    }
}
