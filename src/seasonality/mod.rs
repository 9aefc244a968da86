//! Average return by calendar month.

use crate::error::{AnalyzerError, Result};
use crate::models::{PeriodReturn, PriceSeries};
use chrono::Datelike;
use serde::Serialize;

/// Indonesian short month names, January first.
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

pub fn month_label(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_LABELS.get(i as usize))
        .copied()
        .unwrap_or("?")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthStat {
    pub month: u32,
    pub label: &'static str,
    pub mean_return: f64,
    pub samples: usize,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremes<'a> {
    pub best: &'a MonthStat,
    pub worst: &'a MonthStat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonalitySummary {
    pub symbol: String,
    /// Ascending by month, one entry per month that has at least one return.
    pub months: Vec<MonthStat>,
}

impl SeasonalitySummary {
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn get(&self, month: u32) -> Option<&MonthStat> {
        self.months.iter().find(|m| m.month == month)
    }

    /// Highest mean; ties go to the earliest month.
    pub fn best(&self) -> Option<&MonthStat> {
        self.months.iter().fold(None, |acc: Option<&MonthStat>, m| match acc {
            Some(a) if a.mean_return >= m.mean_return => Some(a),
            _ => Some(m),
        })
    }

    /// Lowest mean; ties go to the earliest month.
    pub fn worst(&self) -> Option<&MonthStat> {
        self.months.iter().fold(None, |acc: Option<&MonthStat>, m| match acc {
            Some(a) if a.mean_return <= m.mean_return => Some(a),
            _ => Some(m),
        })
    }

    pub fn extremes(&self) -> Result<Extremes<'_>> {
        match (self.best(), self.worst()) {
            (Some(best), Some(worst)) => Ok(Extremes { best, worst }),
            _ => Err(AnalyzerError::InsufficientSeries {
                symbol: self.symbol.clone(),
                samples: 0,
            }),
        }
    }
}

pub fn aggregate(series: &PriceSeries) -> SeasonalitySummary {
    aggregate_returns(&series.symbol, &series.returns())
}

pub fn aggregate_returns(symbol: &str, returns: &[PeriodReturn]) -> SeasonalitySummary {
    let mut buckets = [(0.0_f64, 0_usize); 12];
    for r in returns.iter().filter(|r| r.value.is_finite()) {
        let slot = &mut buckets[r.date.month0() as usize];
        slot.0 += r.value;
        slot.1 += 1;
    }

    let months = buckets
        .iter()
        .enumerate()
        .filter(|(_, (_, n))| *n > 0)
        .map(|(i, &(sum, n))| {
            let month = i as u32 + 1;
            let mean_return = sum / n as f64;
            MonthStat {
                month,
                label: month_label(month),
                mean_return,
                samples: n,
                trend: if mean_return >= 0.0 { Trend::Positive } else { Trend::Negative },
            }
        })
        .collect();

    SeasonalitySummary {
        symbol: symbol.to_string(),
        months,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
