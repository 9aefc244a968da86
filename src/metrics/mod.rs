//! Metric normalization and display formatting.
//!
//! Provider values arrive as JSON: plain numbers, numeric strings, Yahoo's
//! `{ "raw": .., "fmt": .. }` objects, or junk. Everything funnels through
//! [`coerce_numeric`], which never fails.

use crate::models::{Metric, RawFundamentals};
use crate::utils::fmt_number;
use serde::Serialize;
use serde_json::Value;

pub const CURRENCY_PREFIX: &str = "Rp";
pub const NOT_AVAILABLE: &str = "N/A";

/// Largest unit first; the first threshold the magnitude reaches wins.
const UNITS: [(f64, &str); 3] = [(1e12, "T"), (1e9, "B"), (1e6, "M")];

// ── Coercion ──────────────────────────────────────────────────────────────────

/// Finite number carried by `value`, if any.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Object(map) => map.get("raw").and_then(numeric_value),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

pub fn coerce_numeric(value: Option<&Value>, default: f64) -> f64 {
    value.and_then(numeric_value).unwrap_or(default)
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// "Rp 2.50 T" | "Rp 1.20 B" | "Rp 950,000" | "Rp 950,000.50"
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let magnitude = value.abs();
    for (threshold, suffix) in UNITS {
        if magnitude >= threshold {
            return format!("{} {:.2} {}", CURRENCY_PREFIX, value / threshold, suffix);
        }
    }
    let sign = if value < 0.0 { "-" } else { "" };
    if value.fract() == 0.0 {
        return format!("{} {}{}", CURRENCY_PREFIX, sign, fmt_number(magnitude as i64));
    }
    let cents = (magnitude * 100.0).round() as i64;
    format!(
        "{} {}{}.{:02}",
        CURRENCY_PREFIX,
        sign,
        fmt_number(cents / 100),
        cents % 100
    )
}

/// Fraction to percent: 0.153 → "15.30%"
pub fn format_percent(fraction: f64) -> String {
    if !fraction.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{:.2}%", fraction * 100.0)
}

pub fn format_multiple(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{:.2}x", value)
}

// ── Derived ratios ────────────────────────────────────────────────────────────

/// Ratios fed to the scorer, with fallbacks derived from statement totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedRatios {
    pub return_on_equity: f64,
    pub price_to_book: f64,
    pub trailing_pe: f64,
    pub debt_to_equity: f64,
    pub net_margin: Option<f64>,
}

impl DerivedRatios {
    pub fn from_fundamentals(f: &RawFundamentals) -> Self {
        let equity = f.get(Metric::TotalEquity).filter(|e| *e > 0.0);

        let return_on_equity = f
            .get(Metric::ReturnOnEquity)
            .or_else(|| Some(f.get(Metric::NetIncome)? / equity?))
            .unwrap_or(0.0);

        let debt_to_equity = f
            .get(Metric::DebtToEquity)
            .or_else(|| Some(f.get(Metric::TotalDebt)? / equity?))
            .unwrap_or(0.0);

        let net_margin = match (f.get(Metric::NetIncome), f.get(Metric::Revenue)) {
            (Some(ni), Some(rev)) if rev > 0.0 => Some(ni / rev),
            _ => None,
        };

        Self {
            return_on_equity,
            price_to_book: f.get_or(Metric::PriceToBook, 0.0),
            trailing_pe: f.get_or(Metric::TrailingPe, 0.0),
            debt_to_equity,
            net_margin,
        }
    }
}

// ── Display rows ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
}

/// Headline metrics: price, PER, PBV.
pub fn headline_rows(f: &RawFundamentals) -> Vec<SummaryRow> {
    vec![
        row(f, Metric::CurrentPrice, format_currency),
        row(f, Metric::TrailingPe, format_multiple),
        row(f, Metric::PriceToBook, format_multiple),
    ]
}

/// The fundamentals table. Fields the provider did not supply show as N/A.
pub fn summary_rows(f: &RawFundamentals) -> Vec<SummaryRow> {
    vec![
        row(f, Metric::MarketCap, format_currency),
        row(f, Metric::Revenue, format_currency),
        row(f, Metric::NetIncome, format_currency),
        row(f, Metric::ReturnOnEquity, format_percent),
        row(f, Metric::DebtToEquity, format_multiple),
        row(f, Metric::TotalDebt, format_currency),
        row(f, Metric::OperatingCashflow, format_currency),
        row(f, Metric::FreeCashflow, format_currency),
        row(f, Metric::TotalCash, format_currency),
    ]
}

fn row(f: &RawFundamentals, metric: Metric, fmt: fn(f64) -> String) -> SummaryRow {
    SummaryRow {
        label: metric.label(),
        value: f.get(metric).map(fmt).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
