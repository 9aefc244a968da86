//! Yahoo Finance payloads → domain models.
//!
//! Values are copied raw; coercion happens when the fundamentals are read.

use crate::error::{AnalyzerError, Result};
use crate::metrics::numeric_value;
use crate::models::{Metric, PricePoint, PriceSeries, RawFundamentals};
use chrono::DateTime;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Modules requested from quoteSummary.
pub const SUMMARY_MODULES: &str =
    "financialData,defaultKeyStatistics,summaryDetail,price,balanceSheetHistory";

/// JSON pointers (relative to the quoteSummary result) tried in order per metric.
fn metric_paths(metric: Metric) -> &'static [&'static str] {
    match metric {
        Metric::CurrentPrice => &["/financialData/currentPrice", "/price/regularMarketPrice"],
        Metric::TrailingPe => &["/summaryDetail/trailingPE", "/defaultKeyStatistics/trailingPE"],
        Metric::PriceToBook => &["/defaultKeyStatistics/priceToBook"],
        Metric::ReturnOnEquity => &["/financialData/returnOnEquity"],
        Metric::DebtToEquity => &["/financialData/debtToEquity"],
        Metric::TotalDebt => &["/financialData/totalDebt"],
        Metric::MarketCap => &["/summaryDetail/marketCap", "/price/marketCap"],
        Metric::Revenue => &["/financialData/totalRevenue"],
        Metric::NetIncome => &["/defaultKeyStatistics/netIncomeToCommon"],
        Metric::OperatingCashflow => &["/financialData/operatingCashflow"],
        Metric::FreeCashflow => &["/financialData/freeCashflow"],
        Metric::TotalAssets => &["/balanceSheetHistory/balanceSheetStatements/0/totalAssets"],
        Metric::TotalEquity => &[
            "/balanceSheetHistory/balanceSheetStatements/0/totalStockholderEquity",
        ],
        Metric::TotalCash => &["/financialData/totalCash"],
    }
}

/// Yahoo reports debt/equity in percent (45.3 means 0.453).
const DEBT_TO_EQUITY_PERCENT: f64 = 100.0;

fn envelope<'a>(root: &'a Value, key: &str) -> Result<&'a Value> {
    let node = root
        .get(key)
        .ok_or_else(|| AnalyzerError::MalformedResponse(format!("missing '{}' envelope", key)))?;

    if let Some(err) = node.get("error").filter(|e| !e.is_null()) {
        let reason = err
            .get("description")
            .or_else(|| err.get("code"))
            .and_then(Value::as_str)
            .unwrap_or("unknown provider error");
        return Err(AnalyzerError::MalformedResponse(reason.to_string()));
    }

    node.pointer("/result/0")
        .ok_or_else(|| AnalyzerError::MalformedResponse(format!("empty '{}' result", key)))
}

pub fn parse_quote_summary(symbol: &str, root: &Value) -> Result<RawFundamentals> {
    let result = envelope(root, "quoteSummary")?;
    let mut f = RawFundamentals::new(symbol);

    f.name = ["/price/longName", "/price/shortName"]
        .iter()
        .find_map(|p| result.pointer(p).and_then(Value::as_str))
        .map(|s| s.trim().to_string());
    f.currency = ["/financialData/financialCurrency", "/price/currency"]
        .iter()
        .find_map(|p| result.pointer(p).and_then(Value::as_str))
        .map(str::to_string);

    for metric in Metric::ALL {
        let Some(raw) = metric_paths(metric)
            .iter()
            .filter_map(|p| result.pointer(p))
            .find(|v| !is_empty_field(v))
        else {
            continue;
        };

        let value = if metric == Metric::DebtToEquity {
            match numeric_value(raw) {
                Some(pct) => json!(pct / DEBT_TO_EQUITY_PERCENT),
                None => raw.clone(),
            }
        } else {
            raw.clone()
        };
        f.insert(metric, value);
    }

    debug!("{}: {} issues in fundamentals", symbol, f.issues().len());
    Ok(f)
}

/// Yahoo uses `{}` for "no value" inside modules.
fn is_empty_field(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

pub fn parse_chart(symbol: &str, root: &Value) -> Result<PriceSeries> {
    let result = envelope(root, "chart")?;

    let timestamps = result
        .get("timestamp")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let closes = result
        .pointer("/indicators/adjclose/0/adjclose")
        .or_else(|| result.pointer("/indicators/quote/0/close"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    // Bars are stamped at exchange-local midnight; shift so the date lands in the right month.
    let gmt_offset = result
        .pointer("/meta/gmtoffset")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if timestamps.len() != closes.len() {
        warn!(
            "{}: {} timestamps vs {} closes, truncating",
            symbol,
            timestamps.len(),
            closes.len()
        );
    }

    let points = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts.as_i64()? + gmt_offset, 0)?.date_naive();
            let close = numeric_value(close)?;
            Some(PricePoint { date, close })
        })
        .collect();

    // The live bar for the current month can arrive next to its month-start bar.
    Ok(PriceSeries::new(symbol, points).resample_monthly())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
