//! Terminal presentation of reports.

use crate::error::AnalyzerError;
use crate::metrics::{SummaryRow, format_multiple, format_percent};
use crate::pipeline::{SeasonalityReport, TickerReport};
use crate::scoring::{Comparison, ScoreBreakdown, ScoredTicker};
use crate::utils::text_bar;
use std::fmt::Write;

const RULE: &str = "─────────────────────────────────────────────";
const BAR_WIDTH: usize = 24;

pub const EDUCATION: &str = "Low PER and PBV are not automatically good. \
Check ROE, cash flow and the ability to service debt as well.";

pub const SEASONALITY_NOTE: &str = "Seasonality is a historical average, not a forecast.";

pub fn ticker_report(r: &TickerReport) -> String {
    let mut out = String::new();
    let title = match &r.name {
        Some(name) => format!("{} · {}", r.symbol, name),
        None => r.symbol.clone(),
    };
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "  {}", title);
    let _ = writeln!(out, "{}", RULE);

    rows(&mut out, &r.headline);
    let _ = writeln!(out);
    let _ = writeln!(out, "  Fundamental Summary");
    rows(&mut out, &r.fundamentals);
    if let Some(margin) = r.ratios.net_margin {
        row(&mut out, "Net Margin", &format_percent(margin));
    }

    let _ = writeln!(out);
    score_block(&mut out, &r.score);

    let _ = writeln!(out);
    out.push_str(&seasonality_report(&r.seasonality));

    let _ = writeln!(out);
    let _ = writeln!(out, "  ℹ {}", EDUCATION);
    out
}

pub fn comparison(c: &Comparison) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "  {} vs {}", c.first.symbol, c.second.symbol);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "  {:<14}{:>14}{:>14}", "", c.first.symbol, c.second.symbol);

    let cols: [(&str, fn(&ScoredTicker) -> String); 5] = [
        ("ROE", |t| format_percent(t.ratios.return_on_equity)),
        ("PBV", |t| format_multiple(t.ratios.price_to_book)),
        ("PER", |t| format_multiple(t.ratios.trailing_pe)),
        ("Debt/Equity", |t| format_multiple(t.ratios.debt_to_equity)),
        ("Score", |t| format!("{}/100", t.score.total)),
    ];
    for (label, cell) in cols {
        let _ = writeln!(out, "  {:<14}{:>14}{:>14}", label, cell(&c.first), cell(&c.second));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  ⇒ {}", c.verdict());
    out
}

pub fn seasonality_report(s: &SeasonalityReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Monthly Seasonality ({} samples)", s.samples);

    if let Some(note) = s.insufficient() {
        let _ = writeln!(out, "  {}", note.user_message());
        return out;
    }

    let max_abs = s
        .summary
        .months
        .iter()
        .map(|m| m.mean_return.abs())
        .fold(0.0_f64, f64::max);

    for m in &s.summary.months {
        let _ = writeln!(
            out,
            "  {:<4}{:>8}  {}",
            m.label,
            format_percent(m.mean_return),
            text_bar(m.mean_return, max_abs, BAR_WIDTH)
        );
    }

    match s.summary.extremes() {
        Ok(e) => {
            let _ = writeln!(
                out,
                "  Best: {} ({})  Worst: {} ({})",
                e.best.label,
                format_percent(e.best.mean_return),
                e.worst.label,
                format_percent(e.worst.mean_return)
            );
        }
        Err(e) => {
            let _ = writeln!(out, "  {}", e.user_message());
        }
    }
    let _ = writeln!(out, "  {}", SEASONALITY_NOTE);
    out
}

pub fn failure(err: &AnalyzerError) -> String {
    format!("✗ {}", err.user_message())
}

fn score_block(out: &mut String, s: &ScoreBreakdown) {
    let _ = writeln!(out, "  Fundamental Score: {}/100 ({})", s.total, s.rating.label());
    row(out, "Profitability", &format!("{}/30", s.profitability));
    row(out, "Valuation", &format!("{}/25", s.valuation));
    row(out, "Earnings", &format!("{}/25", s.earnings_multiple));
    row(out, "Leverage", &format!("{}/20", s.leverage));
}

fn rows(out: &mut String, rows: &[SummaryRow]) {
    for r in rows {
        row(out, r.label, &r.value);
    }
}

fn row(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "  {:<22}{:>20}", label, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metric, PricePoint, PriceSeries, RawFundamentals};
    use crate::scoring::compare;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap(),
                close,
            })
            .collect();
        PriceSeries::new("BBRI.JK", points)
    }

    #[test]
    fn test_seasonality_render() {
        let out = seasonality_report(&SeasonalityReport::from_series(&series(&[100.0, 104.0, 101.0])));
        assert!(out.contains("Feb"));
        assert!(out.contains("4.00%"));
        assert!(out.contains("Best: Feb"));
        assert!(out.contains("Worst: Mar"));
    }

    #[test]
    fn test_seasonality_render_insufficient() {
        let out = seasonality_report(&SeasonalityReport::from_series(&series(&[100.0])));
        assert!(out.contains("Not enough price history"));
        assert!(!out.contains("Best"));
    }

    #[test]
    fn test_comparison_render() {
        let a = RawFundamentals::new("BBCA.JK").with(Metric::ReturnOnEquity, 0.2);
        let b = RawFundamentals::new("BBRI.JK").with(Metric::ReturnOnEquity, 0.2);
        let out = comparison(&compare(&a, &b));
        assert!(out.contains("Tie"));
        assert!(out.contains("20.00%"));
    }
}
