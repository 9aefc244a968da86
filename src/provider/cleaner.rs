use crate::error::{AnalyzerError, Result};
use crate::models::{PricePoint, RawCsvRow};
use chrono::NaiveDate;
use tracing::warn;

// ── Parsers ───────────────────────────────────────────────────────────────────

/// Parse price: strip everything except digits, dot, minus.
/// "Rp 9,450.00" → 9450.0 | "610.00" → 610.0
pub fn parse_price(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "N/A" || s == "-" || s == "—" {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse dates: "Feb 20, 2024" (investing.com) or ISO
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ["%b %d, %Y", "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d %b %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// "bbca" → "BBCA.JK"; symbols already carrying a suffix are kept as-is.
pub fn normalise_symbol(raw: &str, exchange_suffix: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    let valid = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && !symbol.starts_with('.');
    if !valid {
        return Err(AnalyzerError::InvalidSymbol(raw.to_string()));
    }

    if symbol.contains('.') || exchange_suffix.is_empty() {
        Ok(symbol)
    } else {
        Ok(format!("{}{}", symbol, exchange_suffix.to_uppercase()))
    }
}

// ── Equity CSV → PricePoint ───────────────────────────────────────────────────

pub fn csv_row_to_point(symbol: &str, row: &RawCsvRow) -> Option<PricePoint> {
    let date = parse_date(row.date.as_deref()?)?;
    let close = parse_price(row.price.as_deref()?)?;

    if close <= 0.0 {
        warn!("Invalid close {} for {} on {}", close, symbol, date);
        return None;
    }

    Some(PricePoint { date, close })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("Rp 9,450.00"), Some(9450.0));
        assert_eq!(parse_price("610"), Some(610.0));
        assert_eq!(parse_price("N/A"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let want = NaiveDate::from_ymd_opt(2024, 2, 20);
        assert_eq!(parse_date("Feb 20, 2024"), want);
        assert_eq!(parse_date("2024-02-20"), want);
        assert_eq!(parse_date("20/02/2024"), want);
        assert_eq!(parse_date("20 Feb 2024"), want);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_normalise_symbol() {
        assert_eq!(normalise_symbol(" bbca ", ".JK").unwrap(), "BBCA.JK");
        assert_eq!(normalise_symbol("tlkm.jk", ".JK").unwrap(), "TLKM.JK");
        assert!(normalise_symbol("^JKSE", ".JK").is_err());
        assert!(normalise_symbol("   ", ".JK").is_err());
        assert!(normalise_symbol(".JK", ".JK").is_err());
        assert_eq!(normalise_symbol("AAPL", "").unwrap(), "AAPL");
    }

    #[test]
    fn test_csv_row_to_point() {
        let row = RawCsvRow {
            date: Some("Jan 31, 2024".into()),
            price: Some("9,450.00".into()),
        };
        let p = csv_row_to_point("BBCA", &row).unwrap();
        assert_eq!(p.close, 9450.0);

        let zero = RawCsvRow {
            date: Some("Jan 31, 2024".into()),
            price: Some("0".into()),
        };
        assert!(csv_row_to_point("BBCA", &zero).is_none());
        assert!(csv_row_to_point("BBCA", &RawCsvRow::default()).is_none());
    }
}
