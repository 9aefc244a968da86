//! CSV loader for offline price history (investing.com exports).

use crate::models::{PricePoint, PriceSeries, RawCsvRow};
use crate::provider::cleaner::csv_row_to_point;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Extract symbol from CSV filename: "BBCA Historical Data.csv" → "BBCA"
pub fn extract_symbol_from_filename(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let symbol = stem
        .split(['_', ' ', '.'])
        .next()?
        .trim()
        .to_uppercase();

    if symbol.is_empty() { None } else { Some(symbol) }
}

/// Parse an investing.com CSV: Date, Price, Open, High, Low, Vol., Change%
pub fn load_csv(path: &Path) -> Result<PriceSeries> {
    let symbol = extract_symbol_from_filename(path)
        .with_context(|| format!("No symbol in filename {:?}", path))?;

    debug!("Loading {} from {:?}", symbol, path);
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let series = read_series(&symbol, file)?;

    info!("{}: {} price samples loaded", symbol, series.len());
    Ok(series)
}

pub fn read_series<R: Read>(symbol: &str, input: R) -> Result<PriceSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut points: Vec<PricePoint> = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("{} row {}: {}", symbol, i + 1, e);
                continue;
            }
        };

        let raw = RawCsvRow {
            date: record.get(0).map(|s| s.to_string()),
            price: record.get(1).map(|s| s.to_string()),
        };

        if let Some(point) = csv_row_to_point(symbol, &raw) {
            points.push(point);
        }
    }

    Ok(PriceSeries::new(symbol, points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = "\
\"Date\",\"Price\",\"Open\",\"High\",\"Low\",\"Vol.\",\"Change %\"
\"Mar 01, 2024\",\"9,950.00\",\"9,800.00\",\"10,000.00\",\"9,775.00\",\"1.2B\",\"1.27%\"
\"Feb 01, 2024\",\"9,825.00\",\"9,500.00\",\"9,900.00\",\"9,450.00\",\"1.5B\",\"3.42%\"
\"not a date\",\"1.00\"
\"Jan 02, 2024\",\"9,500.00\",\"9,400.00\",\"9,550.00\",\"9,350.00\",\"900M\",\"0.53%\"
";

    #[test]
    fn test_extract_symbol_from_filename() {
        let p = PathBuf::from("data/BBCA Historical Data.csv");
        assert_eq!(extract_symbol_from_filename(&p).as_deref(), Some("BBCA"));
        let p = PathBuf::from("tlkm_monthly.csv");
        assert_eq!(extract_symbol_from_filename(&p).as_deref(), Some("TLKM"));
    }

    #[test]
    fn test_read_series_sorts_and_skips_bad_rows() {
        let s = read_series("BBCA", SAMPLE.as_bytes()).unwrap();
        assert_eq!(s.len(), 3);
        let closes: Vec<f64> = s.points().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![9500.0, 9825.0, 9950.0]);
    }

    #[test]
    fn test_load_csv_missing_file() {
        assert!(load_csv(Path::new("/nonexistent/BBCA.csv")).is_err());
    }
}
