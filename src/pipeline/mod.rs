//! Lookup pipeline: ticker → fetch → normalise → score → aggregate.
//!
//! One lookup runs start to finish before the next. The provider and the
//! caches are handed in, so tests can swap the provider for a stub and
//! callers decide when cached entries go stale.

use crate::cache::LookupCache;
use crate::error::{AnalyzerError, Result};
use crate::metrics::{DerivedRatios, SummaryRow, headline_rows, summary_rows};
use crate::models::{PeriodReturn, PriceSeries, RawFundamentals};
use crate::provider::MarketDataSource;
use crate::provider::cleaner::normalise_symbol;
use crate::scoring::{Comparison, ScoreBreakdown, compare, score};
use crate::seasonality::{SeasonalitySummary, aggregate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct TickerReport {
    pub symbol: String,
    pub name: Option<String>,
    pub headline: Vec<SummaryRow>,
    pub fundamentals: Vec<SummaryRow>,
    pub ratios: DerivedRatios,
    pub score: ScoreBreakdown,
    pub seasonality: SeasonalityReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonalityReport {
    pub symbol: String,
    pub samples: usize,
    pub returns: Vec<PeriodReturn>,
    pub summary: SeasonalitySummary,
}

impl SeasonalityReport {
    pub fn from_series(series: &PriceSeries) -> Self {
        Self {
            symbol: series.symbol.clone(),
            samples: series.len(),
            returns: series.returns(),
            summary: aggregate(series),
        }
    }

    /// Soft note when there is nothing to aggregate.
    pub fn insufficient(&self) -> Option<AnalyzerError> {
        self.summary.is_empty().then(|| AnalyzerError::InsufficientSeries {
            symbol: self.symbol.clone(),
            samples: self.samples,
        })
    }
}

pub struct Analyzer {
    source: Arc<dyn MarketDataSource>,
    fundamentals: LookupCache<RawFundamentals>,
    history: LookupCache<PriceSeries>,
    exchange_suffix: String,
}

impl Analyzer {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        fundamentals: LookupCache<RawFundamentals>,
        history: LookupCache<PriceSeries>,
        exchange_suffix: impl Into<String>,
    ) -> Self {
        Self {
            source,
            fundamentals,
            history,
            exchange_suffix: exchange_suffix.into(),
        }
    }

    pub fn normalise(&self, input: &str) -> Result<String> {
        normalise_symbol(input, &self.exchange_suffix)
    }

    pub async fn analyze(&self, input: &str) -> Result<TickerReport> {
        let symbol = self.normalise(input)?;
        info!("Analyzing {}", symbol);

        let fundamentals = self.fundamentals(&symbol).await?;
        for (metric, issue) in fundamentals.issues() {
            debug!("{}: {:?} defaulted ({:?})", symbol, metric, issue);
        }

        let ratios = DerivedRatios::from_fundamentals(&fundamentals);
        let score = score(&ratios);
        info!("{}: score {}/100", symbol, score.total);

        // Missing history only costs the seasonality panel.
        let series = match self.price_history(&symbol).await {
            Ok(s) => s,
            Err(e) => {
                warn!("{}: {}", symbol, e);
                PriceSeries::new(symbol.clone(), Vec::new())
            }
        };

        Ok(TickerReport {
            symbol: symbol.clone(),
            name: fundamentals.name.clone(),
            headline: headline_rows(&fundamentals),
            fundamentals: summary_rows(&fundamentals),
            ratios,
            score,
            seasonality: SeasonalityReport::from_series(&series),
        })
    }

    pub async fn compare(&self, first: &str, second: &str) -> Result<Comparison> {
        let first = self.normalise(first)?;
        let second = self.normalise(second)?;

        let a = self.fundamentals(&first).await?;
        let b = self.fundamentals(&second).await?;

        let comparison = compare(&a, &b);
        info!("{}", comparison.verdict());
        Ok(comparison)
    }

    pub async fn seasonality(&self, input: &str) -> Result<SeasonalityReport> {
        let symbol = self.normalise(input)?;
        let series = self.price_history(&symbol).await?;
        Ok(SeasonalityReport::from_series(&series))
    }

    pub async fn invalidate(&self, input: &str) -> Result<()> {
        let symbol = self.normalise(input)?;
        self.fundamentals.invalidate(&symbol).await;
        self.history.invalidate(&symbol).await;
        info!("{}: cache entries dropped", symbol);
        Ok(())
    }

    pub async fn clear_cache(&self) {
        self.fundamentals.clear().await;
        self.history.clear().await;
        info!("Cache cleared");
    }

    async fn fundamentals(&self, symbol: &str) -> Result<RawFundamentals> {
        self.fundamentals
            .get_or_fetch(symbol, || async {
                self.source
                    .fetch_fundamentals(symbol)
                    .await
                    .map_err(|e| source_failure(symbol, e))
            })
            .await
    }

    async fn price_history(&self, symbol: &str) -> Result<PriceSeries> {
        self.history
            .get_or_fetch(symbol, || async {
                self.source
                    .fetch_price_history(symbol)
                    .await
                    .map_err(|e| source_failure(symbol, e))
            })
            .await
    }
}

fn source_failure(symbol: &str, err: anyhow::Error) -> AnalyzerError {
    AnalyzerError::DataSourceFailure {
        symbol: symbol.to_string(),
        reason: format!("{:#}", err),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
