pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ProviderConfig;
use crate::models::{PriceSeries, RawFundamentals};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use self::http_client::HttpClient;
use self::parsers::{SUMMARY_MODULES, parse_chart, parse_quote_summary};

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable data source abstraction. Symbols arrive already normalised.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<RawFundamentals>;
    async fn fetch_price_history(&self, symbol: &str) -> Result<PriceSeries>;
}

// ── Yahoo Finance ─────────────────────────────────────────────────────────────

pub struct YahooProvider {
    client: HttpClient,
    base_url: Url,
    session_url: Url,
    history_range: String,
    history_interval: String,
    crumb: OnceCell<String>,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            base_url: Url::parse(&config.base_url)
                .with_context(|| format!("Invalid provider base_url {:?}", config.base_url))?,
            session_url: Url::parse(&config.session_url)
                .with_context(|| format!("Invalid provider session_url {:?}", config.session_url))?,
            history_range: config.history_range.clone(),
            history_interval: config.history_interval.clone(),
            crumb: OnceCell::new(),
        })
    }

    /// `{base}/v10/finance/quoteSummary/BBCA.JK?modules=..&crumb=..`
    fn summary_url(&self, symbol: &str, crumb: &str) -> Result<Url> {
        let path = format!("v10/finance/quoteSummary/{}", symbol);
        let url = self.base_url.join(&path)?;
        Ok(Url::parse_with_params(
            url.as_str(),
            &[("modules", SUMMARY_MODULES), ("crumb", crumb)],
        )?)
    }

    /// `{base}/v8/finance/chart/BBCA.JK?range=5y&interval=1mo`
    fn chart_url(&self, symbol: &str) -> Result<Url> {
        let path = format!("v8/finance/chart/{}", symbol);
        let url = self.base_url.join(&path)?;
        Ok(Url::parse_with_params(
            url.as_str(),
            &[
                ("range", self.history_range.as_str()),
                ("interval", self.history_interval.as_str()),
                ("events", "div,split"),
            ],
        )?)
    }

    /// Cookie + crumb handshake, done once per process.
    async fn crumb(&self) -> Result<&str> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                self.client.touch(&self.session_url).await?;
                let url = self.base_url.join("v1/test/getcrumb")?;
                let crumb = self.client.get_text(&url).await.context("Crumb request failed")?;
                let crumb = crumb.trim().to_string();
                if crumb.is_empty() || crumb.contains(' ') {
                    bail!("Provider returned no usable crumb");
                }
                info!("Provider session established");
                Ok::<_, anyhow::Error>(crumb)
            })
            .await?;
        Ok(crumb.as_str())
    }
}

#[async_trait]
impl MarketDataSource for YahooProvider {
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<RawFundamentals> {
        let crumb = self.crumb().await?;
        let url = self.summary_url(symbol, crumb)?;
        let body = self
            .client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch fundamentals for {}", symbol))?;

        let fundamentals = parse_quote_summary(symbol, &body)?;
        debug!("{}: fundamentals for {:?}", symbol, fundamentals.name);
        Ok(fundamentals)
    }

    async fn fetch_price_history(&self, symbol: &str) -> Result<PriceSeries> {
        let url = self.chart_url(symbol)?;
        let body = self
            .client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch price history for {}", symbol))?;

        let series = parse_chart(symbol, &body)?;
        debug!("{}: {} price samples", symbol, series.len());
        Ok(series)
    }
}
