mod cache;
mod config;
mod error;
mod loader;
mod metrics;
mod models;
mod pipeline;
mod provider;
mod render;
mod scoring;
mod seasonality;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cache::LookupCache;
use crate::config::AppConfig;
use crate::error::AnalyzerError;
use crate::pipeline::{Analyzer, SeasonalityReport};
use crate::provider::YahooProvider;

#[derive(Parser)]
#[command(name = "idx-analyzer", about = "IDX stock fundamentals, score and seasonality", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print reports as JSON instead of text
    #[arg(long, global = true, env = "IDX_JSON")]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fundamentals, score and seasonality for one ticker (e.g. BBCA)
    Analyze { ticker: String },

    /// Score two tickers side by side
    Compare { first: String, second: String },

    /// Average return by calendar month
    Seasonality {
        ticker: Option<String>,

        /// Read prices from an investing.com CSV export instead of the provider
        #[arg(long, conflicts_with = "ticker")]
        csv: Option<PathBuf>,
    },

    /// Read tickers from stdin, one per line (`:refresh CODE`, `:clear`, `:quit`)
    Interactive,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "idx_analyzer=info,warn",
        1 => "idx_analyzer=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;
    let out = Output { json: cli.json };

    // Offline CSV mode needs no provider.
    if let Command::Seasonality { csv: Some(path), .. } = &cli.command {
        let _t = utils::Timer::start(format!("CSV seasonality {:?}", path));
        let series = loader::load_csv(path)?.resample_monthly();
        out.seasonality(&SeasonalityReport::from_series(&series))?;
        return Ok(ExitCode::SUCCESS);
    }

    let provider = YahooProvider::new(&config.provider)?;
    let analyzer = Analyzer::new(
        Arc::new(provider),
        LookupCache::from_config("fundamentals", &config.cache),
        LookupCache::from_config("history", &config.cache),
        config.provider.exchange_suffix.clone(),
    );

    match cli.command {
        Command::Analyze { ticker } => {
            let _t = utils::Timer::start(format!("analyze {}", ticker));
            match analyzer.analyze(&ticker).await {
                Ok(report) => out.ticker(&report)?,
                Err(e) => return Ok(fail(&e)),
            }
        }

        Command::Compare { first, second } => {
            let _t = utils::Timer::start(format!("compare {} {}", first, second));
            match analyzer.compare(&first, &second).await {
                Ok(c) => out.emit(&c, render::comparison(&c))?,
                Err(e) => return Ok(fail(&e)),
            }
        }

        Command::Seasonality { ticker, .. } => {
            let Some(ticker) = ticker else {
                anyhow::bail!("seasonality needs a TICKER or --csv PATH");
            };
            let _t = utils::Timer::start(format!("seasonality {}", ticker));
            match analyzer.seasonality(&ticker).await {
                Ok(report) => out.seasonality(&report)?,
                Err(e) => return Ok(fail(&e)),
            }
        }

        Command::Interactive => interactive(&analyzer, &out).await?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Read-eval loop: each line is one lookup, sharing the cache.
async fn interactive(analyzer: &Analyzer, out: &Output) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"ticker> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else { break };
        let line = line.trim();

        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            [] => continue,
            [":quit"] | [":q"] => break,
            [":clear"] => analyzer.clear_cache().await,
            [":refresh", code] => {
                if let Err(e) = analyzer.invalidate(code).await {
                    println!("{}", render::failure(&e));
                }
            }
            [code] => {
                let _t = utils::Timer::start(format!("analyze {}", code));
                match analyzer.analyze(code).await {
                    Ok(report) => out.ticker(&report)?,
                    Err(e) => {
                        if !e.is_soft() {
                            warn!("{}", e);
                        }
                        println!("{}", render::failure(&e));
                    }
                }
            }
            _ => println!("Enter one ticker code, e.g. BBCA"),
        }
    }
    Ok(())
}

struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", text);
        }
        Ok(())
    }

    fn ticker(&self, report: &pipeline::TickerReport) -> Result<()> {
        self.emit(report, render::ticker_report(report))
    }

    fn seasonality(&self, report: &SeasonalityReport) -> Result<()> {
        self.emit(report, render::seasonality_report(report))
    }
}

/// Surface a lookup failure as one generic notice; details go to the log.
fn fail(err: &AnalyzerError) -> ExitCode {
    warn!("{}", err);
    eprintln!("{}", render::failure(err));
    ExitCode::FAILURE
}
