use thiserror::Error;

/// Errors surfaced by the analyzer core.
///
/// Missing and non-numeric metrics are not here: they are recovered where
/// they are read (see [`crate::models::MetricIssue`]).
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("invalid ticker symbol: {0:?}")]
    InvalidSymbol(String),

    /// Too few usable prices to compute any return. Shown as a note, not a failure.
    #[error("insufficient price history for {symbol}: {samples} usable samples")]
    InsufficientSeries { symbol: String, samples: usize },

    #[error("data source failure for {symbol}: {reason}")]
    DataSourceFailure { symbol: String, reason: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl AnalyzerError {
    /// Message shown to the end user. Provider details stay in the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidSymbol(raw) => format!("'{}' is not a valid ticker code.", raw.trim()),
            Self::InsufficientSeries { .. } => {
                "Not enough price history for seasonality analysis.".to_string()
            }
            Self::DataSourceFailure { .. } | Self::MalformedResponse(_) => {
                "Stock data not found or the data source is having problems.".to_string()
            }
        }
    }

    pub fn is_soft(&self) -> bool {
        matches!(self, Self::InsufficientSeries { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
