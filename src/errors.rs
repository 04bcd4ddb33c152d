use thiserror::Error;

use crate::months::Month;

/// Failures from a single upstream request. Everything except `Api` is
/// transient and eligible for retry; `Api` is the exchange telling us the
/// query itself is bad (unlisted instrument, pre-listing window) and a
/// retry cannot change the answer.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected data from exchange: {0}")]
    UnexpectedData(String),

    #[error("Exchange API error {code}: {message}")]
    Api { code: i64, message: String },
}

impl FetchError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, FetchError::Api { .. })
    }
}

/// Fatal errors of the collection pipeline. These surface before or during
/// table I/O; per-request failures never reach this level (they collapse to
/// the configured sentinel value instead).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),

    #[error("start month {start} is after end month {end}")]
    InvalidRange { start: Month, end: Month },

    #[error("no instruments provided")]
    NoInstruments,

    #[error("instrument '{0}' is not a column of the table")]
    UnknownInstrument(String),

    #[error("malformed table: {0}")]
    MalformedTable(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
