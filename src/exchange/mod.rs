use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::FundingHistoryEntry;

pub mod deribit;

/// Capability interface for the upstream funding-rate API. The collector
/// and the fetch wrapper only see this trait, so tests can script a fake
/// source instead of hitting the network.
#[async_trait]
pub trait FundingSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Total funding-rate value over [start_ms, end_ms], as a decimal
    /// fraction of position value.
    async fn funding_value(
        &self,
        instrument: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<f64, FetchError>;

    /// Raw funding-rate history samples over [start_ms, end_ms].
    async fn funding_history(
        &self,
        instrument: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<FundingHistoryEntry>, FetchError>;
}
