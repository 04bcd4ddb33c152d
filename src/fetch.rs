use std::time::Duration;

use crate::exchange::FundingSource;

/// Wraps a [`FundingSource`] with bounded retries and a sentinel fallback,
/// so one bad (instrument, month) pair can never abort a collection run.
///
/// `retries` counts total attempts. Transient failures sleep
/// `backoff * attempt` between attempts (linear, not exponential);
/// permanent API errors short-circuit to the sentinel without retrying.
pub struct FundingFetcher<'a> {
    source: &'a dyn FundingSource,
    retries: u32,
    backoff: Duration,
    sentinel: f64,
}

impl<'a> FundingFetcher<'a> {
    pub fn new(source: &'a dyn FundingSource, retries: u32, backoff: Duration, sentinel: f64) -> Self {
        Self {
            source,
            retries,
            backoff,
            sentinel,
        }
    }

    /// Fetches one month's funding value, collapsing every failure mode to
    /// the sentinel. Never returns an error.
    pub async fn value_or_sentinel(&self, instrument: &str, start_ms: i64, end_ms: i64) -> f64 {
        for attempt in 1..=self.retries {
            match self.source.funding_value(instrument, start_ms, end_ms).await {
                Ok(value) => return value,
                Err(e) if e.is_permanent() => {
                    tracing::debug!(
                        "[{}] {instrument}: {e}, recording no data",
                        self.source.name()
                    );
                    return self.sentinel;
                }
                Err(e) => {
                    tracing::warn!(
                        "[{}] {instrument} attempt {attempt}/{}: {e}",
                        self.source.name(),
                        self.retries
                    );
                    if attempt < self.retries {
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                }
            }
        }

        tracing::warn!(
            "[{}] {instrument}: retries exhausted, recording no data",
            self.source.name()
        );
        self.sentinel
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::errors::FetchError;
    use crate::models::FundingHistoryEntry;

    /// Fake source that replays a scripted sequence of outcomes and counts
    /// how many requests were issued.
    pub(crate) struct ScriptedSource {
        responses: Mutex<VecDeque<Result<f64, FetchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub(crate) fn new(responses: Vec<Result<f64, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FundingSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn funding_value(
            &self,
            _instrument: &str,
            _start_ms: i64,
            _end_ms: i64,
        ) -> Result<f64, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::UnexpectedData("script exhausted".into())))
        }

        async fn funding_history(
            &self,
            _instrument: &str,
            _start_ms: i64,
            _end_ms: i64,
        ) -> Result<Vec<FundingHistoryEntry>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn transient() -> FetchError {
        FetchError::UnexpectedData("connection timed out".into())
    }

    fn permanent() -> FetchError {
        FetchError::Api {
            code: -32602,
            message: "Invalid params".into(),
        }
    }

    #[tokio::test]
    async fn returns_value_on_first_success() {
        let source = ScriptedSource::new(vec![Ok(0.0123)]);
        let fetcher = FundingFetcher::new(&source, 3, Duration::ZERO, 0.0);
        assert_eq!(fetcher.value_or_sentinel("BTC-PERPETUAL", 0, 1).await, 0.0123);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn permanent_error_yields_sentinel_without_retry() {
        let source = ScriptedSource::new(vec![Err(permanent())]);
        let fetcher = FundingFetcher::new(&source, 3, Duration::ZERO, 0.0);
        assert_eq!(fetcher.value_or_sentinel("BTC-PERPETUAL", 0, 1).await, 0.0);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn transient_errors_retry_to_the_bound_then_sentinel() {
        let source = ScriptedSource::new(vec![Err(transient()), Err(transient()), Err(transient())]);
        let fetcher = FundingFetcher::new(&source, 3, Duration::ZERO, -1.0);
        assert_eq!(fetcher.value_or_sentinel("BTC-PERPETUAL", 0, 1).await, -1.0);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn transient_error_then_success_recovers() {
        let source = ScriptedSource::new(vec![Err(transient()), Ok(0.002)]);
        let fetcher = FundingFetcher::new(&source, 3, Duration::ZERO, 0.0);
        assert_eq!(fetcher.value_or_sentinel("ETH-PERPETUAL", 0, 1).await, 0.002);
        assert_eq!(source.calls(), 2);
    }
}
