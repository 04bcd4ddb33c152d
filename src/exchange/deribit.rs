use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::FundingSource;
use crate::errors::FetchError;
use crate::models::FundingHistoryEntry;

/// The JSON-RPC envelope Deribit wraps every public endpoint in.
#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct Deribit {
    client: reqwest::Client,
    base_url: String,
}

impl Deribit {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// GETs one public endpoint and unwraps the JSON-RPC envelope.
    /// Deribit reports invalid-parameter errors as JSON-RPC error objects
    /// under HTTP 400, so the body is parsed regardless of status.
    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        instrument: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<T, FetchError> {
        let url = format!(
            "{}/api/v2/public/{endpoint}?instrument_name={instrument}&start_timestamp={start_ms}&end_timestamp={end_ms}",
            self.base_url
        );
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        let body = response.text().await?;

        let envelope: RpcEnvelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(FetchError::Parse(e)),
            Err(_) => {
                return Err(FetchError::UnexpectedData(format!(
                    "status {status}, unparseable body"
                )));
            }
        };

        if let Some(error) = envelope.error {
            return Err(FetchError::Api {
                code: error.code,
                message: error.message,
            });
        }

        envelope.result.ok_or_else(|| {
            FetchError::UnexpectedData(format!("status {status}, response missing result"))
        })
    }
}

#[async_trait]
impl FundingSource for Deribit {
    fn name(&self) -> &'static str {
        "deribit"
    }

    async fn funding_value(
        &self,
        instrument: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<f64, FetchError> {
        self.call("get_funding_rate_value", instrument, start_ms, end_ms)
            .await
    }

    async fn funding_history(
        &self,
        instrument: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<FundingHistoryEntry>, FetchError> {
        self.call("get_funding_rate_history", instrument, start_ms, end_ms)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_result() {
        let envelope: RpcEnvelope<f64> =
            serde_json::from_str(r#"{"jsonrpc":"2.0","result":0.0123,"usIn":1}"#).unwrap();
        assert_eq!(envelope.result, Some(0.0123));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn envelope_carries_structured_error() {
        let envelope: RpcEnvelope<f64> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid params"}}"#,
        )
        .unwrap();
        let error = envelope.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Invalid params");
    }

    #[test]
    fn history_entries_deserialize() {
        let envelope: RpcEnvelope<Vec<FundingHistoryEntry>> = serde_json::from_str(
            r#"{"result":[{"timestamp":1672531200000,"interest_8h":0.0001,"interest_1h":0.0000125,"index_price":16500.0}]}"#,
        )
        .unwrap();
        let entries = envelope.result.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, 1_672_531_200_000);
        assert!((entries[0].interest_8h - 0.0001).abs() < 1e-12);
    }
}
