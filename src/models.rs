use serde::{Deserialize, Serialize};

/// One raw funding-rate history sample as reported by the exchange.
/// `interest_8h` and `interest_1h` are decimal fractions, not percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingHistoryEntry {
    pub timestamp: i64,
    pub interest_8h: f64,
    pub interest_1h: f64,
    #[serde(default)]
    pub index_price: Option<f64>,
}
