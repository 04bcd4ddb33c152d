use serde::Serialize;

use crate::analytics::{InstrumentSeries, StatsRow, Unit};
use crate::models::FundingHistoryEntry;
use crate::months::Month;

/// Response for GET /instruments
#[derive(Serialize)]
pub struct InstrumentsResponse {
    pub instruments: Vec<String>,
}

/// Response for GET /monthly
#[derive(Serialize)]
pub struct MonthlyResponse {
    pub unit: Unit,
    pub annualized: bool,
    pub series: Vec<InstrumentSeries>,
}

/// Response for GET /cumulative. `start`/`end` echo the normalized window.
#[derive(Serialize)]
pub struct CumulativeResponse {
    pub start: Month,
    pub end: Month,
    pub unit: Unit,
    pub series: Vec<InstrumentSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<InstrumentSeries>,
}

/// Response for GET /stats
#[derive(Serialize)]
pub struct StatsResponse {
    pub unit: Unit,
    pub rows: Vec<StatsRow>,
}

/// Response for GET /history/{instrument}
#[derive(Serialize)]
pub struct HistoryResponse {
    pub instrument: String,
    pub entries: Vec<FundingHistoryEntry>,
}
