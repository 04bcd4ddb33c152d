use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use super::AppState;
use super::models::{
    CumulativeResponse, HistoryResponse, InstrumentsResponse, MonthlyResponse, StatsResponse,
};
use crate::analytics::Unit;
use crate::months::Month;

/// GET /health — simple liveness check
pub async fn health() -> &'static str {
    "OK"
}

/// Comma-separated instrument filter; empty means every table column.
fn parse_selection(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// GET /instruments — the loaded table's columns
pub async fn instruments(State(state): State<AppState>) -> Json<InstrumentsResponse> {
    Json(InstrumentsResponse {
        instruments: state.engine.instruments().to_vec(),
    })
}

#[derive(Deserialize)]
pub struct MonthlyQuery {
    instruments: Option<String>,
    #[serde(default)]
    unit: Unit,
    #[serde(default)]
    annualized: bool,
}

/// GET /monthly — per-instrument monthly series
pub async fn monthly(
    State(state): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> Json<MonthlyResponse> {
    let selected = parse_selection(query.instruments.as_deref());
    Json(MonthlyResponse {
        unit: query.unit,
        annualized: query.annualized,
        series: state
            .engine
            .monthly_series(&selected, query.unit, query.annualized),
    })
}

#[derive(Deserialize)]
pub struct CumulativeQuery {
    instruments: Option<String>,
    start: Option<Month>,
    end: Option<Month>,
    #[serde(default)]
    unit: Unit,
    #[serde(default = "default_true")]
    total: bool,
}

fn default_true() -> bool {
    true
}

/// GET /cumulative — windowed cumulative series, optional TOTAL trace
pub async fn cumulative(
    State(state): State<AppState>,
    Query(query): Query<CumulativeQuery>,
) -> Result<Json<CumulativeResponse>, StatusCode> {
    let Some((first, last)) = state.engine.month_span() else {
        return Err(StatusCode::NOT_FOUND);
    };
    let mut start = query.start.unwrap_or(first);
    let mut end = query.end.unwrap_or(last);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    let selected = parse_selection(query.instruments.as_deref());

    let series = state
        .engine
        .cumulative_window(&selected, start, end, query.unit);
    let total = query
        .total
        .then(|| state.engine.total_cumulative(&selected, start, end, query.unit));

    Ok(Json(CumulativeResponse {
        start,
        end,
        unit: query.unit,
        series,
        total,
    }))
}

#[derive(Deserialize)]
pub struct StatsQuery {
    instruments: Option<String>,
    #[serde(default)]
    unit: Unit,
}

/// GET /stats — the quick-stats table
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Json<StatsResponse> {
    let selected = parse_selection(query.instruments.as_deref());
    Json(StatsResponse {
        unit: query.unit,
        rows: state.engine.stats(&selected, query.unit),
    })
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    start_timestamp: i64,
    end_timestamp: i64,
}

/// GET /history/{instrument} — raw funding-rate history passthrough
pub async fn history(
    State(state): State<AppState>,
    Path(instrument): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, StatusCode> {
    match state
        .source
        .funding_history(&instrument, query.start_timestamp, query.end_timestamp)
        .await
    {
        Ok(entries) => Ok(Json(HistoryResponse {
            instrument,
            entries,
        })),
        Err(e) if e.is_permanent() => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("[{}] history fetch failed: {e}", state.source.name());
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}
