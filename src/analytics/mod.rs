use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::months::Month;
use crate::table::WideTable;

/// Display unit for funding values. Storage is always decimal fractions;
/// conversion happens on the way out and never feeds back into the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Fraction,
    #[default]
    Percent,
    Bps,
}

impl Unit {
    pub fn factor(self) -> f64 {
        match self {
            Unit::Fraction => 1.0,
            Unit::Percent => 100.0,
            Unit::Bps => 10_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub month: Month,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentSeries {
    pub instrument: String,
    pub points: Vec<SeriesPoint>,
}

/// Per-instrument summary line of the quick-stats table. All values have
/// the unit transform applied; `yearly` is presented newest year first.
#[derive(Debug, Clone, Serialize)]
pub struct StatsRow {
    pub instrument: String,
    pub latest_month: f64,
    pub last_12m_sum: f64,
    pub total: f64,
    pub yearly: Vec<YearTotal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub total: f64,
}

/// Read-only aggregation over a loaded wide table. Every query recomputes
/// from the table rows; nothing here is persisted.
pub struct AnalyticsEngine {
    table: WideTable,
}

impl AnalyticsEngine {
    pub fn new(table: WideTable) -> Self {
        Self { table }
    }

    pub fn instruments(&self) -> &[String] {
        self.table.instruments()
    }

    /// First and last month of the table, if it has any rows.
    pub fn month_span(&self) -> Option<(Month, Month)> {
        let rows = self.table.rows();
        Some((rows.first()?.month, rows.last()?.month))
    }

    /// Resolves a selection to (column, name) pairs in selection order.
    /// Unknown names are ignored; an empty selection means every column.
    fn select<'a>(&'a self, selected: &'a [String]) -> Vec<(usize, &'a str)> {
        if selected.is_empty() {
            return self
                .table
                .instruments()
                .iter()
                .enumerate()
                .map(|(i, name)| (i, name.as_str()))
                .collect();
        }
        selected
            .iter()
            .filter_map(|name| {
                self.table
                    .instrument_index(name)
                    .map(|i| (i, name.as_str()))
            })
            .collect()
    }

    /// Monthly values per instrument. Annualization (×12) is a display
    /// transform layered on top of the unit conversion.
    pub fn monthly_series(
        &self,
        selected: &[String],
        unit: Unit,
        annualized: bool,
    ) -> Vec<InstrumentSeries> {
        let factor = unit.factor() * if annualized { 12.0 } else { 1.0 };
        self.select(selected)
            .into_iter()
            .map(|(col, name)| InstrumentSeries {
                instrument: name.to_string(),
                points: self
                    .table
                    .rows()
                    .iter()
                    .map(|row| SeriesPoint {
                        month: row.month,
                        value: row.values[col] * factor,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Running sum per instrument, restricted to the window
    /// [start, month-after-end). The cumulative state starts at zero inside
    /// the window regardless of any earlier history. An inverted range is
    /// normalized by swapping the boundaries.
    pub fn cumulative_window(
        &self,
        selected: &[String],
        start: Month,
        end: Month,
        unit: Unit,
    ) -> Vec<InstrumentSeries> {
        let (start, end) = normalize_range(start, end);
        let factor = unit.factor();
        self.select(selected)
            .into_iter()
            .map(|(col, name)| {
                let mut running = 0.0;
                InstrumentSeries {
                    instrument: name.to_string(),
                    points: self
                        .window_rows(start, end)
                        .map(|row| {
                            running += row.values[col];
                            SeriesPoint {
                                month: row.month,
                                value: running * factor,
                            }
                        })
                        .collect(),
                }
            })
            .collect()
    }

    /// Combined TOTAL trace for a selection: sum across the selected
    /// instruments per month first, then cumulate that single series.
    pub fn total_cumulative(
        &self,
        selected: &[String],
        start: Month,
        end: Month,
        unit: Unit,
    ) -> InstrumentSeries {
        let (start, end) = normalize_range(start, end);
        let columns = self.select(selected);
        let factor = unit.factor();
        let mut running = 0.0;
        InstrumentSeries {
            instrument: "TOTAL".to_string(),
            points: self
                .window_rows(start, end)
                .map(|row| {
                    running += columns.iter().map(|(col, _)| row.values[*col]).sum::<f64>();
                    SeriesPoint {
                        month: row.month,
                        value: running * factor,
                    }
                })
                .collect(),
        }
    }

    /// Quick stats per instrument, sorted by all-time total descending.
    /// The trailing 12-month sum counts rows, not calendar distance, and
    /// covers whatever history exists when shorter than 12 rows.
    pub fn stats(&self, selected: &[String], unit: Unit) -> Vec<StatsRow> {
        let factor = unit.factor();
        let rows = self.table.rows();

        let mut out: Vec<StatsRow> = self
            .select(selected)
            .into_iter()
            .map(|(col, name)| {
                let latest = rows.last().map(|r| r.values[col]).unwrap_or(0.0);
                let last_12m: f64 = rows.iter().rev().take(12).map(|r| r.values[col]).sum();
                let total: f64 = rows.iter().map(|r| r.values[col]).sum();

                let mut yearly: BTreeMap<i32, f64> = BTreeMap::new();
                for row in rows {
                    *yearly.entry(row.month.year()).or_insert(0.0) += row.values[col];
                }

                StatsRow {
                    instrument: name.to_string(),
                    latest_month: latest * factor,
                    last_12m_sum: last_12m * factor,
                    total: total * factor,
                    yearly: yearly
                        .into_iter()
                        .rev()
                        .map(|(year, total)| YearTotal {
                            year,
                            total: total * factor,
                        })
                        .collect(),
                }
            })
            .collect();

        out.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap());
        out
    }

    fn window_rows(&self, start: Month, end: Month) -> impl Iterator<Item = &crate::table::WideRow> {
        let end_exclusive = end.next();
        self.table
            .rows()
            .iter()
            .filter(move |row| row.month >= start && row.month < end_exclusive)
    }
}

fn normalize_range(start: Month, end: Month) -> (Month, Month) {
    if start <= end { (start, end) } else { (end, start) }
}
