use std::path::Path;

use crate::errors::PipelineError;
use crate::months::Month;

/// The persisted wide table, loaded into memory: one row per month
/// ascending, one numeric column per instrument. This is the sole
/// interchange format between the collector and the analytics layer.
#[derive(Debug, Clone)]
pub struct WideTable {
    instruments: Vec<String>,
    rows: Vec<WideRow>,
}

#[derive(Debug, Clone)]
pub struct WideRow {
    pub month: Month,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Parallel to the table's instrument list.
    pub values: Vec<f64>,
}

/// Melted form of one cell, for grouped aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub month: Month,
    pub instrument: String,
    pub value: f64,
}

impl WideTable {
    pub(crate) fn from_parts(instruments: Vec<String>, mut rows: Vec<WideRow>) -> Self {
        rows.sort_by_key(|r| r.month);
        Self { instruments, rows }
    }

    /// Reads a `;`-separated wide CSV written by the collector. Unparsable
    /// numeric cells coerce to 0.0; a row whose month label does not parse
    /// is a malformed table.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let mut columns = headers.iter();
        let meta = [columns.next(), columns.next(), columns.next()];
        if meta[0] != Some("month") {
            return Err(PipelineError::MalformedTable(format!(
                "expected leading 'month' column, found {:?}",
                meta[0]
            )));
        }
        let instruments: Vec<String> = columns.map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let label = record.get(0).unwrap_or_default();
            let month: Month = label
                .parse()
                .map_err(|_| PipelineError::MalformedTable(format!("bad month label '{label}'")))?;
            let start_ms = record.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
            let end_ms = record.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);
            let values = (0..instruments.len())
                .map(|i| {
                    record
                        .get(3 + i)
                        .and_then(|s| s.parse::<f64>().ok())
                        .unwrap_or(0.0)
                })
                .collect();
            rows.push(WideRow {
                month,
                start_ms,
                end_ms,
                values,
            });
        }

        Ok(Self::from_parts(instruments, rows))
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    pub fn instrument_index(&self, name: &str) -> Option<usize> {
        self.instruments.iter().position(|i| i == name)
    }

    /// Flattens to (month, instrument, value) triples, row-major.
    pub fn to_long(&self) -> Vec<LongRecord> {
        self.rows
            .iter()
            .flat_map(|row| {
                self.instruments
                    .iter()
                    .zip(&row.values)
                    .map(|(instrument, &value)| LongRecord {
                        month: row.month,
                        instrument: instrument.clone(),
                        value,
                    })
            })
            .collect()
    }

    /// Derived per-instrument export: `month;funding_total_pct`, with the
    /// monthly totals converted to percent.
    pub fn write_instrument_summary(
        &self,
        path: &Path,
        instrument: &str,
    ) -> Result<(), PipelineError> {
        let index = self
            .instrument_index(instrument)
            .ok_or_else(|| PipelineError::UnknownInstrument(instrument.to_string()))?;

        let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;
        writer.write_record(["month", "funding_total_pct"])?;
        for row in &self.rows {
            writer.write_record([
                row.month.to_string(),
                (row.values[index] * 100.0).to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::fetch::FundingFetcher;
    use crate::fetch::tests::ScriptedSource;

    fn temp_csv(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("fundwatch-table-{}-{name}.csv", std::process::id()))
    }

    fn write_file(name: &str, content: &str) -> PathBuf {
        let path = temp_csv(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_sorts_and_coerces() {
        // rows deliberately out of order, one junk cell
        let path = write_file(
            "load",
            "month;start_timestamp_ms;end_timestamp_ms;BTC-PERPETUAL;ETH-PERPETUAL\n\
             2023-02;1675209600000;1677628799999;-0.02;n/a\n\
             2023-01;1672531200000;1675209599999;0.01;0.002\n",
        );

        let table = WideTable::load(&path).unwrap();
        assert_eq!(table.instruments(), ["BTC-PERPETUAL", "ETH-PERPETUAL"]);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].month.to_string(), "2023-01");
        assert_eq!(table.rows()[1].values, vec![-0.02, 0.0]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn rejects_table_without_month_column() {
        let path = write_file("bad-header", "label;a;b;BTC-PERPETUAL\n2023-01;0;0;0.01\n");
        let err = WideTable::load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedTable(_)));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn long_records_are_row_major() {
        let path = write_file(
            "long",
            "month;start_timestamp_ms;end_timestamp_ms;A;B\n\
             2023-01;0;1;0.01;0.002\n\
             2023-02;2;3;-0.02;0.004\n",
        );
        let table = WideTable::load(&path).unwrap();
        let long = table.to_long();
        assert_eq!(long.len(), 4);
        assert_eq!(long[0].instrument, "A");
        assert_eq!(long[1].instrument, "B");
        assert_eq!(long[0].month, long[1].month);
        assert_eq!(long[2].value, -0.02);
        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn collected_table_round_trips_through_long_form() {
        let scripted = vec![Ok(0.01), Ok(0.002), Ok(-0.02), Ok(0.004), Ok(0.03), Ok(0.006)];
        let source = ScriptedSource::new(scripted);
        let fetcher = FundingFetcher::new(&source, 3, Duration::ZERO, 0.0);
        let path = temp_csv("round-trip");
        let instruments = vec!["BTC-PERPETUAL".to_string(), "ETH-PERPETUAL".to_string()];

        crate::collect::collect_monthly(
            &fetcher,
            &instruments,
            "2023-01".parse().unwrap(),
            "2023-03".parse().unwrap(),
            &path,
            Duration::ZERO,
        )
        .await
        .unwrap();

        let table = WideTable::load(&path).unwrap();

        // fold the long records back into a matrix and compare
        let mut folded = vec![vec![0.0; instruments.len()]; table.rows().len()];
        for record in table.to_long() {
            let row = table
                .rows()
                .iter()
                .position(|r| r.month == record.month)
                .unwrap();
            let col = table.instrument_index(&record.instrument).unwrap();
            folded[row][col] = record.value;
        }
        for (row, wide) in table.rows().iter().enumerate() {
            assert_eq!(folded[row], wide.values);
        }

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn instrument_summary_is_percent() {
        let path = write_file(
            "summary-src",
            "month;start_timestamp_ms;end_timestamp_ms;BTC-PERPETUAL\n\
             2023-01;0;1;0.01\n\
             2023-02;2;3;-0.005\n",
        );
        let table = WideTable::load(&path).unwrap();

        let out = temp_csv("summary-out");
        table
            .write_instrument_summary(&out, "BTC-PERPETUAL")
            .unwrap();

        let content = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "month;funding_total_pct");
        assert_eq!(lines[1], "2023-01;1");
        assert_eq!(lines[2], "2023-02;-0.5");

        assert!(
            table
                .write_instrument_summary(&out, "SOL-PERPETUAL")
                .is_err()
        );

        fs::remove_file(&path).unwrap();
        fs::remove_file(&out).unwrap();
    }
}
