use std::path::Path;
use std::time::Duration;

use crate::errors::PipelineError;
use crate::fetch::FundingFetcher;
use crate::months::{Month, months_between};

/// Collects one funding value per (month, instrument) into a `;`-separated
/// wide CSV: one row per month, one column per instrument in caller order.
///
/// Input validation happens before the output file is touched. Each row is
/// written and flushed as soon as its month resolves, so killing the
/// process mid-run leaves a valid truncated table. Requests are strictly
/// sequential; `pause` is an optional courtesy delay after every fetch.
///
/// Returns the number of month rows written.
pub async fn collect_monthly(
    fetcher: &FundingFetcher<'_>,
    instruments: &[String],
    start: Month,
    end: Month,
    csv_path: &Path,
    pause: Duration,
) -> Result<usize, PipelineError> {
    let instruments: Vec<&str> = instruments
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if instruments.is_empty() {
        return Err(PipelineError::NoInstruments);
    }

    let windows = months_between(start, end)?;

    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(csv_path)?;
    let mut header = vec!["month", "start_timestamp_ms", "end_timestamp_ms"];
    header.extend(&instruments);
    writer.write_record(&header)?;
    writer.flush()?;

    for window in &windows {
        let mut row = vec![
            window.month.to_string(),
            window.start_ms.to_string(),
            window.end_ms.to_string(),
        ];
        for instrument in &instruments {
            let value = fetcher
                .value_or_sentinel(instrument, window.start_ms, window.end_ms)
                .await;
            row.push(value.to_string());

            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }
        writer.write_record(&row)?;
        writer.flush()?;

        tracing::info!(
            "collected {} ({} instruments)",
            window.month,
            instruments.len()
        );
    }

    Ok(windows.len())
}
