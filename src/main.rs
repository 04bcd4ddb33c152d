mod analytics;
mod api;
mod collect;
mod config;
mod errors;
mod exchange;
mod fetch;
mod models;
mod months;
mod table;

use std::sync::Arc;

use analytics::AnalyticsEngine;
use api::ApiServer;
use config::Config;
use exchange::deribit::Deribit;
use fetch::FundingFetcher;
use table::WideTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();

    tracing::info!(
        "Fundwatch starting — {} instruments, {} through {}, table {}",
        config.instruments.len(),
        config.start_month,
        config.end_month,
        config.csv_path.display()
    );

    let source = Deribit::new(config.api_base.clone(), config.http_timeout)?;

    // ── 1. Collect the monthly wide table (full fetch run) ─────────
    if config.refresh || !config.csv_path.exists() {
        let fetcher = FundingFetcher::new(
            &source,
            config.retries,
            config.retry_backoff,
            config.error_value,
        );
        let rows = collect::collect_monthly(
            &fetcher,
            &config.instruments,
            config.start_month,
            config.end_month,
            &config.csv_path,
            config.fetch_pause,
        )
        .await?;
        tracing::info!("collection finished: {rows} month rows");
    } else {
        tracing::info!("reusing existing table at {}", config.csv_path.display());
    }

    // ── 2. Load the table and write optional derived exports ───────
    let table = WideTable::load(&config.csv_path)?;
    if let Some(instrument) = &config.export_instrument {
        let path = config
            .csv_path
            .with_file_name(format!("{instrument}_monthly_totals.csv"));
        table.write_instrument_summary(&path, instrument)?;
        tracing::info!("wrote per-instrument export to {}", path.display());
    }

    // ── 3. Serve the dashboard API until Ctrl+C ────────────────────
    let engine = AnalyticsEngine::new(table);
    ApiServer::new(engine, Arc::new(source))
        .run(config.api_port)
        .await
}
