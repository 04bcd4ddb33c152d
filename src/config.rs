use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::months::Month;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub instruments: Vec<String>,
    pub start_month: Month,
    pub end_month: Month,
    pub csv_path: PathBuf,
    pub retries: u32,
    pub retry_backoff: Duration,
    pub fetch_pause: Duration,
    pub error_value: f64,
    pub http_timeout: Duration,
    pub api_port: u16,
    pub refresh: bool,
    pub export_instrument: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_base = env::var("API_BASE").unwrap_or_else(|_| "https://www.deribit.com".to_string());

        // default to the two majors if INSTRUMENTS is not set
        let instruments = env::var("INSTRUMENTS")
            .unwrap_or_else(|_| "BTC-PERPETUAL,ETH-PERPETUAL".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let start_month = env::var("START_MONTH")
            .unwrap_or_else(|_| "2019-03".to_string())
            .parse::<Month>()
            .expect("START_MONTH must be YYYY-MM");

        let end_month = env::var("END_MONTH")
            .unwrap_or_else(|_| "2026-01".to_string())
            .parse::<Month>()
            .expect("END_MONTH must be YYYY-MM");

        let csv_path = env::var("CSV_PATH")
            .unwrap_or_else(|_| "funding_rate_value_monthly_wide.csv".to_string())
            .into();

        let retries = env::var("RETRIES")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u32>()
            .expect("RETRIES must be a non-negative integer");

        let retry_backoff = Duration::from_millis(
            env::var("RETRY_BACKOFF_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse::<u64>()
                .expect("RETRY_BACKOFF_MS must be milliseconds"),
        );

        let fetch_pause = Duration::from_millis(
            env::var("FETCH_PAUSE_MS")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<u64>()
                .expect("FETCH_PAUSE_MS must be milliseconds"),
        );

        let error_value = env::var("ERROR_VALUE")
            .unwrap_or_else(|_| "0.0".to_string())
            .parse::<f64>()
            .expect("ERROR_VALUE must be a number");

        let http_timeout = Duration::from_secs(
            env::var("HTTP_TIMEOUT_S")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .expect("HTTP_TIMEOUT_S must be seconds"),
        );

        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .expect("API_PORT must be a valid port number (1-65535)");

        let refresh = env::var("REFRESH")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let export_instrument = env::var("EXPORT_INSTRUMENT")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            api_base,
            instruments,
            start_month,
            end_month,
            csv_path,
            retries,
            retry_backoff,
            fetch_pause,
            error_value,
            http_timeout,
            api_port,
            refresh,
            export_instrument,
        }
    }
}
