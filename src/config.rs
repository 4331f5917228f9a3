use crate::scraper::fetch::USER_AGENT;
use crate::sources::SourceSettings;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Options shared by every subcommand. Each can also come from the
/// environment (or a `.env` file).
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// SQLite database file
    #[arg(long = "db", env = "IMMO_DB_PATH", default_value = "realestate.sqlite3", global = true)]
    pub db_path: PathBuf,

    /// Aggregated `url,source` CSV written after discovery
    #[arg(
        long = "artifact",
        env = "IMMO_ARTIFACT_PATH",
        default_value = "data/output/urls_aggregated.csv",
        global = true
    )]
    pub artifact_path: PathBuf,

    /// Pause between two requests to the same website, in milliseconds
    #[arg(long = "delay-ms", env = "IMMO_REQUEST_DELAY_MS", default_value_t = 300, global = true)]
    pub request_delay_ms: u64,

    /// Per-request deadline, in seconds
    #[arg(long = "timeout-secs", env = "IMMO_REQUEST_TIMEOUT_SECS", default_value_t = 20, global = true)]
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            request_delay: Duration::from_millis(self.request_delay_ms),
            timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: USER_AGENT.to_string(),
        }
    }
}
