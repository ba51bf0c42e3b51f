use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub realtime_url: String,
    pub max_file_bytes: u64,
    pub max_selection_files: usize,
    pub max_batch_bytes: u64,
    pub keepalive_interval: Duration,
    pub reconnect_backoff_initial: Duration,
    pub reconnect_backoff_cap: Duration,
    pub batch_stale_after: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            api_base_url: env::var("API_BASE_URL")?,
            realtime_url: env::var("REALTIME_URL")?,
            max_file_bytes: env_u64("MAX_FILE_BYTES", 100 * 1024 * 1024),
            max_selection_files: env_u64("MAX_SELECTION_FILES", 100) as usize,
            max_batch_bytes: env_u64("MAX_BATCH_BYTES", 50 * 1024 * 1024),
            keepalive_interval: Duration::from_secs(env_u64("KEEPALIVE_SECS", 30)),
            reconnect_backoff_initial: Duration::from_secs(1),
            reconnect_backoff_cap: Duration::from_secs(30),
            batch_stale_after: Duration::from_secs(env_u64("BATCH_STALE_SECS", 600)),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: "http://localhost:8080".to_string(),
            realtime_url: "ws://localhost:8080/ws".to_string(),
            max_file_bytes: 100 * 1024 * 1024,
            max_selection_files: 100,
            max_batch_bytes: 50 * 1024 * 1024,
            keepalive_interval: Duration::from_secs(30),
            reconnect_backoff_initial: Duration::from_secs(1),
            reconnect_backoff_cap: Duration::from_secs(30),
            batch_stale_after: Duration::from_secs(600),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
