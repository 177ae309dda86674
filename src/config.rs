use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub tick_interval: Duration,
    pub push_url: Option<String>,
    pub max_body_size: usize,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("REMINDERS_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid REMINDERS_HOST: {e}"))?;

        let port: u16 = env_or("REMINDERS_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid REMINDERS_PORT: {e}"))?;

        let data_dir = PathBuf::from(env_or("REMINDERS_DATA_DIR", "./data"));

        let storage_key = env_or("REMINDERS_STORAGE_KEY", crate::store::DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err("REMINDERS_STORAGE_KEY must not be empty".to_string());
        }

        let tick_secs: u64 = env_or("REMINDERS_TICK_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid REMINDERS_TICK_SECS: {e}"))?;
        if tick_secs == 0 {
            return Err("REMINDERS_TICK_SECS must be at least 1".to_string());
        }

        let push_url = std::env::var("REMINDERS_PUSH_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let max_body_size: usize = env_or("REMINDERS_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid REMINDERS_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("REMINDERS_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            data_dir,
            storage_key,
            tick_interval: Duration::from_secs(tick_secs),
            push_url,
            max_body_size,
            log_level,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
