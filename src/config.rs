// config.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tokio::time::Duration;

use crate::global_variables::{
    ALLOCATION_LOG_FILE, AMQP_URL, DEFAULT_SOLVE_TIMEOUT_MS, QUEUE_DEMAND_REPORTS,
    QUEUE_SIGNAL_PLANS,
};
use crate::shared_data::CycleConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings for the message-driven optimizer and the sensor feed.
/// Any field left out of the JSON file takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub amqp_url: String,
    pub demand_queue: String,
    pub plan_queue: String,
    pub solve_timeout_ms: u64,
    pub plan_log_path: String,
    pub cycle: CycleConfig,
}

impl ServiceConfig {
    pub fn solve_timeout(&self) -> Duration {
        Duration::from_millis(self.solve_timeout_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            amqp_url: AMQP_URL.to_string(),
            demand_queue: QUEUE_DEMAND_REPORTS.to_string(),
            plan_queue: QUEUE_SIGNAL_PLANS.to_string(),
            solve_timeout_ms: DEFAULT_SOLVE_TIMEOUT_MS,
            plan_log_path: ALLOCATION_LOG_FILE.to_string(),
            cycle: CycleConfig::default(),
        }
    }
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

/// Reads a `CycleConfig` such as `{"total_cycle_time": 90, "min_green_time": 8}`.
pub fn load_cycle_config(path: impl AsRef<Path>) -> Result<CycleConfig, ConfigError> {
    load_json(path.as_ref())
}

pub fn load_service_config(path: impl AsRef<Path>) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = load_json(path.as_ref())?;
    log::debug!("Loaded service config: {:?}", config);
    Ok(config)
}

/// Loads from `path` when one is given, otherwise falls back to defaults.
pub fn service_config_or_default(path: Option<&str>) -> Result<ServiceConfig, ConfigError> {
    match path {
        Some(p) => load_service_config(p),
        None => Ok(ServiceConfig::default()),
    }
}
