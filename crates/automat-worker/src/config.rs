//! Configuration for the automat worker
//!
//! Values start from their defaults and are overridden by environment
//! variables. Unparsable values are ignored with a warning.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

use automat_core::application::work_simulator::{
    DEFAULT_MAX_DURATION_MILLIS, DEFAULT_MIN_DURATION_MILLIS,
};
use automat_monitoring::MonitoringConfig;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Path of the automaton definition (JSON)
    #[serde(default = "default_dfa_path")]
    pub dfa_path: String,

    /// State served by this worker; all states run locally when unset
    #[serde(default)]
    pub state_name: Option<String>,

    /// Lower bound of the simulated work duration
    #[serde(default = "default_min_duration")]
    pub processing_min_duration_millis: u64,

    /// Upper bound of the simulated work duration
    #[serde(default = "default_max_duration")]
    pub processing_max_duration_millis: u64,

    /// Consumer tasks per served state
    #[serde(default = "default_workers_per_state")]
    pub workers_per_state: usize,

    /// Log filter
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit JSON logs
    #[serde(default)]
    pub json_logging: bool,

    /// Deployment environment
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_dfa_path() -> String {
    "dfa.json".to_string()
}

fn default_min_duration() -> u64 {
    DEFAULT_MIN_DURATION_MILLIS
}

fn default_max_duration() -> u64 {
    DEFAULT_MAX_DURATION_MILLIS
}

fn default_workers_per_state() -> usize {
    1
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            dfa_path: default_dfa_path(),
            state_name: None,
            processing_min_duration_millis: default_min_duration(),
            processing_max_duration_millis: default_max_duration(),
            workers_per_state: default_workers_per_state(),
            log_filter: default_log_filter(),
            json_logging: false,
            environment: default_environment(),
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables
    pub fn load() -> WorkerResult<Self> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Monitoring settings read from the environment alone, so logging can
    /// be up before the rest of the configuration is loaded
    pub fn monitoring_from_env() -> MonitoringConfig {
        Self::monitoring_from(|key| env::var(key).ok())
    }

    /// Monitoring settings from an arbitrary variable lookup
    pub fn monitoring_from(lookup: impl Fn(&str) -> Option<String>) -> MonitoringConfig {
        let mut config = Self::default();
        config.apply_service_overrides(&lookup);
        config.monitoring_config()
    }

    // Overrides that never warn
    fn apply_service_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        if let Some(state_name) = lookup("AUTOMAT_STATE_NAME") {
            let state_name = state_name.trim();
            if !state_name.is_empty() {
                self.state_name = Some(state_name.to_string());
            }
        }

        if let Some(log_filter) = lookup("LOG_FILTER") {
            self.log_filter = log_filter;
        }

        if let Some(json) = lookup("LOG_JSON") {
            self.json_logging = json.to_lowercase() == "true" || json == "1";
        }

        if let Some(environment) = lookup("ENVIRONMENT") {
            self.environment = environment;
        }
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> WorkerResult<Self> {
        let mut config = Self::default();

        if let Some(dfa_path) = lookup("AUTOMAT_DFA_PATH") {
            config.dfa_path = dfa_path;
        }

        config.apply_service_overrides(&lookup);

        if let Some(min) = lookup("AUTOMAT_PROCESSING_MIN_DURATION_MILLIS") {
            if let Ok(min) = min.parse::<u64>() {
                config.processing_min_duration_millis = min;
            } else {
                warn!("Invalid AUTOMAT_PROCESSING_MIN_DURATION_MILLIS value: {}", min);
            }
        }

        if let Some(max) = lookup("AUTOMAT_PROCESSING_MAX_DURATION_MILLIS") {
            if let Ok(max) = max.parse::<u64>() {
                config.processing_max_duration_millis = max;
            } else {
                warn!("Invalid AUTOMAT_PROCESSING_MAX_DURATION_MILLIS value: {}", max);
            }
        }

        if let Some(workers) = lookup("AUTOMAT_WORKERS_PER_STATE") {
            if let Ok(workers) = workers.parse::<usize>() {
                config.workers_per_state = workers;
            } else {
                warn!("Invalid AUTOMAT_WORKERS_PER_STATE value: {}", workers);
            }
        }

        config.validate()?;

        info!(
            dfa_path = %config.dfa_path,
            state_name = ?config.state_name,
            workers_per_state = config.workers_per_state,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> WorkerResult<()> {
        if self.processing_max_duration_millis < self.processing_min_duration_millis {
            return Err(WorkerError::ConfigurationError(format!(
                "Maximum processing duration {}ms is below the minimum of {}ms",
                self.processing_max_duration_millis, self.processing_min_duration_millis
            )));
        }

        if self.workers_per_state == 0 {
            return Err(WorkerError::ConfigurationError(
                "At least one worker per state is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Monitoring settings derived from this configuration
    pub fn monitoring_config(&self) -> MonitoringConfig {
        let service_name = match &self.state_name {
            Some(state) => format!("automat-worker-{}", state),
            None => "automat-worker".to_string(),
        };

        MonitoringConfig {
            service_name,
            log_filter: self.log_filter.clone(),
            json_logging: self.json_logging,
            environment: self.environment.clone(),
        }
    }
}
