//! Monitoring for Container Automat workers: structured logging and
//! per-step processing metrics.

use serde::{Deserialize, Serialize};
use tracing::info;

pub mod logging;
pub mod metrics;

/// Configuration for initializing the monitoring system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to startup logs
    pub service_name: String,
    /// Log level filter (e.g., "info,automat_core=debug"), used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Emit JSON formatted logs instead of pretty ones
    pub json_logging: bool,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "container-automat".to_string(),
            log_filter: "info".to_string(),
            json_logging: false,
            environment: "development".to_string(),
        }
    }
}

/// Initialize monitoring system
pub fn init(config: &MonitoringConfig) -> anyhow::Result<()> {
    logging::init_logging(config)?;

    info!(
        service_name = %config.service_name,
        environment = %config.environment,
        "Monitoring initialized"
    );

    Ok(())
}

/// Shutdown the monitoring system
pub fn shutdown() {
    info!("Shutting down monitoring system");
}

pub use crate::logging::{init_test_tracing, LogExt};
pub use crate::metrics::ProcessingMetrics;
