//! Processing metrics, emitted as structured log records

use tracing::info;

/// Metrics of the per-state command processing
pub struct ProcessingMetrics;

impl ProcessingMetrics {
    /// Record one processed command
    pub fn record_step(state: &str, step_result: &str, duration_ms: u64, success: bool) {
        info!(
            metric = "processing_step",
            state = %state,
            step_result = %step_result,
            duration_ms = duration_ms,
            success = success,
            "Processing Step: state={}, result={}, duration={}ms, success={}",
            state,
            step_result,
            duration_ms,
            success
        );
    }

    /// Record a newly created processing instance
    pub fn record_instance_created(instance_id: &str, input_len: usize) {
        info!(
            metric = "instance_created",
            instance_id = %instance_id,
            input_len = input_len,
            "Processing Instance Created: instance_id={}, input_len={}",
            instance_id,
            input_len
        );
    }

    /// Record the start of a state worker pool
    pub fn record_workers_started(state: &str, workers: usize) {
        info!(
            metric = "workers_started",
            state = %state,
            workers = workers,
            "State Workers Started: state={}, workers={}",
            state,
            workers
        );
    }
}
