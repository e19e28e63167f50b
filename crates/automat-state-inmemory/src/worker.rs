use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use automat_core::{AutomatCommand, StateProcessor, StateWork};
use automat_monitoring::ProcessingMetrics;

/// Consumer tasks serving the command channel of one state
pub struct StateWorkerPool {
    state_name: String,
    handles: Vec<JoinHandle<()>>,
}

impl StateWorkerPool {
    /// Spawn `workers` tasks that share `receiver` and process every command
    /// with `processor`
    pub fn spawn(
        processor: Arc<StateProcessor>,
        receiver: mpsc::UnboundedReceiver<AutomatCommand>,
        work: Arc<dyn StateWork>,
        workers: usize,
    ) -> Self {
        let state_name = processor.state_name().to_string();
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers)
            .map(|worker_id| {
                let processor = processor.clone();
                let receiver = receiver.clone();
                let work = work.clone();

                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(command) = next else {
                            break;
                        };

                        let started = Instant::now();
                        let result = processor.process_command(command, work.as_ref()).await;
                        let step_result = result
                            .step_result()
                            .map(|r| r.to_string())
                            .unwrap_or_else(|| "NONE".to_string());

                        ProcessingMetrics::record_step(
                            processor.state_name(),
                            &step_result,
                            started.elapsed().as_millis() as u64,
                            result.is_success(),
                        );
                    }

                    debug!(state = %processor.state_name(), worker_id, "Command channel closed, worker stopped");
                })
            })
            .collect();

        ProcessingMetrics::record_workers_started(&state_name, workers);
        Self { state_name, handles }
    }

    /// Name of the served state
    pub fn state_name(&self) -> &str {
        &self.state_name
    }

    /// Number of worker tasks
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the pool has no worker tasks
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop all worker tasks
    pub fn shutdown(self) {
        info!(state = %self.state_name, "Stopping state workers");
        for handle in self.handles {
            handle.abort();
        }
    }

    /// Wait until every worker task has finished
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
