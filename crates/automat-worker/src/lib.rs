//! Container Automat worker
//!
//! Loads an automaton definition, starts the state workers it is configured
//! for, and optionally feeds inputs through the intake.

pub mod config;
pub mod error;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use automat_core::{
    AutomatEvent, DeterministicFiniteAutomaton, EventType, ProcessingInstance,
    ProcessingRequest, StateWork, WorkSimulator,
};
use automat_monitoring::ProcessingMetrics;
use automat_state_inmemory::{InMemoryAutomatProvider, StateWorkerPool};

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};

/// Final outcome of one processing instance
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOutcome {
    /// The processed instance
    pub instance: ProcessingInstance,
    /// The event that ended the processing
    pub final_event: AutomatEvent,
}

impl ProcessingOutcome {
    /// Whether the input was accepted
    pub fn is_accepted(&self) -> bool {
        self.final_event.event_type == EventType::FinishedInputAccepted
    }
}

/// A running set of state workers over in-memory ports
pub struct AutomatWorker {
    config: WorkerConfig,
    provider: InMemoryAutomatProvider,
    pools: Vec<StateWorkerPool>,
    event_logger: JoinHandle<()>,
    events_logged: Arc<AtomicU64>,
}

impl AutomatWorker {
    /// Load the configured automaton definition and start the workers
    pub async fn start(config: WorkerConfig) -> WorkerResult<Self> {
        let automaton = load_automaton(&config.dfa_path)?;
        let work = WorkSimulator::from_entropy(
            config.processing_min_duration_millis,
            config.processing_max_duration_millis,
        )?;
        Self::start_with(config, automaton, Arc::new(work)).await
    }

    /// Start the workers for an already loaded automaton and custom work
    pub async fn start_with(
        config: WorkerConfig,
        automaton: DeterministicFiniteAutomaton,
        work: Arc<dyn StateWork>,
    ) -> WorkerResult<Self> {
        config.validate()?;
        let provider = InMemoryAutomatProvider::new(Arc::new(automaton));

        let events_logged = Arc::new(AtomicU64::new(0));
        let event_logger = spawn_event_logger(
            provider.messaging().subscribe_events(),
            events_logged.clone(),
        );

        let pools = match &config.state_name {
            Some(state_name) => {
                warn!(
                    state = %state_name,
                    "Single-state mode over the in-memory transport only receives commands \
                     from this process; other states need an external transport"
                );
                vec![
                    provider
                        .start_state_workers(state_name, work, config.workers_per_state)
                        .await?,
                ]
            }
            None => {
                provider
                    .start_all_workers(work, config.workers_per_state)
                    .await?
            }
        };

        info!(
            states = pools.len(),
            workers_per_state = config.workers_per_state,
            "Automat worker started"
        );

        Ok(Self {
            config,
            provider,
            pools,
            event_logger,
            events_logged,
        })
    }

    /// The running configuration
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// The in-memory ports backing this worker
    pub fn provider(&self) -> &InMemoryAutomatProvider {
        &self.provider
    }

    /// Number of events seen by the event log so far
    pub fn events_logged(&self) -> u64 {
        self.events_logged.load(Ordering::Relaxed)
    }

    /// Submit every input and wait until each one was accepted, rejected or failed
    pub async fn process_inputs(
        &self,
        inputs: &[String],
        timeout: Duration,
    ) -> WorkerResult<Vec<ProcessingOutcome>> {
        if self.config.state_name.is_some() {
            return Err(WorkerError::ConfigurationError(
                "Inputs can only be processed when all states run in this worker".to_string(),
            ));
        }

        let mut events = self.provider.messaging().subscribe_events();
        let intake = self.provider.create_intake();

        let mut pending = Vec::with_capacity(inputs.len());
        for input in inputs {
            let instance = intake
                .submit(ProcessingRequest::new(input.clone(), "Submitted by automat-worker"))
                .await?;
            ProcessingMetrics::record_instance_created(
                &instance.processing_instance_id,
                instance.input.chars().count(),
            );
            pending.push(instance);
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        let deadline = tokio::time::Instant::now() + timeout;

        while !pending.is_empty() {
            let event = match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Ok(event)) => event,
                Ok(Err(RecvError::Lagged(skipped))) => {
                    warn!(skipped, "Event subscriber lagged behind");
                    continue;
                }
                Ok(Err(RecvError::Closed)) => {
                    return Err(WorkerError::RuntimeError("Event channel closed".to_string()));
                }
                Err(_) => {
                    return Err(WorkerError::ProcessingTimeout(
                        pending[0].processing_instance_id.clone(),
                    ));
                }
            };

            if !event.event_type.is_final() {
                continue;
            }
            if let Some(index) = pending
                .iter()
                .position(|i| i.processing_instance_id == event.processing_instance_id())
            {
                let instance = pending.swap_remove(index);
                info!(
                    instance_id = %instance.processing_instance_id,
                    input = %instance.input,
                    outcome = ?event.event_type,
                    state = %event.state_name,
                    "{}",
                    event.description
                );
                outcomes.push(ProcessingOutcome {
                    instance,
                    final_event: event,
                });
            }
        }

        Ok(outcomes)
    }

    /// Stop all workers
    pub fn shutdown(self) {
        for pool in self.pools {
            pool.shutdown();
        }
        self.event_logger.abort();
        automat_monitoring::shutdown();
    }
}

/// Load and validate an automaton definition file
pub fn load_automaton(path: impl AsRef<Path>) -> WorkerResult<DeterministicFiniteAutomaton> {
    let path = path.as_ref();
    let automaton = DeterministicFiniteAutomaton::from_path(path).map_err(|e| {
        WorkerError::AutomatonError(format!("{}: {}", path.display(), e))
    })?;

    info!(
        path = %path.display(),
        states = automaton.states().len(),
        start_state = %automaton.start_state(),
        "Automaton loaded"
    );
    Ok(automaton)
}

/// Time allowed for processing `inputs` with the configured work durations
pub fn processing_timeout(config: &WorkerConfig, inputs: &[String]) -> Duration {
    let longest = inputs.iter().map(|i| i.chars().count()).max().unwrap_or(0) as u64;
    // one step per symbol plus the finalization step, with slack for queueing
    let steps = (longest + 1) * inputs.len().max(1) as u64;
    Duration::from_millis(config
            .processing_max_duration_millis
            .saturating_mul(steps)
            .saturating_add(5_000))
}

/// Log every event published on the event channel
fn spawn_event_logger(
    mut events: broadcast::Receiver<AutomatEvent>,
    events_logged: Arc<AtomicU64>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    events_logged.fetch_add(1, Ordering::Relaxed);
                    info!(
                        instance_id = %event.processing_instance_id(),
                        event_type = ?event.event_type,
                        state = %event.state_name,
                        position = event.command.processing_position,
                        "{}",
                        event.description
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event log lagged behind");
                }
                Err(RecvError::Closed) => {
                    debug!("Event channel closed, event log stopped");
                    break;
                }
            }
        }
    })
}

/// Run the worker until interrupted, or until every given input is processed
pub async fn run(config: WorkerConfig, inputs: Vec<String>) -> WorkerResult<()> {
    let worker = AutomatWorker::start(config).await?;

    if inputs.is_empty() {
        info!("Waiting for commands, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
    } else {
        let timeout = processing_timeout(worker.config(), &inputs);
        let outcomes = worker.process_inputs(&inputs, timeout).await?;
        let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
        info!(
            processed = outcomes.len(),
            accepted,
            "All inputs processed"
        );
    }

    worker.shutdown();
    Ok(())
}
