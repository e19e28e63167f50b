//! In-memory backends for Container Automat
//!
//! This crate provides in-process implementations of the storage and
//! messaging ports defined in automat-core, plus worker pools that bind a
//! state processor to its command channel. It is useful for development,
//! testing, and running a whole automaton inside a single process.

use std::sync::Arc;
use tracing::info;

pub mod messaging;
pub mod storage;
pub mod worker;

pub use messaging::InMemoryMessaging;
pub use storage::InMemoryProcessingStorage;
pub use worker::StateWorkerPool;

use automat_core::{
    AutomatMessaging, AutomatStorage, CoreError, DeterministicFiniteAutomaton, ProcessingIntake,
    StateProcessor, StateWork,
};

/// Provider of shared in-memory ports for one automaton
pub struct InMemoryAutomatProvider {
    automaton: Arc<DeterministicFiniteAutomaton>,
    storage: Arc<InMemoryProcessingStorage>,
    messaging: Arc<InMemoryMessaging>,
}

impl InMemoryAutomatProvider {
    /// Create a new provider with one command channel per automaton state
    pub fn new(automaton: Arc<DeterministicFiniteAutomaton>) -> Self {
        let messaging = Arc::new(InMemoryMessaging::new(&automaton));

        Self {
            automaton,
            storage: Arc::new(InMemoryProcessingStorage::default()),
            messaging,
        }
    }

    /// The automaton served by this provider
    pub fn automaton(&self) -> Arc<DeterministicFiniteAutomaton> {
        self.automaton.clone()
    }

    /// Concrete storage, for inspecting the audit trail
    pub fn storage(&self) -> Arc<InMemoryProcessingStorage> {
        self.storage.clone()
    }

    /// Concrete messaging, for subscribing to events
    pub fn messaging(&self) -> Arc<InMemoryMessaging> {
        self.messaging.clone()
    }

    /// Create the ports used by processors and the intake
    pub fn create_ports(&self) -> (Arc<dyn AutomatMessaging>, Arc<dyn AutomatStorage>) {
        let messaging: Arc<dyn AutomatMessaging> = self.messaging.clone();
        let storage: Arc<dyn AutomatStorage> = self.storage.clone();
        (messaging, storage)
    }

    /// Create a processor bound to `state_name`
    pub fn create_processor(&self, state_name: &str) -> Result<StateProcessor, CoreError> {
        let (messaging, storage) = self.create_ports();
        StateProcessor::new(self.automaton.clone(), state_name, messaging, storage)
    }

    /// Create the intake service
    pub fn create_intake(&self) -> ProcessingIntake {
        let (messaging, storage) = self.create_ports();
        ProcessingIntake::new(self.automaton.clone(), messaging, storage)
    }

    /// Start `workers` consumers for the command channel of `state_name`
    pub async fn start_state_workers(
        &self,
        state_name: &str,
        work: Arc<dyn StateWork>,
        workers: usize,
    ) -> Result<StateWorkerPool, CoreError> {
        let processor = Arc::new(self.create_processor(state_name)?);
        let receiver = self.messaging.take_command_receiver(state_name).await?;

        info!(state = %state_name, workers, "Starting state workers");
        Ok(StateWorkerPool::spawn(processor, receiver, work, workers))
    }

    /// Start worker pools for every state of the automaton
    pub async fn start_all_workers(
        &self,
        work: Arc<dyn StateWork>,
        workers_per_state: usize,
    ) -> Result<Vec<StateWorkerPool>, CoreError> {
        let mut pools = Vec::with_capacity(self.automaton.states().len());
        for state in self.automaton.states() {
            pools.push(
                self.start_state_workers(&state.name, work.clone(), workers_per_state)
                    .await?,
            );
        }
        Ok(pools)
    }
}

#[cfg(test)]
mod tests;
