//! Intake of new processing requests

use std::sync::Arc;
use tracing::info;

use crate::domain::{
    AutomatCommand, AutomatMessaging, AutomatStorage, DeterministicFiniteAutomaton,
    ProcessingInstance, ProcessingRequest,
};
use crate::CoreError;

/// Entry point for new processing requests
pub struct ProcessingIntake {
    automaton: Arc<DeterministicFiniteAutomaton>,
    messaging: Arc<dyn AutomatMessaging>,
    storage: Arc<dyn AutomatStorage>,
}

impl ProcessingIntake {
    /// Create a new intake service
    pub fn new(
        automaton: Arc<DeterministicFiniteAutomaton>,
        messaging: Arc<dyn AutomatMessaging>,
        storage: Arc<dyn AutomatStorage>,
    ) -> Self {
        Self {
            automaton,
            messaging,
            storage,
        }
    }

    /// Store a new processing instance and send its first command to the start state
    pub async fn submit(&self, request: ProcessingRequest) -> Result<ProcessingInstance, CoreError> {
        request.validate()?;

        let instance = self
            .storage
            .create_processing_instance(&request.description, &request.input)
            .await?;

        info!(
            instance_id = %instance.processing_instance_id,
            "New request processing instance {} for input {}.",
            instance.processing_instance_id,
            instance.input
        );

        let command = AutomatCommand::new(instance.processing_instance_id.clone(), instance.input.clone(), 0);
        self.messaging
            .send_command(self.automaton.start_state(), &command)
            .await?;

        Ok(instance)
    }
}
