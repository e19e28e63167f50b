//! Per-state command processing
//!
//! A [`StateProcessor`] is bound to exactly one automaton state. For every
//! command it publishes a START event, performs the injected work, then
//! either finalizes the run (accept or reject) or hands processing on to the
//! next state. Whatever happens, exactly one processing step is stored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::{
    AutomatCommand, AutomatEvent, AutomatMessaging, AutomatStorage, DeterministicFiniteAutomaton,
    EventType, ProcessingStep, StepResult,
};
use crate::CoreError;

const AMBIGUOUS_SITUATION_MESSAGE: &str = "Ambiguous processing situation. Error event explicitly created for processing step because of missing event information.";

/// Summary of the domain work done for one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkResult {
    /// Human readable description of the work
    pub description: String,
    /// How long the work took
    pub duration_millis: u64,
}

impl WorkResult {
    /// Create a new work result
    pub fn new(description: impl Into<String>, duration_millis: u64) -> Self {
        Self {
            description: description.into(),
            duration_millis,
        }
    }
}

/// Domain work performed by a state worker for each command
#[async_trait]
pub trait StateWork: Send + Sync {
    /// Perform the work for `command`
    async fn perform(&self, command: &AutomatCommand) -> Result<WorkResult, CoreError>;
}

/// Where processing continues after a non-final command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingContinuation {
    /// State the next command was sent to
    pub next_state: String,
    /// The command that was sent
    pub next_command: AutomatCommand,
}

/// Everything that happened while processing one command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was processed
    pub processed_command: AutomatCommand,
    /// Result of the injected work, if it ran successfully
    pub work_result: Option<WorkResult>,
    /// Set once the next command was handed to the messaging port
    pub continuation: Option<ProcessingContinuation>,
    /// Last event the messaging port accepted, or the error event that
    /// ended processing after START went out
    pub last_event: Option<AutomatEvent>,
    /// Whether the most recent publish attempt succeeded
    pub last_event_sent: bool,
    /// The stored processing step
    pub processing_step: Option<ProcessingStep>,
    /// First error that occurred
    pub error: Option<CoreError>,
}

impl ProcessingResult {
    fn new(processed_command: AutomatCommand) -> Self {
        Self {
            processed_command,
            work_result: None,
            continuation: None,
            last_event: None,
            last_event_sent: false,
            processing_step: None,
            error: None,
        }
    }

    /// Record an error unless an earlier one is already present
    pub fn record_error(&mut self, error: CoreError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Whether the command was processed without any error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Outcome of the stored step
    pub fn step_result(&self) -> Option<StepResult> {
        self.processing_step.as_ref().map(|step| step.step_result)
    }
}

/// Processes the commands addressed to one automaton state
pub struct StateProcessor {
    automaton: Arc<DeterministicFiniteAutomaton>,
    state_name: String,
    messaging: Arc<dyn AutomatMessaging>,
    storage: Arc<dyn AutomatStorage>,
}

impl StateProcessor {
    /// Bind a new processor to `state_name`.
    ///
    /// Fails with [`CoreError::ConfigurationError`] if the state is not part
    /// of the automaton.
    pub fn new(
        automaton: Arc<DeterministicFiniteAutomaton>,
        state_name: impl Into<String>,
        messaging: Arc<dyn AutomatMessaging>,
        storage: Arc<dyn AutomatStorage>,
    ) -> Result<Self, CoreError> {
        let state_name = state_name.into();
        automaton
            .get_state(&state_name)
            .map_err(|e| CoreError::ConfigurationError(e.to_string()))?;

        Ok(Self {
            automaton,
            state_name,
            messaging,
            storage,
        })
    }

    /// Name of the bound state
    pub fn state_name(&self) -> &str {
        &self.state_name
    }

    /// The automaton the processor works on
    pub fn automaton(&self) -> &DeterministicFiniteAutomaton {
        &self.automaton
    }

    /// Process one command. Never fails; problems are reported on the result.
    pub async fn process_command(
        &self,
        command: AutomatCommand,
        work: &dyn StateWork,
    ) -> ProcessingResult {
        let start_time = Utc::now();
        let mut result = ProcessingResult::new(command);

        self.log_processing_start(&result.processed_command);

        if let Err(e) = self.run(work, &mut result).await {
            self.handle_error(e, &mut result).await;
        }

        self.store_processing_step(start_time, &mut result).await;
        result
    }

    async fn run(&self, work: &dyn StateWork, result: &mut ProcessingResult) -> Result<(), CoreError> {
        let command = result.processed_command.clone();

        self.send_event(&command, EventType::Start, String::new(), result)
            .await?;

        let work_result = work.perform(&command).await?;
        let work_description = work_result.description.clone();
        result.work_result = Some(work_result);

        let Some(symbol) = command.current_input_symbol() else {
            return self.finish_processing(&command, &work_description, result).await;
        };

        let transition = self
            .automaton
            .get_transition(&self.state_name, &symbol.to_string())?;
        let next_state = transition.subsequent_state_name.clone();
        let next_command = command.next_command();

        self.messaging.send_command(&next_state, &next_command).await?;
        debug!(
            instance_id = %command.processing_instance_id,
            state = %self.state_name,
            next_state = %next_state,
            position = next_command.processing_position,
            "Next command sent"
        );

        let description = match next_command.current_input_symbol() {
            None => format!(
                "Processing continues with finalization at final state {}. Processing message: {}",
                next_state, work_description
            ),
            Some(next_symbol) => format!(
                "Processing continues with input symbol {} at state {}. Processing message: {}",
                next_symbol, next_state, work_description
            ),
        };
        result.continuation = Some(ProcessingContinuation {
            next_state,
            next_command,
        });

        self.send_event(&command, EventType::FinishedContinueProcess, description, result)
            .await
    }

    async fn finish_processing(
        &self,
        command: &AutomatCommand,
        work_description: &str,
        result: &mut ProcessingResult,
    ) -> Result<(), CoreError> {
        let (event_type, description) = if self.automaton.is_accept_state(&self.state_name) {
            (
                EventType::FinishedInputAccepted,
                format!("Instance input accepted. Processing message: {}", work_description),
            )
        } else {
            (
                EventType::FinishedInputRejected,
                format!("Instance input rejected. Processing message: {}", work_description),
            )
        };

        self.send_event(command, event_type, description, result).await
    }

    async fn handle_error(&self, error: CoreError, result: &mut ProcessingResult) {
        warn!(
            instance_id = %result.processed_command.processing_instance_id,
            state = %self.state_name,
            position = result.processed_command.processing_position,
            error = %error,
            "Command processing failed"
        );

        let description = error.describe();
        result.record_error(error);

        let command = result.processed_command.clone();
        let event = AutomatEvent::new(EventType::Error, self.state_name.clone(), command, description);

        // The stored step must carry the error text even when the event is lost
        if result.last_event.is_some() {
            result.last_event = Some(event.clone());
        }

        result.last_event_sent = false;
        match self.messaging.send_event(&event).await {
            Ok(()) => {
                result.last_event_sent = true;
                result.last_event = Some(event);
            }
            Err(e) => {
                error!(
                    instance_id = %event.command.processing_instance_id,
                    state = %self.state_name,
                    error = %e,
                    "Failed to publish error event, reporting original error"
                );
            }
        }
    }

    async fn send_event(
        &self,
        command: &AutomatCommand,
        event_type: EventType,
        description: String,
        result: &mut ProcessingResult,
    ) -> Result<(), CoreError> {
        let event = AutomatEvent::new(event_type, self.state_name.clone(), command.clone(), description);

        result.last_event_sent = false;
        self.messaging.send_event(&event).await?;
        result.last_event_sent = true;
        result.last_event = Some(event);
        Ok(())
    }

    async fn store_processing_step(&self, start_time: DateTime<Utc>, result: &mut ProcessingResult) {
        let event = match result.last_event.clone() {
            Some(event) => event,
            None => self.fallback_event(result).await,
        };

        match self.storage.create_processing_step(start_time, &event).await {
            Ok(step) => {
                result.processing_step = Some(step);
            }
            Err(e) => {
                if result.error.is_some() {
                    error!(
                        instance_id = %event.command.processing_instance_id,
                        state = %self.state_name,
                        error = %e,
                        "Failed to store processing step, reporting original error"
                    );
                } else {
                    error!(
                        instance_id = %event.command.processing_instance_id,
                        state = %self.state_name,
                        error = %e,
                        "Failed to store processing step"
                    );
                }
                result.record_error(e);
            }
        }
    }

    async fn fallback_event(&self, result: &mut ProcessingResult) -> AutomatEvent {
        warn!(
            instance_id = %result.processed_command.processing_instance_id,
            state = %self.state_name,
            "No event recorded for command, storing error step"
        );

        let event = AutomatEvent::new(
            EventType::Error,
            self.state_name.clone(),
            result.processed_command.clone(),
            AMBIGUOUS_SITUATION_MESSAGE,
        );

        match self.messaging.send_event(&event).await {
            Ok(()) => {
                result.last_event_sent = true;
                result.last_event = Some(event.clone());
            }
            Err(e) => {
                result.last_event_sent = false;
                debug!(error = %e, "Fallback error event not published");
            }
        }

        event
    }

    fn log_processing_start(&self, command: &AutomatCommand) {
        match command.current_input_symbol() {
            None => info!(
                instance_id = %command.processing_instance_id,
                state = %self.state_name,
                position = command.processing_position,
                "Finalizing the processing of instance {} input {} at position {}.",
                command.processing_instance_id,
                command.processing_input,
                command.processing_position
            ),
            Some(symbol) => info!(
                instance_id = %command.processing_instance_id,
                state = %self.state_name,
                position = command.processing_position,
                "Processing input symbol {} at position {} of instance {} input {}.",
                symbol,
                command.processing_position,
                command.processing_instance_id,
                command.processing_input
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_keeps_first() {
        let mut result = ProcessingResult::new(AutomatCommand::new("id", "0", 0));
        assert!(result.is_success());

        result.record_error(CoreError::WorkError("first".to_string()));
        result.record_error(CoreError::StorageError("second".to_string()));

        assert!(!result.is_success());
        assert_eq!(result.error, Some(CoreError::WorkError("first".to_string())));
    }
}
