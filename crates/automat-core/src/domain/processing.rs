//! Durable audit records of a processing run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::{AutomatEvent, EventType};
use crate::CoreError;

/// Maximum length of a processing instance id
pub const MAX_INSTANCE_ID_LENGTH: usize = 40;
/// Maximum length of a processing input
pub const MAX_INPUT_LENGTH: usize = 500;
/// Maximum length of a processing description
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

/// One end-to-end run of the automaton over one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingInstance {
    /// Opaque identifier
    pub processing_instance_id: String,

    /// Creation time
    pub creation_time: DateTime<Utc>,

    /// The input word
    pub input: String,

    /// Caller supplied description
    pub description: String,
}

impl ProcessingInstance {
    /// Create a new instance with a generated id
    pub fn new(description: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            processing_instance_id: Uuid::new_v4().to_string(),
            creation_time: Utc::now(),
            input: input.into(),
            description: description.into(),
        }
    }
}

/// Outcome recorded on a processing step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepResult {
    /// Processing was handed on to the next state
    ContinueProcessing,
    /// The input was accepted
    InputAccepted,
    /// The input was rejected
    InputRejected,
    /// The step failed
    Error,
}

impl From<EventType> for StepResult {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::FinishedContinueProcess => StepResult::ContinueProcessing,
            EventType::FinishedInputAccepted => StepResult::InputAccepted,
            EventType::FinishedInputRejected => StepResult::InputRejected,
            // A step that never got past START has no outcome
            EventType::Start | EventType::Error => StepResult::Error,
        }
    }
}

impl std::fmt::Display for StepResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StepResult::ContinueProcessing => "CONTINUE_PROCESSING",
            StepResult::InputAccepted => "INPUT_ACCEPTED",
            StepResult::InputRejected => "INPUT_REJECTED",
            StepResult::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Audit record of one command handled by a state worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStep {
    /// Opaque identifier
    pub processing_step_id: String,
    /// Owning processing instance
    pub processing_instance_id: String,
    /// Position of the handled command
    pub processing_position: usize,
    /// Symbol consumed, empty for finalization steps
    pub input_symbol: String,
    /// State that handled the command
    pub state_name: String,
    /// When handling started
    pub start_time: DateTime<Utc>,
    /// Time of the event the step was built from
    pub end_time: DateTime<Utc>,
    /// Outcome
    pub step_result: StepResult,
    /// Description copied from the event
    pub description: String,
}

impl ProcessingStep {
    /// Build a step from the last event of a processing attempt
    pub fn from_event(start_time: DateTime<Utc>, event: &AutomatEvent) -> Self {
        Self {
            processing_step_id: Uuid::new_v4().to_string(),
            processing_instance_id: event.command.processing_instance_id.clone(),
            processing_position: event.command.processing_position,
            input_symbol: event
                .current_input_symbol()
                .map(String::from)
                .unwrap_or_default(),
            state_name: event.state_name.clone(),
            start_time,
            end_time: event.event_time,
            step_result: event.event_type.into(),
            description: event.description.clone(),
        }
    }
}

/// Request to start processing a new input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingRequest {
    /// The input word
    pub input: String,
    /// Caller supplied description
    #[serde(default)]
    pub description: String,
}

impl ProcessingRequest {
    /// Create a new request
    pub fn new(input: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            description: description.into(),
        }
    }

    /// Check the request against the storage field limits
    pub fn validate(&self) -> Result<(), CoreError> {
        let input_len = self.input.chars().count();
        if input_len > MAX_INPUT_LENGTH {
            return Err(CoreError::ValidationError(format!(
                "Input has {} characters, at most {} are allowed",
                input_len, MAX_INPUT_LENGTH
            )));
        }

        let description_len = self.description.chars().count();
        if description_len > MAX_DESCRIPTION_LENGTH {
            return Err(CoreError::ValidationError(format!(
                "Description has {} characters, at most {} are allowed",
                description_len, MAX_DESCRIPTION_LENGTH
            )));
        }

        Ok(())
    }
}
