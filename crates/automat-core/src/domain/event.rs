//! Progress events broadcast by state workers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::command::AutomatCommand;

/// Kind of progress a state worker reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// The worker started processing a command
    #[serde(rename = "STATE_PROCESSING_START")]
    Start,

    /// The worker handed processing on to the next state
    #[serde(rename = "STATE_PROCESSING_FINISHED_CONTINUE_PROCESS")]
    FinishedContinueProcess,

    /// The input was fully consumed in an accept state
    #[serde(rename = "STATE_PROCESSING_FINISHED_INPUT_ACCEPTED")]
    FinishedInputAccepted,

    /// The input was fully consumed in a non-accept state
    #[serde(rename = "STATE_PROCESSING_FINISHED_INPUT_REJECTED")]
    FinishedInputRejected,

    /// Processing of the command failed
    #[serde(rename = "STATE_PROCESSING_ERROR")]
    Error,
}

impl EventType {
    /// Whether the event ends the processing of an instance
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            EventType::FinishedInputAccepted | EventType::FinishedInputRejected | EventType::Error
        )
    }
}

/// Fact a state worker publishes about its progress on a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatEvent {
    /// Kind of event
    pub event_type: EventType,

    /// Name of the state that produced the event
    pub state_name: String,

    /// Instance, input and position the event is about
    #[serde(flatten)]
    pub command: AutomatCommand,

    /// Creation time
    pub event_time: DateTime<Utc>,

    /// Human readable details
    pub description: String,
}

impl AutomatEvent {
    /// Create an event stamped with the current time
    pub fn new(
        event_type: EventType,
        state_name: impl Into<String>,
        command: AutomatCommand,
        description: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            state_name: state_name.into(),
            command,
            event_time: Utc::now(),
            description: description.into(),
        }
    }

    /// Input symbol of the underlying command, if any
    pub fn current_input_symbol(&self) -> Option<char> {
        self.command.current_input_symbol()
    }

    /// Identifier of the processing instance the event belongs to
    pub fn processing_instance_id(&self) -> &str {
        &self.command.processing_instance_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_wire_names() {
        let names = vec![
            (EventType::Start, "\"STATE_PROCESSING_START\""),
            (
                EventType::FinishedContinueProcess,
                "\"STATE_PROCESSING_FINISHED_CONTINUE_PROCESS\"",
            ),
            (
                EventType::FinishedInputAccepted,
                "\"STATE_PROCESSING_FINISHED_INPUT_ACCEPTED\"",
            ),
            (
                EventType::FinishedInputRejected,
                "\"STATE_PROCESSING_FINISHED_INPUT_REJECTED\"",
            ),
            (EventType::Error, "\"STATE_PROCESSING_ERROR\""),
        ];

        for (event_type, expected) in names {
            assert_eq!(serde_json::to_string(&event_type).unwrap(), expected);
        }
    }

    #[test]
    fn test_final_event_types() {
        assert!(!EventType::Start.is_final());
        assert!(!EventType::FinishedContinueProcess.is_final());
        assert!(EventType::FinishedInputAccepted.is_final());
        assert!(EventType::FinishedInputRejected.is_final());
        assert!(EventType::Error.is_final());
    }

    #[test]
    fn test_event_carries_command_details() {
        let event = AutomatEvent::new(
            EventType::Start,
            "S1",
            AutomatCommand::new("id-7", "10", 1),
            "started",
        );

        assert_eq!(event.current_input_symbol(), Some('0'));
        assert_eq!(event.processing_instance_id(), "id-7");
        assert!(event.event_time <= Utc::now());
    }

    #[test]
    fn test_wire_format_is_flat() {
        let event = AutomatEvent::new(
            EventType::FinishedInputRejected,
            "S2",
            AutomatCommand::new("id-7", "101", 3),
            "rejected",
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventType"], "STATE_PROCESSING_FINISHED_INPUT_REJECTED");
        assert_eq!(json["processingInstanceId"], "id-7");
        assert_eq!(json["processingInput"], "101");
        assert_eq!(json["processingPosition"], 3);
        assert_eq!(json["stateName"], "S2");
        assert!(json["eventTime"].is_string());

        let parsed: AutomatEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }
}
