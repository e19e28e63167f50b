//! Commands exchanged between state workers

use serde::{Deserialize, Serialize};

/// Instruction addressed to the worker role of exactly one state.
///
/// A command at position `p` asks the receiving state to consume the symbol at
/// index `p` of `processing_input`. A position equal to the input length marks
/// the finalization command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatCommand {
    /// Identifier of the processing instance
    pub processing_instance_id: String,

    /// The complete input word
    pub processing_input: String,

    /// Index of the next symbol to consume
    pub processing_position: usize,
}

impl AutomatCommand {
    /// Create a new command
    pub fn new(
        processing_instance_id: impl Into<String>,
        processing_input: impl Into<String>,
        processing_position: usize,
    ) -> Self {
        Self {
            processing_instance_id: processing_instance_id.into(),
            processing_input: processing_input.into(),
            processing_position,
        }
    }

    /// Whether a symbol remains to be consumed at the current position
    pub fn has_input_symbol(&self) -> bool {
        self.processing_position < self.input_len()
    }

    /// The symbol at the current position, if any
    pub fn current_input_symbol(&self) -> Option<char> {
        self.processing_input.chars().nth(self.processing_position)
    }

    /// Whether this command finalizes the processing
    pub fn is_processing_end_command(&self) -> bool {
        !self.has_input_symbol()
    }

    /// The command for the following position
    pub fn next_command(&self) -> AutomatCommand {
        AutomatCommand {
            processing_instance_id: self.processing_instance_id.clone(),
            processing_input: self.processing_input.clone(),
            processing_position: self.processing_position + 1,
        }
    }

    fn input_len(&self) -> usize {
        self.processing_input.chars().count()
    }
}
