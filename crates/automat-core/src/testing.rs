use async_trait::async_trait;

use crate::application::{StateWork, WorkResult};
use crate::domain::{AutomatCommand, DeterministicFiniteAutomaton};
use crate::CoreError;

/// Automaton accepting words over `{0, 1}` with an even number of zeros
pub const EVEN_ZEROS_DFA_JSON: &str = r#"{
  "alphabet": [
    { "symbol": "0", "description": "Zero" },
    { "symbol": "1", "description": "One" }
  ],
  "states": [
    { "name": "S1", "description": "Even number of zeros read." },
    { "name": "S2", "description": "Odd number of zeros read." }
  ],
  "transitions": [
    { "currentStateName": "S1", "inputSymbol": "0", "subsequentStateName": "S2", "description": "" },
    { "currentStateName": "S1", "inputSymbol": "1", "subsequentStateName": "S1", "description": "" },
    { "currentStateName": "S2", "inputSymbol": "0", "subsequentStateName": "S1", "description": "" },
    { "currentStateName": "S2", "inputSymbol": "1", "subsequentStateName": "S2", "description": "" }
  ],
  "startState": "S1",
  "acceptStates": ["S1"],
  "description": "Test version of DFA for checking input of an even number of zeros."
}"#;

/// The even-zeros automaton
pub fn even_zeros_automaton() -> DeterministicFiniteAutomaton {
    DeterministicFiniteAutomaton::from_json(EVEN_ZEROS_DFA_JSON)
        .expect("sample automaton definition is valid")
}

/// Work that completes immediately with a fixed description
#[derive(Debug, Clone)]
pub struct FixedWork(pub String);

impl FixedWork {
    /// Create fixed work reporting `description`
    pub fn new(description: impl Into<String>) -> Self {
        Self(description.into())
    }
}

#[async_trait]
impl StateWork for FixedWork {
    async fn perform(&self, _command: &AutomatCommand) -> Result<WorkResult, CoreError> {
        Ok(WorkResult::new(self.0.clone(), 0))
    }
}

/// Work that always fails with the given error
#[derive(Debug, Clone)]
pub struct FailingWork(pub CoreError);

#[async_trait]
impl StateWork for FailingWork {
    async fn perform(&self, _command: &AutomatCommand) -> Result<WorkResult, CoreError> {
        Err(self.0.clone())
    }
}
