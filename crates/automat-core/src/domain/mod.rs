//! Domain model of the choreographed automaton execution

pub mod automaton;
pub mod command;
pub mod event;
pub mod ports;
pub mod processing;

pub use automaton::{
    AlphabetSymbol, AutomatonDefinition, AutomatonState, DeterministicFiniteAutomaton,
    StateTransition,
};
pub use command::AutomatCommand;
pub use event::{AutomatEvent, EventType};
pub use ports::{command_channel_name, event_channel_name, AutomatMessaging, AutomatStorage};
pub use processing::{ProcessingInstance, ProcessingRequest, ProcessingStep, StepResult};
