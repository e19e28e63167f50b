//!
//! Container Automat Core - choreographed execution of deterministic finite automata
//!
//! Each automaton state is served by its own pool of workers. Workers pass
//! commands to each other over a messaging port, broadcast events about their
//! progress, and append one audit step per handled command to a storage port.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - automaton model, messages, audit records and ports
pub mod domain;

/// Application services - per-state processing, work simulation and intake
pub mod application;

/// Error types
pub mod error;

/// Sample automata and fixtures for tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::CoreError;

pub use application::{
    ProcessingContinuation, ProcessingIntake, ProcessingResult, StateProcessor, StateWork,
    WorkResult, WorkSimulator,
};
pub use domain::{
    AlphabetSymbol, AutomatCommand, AutomatEvent, AutomatMessaging, AutomatStorage,
    AutomatonState, DeterministicFiniteAutomaton, EventType, ProcessingInstance,
    ProcessingRequest, ProcessingStep, StateTransition, StepResult,
};
