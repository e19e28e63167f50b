//! Services driving the automaton processing

pub mod intake;
pub mod processor;
pub mod work_simulator;

pub use intake::ProcessingIntake;
pub use processor::{ProcessingContinuation, ProcessingResult, StateProcessor, StateWork, WorkResult};
pub use work_simulator::WorkSimulator;
