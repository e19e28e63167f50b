//! Capabilities the processing core consumes
//!
//! Concrete transports and databases implement these traits; the processor
//! only ever talks to them through trait objects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::command::AutomatCommand;
use super::event::AutomatEvent;
use super::processing::{ProcessingInstance, ProcessingStep};
use crate::CoreError;

/// Prefix of every channel name
pub const CHANNEL_PREFIX: &str = "container-automat";

/// Name of the command channel owned by the workers of `state_name`
pub fn command_channel_name(state_name: &str) -> String {
    format!("{}-{}", CHANNEL_PREFIX, state_name)
}

/// Name of the broadcast event channel
pub fn event_channel_name() -> String {
    format!("{}-events", CHANNEL_PREFIX)
}

/// Asynchronous message transport between state workers
#[async_trait]
pub trait AutomatMessaging: Send + Sync {
    /// Deliver a command to the workers bound to `target_state_name`
    async fn send_command(
        &self,
        target_state_name: &str,
        command: &AutomatCommand,
    ) -> Result<(), CoreError>;

    /// Broadcast an event to every subscriber
    async fn send_event(&self, event: &AutomatEvent) -> Result<(), CoreError>;
}

/// Durable audit storage
#[async_trait]
pub trait AutomatStorage: Send + Sync {
    /// Persist a new processing instance
    async fn create_processing_instance(
        &self,
        description: &str,
        input: &str,
    ) -> Result<ProcessingInstance, CoreError>;

    /// Persist a processing step built from `event`.
    ///
    /// Fails with [`CoreError::ProcessingInstanceNotFound`] when the event
    /// references an unknown instance.
    async fn create_processing_step(
        &self,
        start_time: DateTime<Utc>,
        event: &AutomatEvent,
    ) -> Result<ProcessingStep, CoreError>;
}
