use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, trace};

use automat_core::domain::{command_channel_name, event_channel_name};
use automat_core::{AutomatCommand, AutomatEvent, AutomatMessaging, CoreError, DeterministicFiniteAutomaton};

/// Capacity of the broadcast event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// In-memory implementation of the AutomatMessaging port.
///
/// Every automaton state owns one unbounded command channel; all events go
/// to a single broadcast channel.
pub struct InMemoryMessaging {
    command_senders: HashMap<String, mpsc::UnboundedSender<AutomatCommand>>,
    command_receivers: Mutex<HashMap<String, mpsc::UnboundedReceiver<AutomatCommand>>>,
    event_sender: broadcast::Sender<AutomatEvent>,
}

impl InMemoryMessaging {
    /// Create one command channel per state of `automaton`
    pub fn new(automaton: &DeterministicFiniteAutomaton) -> Self {
        let mut command_senders = HashMap::new();
        let mut command_receivers = HashMap::new();

        for state in automaton.states() {
            let (tx, rx) = mpsc::unbounded_channel();
            command_senders.insert(state.name.clone(), tx);
            command_receivers.insert(state.name.clone(), rx);
        }

        let (event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            command_senders,
            command_receivers: Mutex::new(command_receivers),
            event_sender,
        }
    }

    /// Subscribe to the event channel
    pub fn subscribe_events(&self) -> broadcast::Receiver<AutomatEvent> {
        self.event_sender.subscribe()
    }

    /// Take the command receiver of `state_name`; each receiver can be taken once
    pub async fn take_command_receiver(
        &self,
        state_name: &str,
    ) -> Result<mpsc::UnboundedReceiver<AutomatCommand>, CoreError> {
        let mut receivers = self.command_receivers.lock().await;
        receivers.remove(state_name).ok_or_else(|| {
            CoreError::MessagingError(format!(
                "Command channel {} is unknown or already consumed",
                command_channel_name(state_name)
            ))
        })
    }

    /// Names of all command channels
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .command_senders
            .keys()
            .map(|state| command_channel_name(state))
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl AutomatMessaging for InMemoryMessaging {
    async fn send_command(
        &self,
        target_state_name: &str,
        command: &AutomatCommand,
    ) -> Result<(), CoreError> {
        let channel = command_channel_name(target_state_name);
        let sender = self.command_senders.get(target_state_name).ok_or_else(|| {
            CoreError::MessagingError(format!("No command channel {}", channel))
        })?;

        sender.send(command.clone()).map_err(|_| {
            CoreError::MessagingError(format!("Command channel {} is closed", channel))
        })?;

        debug!(
            instance_id = %command.processing_instance_id,
            channel = %channel,
            position = command.processing_position,
            "Command sent"
        );
        Ok(())
    }

    async fn send_event(&self, event: &AutomatEvent) -> Result<(), CoreError> {
        // A broadcast without subscribers is not an error
        match self.event_sender.send(event.clone()) {
            Ok(receivers) => trace!(
                channel = %event_channel_name(),
                receivers,
                event_type = ?event.event_type,
                "Event published"
            ),
            Err(_) => trace!(
                channel = %event_channel_name(),
                event_type = ?event.event_type,
                "Event published without subscribers"
            ),
        }
        Ok(())
    }
}
