//! Mocked ports shared by the integration tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;

use automat_core::{
    AutomatCommand, AutomatEvent, AutomatMessaging, AutomatStorage, CoreError,
    ProcessingInstance, ProcessingStep,
};

mock! {
    pub Messaging {}

    #[async_trait]
    impl AutomatMessaging for Messaging {
        async fn send_command(&self, target_state_name: &str, command: &AutomatCommand) -> Result<(), CoreError>;
        async fn send_event(&self, event: &AutomatEvent) -> Result<(), CoreError>;
    }
}

mock! {
    pub Storage {}

    #[async_trait]
    impl AutomatStorage for Storage {
        async fn create_processing_instance(&self, description: &str, input: &str) -> Result<ProcessingInstance, CoreError>;
        async fn create_processing_step(&self, start_time: DateTime<Utc>, event: &AutomatEvent) -> Result<ProcessingStep, CoreError>;
    }
}
