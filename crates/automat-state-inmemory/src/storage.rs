use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use automat_core::domain::processing::{MAX_DESCRIPTION_LENGTH, MAX_INPUT_LENGTH};
use automat_core::{AutomatEvent, AutomatStorage, CoreError, ProcessingInstance, ProcessingStep};

/// In-memory implementation of the AutomatStorage port
pub struct InMemoryProcessingStorage {
    instances: Arc<RwLock<HashMap<String, ProcessingInstance>>>,
    steps: Arc<RwLock<Vec<ProcessingStep>>>,
}

impl InMemoryProcessingStorage {
    /// Create a new storage over shared maps
    pub fn new(
        instances: Arc<RwLock<HashMap<String, ProcessingInstance>>>,
        steps: Arc<RwLock<Vec<ProcessingStep>>>,
    ) -> Self {
        Self { instances, steps }
    }

    /// Find a processing instance by id
    pub async fn find_instance(&self, processing_instance_id: &str) -> Option<ProcessingInstance> {
        let instances = self.instances.read().await;
        instances.get(processing_instance_id).cloned()
    }

    /// All steps of an instance in the order they were stored
    pub async fn steps_for_instance(&self, processing_instance_id: &str) -> Vec<ProcessingStep> {
        let steps = self.steps.read().await;
        steps
            .iter()
            .filter(|step| step.processing_instance_id == processing_instance_id)
            .cloned()
            .collect()
    }

    /// Number of stored steps across all instances
    pub async fn step_count(&self) -> usize {
        self.steps.read().await.len()
    }
}

impl Default for InMemoryProcessingStorage {
    fn default() -> Self {
        Self::new(
            Arc::new(RwLock::new(HashMap::new())),
            Arc::new(RwLock::new(Vec::new())),
        )
    }
}

#[async_trait]
impl AutomatStorage for InMemoryProcessingStorage {
    async fn create_processing_instance(
        &self,
        description: &str,
        input: &str,
    ) -> Result<ProcessingInstance, CoreError> {
        if input.chars().count() > MAX_INPUT_LENGTH {
            return Err(CoreError::StorageError(format!(
                "Input exceeds {} characters",
                MAX_INPUT_LENGTH
            )));
        }
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(CoreError::StorageError(format!(
                "Description exceeds {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }

        let instance = ProcessingInstance::new(description, input);
        let mut instances = self.instances.write().await;
        instances.insert(instance.processing_instance_id.clone(), instance.clone());

        debug!(instance_id = %instance.processing_instance_id, "Stored processing instance");
        Ok(instance)
    }

    async fn create_processing_step(
        &self,
        start_time: DateTime<Utc>,
        event: &AutomatEvent,
    ) -> Result<ProcessingStep, CoreError> {
        let instance_id = event.processing_instance_id();
        if !self.instances.read().await.contains_key(instance_id) {
            return Err(CoreError::ProcessingInstanceNotFound(instance_id.to_string()));
        }

        let step = ProcessingStep::from_event(start_time, event);
        let mut steps = self.steps.write().await;
        steps.push(step.clone());

        debug!(
            instance_id = %step.processing_instance_id,
            state = %step.state_name,
            position = step.processing_position,
            step_result = %step.step_result,
            "Stored processing step"
        );
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use automat_core::{AutomatCommand, EventType, StepResult};

    #[tokio::test]
    async fn test_create_and_find_instance() -> Result<(), CoreError> {
        let storage = InMemoryProcessingStorage::default();

        let instance = storage.create_processing_instance("two zeros", "1010").await?;
        let found = storage
            .find_instance(&instance.processing_instance_id)
            .await
            .unwrap();

        assert_eq!(found, instance);
        assert!(storage.find_instance("unknown").await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_steps_are_appended_per_instance() -> Result<(), CoreError> {
        let storage = InMemoryProcessingStorage::default();
        let first = storage.create_processing_instance("", "10").await?;
        let second = storage.create_processing_instance("", "1").await?;

        for (instance, position) in [(&first, 0), (&second, 0), (&first, 1)] {
            let event = AutomatEvent::new(
                EventType::FinishedContinueProcess,
                "S1",
                AutomatCommand::new(instance.processing_instance_id.clone(), instance.input.clone(), position),
                "",
            );
            storage.create_processing_step(Utc::now(), &event).await?;
        }

        let steps = storage.steps_for_instance(&first.processing_instance_id).await;
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].processing_position, 0);
        assert_eq!(steps[1].processing_position, 1);
        assert_eq!(steps[1].step_result, StepResult::ContinueProcessing);
        assert_eq!(storage.step_count().await, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_step_for_unknown_instance_rejected() {
        let storage = InMemoryProcessingStorage::default();
        let event = AutomatEvent::new(
            EventType::Start,
            "S1",
            AutomatCommand::new("missing", "1", 0),
            "",
        );

        let result = storage.create_processing_step(Utc::now(), &event).await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "No ProcessingInstance with id missing."
        );
        assert_eq!(storage.step_count().await, 0);
    }

    #[tokio::test]
    async fn test_oversized_input_rejected() {
        let storage = InMemoryProcessingStorage::default();
        let result = storage
            .create_processing_instance("", &"1".repeat(MAX_INPUT_LENGTH + 1))
            .await;

        assert!(matches!(result, Err(CoreError::StorageError(_))));
    }
}
