use crate::{InMemoryAutomatProvider, InMemoryMessaging, InMemoryProcessingStorage};
use async_trait::async_trait;
use automat_core::testing::{even_zeros_automaton, FixedWork};
use automat_core::{
    AutomatCommand, AutomatEvent, AutomatMessaging, AutomatStorage, CoreError, EventType,
    ProcessingInstance, ProcessingRequest, ProcessingStep, StateProcessor, StateWork, StepResult,
    WorkSimulator,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn provider() -> InMemoryAutomatProvider {
    automat_monitoring::init_test_tracing();
    InMemoryAutomatProvider::new(Arc::new(even_zeros_automaton()))
}

async fn wait_for_final_event(
    events: &mut broadcast::Receiver<AutomatEvent>,
    instance_id: &str,
) -> AutomatEvent {
    timeout(WAIT, async {
        loop {
            match events.recv().await {
                Ok(event) if event.processing_instance_id() == instance_id && event.event_type.is_final() => {
                    return event;
                }
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("Event channel closed"),
            }
        }
    })
    .await
    .expect("No final event received")
}

async fn wait_for_steps(
    storage: &InMemoryProcessingStorage,
    instance_id: &str,
    expected: usize,
) -> Vec<ProcessingStep> {
    timeout(WAIT, async {
        loop {
            let mut steps = storage.steps_for_instance(instance_id).await;
            if steps.len() >= expected {
                steps.sort_by_key(|step| step.processing_position);
                return steps;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Steps were not stored in time")
}

async fn run_input(provider: &InMemoryAutomatProvider, input: &str) -> (ProcessingInstance, AutomatEvent) {
    let mut events = provider.messaging().subscribe_events();
    let instance = provider
        .create_intake()
        .submit(ProcessingRequest::new(input, "end-to-end"))
        .await
        .unwrap();
    let final_event = wait_for_final_event(&mut events, &instance.processing_instance_id).await;
    (instance, final_event)
}

#[tokio::test]
async fn test_even_number_of_zeros_accepted() {
    let provider = provider();
    let _pools = provider
        .start_all_workers(Arc::new(FixedWork::new("done")), 1)
        .await
        .unwrap();

    let (instance, final_event) = run_input(&provider, "1010").await;

    assert_eq!(final_event.event_type, EventType::FinishedInputAccepted);
    assert_eq!(final_event.state_name, "S1");
    assert_eq!(final_event.command.processing_position, 4);

    let steps = wait_for_steps(&provider.storage(), &instance.processing_instance_id, 5).await;
    let path: Vec<(&str, &str, StepResult)> = steps
        .iter()
        .map(|s| (s.state_name.as_str(), s.input_symbol.as_str(), s.step_result))
        .collect();
    assert_eq!(
        path,
        vec![
            ("S1", "1", StepResult::ContinueProcessing),
            ("S1", "0", StepResult::ContinueProcessing),
            ("S2", "1", StepResult::ContinueProcessing),
            ("S2", "0", StepResult::ContinueProcessing),
            ("S1", "", StepResult::InputAccepted),
        ]
    );
    assert!(steps.iter().all(|s| s.start_time <= s.end_time));
}

#[tokio::test]
async fn test_odd_number_of_zeros_rejected() {
    let provider = provider();
    let _pools = provider
        .start_all_workers(Arc::new(FixedWork::new("done")), 1)
        .await
        .unwrap();

    let (instance, final_event) = run_input(&provider, "101").await;

    assert_eq!(final_event.event_type, EventType::FinishedInputRejected);
    assert_eq!(final_event.state_name, "S2");
    assert_eq!(final_event.command.processing_position, 3);

    let steps = wait_for_steps(&provider.storage(), &instance.processing_instance_id, 4).await;
    assert_eq!(steps.last().unwrap().step_result, StepResult::InputRejected);
}

#[tokio::test]
async fn test_symbol_outside_alphabet_stops_processing() {
    let provider = provider();
    let _pools = provider
        .start_all_workers(Arc::new(FixedWork::new("done")), 1)
        .await
        .unwrap();

    let (instance, final_event) = run_input(&provider, "1a1").await;

    assert_eq!(final_event.event_type, EventType::Error);
    assert_eq!(final_event.state_name, "S1");
    assert_eq!(final_event.command.processing_position, 1);
    assert_eq!(
        final_event.description,
        "No state transition for state S1 and input symbol a."
    );

    let steps = wait_for_steps(&provider.storage(), &instance.processing_instance_id, 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        provider
            .storage()
            .steps_for_instance(&instance.processing_instance_id)
            .await
            .len(),
        2
    );
    assert_eq!(steps[1].step_result, StepResult::Error);
    assert_eq!(steps[1].input_symbol, "a");
}

#[tokio::test]
async fn test_empty_input_accepted_at_start_state() {
    let provider = provider();
    let _pools = provider
        .start_all_workers(Arc::new(FixedWork::new("done")), 1)
        .await
        .unwrap();

    let (instance, final_event) = run_input(&provider, "").await;

    assert_eq!(final_event.event_type, EventType::FinishedInputAccepted);
    let steps = wait_for_steps(&provider.storage(), &instance.processing_instance_id, 1).await;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].input_symbol, "");
}

#[tokio::test]
async fn test_many_instances_with_parallel_workers() {
    let provider = provider();
    let work = WorkSimulator::new(0, 3, StdRng::seed_from_u64(11)).unwrap();
    let _pools = provider.start_all_workers(Arc::new(work), 3).await.unwrap();

    let inputs = ["", "0", "00", "0110", "111", "1000", "0101010", "10"];
    let mut events = provider.messaging().subscribe_events();
    let intake = provider.create_intake();

    let mut expected = HashMap::new();
    for input in inputs {
        let instance = intake
            .submit(ProcessingRequest::new(input, "parallel"))
            .await
            .unwrap();
        let zeros = input.chars().filter(|c| *c == '0').count();
        expected.insert(instance.processing_instance_id, zeros % 2 == 0);
    }

    let outcomes = timeout(WAIT, async {
        let mut outcomes = HashMap::new();
        while outcomes.len() < expected.len() {
            if let Ok(event) = events.recv().await {
                if event.event_type.is_final() {
                    outcomes.insert(
                        event.processing_instance_id().to_string(),
                        event.event_type == EventType::FinishedInputAccepted,
                    );
                }
            }
        }
        outcomes
    })
    .await
    .expect("Not every instance finished");

    assert_eq!(outcomes, expected);
}

#[tokio::test]
async fn test_start_workers_for_unknown_state_fails() {
    let provider = provider();

    let result = provider
        .start_state_workers("S7", Arc::new(FixedWork::new("done")), 1)
        .await;

    assert!(matches!(result, Err(CoreError::ConfigurationError(_))));
}

#[tokio::test]
async fn test_workers_stop_when_shut_down() {
    let provider = provider();
    let pool = provider
        .start_state_workers("S2", Arc::new(FixedWork::new("done")), 2)
        .await
        .unwrap();

    assert_eq!(pool.state_name(), "S2");
    assert_eq!(pool.len(), 2);
    pool.shutdown();
}

/// Storage whose step writes always fail
struct FailingStepStorage {
    inner: InMemoryProcessingStorage,
}

#[async_trait]
impl AutomatStorage for FailingStepStorage {
    async fn create_processing_instance(
        &self,
        description: &str,
        input: &str,
    ) -> Result<ProcessingInstance, CoreError> {
        self.inner.create_processing_instance(description, input).await
    }

    async fn create_processing_step(
        &self,
        _start_time: DateTime<Utc>,
        _event: &AutomatEvent,
    ) -> Result<ProcessingStep, CoreError> {
        Err(CoreError::StorageError("disk full".to_string()))
    }
}

#[tokio::test]
async fn test_next_command_delivered_even_if_step_storage_fails() {
    let automaton = Arc::new(even_zeros_automaton());
    let messaging = Arc::new(InMemoryMessaging::new(&automaton));
    let storage = Arc::new(FailingStepStorage {
        inner: InMemoryProcessingStorage::default(),
    });
    let mut s2_commands = messaging.take_command_receiver("S2").await.unwrap();

    let instance = storage.create_processing_instance("", "01").await.unwrap();
    let processor = StateProcessor::new(
        automaton,
        "S1",
        messaging.clone() as Arc<dyn AutomatMessaging>,
        storage.clone() as Arc<dyn AutomatStorage>,
    )
    .unwrap();

    let command = AutomatCommand::new(instance.processing_instance_id.clone(), "01", 0);
    let work: &dyn StateWork = &FixedWork::new("done");
    let result = processor.process_command(command, work).await;

    assert_eq!(
        result.error,
        Some(CoreError::StorageError("disk full".to_string()))
    );
    assert!(result.processing_step.is_none());

    // The downstream state already has the next command despite the missing step
    let delivered = s2_commands.try_recv().unwrap();
    assert_eq!(delivered.processing_position, 1);
    assert_eq!(delivered.processing_instance_id, instance.processing_instance_id);
}
