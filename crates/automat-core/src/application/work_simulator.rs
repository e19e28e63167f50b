//! Simulated domain work with a random duration

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::processor::{StateWork, WorkResult};
use crate::domain::AutomatCommand;
use crate::CoreError;

/// Default lower bound of the simulated work duration
pub const DEFAULT_MIN_DURATION_MILLIS: u64 = 500;
/// Default upper bound of the simulated work duration
pub const DEFAULT_MAX_DURATION_MILLIS: u64 = 5000;

/// Stand-in for domain logic: sleeps a random duration within `[min, max]`
#[derive(Debug)]
pub struct WorkSimulator {
    min_duration_millis: u64,
    max_duration_millis: u64,
    rng: Mutex<StdRng>,
}

impl WorkSimulator {
    /// Create a simulator drawing durations from `rng`
    pub fn new(
        min_duration_millis: u64,
        max_duration_millis: u64,
        rng: StdRng,
    ) -> Result<Self, CoreError> {
        if max_duration_millis < min_duration_millis {
            return Err(CoreError::ConfigurationError(format!(
                "Invalid work simulator range with a minimum of {} and a maximum of {} milliseconds",
                min_duration_millis, max_duration_millis
            )));
        }

        Ok(Self {
            min_duration_millis,
            max_duration_millis,
            rng: Mutex::new(rng),
        })
    }

    /// Create a simulator seeded from the operating system
    pub fn from_entropy(
        min_duration_millis: u64,
        max_duration_millis: u64,
    ) -> Result<Self, CoreError> {
        Self::new(min_duration_millis, max_duration_millis, StdRng::from_entropy())
    }

    /// Lower bound in milliseconds
    pub fn min_duration_millis(&self) -> u64 {
        self.min_duration_millis
    }

    /// Upper bound in milliseconds
    pub fn max_duration_millis(&self) -> u64 {
        self.max_duration_millis
    }

    async fn random_duration(&self) -> u64 {
        if self.min_duration_millis == self.max_duration_millis {
            return self.min_duration_millis;
        }
        let mut rng = self.rng.lock().await;
        rng.gen_range(self.min_duration_millis..=self.max_duration_millis)
    }
}

#[async_trait]
impl StateWork for WorkSimulator {
    async fn perform(&self, command: &AutomatCommand) -> Result<WorkResult, CoreError> {
        let started = Instant::now();
        let random_duration = self.random_duration().await;
        if random_duration > 0 {
            tokio::time::sleep(Duration::from_millis(random_duration)).await;
        }
        let duration_millis = started.elapsed().as_millis() as u64;

        let description = match command.current_input_symbol() {
            Some(symbol) => format!(
                "Simulated work for input symbol {} with a random duration of {} milliseconds.",
                symbol, duration_millis
            ),
            None => format!(
                "Simulated work with a random duration of {} milliseconds.",
                duration_millis
            ),
        };

        Ok(WorkResult::new(description, duration_millis))
    }
}
