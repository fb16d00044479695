//! Process-local failure simulation config consulted by the saga's credit
//! step (§4.5). Represented as a small struct behind a lock, per §9's
//! Design Notes guidance rather than scattered flags.

use std::collections::HashSet;
use std::sync::Mutex;

use common::ids::TransactionId;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub enabled: bool,
    pub failure_rate: f64,
    pub fail_transaction_ids: HashSet<TransactionId>,
}

pub struct SimulationController {
    config: Mutex<SimulationConfig>,
}

impl SimulationController {
    pub fn new() -> Self {
        Self {
            config: Mutex::new(SimulationConfig::default()),
        }
    }

    pub fn get(&self) -> SimulationConfig {
        self.config.lock().unwrap().clone()
    }

    pub fn set(&self, config: SimulationConfig) {
        *self.config.lock().unwrap() = config;
    }

    pub fn reset(&self) {
        *self.config.lock().unwrap() = SimulationConfig::default();
    }

    /// `enabled` AND (the transaction ID is targeted OR a random roll
    /// crosses `failure_rate`), per §4.5's failure simulation hook.
    pub fn should_fail(&self, transaction_id: TransactionId) -> bool {
        let config = self.config.lock().unwrap();
        if !config.enabled {
            return false;
        }
        if config.fail_transaction_ids.contains(&transaction_id) {
            return true;
        }
        if config.failure_rate <= 0.0 {
            return false;
        }
        rand::thread_rng().gen::<f64>() < config.failure_rate
    }
}

impl Default for SimulationController {
    fn default() -> Self {
        Self::new()
    }
}
