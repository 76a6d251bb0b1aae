use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::{CyclerError, CyclerResult};
use crate::global_variables::{
    CONNECT_RETRIES, CONNECT_RETRY_WAIT_MS, PHASES, STEP_DELAY_MS, SUMO_BINARY, SUMO_CONFIG,
    SWITCH_INTERVAL, TLS_ID, TRACI_HOST,
};

/// How the simulator is started and reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchConfig {
    pub sumo_binary: String,
    pub sumo_config: PathBuf,
    pub host: String,
    pub num_retries: u32,
    pub retry_wait: Duration,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            sumo_binary: SUMO_BINARY.to_string(),
            sumo_config: PathBuf::from(SUMO_CONFIG),
            host: TRACI_HOST.to_string(),
            num_retries: CONNECT_RETRIES,
            retry_wait: Duration::from_millis(CONNECT_RETRY_WAIT_MS),
        }
    }
}

/// Which signal is cycled and how often.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleConfig {
    pub tls_id: String,
    /// Phase indices of the signal program. Only the length is used for
    /// wrapping; the list is assumed, not read from the simulator.
    pub phases: Vec<u32>,
    /// A switch happens on every step where `step % switch_interval == 0`.
    pub switch_interval: u64,
    /// Pause before each simulation step.
    pub step_delay: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            tls_id: TLS_ID.to_string(),
            phases: PHASES.to_vec(),
            switch_interval: SWITCH_INTERVAL,
            step_delay: Duration::from_millis(STEP_DELAY_MS),
        }
    }
}

impl CycleConfig {
    pub fn phase_count(&self) -> u32 {
        self.phases.len() as u32
    }

    pub fn validate(&self) -> CyclerResult<()> {
        if self.phases.is_empty() {
            return Err(CyclerError::Config("phase list is empty".to_string()));
        }
        if u32::try_from(self.phases.len()).is_err() {
            return Err(CyclerError::Config("phase list is too long".to_string()));
        }
        if self.switch_interval == 0 {
            return Err(CyclerError::Config(
                "switch interval must be at least one step".to_string(),
            ));
        }
        if self.tls_id.is_empty() {
            return Err(CyclerError::Config("traffic light id is empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControllerConfig {
    pub launch: LaunchConfig,
    pub cycle: CycleConfig,
}
