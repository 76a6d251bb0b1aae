//! In-memory stand-in for a SUMO session.
//!
//! Behaves like the simulator as far as the cycler can observe: vehicles stay
//! expected for a fixed number of steps, signals keep the phase they were last
//! set to, and unknown signal ids fail the way SUMO reports them.

use std::collections::HashMap;

use crate::error::{TraciError, TraciResult};
use crate::simulation_engine::SimulationControl;
use crate::traci::constants::{CMD_GET_TL_VARIABLE, CMD_SET_TL_VARIABLE, RTYPE_ERR};

/// A call received by [`MockSimulation`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    MinExpected,
    Step,
    GetPhase(String),
    SetPhase(String, u32),
    Close,
}

#[derive(Debug, Default)]
pub struct MockSimulation {
    /// Steps after which no more vehicles are expected.
    pub vehicle_steps: u64,
    pub steps_taken: u64,
    pub signals: HashMap<String, u32>,
    pub calls: Vec<SimCall>,
    pub closed: bool,
    /// When set, the n-th set_phase call (0-based) fails.
    pub fail_set_at: Option<usize>,
    pub set_calls: usize,
    /// When false, calls are not recorded (benches).
    pub record: bool,
}

impl MockSimulation {
    /// A simulation with one signal that keeps vehicles for `vehicle_steps` steps.
    pub fn new(vehicle_steps: u64, tls_id: &str, initial_phase: u32) -> Self {
        let mut signals = HashMap::new();
        signals.insert(tls_id.to_string(), initial_phase);
        Self {
            vehicle_steps,
            signals,
            record: true,
            ..Self::default()
        }
    }

    fn log(&mut self, call: SimCall) {
        if self.record {
            self.calls.push(call);
        }
    }

    fn ensure_open(&self) -> TraciResult<()> {
        if self.closed {
            Err(TraciError::Closed)
        } else {
            Ok(())
        }
    }

    fn unknown_signal(command: u8, tls_id: &str) -> TraciError {
        TraciError::CommandFailed {
            command,
            status: RTYPE_ERR,
            description: format!("Traffic light '{}' is not known", tls_id),
        }
    }

    /// Phases passed to set_phase, in order.
    pub fn commanded_phases(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SimCall::SetPhase(_, phase) => Some(*phase),
                _ => None,
            })
            .collect()
    }

    /// Number of steps preceding each set_phase call, i.e. the step it belongs to.
    pub fn switch_steps(&self) -> Vec<u64> {
        let mut steps: u64 = 0;
        let mut out = Vec::new();
        for call in &self.calls {
            match call {
                SimCall::Step => steps += 1,
                SimCall::SetPhase(..) => out.push(steps.saturating_sub(1)),
                _ => {}
            }
        }
        out
    }
}

impl SimulationControl for MockSimulation {
    async fn min_expected_number(&mut self) -> TraciResult<i32> {
        self.ensure_open()?;
        self.log(SimCall::MinExpected);
        let remaining = self.vehicle_steps.saturating_sub(self.steps_taken);
        Ok(i32::try_from(remaining).unwrap_or(i32::MAX))
    }

    async fn simulation_step(&mut self) -> TraciResult<()> {
        self.ensure_open()?;
        self.log(SimCall::Step);
        self.steps_taken += 1;
        Ok(())
    }

    async fn get_phase(&mut self, tls_id: &str) -> TraciResult<u32> {
        self.ensure_open()?;
        self.log(SimCall::GetPhase(tls_id.to_string()));
        self.signals
            .get(tls_id)
            .copied()
            .ok_or_else(|| Self::unknown_signal(CMD_GET_TL_VARIABLE, tls_id))
    }

    async fn set_phase(&mut self, tls_id: &str, phase: u32) -> TraciResult<()> {
        self.ensure_open()?;
        let index = self.set_calls;
        self.set_calls += 1;
        self.log(SimCall::SetPhase(tls_id.to_string(), phase));
        if self.fail_set_at == Some(index) {
            return Err(TraciError::CommandFailed {
                command: CMD_SET_TL_VARIABLE,
                status: RTYPE_ERR,
                description: format!(
                    "Invalid phase index {} for traffic light '{}'",
                    phase, tls_id
                ),
            });
        }
        match self.signals.get_mut(tls_id) {
            Some(current) => {
                *current = phase;
                Ok(())
            }
            None => Err(Self::unknown_signal(CMD_SET_TL_VARIABLE, tls_id)),
        }
    }

    async fn close(&mut self) -> TraciResult<()> {
        self.ensure_open()?;
        self.log(SimCall::Close);
        self.closed = true;
        Ok(())
    }
}
