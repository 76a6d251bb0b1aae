use tokio::time::sleep;

use crate::control_system::config::CycleConfig;
use crate::error::{CyclerError, CyclerResult};
use crate::shared_data::{PhaseSwitch, RunSummary};
use crate::simulation_engine::SimulationControl;

/// The controlled signal as the cycler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub id: String,
    pub current_phase: u32,
    pub phase_count: u32,
}

/// Everything a phase decider may look at when a switch is due.
#[derive(Debug, Clone, Copy)]
pub struct PhaseContext<'a> {
    pub step: u64,
    pub tls_id: &'a str,
    pub current_phase: u32,
    pub phase_count: u32,
}

/// Chooses the phase to switch to on each switch step.
///
/// The result must be below `phase_count`. Traffic-responsive strategies plug
/// in here; closures work too.
pub trait PhaseDecider {
    fn next_phase(&mut self, ctx: &PhaseContext<'_>) -> u32;
}

/// Advances to the following phase and wraps after the last one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

impl PhaseDecider for RoundRobin {
    fn next_phase(&mut self, ctx: &PhaseContext<'_>) -> u32 {
        ((u64::from(ctx.current_phase) + 1) % u64::from(ctx.phase_count)) as u32
    }
}

impl<F> PhaseDecider for F
where
    F: FnMut(&PhaseContext<'_>) -> u32,
{
    fn next_phase(&mut self, ctx: &PhaseContext<'_>) -> u32 {
        self(ctx)
    }
}

/// Steps the simulation and switches one signal every `switch_interval` steps.
pub struct PhaseCycler<D = RoundRobin> {
    config: CycleConfig,
    decider: D,
}

impl PhaseCycler<RoundRobin> {
    pub fn new(config: CycleConfig) -> CyclerResult<Self> {
        Self::with_decider(config, RoundRobin)
    }
}

impl<D: PhaseDecider> PhaseCycler<D> {
    pub fn with_decider(config: CycleConfig, decider: D) -> CyclerResult<Self> {
        config.validate()?;
        Ok(Self { config, decider })
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn is_switch_step(&self, step: u64) -> bool {
        step % self.config.switch_interval == 0
    }

    /// Asks the decider for the next phase of `signal` and checks it is in range.
    pub fn decide(&mut self, signal: &Signal, step: u64) -> CyclerResult<u32> {
        if signal.phase_count == 0 {
            return Err(CyclerError::Config(format!(
                "traffic light {} has no phases",
                signal.id
            )));
        }
        let ctx = PhaseContext {
            step,
            tls_id: &signal.id,
            current_phase: signal.current_phase,
            phase_count: signal.phase_count,
        };
        let phase = self.decider.next_phase(&ctx);
        if phase >= signal.phase_count {
            return Err(CyclerError::PhaseOutOfRange {
                tls_id: signal.id.clone(),
                phase,
                phase_count: signal.phase_count,
            });
        }
        Ok(phase)
    }

    /// Runs until the simulation expects no more vehicles, then closes it.
    ///
    /// Any simulation error ends the run immediately without closing.
    pub async fn run<S: SimulationControl>(&mut self, sim: &mut S) -> CyclerResult<RunSummary> {
        let tls_id = self.config.tls_id.clone();
        let mut signal = Signal {
            current_phase: sim.get_phase(&tls_id).await?,
            id: tls_id,
            phase_count: self.config.phase_count(),
        };
        if signal.current_phase >= signal.phase_count {
            log::warn!(
                "Traffic light {} starts in phase {}, outside the assumed {} phases",
                signal.id,
                signal.current_phase,
                signal.phase_count
            );
        }
        log::info!(
            "Cycling traffic light {} from phase {} every {} steps",
            signal.id,
            signal.current_phase,
            self.config.switch_interval
        );

        let mut step: u64 = 0;
        let mut switches: u64 = 0;
        while sim.min_expected_number().await? > 0 {
            sleep(self.config.step_delay).await;
            sim.simulation_step().await?;

            if self.is_switch_step(step) {
                let next_phase = self.decide(&signal, step)?;
                sim.set_phase(&signal.id, next_phase).await?;
                let switch = PhaseSwitch {
                    step,
                    tls_id: signal.id.clone(),
                    phase: next_phase,
                };
                println!("{}", switch);
                if let Ok(json) = serde_json::to_string(&switch) {
                    log::debug!("{}", json);
                }
                signal.current_phase = next_phase;
                switches += 1;
            }

            step += 1;
        }

        sim.close().await?;
        let summary = RunSummary {
            steps: step,
            switches,
            final_phase: signal.current_phase,
        };
        log::info!(
            "No vehicles left after {} steps; {} phase switches",
            summary.steps,
            summary.switches
        );
        Ok(summary)
    }
}
