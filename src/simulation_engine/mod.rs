// simulation_engine/mod.rs
pub mod mock;

use crate::error::TraciResult;

/// The operations the phase cycler needs from a running simulation.
///
/// Implemented by [`crate::traci::TraciConnection`] for a live SUMO process and
/// by [`mock::MockSimulation`] for tests and benches.
#[allow(async_fn_in_trait)]
pub trait SimulationControl {
    /// Number of vehicles still running or waiting to enter the network.
    async fn min_expected_number(&mut self) -> TraciResult<i32>;

    /// Advances the simulation by exactly one step.
    async fn simulation_step(&mut self) -> TraciResult<()>;

    async fn get_phase(&mut self, tls_id: &str) -> TraciResult<u32>;

    async fn set_phase(&mut self, tls_id: &str, phase: u32) -> TraciResult<()>;

    /// Ends the session. Further calls fail with [`crate::error::TraciError::Closed`].
    async fn close(&mut self) -> TraciResult<()>;
}
