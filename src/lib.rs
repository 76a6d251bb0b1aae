pub mod control_system;
pub mod error;
pub mod global_variables;
pub mod shared_data;
pub mod simulation_engine;
pub mod traci;

pub use control_system::config::{ControllerConfig, CycleConfig, LaunchConfig};
pub use control_system::traffic_light_controller::{
    PhaseContext, PhaseCycler, PhaseDecider, RoundRobin, Signal,
};
pub use error::{CyclerError, CyclerResult, TraciError, TraciResult};
pub use simulation_engine::SimulationControl;
pub use traci::TraciConnection;
