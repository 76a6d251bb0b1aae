use std::process::ExitStatus;

use thiserror::Error;

/// Failures of the TraCI link to the simulator.
#[derive(Debug, Error)]
pub enum TraciError {
    #[error("traci i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start simulator '{binary}': {source}")]
    Spawn {
        binary: String,
        source: std::io::Error,
    },

    #[error("could not connect to TraCI server at {host}:{port} after {attempts} attempts: {source}")]
    Connect {
        host: String,
        port: u16,
        attempts: u32,
        source: std::io::Error,
    },

    #[error("TraCI server already finished ({0})")]
    ServerExited(ExitStatus),

    #[error("command 0x{command:02x} failed with status 0x{status:02x}: {description}")]
    CommandFailed {
        command: u8,
        status: u8,
        description: String,
    },

    #[error("expected response 0x{expected:02x}, got 0x{got:02x}")]
    UnexpectedResponse { expected: u8, got: u8 },

    #[error("expected value type 0x{expected:02x}, got 0x{got:02x}")]
    UnexpectedType { expected: u8, got: u8 },

    #[error("unexpected value: {0}")]
    UnexpectedValue(String),

    #[error("malformed TraCI message: {0}")]
    Malformed(&'static str),

    #[error("connection already closed")]
    Closed,
}

pub type TraciResult<T> = Result<T, TraciError>;

/// Failures of the phase cycler itself.
#[derive(Debug, Error)]
pub enum CyclerError {
    #[error("invalid cycle configuration: {0}")]
    Config(String),

    #[error("phase {phase} is outside the {phase_count}-phase list of traffic light {tls_id}")]
    PhaseOutOfRange {
        tls_id: String,
        phase: u32,
        phase_count: u32,
    },

    #[error(transparent)]
    Traci(#[from] TraciError),
}

pub type CyclerResult<T> = Result<T, CyclerError>;
