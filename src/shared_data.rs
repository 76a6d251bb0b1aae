// src/shared_data.rs

use serde::Serialize;
use std::fmt;

/// One phase command issued by the cycler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseSwitch {
    pub step: u64,
    pub tls_id: String,
    pub phase: u32,
}

impl fmt::Display for PhaseSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Step {}: Traffic light {} switched to phase {}",
            self.step, self.tls_id, self.phase
        )
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub steps: u64,
    pub switches: u64,
    pub final_phase: u32,
}
