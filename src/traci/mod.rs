//! Minimal TraCI client: just the commands the phase cycler issues.

pub mod codec;
pub mod connection;
pub mod constants;
pub mod launcher;

pub use connection::TraciConnection;
pub use launcher::start;
