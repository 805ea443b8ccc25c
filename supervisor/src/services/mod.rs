//! Service implementations
//!
//! This module contains real implementations of all service traits.
//! These are the production implementations that handle actual I/O operations.

pub mod health_probe;
pub mod log_tail;
pub mod opener;
pub mod pid_store;
pub mod port_probe;
pub mod process_control;
pub mod run_lock;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use health_probe::HttpHealthProbe;
pub use log_tail::LogFollower;
pub use opener::SystemOpener;
pub use pid_store::{FilePidStore, MemoryPidStore};
pub use port_probe::TcpPortProbe;
pub use process_control::RealProcessControl;
pub use run_lock::RunLock;
