//! Core supervisor logic with no I/O of its own

pub mod outcome;
pub mod status;

pub use outcome::{StartOutcome, StopOutcome, Termination};
pub use status::{LifecycleStatus, ObservedState, StatusLine, StatusReport};
