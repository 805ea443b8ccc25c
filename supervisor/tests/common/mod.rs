//! Common test utilities and infrastructure
//!
//! Fixtures, a fake process table driving the mocks, and a builder that
//! wires mocked services into a supervisor rooted in a temp directory.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{FakeWorld, SupervisorBuilder, TestHelpers};
