//! Ports: trait seams between the core and its collaborators.

pub mod goal_runner;
pub mod quality_gate;
pub mod stores;

pub use goal_runner::{GoalRunner, RunConfig, RunResult};
pub use quality_gate::{PassingGate, QualityGate};
pub use stores::{InMemoryRecoveryStore, RecoveryStore, RunHistory};
