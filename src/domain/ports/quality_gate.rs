//! Quality gate port - the external veto consumed by governance.

use async_trait::async_trait;

use crate::domain::models::GateSignal;

/// External quality gate.
///
/// A hard block from the gate stops the governance loop with the `Blocked`
/// outcome; it is an intentional veto, not an internal failure.
#[async_trait]
pub trait QualityGate: Send + Sync {
    /// Evaluate the gate.
    async fn check(&self) -> GateSignal;
}

/// A gate that always passes. Used when no external gate is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassingGate;

#[async_trait]
impl QualityGate for PassingGate {
    async fn check(&self) -> GateSignal {
        GateSignal {
            passed: true,
            hard_block: false,
            blocking_reasons: Vec::new(),
        }
    }
}
