//! Error types for SkillFortify's core.

/// Top-level error type for the core.
#[derive(Debug, thiserror::Error)]
pub enum SkillFortifyError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputKind),

    #[error("closure violation: {0}")]
    ClosureViolation(String),

    #[error("SAT solver unavailable: {0}")]
    SolverUnavailable(String),
}

/// Specific reasons an input was rejected.
///
/// Nested under `SkillFortifyError::InvalidInput` the way the teacher nests
/// `ConfigError`/`DatabaseError` under its top-level `Error`.
#[derive(Debug, thiserror::Error)]
pub enum InvalidInputKind {
    #[error("signal {name} = {value} is out of range [0, 1]")]
    SignalOutOfRange { name: &'static str, value: f64 },

    #[error("trust weights must be non-negative and sum to 1.0 (got sum {sum})")]
    WeightsNotNormalized { sum: f64 },

    #[error("trust weight {name} = {value} is negative")]
    NegativeWeight { name: &'static str, value: f64 },

    #[error("propagation chain must not be empty")]
    EmptyPropagationChain,

    #[error("unknown trust signal name: {0}")]
    UnknownSignalName(String),

    #[error("evidence delta for {name} must be non-negative (got {value})")]
    NegativeEvidenceDelta { name: String, value: f64 },

    #[error("invalid version constraint: {0}")]
    InvalidVersionConstraint(String),

    #[error("decay rate must be non-negative (got {0})")]
    NegativeDecayRate(f64),
}

/// `verify_integrity` never raises; callers compare `IntegrityStatus` values.
/// Kept as a distinguishable result type rather than folded into
/// `SkillFortifyError`, matching the "never raises" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityStatus {
    Match,
    Mismatch,
}

impl IntegrityStatus {
    pub fn is_match(self) -> bool {
        matches!(self, IntegrityStatus::Match)
    }
}
