//! The trust algebra: signal combination, propagation, decay, evidence updates.

pub mod engine;
pub mod models;
pub mod propagation;

pub use engine::TrustEngine;
pub use models::{SIGNAL_NAMES, TrustLevel, TrustScore, TrustSignals, TrustWeights};
