//! Threat taxonomy, messages, and the Dolev-Yao attacker model.

pub mod dy;
pub mod messages;
pub mod taxonomy;

pub use dy::DYSkillAttacker;
pub use messages::{Registry, SkillMessage, SupplyChain};
pub use taxonomy::{AttackClass, AttackSurface, SupplyChainPhase, ThreatActor, all_surfaces};
