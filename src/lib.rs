//! Static analysis, trust scoring, and SAT-based dependency resolution for
//! LLM agent skills.
//!
//! The core is stateless: every public operation is a pure function over
//! its inputs plus optional configuration. Per-format parsing, filesystem
//! discovery, and CLI rendering are treated as thin adapters around the
//! types and functions exported here.

pub mod analyzer;
pub mod capability;
pub mod dependency;
pub mod error;
pub mod lockfile;
pub mod sbom;
pub mod threat;
pub mod trust;
pub mod util;

pub use analyzer::{AnalysisResult, Finding, FindingType, ParsedSkill, Severity, analyze};
pub use capability::{AccessLevel, Capability, CapabilitySet};
pub use dependency::{AgentDependencyGraph, DependencyResolver, Resolution, SkillNode};
pub use error::{IntegrityStatus, InvalidInputKind, SkillFortifyError};
pub use lockfile::{LockedSkill, Lockfile, SkillSource};
pub use sbom::{Sbom, SkillComponent, SkillComponentInput};
pub use threat::{AttackClass, AttackSurface, DYSkillAttacker, SupplyChainPhase, ThreatActor};
pub use trust::{TrustEngine, TrustLevel, TrustScore, TrustSignals, TrustWeights};
