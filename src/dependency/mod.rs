//! The agent dependency graph, version constraints, and the SAT-based resolver.

pub mod constraints;
pub mod graph;
pub mod resolver;
pub mod sat;

pub use constraints::{SkillConflict, SkillDependency, VersionConstraint};
pub use graph::{AgentDependencyGraph, SkillNode};
pub use resolver::{DependencyResolver, Resolution};
pub use sat::{DpllBackend, SatBackend};
