//! Content-addressable lockfile: `LockedSkill`, `Lockfile`, integrity
//! verification via sha256.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::dependency::graph::AgentDependencyGraph;
use crate::dependency::resolver::Resolution;
use crate::error::IntegrityStatus;
use crate::trust::{TrustLevel, TrustScore};

/// The lockfile format version. Bumped whenever a field is added, removed,
/// or reinterpreted.
pub const LOCKFILE_VERSION: u32 = 1;

/// One persisted lockfile entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedSkill {
    pub name: String,
    pub version: String,
    pub integrity: String,
    pub format: String,
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_level: Option<String>,
    pub dependencies: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

/// `"sha256:" + hex(sha256(content))`.
pub fn compute_integrity(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("sha256:{}", hex::encode(digest))
}

/// Recomputes `compute_integrity(content)` and compares against `expected`.
pub fn verify_integrity(expected: &str, content: &str) -> IntegrityStatus {
    if compute_integrity(content) == expected {
        IntegrityStatus::Match
    } else {
        IntegrityStatus::Mismatch
    }
}

/// Per-skill source text and provenance, keyed by `(name, version)` alongside
/// `Lockfile::from_resolution`'s other lookups. Mirrors the fields
/// `ParsedSkill` already carries for a locally-loaded skill.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillSource {
    pub content: String,
    pub format: String,
    pub source_path: Option<String>,
}

fn trust_level_name(level: TrustLevel) -> &'static str {
    match level {
        TrustLevel::Unsigned => "UNSIGNED",
        TrustLevel::Signed => "SIGNED",
        TrustLevel::CommunityVerified => "COMMUNITY_VERIFIED",
        TrustLevel::FormallyVerified => "FORMALLY_VERIFIED",
    }
}

/// Keyed collection of `LockedSkill` by name, serialized as a key-ordered
/// JSON object so diffs stay stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lockfile {
    pub version: u32,
    pub skills: BTreeMap<String, LockedSkill>,
}

impl Lockfile {
    pub fn new() -> Self {
        Lockfile {
            version: LOCKFILE_VERSION,
            skills: BTreeMap::new(),
        }
    }

    /// Builds one `LockedSkill` per installed `(name, version)` pair in
    /// `resolution`, looking up graph metadata, source text, and provenance
    /// for each. `sources` maps `(name, version)` to the skill's raw content
    /// and format; entries absent from `sources` get an empty-content hash
    /// and a `"unknown"` format, since the resolver alone has no way to
    /// recover those from a bare name/version pair.
    pub fn from_resolution(
        resolution: &Resolution,
        graph: &AgentDependencyGraph,
        sources: &BTreeMap<(String, String), SkillSource>,
    ) -> Lockfile {
        let mut lockfile = Lockfile::new();
        for (name, version) in &resolution.installed {
            let key = (name.clone(), version.clone());
            let source = sources.get(&key);
            let content = source.map(|s| s.content.as_str()).unwrap_or("");
            let node = graph.get_node(name, version);

            let mut dependencies = BTreeMap::new();
            if let Some(node) = node {
                for dep in &node.dependencies {
                    if let Some(resolved) = resolution.installed.get(&dep.skill_name) {
                        dependencies.insert(dep.skill_name.clone(), resolved.clone());
                    }
                }
            }

            let locked = LockedSkill {
                name: name.clone(),
                version: version.clone(),
                integrity: compute_integrity(content),
                format: source
                    .map(|s| s.format.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
                capabilities: node
                    .map(|n| n.capabilities.iter().cloned().collect())
                    .unwrap_or_default(),
                trust_score: None,
                trust_level: None,
                dependencies,
                source_path: source.and_then(|s| s.source_path.clone()),
            };
            lockfile.skills.insert(name.clone(), locked);
        }
        lockfile
    }

    /// Attach a computed trust score to an already-locked skill, if present.
    pub fn annotate_trust(&mut self, name: &str, score: &TrustScore) {
        if let Some(locked) = self.skills.get_mut(name) {
            locked.trust_score = Some(score.effective_score);
            locked.trust_level = Some(trust_level_name(score.level).to_string());
        }
    }

    /// Cross-reference validation: every `dependencies` target must resolve
    /// to an entry present in this lockfile. Returns one error string per
    /// violation.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, locked) in &self.skills {
            for dep_name in locked.dependencies.keys() {
                if !self.skills.contains_key(dep_name) {
                    errors.push(format!(
                        "'{name}' depends on '{dep_name}', which is not present in the lockfile"
                    ));
                }
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::constraints::{SkillDependency, VersionConstraint};
    use crate::dependency::graph::SkillNode;

    #[test]
    fn compute_integrity_is_stable_across_calls() {
        let a = compute_integrity("hello world");
        let b = compute_integrity("hello world");
        assert_eq!(a, b);
        assert!(a.starts_with("sha256:"));
        assert_eq!(a.len(), "sha256:".len() + 64);
    }

    #[test]
    fn verify_integrity_detects_tamper() {
        let integrity = compute_integrity("original content");
        assert_eq!(
            verify_integrity(&integrity, "original content"),
            IntegrityStatus::Match
        );
        assert_eq!(
            verify_integrity(&integrity, "tampered content"),
            IntegrityStatus::Mismatch
        );
    }

    #[test]
    fn from_resolution_populates_dependency_versions() {
        let mut graph = AgentDependencyGraph::new();
        let mut app = SkillNode::new("app", "1.0.0");
        app.dependencies.push(SkillDependency {
            skill_name: "lib".to_string(),
            constraint: VersionConstraint::parse(">=1.0.0").unwrap(),
        });
        graph.add_skill(app);
        graph.add_skill(SkillNode::new("lib", "1.2.0"));

        let mut installed = BTreeMap::new();
        installed.insert("app".to_string(), "1.0.0".to_string());
        installed.insert("lib".to_string(), "1.2.0".to_string());
        let resolution = Resolution {
            success: true,
            installed,
            conflicts: Vec::new(),
        };

        let mut sources = BTreeMap::new();
        sources.insert(
            ("app".to_string(), "1.0.0".to_string()),
            SkillSource {
                content: "instructions: ...".to_string(),
                format: "claude".to_string(),
                source_path: Some("skills/app/SKILL.md".to_string()),
            },
        );
        let lockfile = Lockfile::from_resolution(&resolution, &graph, &sources);

        assert_eq!(lockfile.skills.len(), 2);
        let app_entry = &lockfile.skills["app"];
        assert_eq!(
            app_entry.dependencies.get("lib"),
            Some(&"1.2.0".to_string())
        );
        assert_eq!(app_entry.format, "claude");
        assert_eq!(
            app_entry.source_path.as_deref(),
            Some("skills/app/SKILL.md")
        );

        let lib_entry = &lockfile.skills["lib"];
        assert_eq!(lib_entry.format, "unknown");
        assert_eq!(lib_entry.source_path, None);
    }

    #[test]
    fn validate_flags_dangling_dependency() {
        let mut lockfile = Lockfile::new();
        lockfile.skills.insert(
            "app".to_string(),
            LockedSkill {
                name: "app".to_string(),
                version: "1.0.0".to_string(),
                integrity: compute_integrity(""),
                format: "unknown".to_string(),
                capabilities: Vec::new(),
                trust_score: None,
                trust_level: None,
                dependencies: [("missing".to_string(), "1.0.0".to_string())]
                    .into_iter()
                    .collect(),
                source_path: None,
            },
        );

        let errors = lockfile.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("missing"));
    }

    #[test]
    fn validate_accepts_consistent_lockfile() {
        let mut lockfile = Lockfile::new();
        for name in ["app", "lib"] {
            lockfile.skills.insert(
                name.to_string(),
                LockedSkill {
                    name: name.to_string(),
                    version: "1.0.0".to_string(),
                    integrity: compute_integrity(""),
                    format: "unknown".to_string(),
                    capabilities: Vec::new(),
                    trust_score: None,
                    trust_level: None,
                    dependencies: BTreeMap::new(),
                    source_path: None,
                },
            );
        }
        assert!(lockfile.validate().is_empty());
    }

    #[test]
    fn optional_fields_are_omitted_from_serialized_json() {
        let locked = LockedSkill {
            name: "app".to_string(),
            version: "1.0.0".to_string(),
            integrity: compute_integrity(""),
            format: "unknown".to_string(),
            capabilities: Vec::new(),
            trust_score: None,
            trust_level: None,
            dependencies: BTreeMap::new(),
            source_path: None,
        };
        let json = serde_json::to_string(&locked).unwrap();
        assert!(!json.contains("trust_score"));
        assert!(!json.contains("source_path"));
    }
}
