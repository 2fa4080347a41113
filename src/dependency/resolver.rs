//! SAT-based dependency resolution: CNF encoding, solving, and UNSAT
//! diagnosis.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::capability::Capability;
use crate::dependency::constraints::VersionConstraint;
use crate::dependency::graph::AgentDependencyGraph;
use crate::dependency::sat::{Clause, DpllBackend, SatBackend, SatOutcome};
use crate::error::SkillFortifyError;

/// The result of a resolution attempt. `success = false` is a negative
/// result, not an error — the resolver never fails with `Err` for an
/// unsatisfiable instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub success: bool,
    pub installed: BTreeMap<String, String>,
    pub conflicts: Vec<String>,
}

/// Resolves an `AgentDependencyGraph` against root requirements and an
/// optional capability bound, via a CNF encoding solved by a pluggable
/// `SatBackend`.
pub struct DependencyResolver<'g> {
    graph: &'g AgentDependencyGraph,
    backend: Box<dyn SatBackend>,
}

impl<'g> DependencyResolver<'g> {
    pub fn new(graph: &'g AgentDependencyGraph) -> Self {
        DependencyResolver {
            graph,
            backend: Box::new(DpllBackend),
        }
    }

    pub fn with_backend(graph: &'g AgentDependencyGraph, backend: Box<dyn SatBackend>) -> Self {
        DependencyResolver { graph, backend }
    }

    pub fn resolve(
        &self,
        requirements: &BTreeMap<String, VersionConstraint>,
        allowed_capabilities: Option<&HashSet<Capability>>,
    ) -> Result<Resolution, SkillFortifyError> {
        if !self.backend.is_available() {
            return Err(SkillFortifyError::SolverUnavailable(
                "configured SAT backend reported unavailable".to_string(),
            ));
        }

        let nodes: Vec<(String, String)> = self
            .graph
            .nodes()
            .map(|n| (n.name.clone(), n.version.clone()))
            .collect();

        let mut var_of: HashMap<(String, String), u32> = HashMap::new();
        for (i, key) in nodes.iter().enumerate() {
            var_of.insert(key.clone(), (i + 1) as u32);
        }
        let var_to_key: HashMap<u32, (String, String)> =
            var_of.iter().map(|(k, &v)| (v, k.clone())).collect();

        let mut clauses: Vec<Clause> = Vec::new();

        // 1. At-most-one per skill.
        let mut by_name: HashMap<&str, Vec<u32>> = HashMap::new();
        for (name, version) in &nodes {
            by_name
                .entry(name.as_str())
                .or_default()
                .push(var_of[&(name.clone(), version.clone())]);
        }
        for vars in by_name.values() {
            for i in 0..vars.len() {
                for j in (i + 1)..vars.len() {
                    clauses.push(vec![-(vars[i] as i32), -(vars[j] as i32)]);
                }
            }
        }

        // 2. Root requirements.
        for (req_name, constraint) in requirements {
            let satisfying: Vec<i32> = nodes
                .iter()
                .filter(|(n, v)| n == req_name && constraint.satisfies(v))
                .map(|key| var_of[key] as i32)
                .collect();
            // Empty clause if unsatisfiable — records the failure in the
            // instance itself.
            clauses.push(satisfying);
        }

        // 3. Dependencies.
        for (name, version) in &nodes {
            let x = var_of[&(name.clone(), version.clone())] as i32;
            for d in self.graph.get_dependencies(name, version) {
                let satisfying: Vec<i32> = nodes
                    .iter()
                    .filter(|(n, v)| *n == d.skill_name && d.constraint.satisfies(v))
                    .map(|key| var_of[key] as i32)
                    .collect();
                if satisfying.is_empty() {
                    clauses.push(vec![-x]);
                } else {
                    let mut clause = vec![-x];
                    clause.extend(satisfying);
                    clauses.push(clause);
                }
            }
        }

        // 4. Conflicts.
        for (name, version) in &nodes {
            let x = var_of[&(name.clone(), version.clone())] as i32;
            for c in self.graph.get_conflicts(name, version) {
                for (n, v) in &nodes {
                    if *n == c.skill_name && c.constraint.satisfies(v) {
                        let y = var_of[&(n.clone(), v.clone())] as i32;
                        clauses.push(vec![-x, -y]);
                    }
                }
            }
        }

        // 5. Capability bounds.
        if let Some(allowed) = allowed_capabilities {
            for (name, version) in &nodes {
                let x = var_of[&(name.clone(), version.clone())] as i32;
                if let Some(node) = self.graph.get_node(name, version) {
                    let node_caps: Vec<Capability> = node
                        .capabilities
                        .iter()
                        .filter_map(|s| Capability::parse(s))
                        .collect();
                    let all_within = node_caps.iter().all(|cap| {
                        allowed
                            .iter()
                            .any(|a| a.resource == cap.resource && a.access >= cap.access)
                    });
                    if !all_within {
                        clauses.push(vec![-x]);
                    }
                }
            }
        }

        debug!(
            num_vars = nodes.len(),
            num_clauses = clauses.len(),
            "encoded SAT instance for dependency resolution"
        );

        match self.backend.solve(nodes.len() as u32, &clauses) {
            SatOutcome::Sat(model) => {
                let mut installed = BTreeMap::new();
                for (var, key) in &var_to_key {
                    if model.get(var).copied().unwrap_or(false) {
                        installed.insert(key.0.clone(), key.1.clone());
                    }
                }
                Ok(Resolution {
                    success: true,
                    installed,
                    conflicts: Vec::new(),
                })
            }
            SatOutcome::Unsat => {
                let conflicts = self.diagnose_failure(requirements, allowed_capabilities, &nodes);
                Ok(Resolution {
                    success: false,
                    installed: BTreeMap::new(),
                    conflicts,
                })
            }
        }
    }

    fn diagnose_failure(
        &self,
        requirements: &BTreeMap<String, VersionConstraint>,
        allowed_capabilities: Option<&HashSet<Capability>>,
        nodes: &[(String, String)],
    ) -> Vec<String> {
        let mut diagnostics = Vec::new();

        if let Some(allowed) = allowed_capabilities {
            for (name, version) in nodes {
                if requirements.contains_key(name)
                    && let Some(node) = self.graph.get_node(name, version)
                {
                    let overreaching: Vec<&str> = node
                        .capabilities
                        .iter()
                        .filter_map(|s| Capability::parse(s))
                        .filter(|cap| {
                            !allowed
                                .iter()
                                .any(|a| a.resource == cap.resource && a.access >= cap.access)
                        })
                        .map(|_| name.as_str())
                        .collect();
                    if !overreaching.is_empty() {
                        diagnostics.push(format!(
                            "'{name}@{version}' requires capabilities beyond the allowed set"
                        ));
                    }
                }
            }
        }

        for (req_name, constraint) in requirements {
            let available = self.graph.get_versions(req_name);
            if available.is_empty() {
                diagnostics.push(format!(
                    "required skill '{req_name}' is not present in the graph"
                ));
            } else if !available.iter().any(|v| constraint.satisfies(v)) {
                diagnostics.push(format!(
                    "no version of '{req_name}' satisfies '{}' (available: {})",
                    constraint.raw(),
                    available.join(", ")
                ));
            }
        }

        for (name, version) in nodes {
            for d in self.graph.get_dependencies(name, version) {
                let available = self.graph.get_versions(&d.skill_name);
                if !available.iter().any(|v| d.constraint.satisfies(v)) {
                    diagnostics.push(format!(
                        "'{name}@{version}' depends on '{}' satisfying '{}', but no such version exists",
                        d.skill_name,
                        d.constraint.raw()
                    ));
                }
            }
        }

        let req_names: Vec<&String> = requirements.keys().collect();
        for i in 0..req_names.len() {
            for j in (i + 1)..req_names.len() {
                let a = req_names[i];
                let b = req_names[j];
                if self.mutually_conflicting(a, b) {
                    diagnostics.push(format!(
                        "required skills '{a}' and '{b}' conflict with each other"
                    ));
                }
            }
        }

        if diagnostics.is_empty() {
            diagnostics.push(
                "Resolution failed: no satisfying assignment exists (constraint system is unsatisfiable)"
                    .to_string(),
            );
        }

        diagnostics
    }

    fn mutually_conflicting(&self, a: &str, b: &str) -> bool {
        for version in self.graph.get_versions(a) {
            for c in self.graph.get_conflicts(a, &version) {
                if c.skill_name == b
                    && self
                        .graph
                        .get_versions(b)
                        .iter()
                        .all(|v| c.constraint.satisfies(v))
                {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::AccessLevel;
    use crate::dependency::constraints::SkillDependency;
    use crate::dependency::graph::SkillNode;

    fn req(name: &str, constraint: &str) -> (String, VersionConstraint) {
        (name.to_string(), VersionConstraint::parse(constraint).unwrap())
    }

    #[test]
    fn scenario_resolution_simple_success() {
        let mut graph = AgentDependencyGraph::new();
        let mut app = SkillNode::new("app", "1.0.0");
        app.dependencies.push(SkillDependency {
            skill_name: "lib".to_string(),
            constraint: VersionConstraint::parse(">=1.0.0").unwrap(),
        });
        graph.add_skill(app);
        graph.add_skill(SkillNode::new("lib", "1.2.0"));

        let resolver = DependencyResolver::new(&graph);
        let requirements: BTreeMap<_, _> = [req("app", "*")].into_iter().collect();
        let resolution = resolver.resolve(&requirements, None).unwrap();

        assert!(resolution.success);
        assert_eq!(resolution.installed.get("app"), Some(&"1.0.0".to_string()));
        assert_eq!(resolution.installed.get("lib"), Some(&"1.2.0".to_string()));
    }

    #[test]
    fn resolution_is_deterministic_across_repeated_calls() {
        let mut graph = AgentDependencyGraph::new();
        let mut app = SkillNode::new("app", "1.0.0");
        app.dependencies.push(SkillDependency {
            skill_name: "lib".to_string(),
            constraint: VersionConstraint::parse(">=1.0.0").unwrap(),
        });
        graph.add_skill(app);
        graph.add_skill(SkillNode::new("lib", "1.2.0"));

        let resolver = DependencyResolver::new(&graph);
        let requirements: BTreeMap<_, _> = [req("app", "*")].into_iter().collect();
        let r1 = resolver.resolve(&requirements, None).unwrap();
        let r2 = resolver.resolve(&requirements, None).unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn missing_required_skill_diagnoses() {
        let graph = AgentDependencyGraph::new();
        let resolver = DependencyResolver::new(&graph);
        let requirements: BTreeMap<_, _> = [req("app", "*")].into_iter().collect();
        let resolution = resolver.resolve(&requirements, None).unwrap();
        assert!(!resolution.success);
        assert!(!resolution.conflicts.is_empty());
    }

    #[test]
    fn at_most_one_version_per_skill_in_installed() {
        let mut graph = AgentDependencyGraph::new();
        graph.add_skill(SkillNode::new("lib", "1.0.0"));
        graph.add_skill(SkillNode::new("lib", "2.0.0"));
        let resolver = DependencyResolver::new(&graph);
        let requirements: BTreeMap<_, _> = [req("lib", "*")].into_iter().collect();
        let resolution = resolver.resolve(&requirements, None).unwrap();
        assert!(resolution.success);
        assert_eq!(resolution.installed.len(), 1);
    }

    #[test]
    fn capability_bound_excludes_overreaching_nodes() {
        let mut graph = AgentDependencyGraph::new();
        let mut node = SkillNode::new("tool", "1.0.0");
        node.capabilities.insert("shell:admin".to_string());
        graph.add_skill(node);

        let resolver = DependencyResolver::new(&graph);
        let requirements: BTreeMap<_, _> = [req("tool", "*")].into_iter().collect();
        let allowed: HashSet<_> = [Capability::new("shell", AccessLevel::Read)]
            .into_iter()
            .collect();
        let resolution = resolver.resolve(&requirements, Some(&allowed)).unwrap();
        assert!(!resolution.success);
    }

    #[test]
    fn conflicting_skills_cannot_both_install() {
        let mut graph = AgentDependencyGraph::new();
        let mut app = SkillNode::new("app", "1.0.0");
        app.conflicts.push(crate::dependency::constraints::SkillConflict {
            skill_name: "lib".to_string(),
            constraint: VersionConstraint::parse("2.0.0").unwrap(),
        });
        graph.add_skill(app);
        graph.add_skill(SkillNode::new("lib", "1.2.0"));
        graph.add_skill(SkillNode::new("lib", "2.0.0"));

        let resolver = DependencyResolver::new(&graph);
        let requirements: BTreeMap<_, _> =
            [req("app", "*"), req("lib", "*")].into_iter().collect();
        let resolution = resolver.resolve(&requirements, None).unwrap();
        if resolution.success {
            assert_eq!(resolution.installed.get("lib"), Some(&"1.2.0".to_string()));
        }
    }
}
