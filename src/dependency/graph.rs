//! `SkillNode` and `AgentDependencyGraph` — the formal tuple `(S, V, D, C, Cap)`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::dependency::constraints::{SkillConflict, SkillDependency, compare_versions};

/// A single versioned skill: its dependencies, conflicts, and capabilities.
/// Identified by `(name, version)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillNode {
    pub name: String,
    pub version: String,
    pub dependencies: Vec<SkillDependency>,
    pub conflicts: Vec<SkillConflict>,
    pub capabilities: BTreeSet<String>,
}

impl SkillNode {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        SkillNode {
            name: name.into(),
            version: version.into(),
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            capabilities: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> (String, String) {
        (self.name.clone(), self.version.clone())
    }
}

/// Keyed collection of `SkillNode`s by `(name, version)`. Not safe for
/// concurrent mutation; readers must not mutate.
#[derive(Debug, Clone, Default)]
pub struct AgentDependencyGraph {
    nodes: BTreeMap<(String, String), SkillNode>,
}

impl AgentDependencyGraph {
    pub fn new() -> Self {
        AgentDependencyGraph::default()
    }

    /// Insert `node`, replacing any existing node with the same key.
    pub fn add_skill(&mut self, node: SkillNode) {
        self.nodes.insert(node.key(), node);
    }

    pub fn get_node(&self, name: &str, version: &str) -> Option<&SkillNode> {
        self.nodes.get(&(name.to_string(), version.to_string()))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SkillNode> {
        self.nodes.values()
    }

    pub fn skill_names(&self) -> BTreeSet<String> {
        self.nodes.keys().map(|(name, _)| name.clone()).collect()
    }

    /// Versions of `name`, newest-first by semver (lexicographic fallback
    /// for non-semver strings).
    pub fn get_versions(&self, name: &str) -> Vec<String> {
        let mut versions: Vec<String> = self
            .nodes
            .keys()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .collect();
        versions.sort_by(|a, b| compare_versions(a, b).reverse());
        versions
    }

    pub fn get_dependencies(&self, name: &str, version: &str) -> &[SkillDependency] {
        self.get_node(name, version)
            .map(|n| n.dependencies.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_conflicts(&self, name: &str, version: &str) -> &[SkillConflict] {
        self.get_node(name, version)
            .map(|n| n.conflicts.as_slice())
            .unwrap_or(&[])
    }

    /// Detect cycles at skill-name granularity (versions of the same name
    /// are merged). Iterative DFS with three-coloring; a back-edge to a
    /// gray vertex reconstructs the cycle via parent pointers. Iterative so
    /// it cannot stack-overflow on large graphs.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let adjacency = self.name_adjacency();
        let mut color: HashMap<String, Color> =
            adjacency.keys().map(|n| (n.clone(), Color::White)).collect();
        let mut parent: HashMap<String, String> = HashMap::new();
        let mut cycles = Vec::new();

        let names: Vec<String> = adjacency.keys().cloned().collect();
        for start in names {
            if color[&start] != Color::White {
                continue;
            }
            // Stack of (node, index of next neighbor to visit).
            let mut stack: Vec<(String, usize)> = vec![(start.clone(), 0)];
            color.insert(start, Color::Gray);

            while let Some((node, idx)) = stack.pop() {
                let neighbors = &adjacency[&node];
                if idx >= neighbors.len() {
                    color.insert(node, Color::Black);
                    continue;
                }
                // Re-push this frame advanced to the next neighbor before
                // descending, so we resume here after the child returns.
                stack.push((node.clone(), idx + 1));

                let succ = neighbors[idx].clone();
                match color.get(&succ).copied().unwrap_or(Color::White) {
                    Color::White => {
                        parent.insert(succ.clone(), node.clone());
                        color.insert(succ.clone(), Color::Gray);
                        stack.push((succ, 0));
                    }
                    Color::Gray => {
                        // Back-edge: reconstruct the cycle by walking parent
                        // pointers from `node` up to `succ`.
                        let mut cycle = vec![node.clone()];
                        let mut cur = node;
                        while cur != succ {
                            match parent.get(&cur) {
                                Some(p) => {
                                    cycle.push(p.clone());
                                    cur = p.clone();
                                }
                                None => break,
                            }
                        }
                        cycle.reverse();
                        cycle.push(succ);
                        cycles.push(cycle);
                    }
                    Color::Black => {}
                }
            }
        }

        cycles
    }

    fn name_adjacency(&self) -> HashMap<String, Vec<String>> {
        let mut adjacency: HashMap<String, BTreeSet<String>> = HashMap::new();
        for node in self.nodes.values() {
            adjacency.entry(node.name.clone()).or_default();
            for dep in &node.dependencies {
                adjacency
                    .entry(node.name.clone())
                    .or_default()
                    .insert(dep.skill_name.clone());
                // A dependency's target may not be a known node (a dangling
                // reference); give it its own empty entry so traversal never
                // looks up a name that was only ever seen as a value.
                adjacency.entry(dep.skill_name.clone()).or_default();
            }
        }
        adjacency
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect()
    }

    /// BFS transitive dependency closure from `(name, version)`. Picks the
    /// highest satisfying version per dependency (optimistic resolution).
    /// Excludes the root from the returned set.
    pub fn transitive_dependencies(&self, name: &str, version: &str) -> BTreeSet<(String, String)> {
        let mut visited: HashSet<(String, String)> = HashSet::new();
        let mut queue: VecDeque<(String, String)> = VecDeque::new();
        queue.push_back((name.to_string(), version.to_string()));
        visited.insert((name.to_string(), version.to_string()));

        let mut result: BTreeSet<(String, String)> = BTreeSet::new();

        while let Some((n, v)) = queue.pop_front() {
            for dep in self.get_dependencies(&n, &v) {
                if let Some(best) = self.highest_satisfying_version(&dep.skill_name, &dep.constraint) {
                    let key = (dep.skill_name.clone(), best.clone());
                    if visited.insert(key.clone()) {
                        result.insert(key.clone());
                        queue.push_back(key);
                    }
                }
            }
        }

        result
    }

    fn highest_satisfying_version(
        &self,
        name: &str,
        constraint: &crate::dependency::constraints::VersionConstraint,
    ) -> Option<String> {
        self.get_versions(name)
            .into_iter()
            .find(|v| constraint.satisfies(v))
    }

    /// Reverse transitive closure of a vulnerable set. For every
    /// non-vulnerable node, collect the vulnerable nodes it transitively
    /// depends on (via best-match resolution).
    pub fn propagate_vulnerabilities(
        &self,
        vulnerable: &BTreeSet<(String, String)>,
    ) -> BTreeMap<(String, String), Vec<(String, String)>> {
        let mut affected: BTreeMap<(String, String), Vec<(String, String)>> = BTreeMap::new();

        for node in self.nodes.values() {
            let key = node.key();
            if vulnerable.contains(&key) {
                continue;
            }
            let reachable = self.transitive_dependencies(&node.name, &node.version);
            let mut hit: Vec<(String, String)> = reachable
                .into_iter()
                .filter(|k| vulnerable.contains(k))
                .collect();
            if !hit.is_empty() {
                hit.sort();
                affected.insert(key, hit);
            }
        }

        affected
    }
}
