//! `SkillMessage`, `Registry`, and `SupplyChain` — the Dolev-Yao channel
//! model's message and topology types.

use std::collections::{BTreeMap, BTreeSet};

/// An immutable, hashable message: the Dolev-Yao analog of a network
/// message, carried between registries, authors, and agents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SkillMessage {
    pub skill_name: String,
    pub version: String,
    pub payload: Vec<u8>,
    pub capabilities: BTreeSet<String>,
}

impl SkillMessage {
    pub fn new(
        skill_name: impl Into<String>,
        version: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        capabilities: impl IntoIterator<Item = String>,
    ) -> Self {
        SkillMessage {
            skill_name: skill_name.into(),
            version: version.into(),
            payload: payload.into(),
            capabilities: capabilities.into_iter().collect(),
        }
    }
}

/// An ordered list of published `SkillMessage`s.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub name: String,
    published: Vec<SkillMessage>,
}

impl Registry {
    pub fn new(name: impl Into<String>) -> Self {
        Registry {
            name: name.into(),
            published: Vec::new(),
        }
    }

    pub fn publish(&mut self, message: SkillMessage) {
        self.published.push(message);
    }

    pub fn published(&self) -> &[SkillMessage] {
        &self.published
    }
}

/// The full supply chain topology: authors, named registries, developers,
/// and environments.
#[derive(Debug, Clone, Default)]
pub struct SupplyChain {
    pub authors: Vec<String>,
    pub registries: BTreeMap<String, Registry>,
    pub developers: Vec<String>,
    pub environments: Vec<String>,
}

impl SupplyChain {
    pub fn new() -> Self {
        SupplyChain::default()
    }

    pub fn registry(&self, name: &str) -> Option<&Registry> {
        self.registries.get(name)
    }

    pub fn registry_mut(&mut self, name: &str) -> Option<&mut Registry> {
        self.registries.get_mut(name)
    }

    /// A fixture topology used by tests and examples: three authors
    /// (including an attacker, "mallory"), two registries ("official" and
    /// "community"), two developers, two environments ("staging" and
    /// "production"), with the official registry pre-seeded with two
    /// legitimate skills.
    pub fn example() -> Self {
        let mut official = Registry::new("official");
        official.publish(SkillMessage::new(
            "web-search",
            "2.0.0",
            b"".to_vec(),
            ["network:read".to_string()],
        ));
        official.publish(SkillMessage::new(
            "file-reader",
            "1.1.0",
            b"".to_vec(),
            ["file:read".to_string()],
        ));

        let mut registries = BTreeMap::new();
        registries.insert("official".to_string(), official);
        registries.insert("community".to_string(), Registry::new("community"));

        SupplyChain {
            authors: vec!["alice".into(), "bob".into(), "mallory".into()],
            registries,
            developers: vec!["dev-1".into(), "dev-2".into()],
            environments: vec!["staging".into(), "production".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_publish_appends() {
        let mut reg = Registry::new("official");
        reg.publish(SkillMessage::new("a", "1.0.0", vec![], []));
        reg.publish(SkillMessage::new("b", "1.0.0", vec![], []));
        assert_eq!(reg.published().len(), 2);
    }

    #[test]
    fn example_fixture_topology() {
        let chain = SupplyChain::example();
        assert_eq!(chain.authors.len(), 3);
        assert!(chain.authors.contains(&"mallory".to_string()));
        assert_eq!(chain.registries.len(), 2);
        assert_eq!(chain.developers.len(), 2);
        assert_eq!(chain.environments.len(), 2);
        assert_eq!(chain.registry("official").unwrap().published().len(), 2);
        assert_eq!(chain.registry("community").unwrap().published().len(), 0);
    }
}
