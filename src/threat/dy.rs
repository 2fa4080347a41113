//! `DYSkillAttacker` — a Dolev-Yao attacker over `SkillMessage`s.
//!
//! A pure state machine with a monotone knowledge set `K`, modeled as an
//! owned set behind `&mut self` method receivers (see Design Notes: callers
//! needing independent attackers construct fresh instances).

use std::collections::BTreeSet;

use crate::error::SkillFortifyError;
use crate::threat::messages::{SkillMessage, SupplyChain};

#[derive(Debug, Default)]
pub struct DYSkillAttacker {
    knowledge: BTreeSet<SkillMessage>,
}

// `SkillMessage` derives `Hash`/`Eq` but not `Ord`; the attacker's knowledge
// set only needs set semantics, so order by a synthetic key rather than
// requiring `Ord` on `SkillMessage` itself.
impl PartialOrd for SkillMessage {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SkillMessage {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.skill_name, &self.version, &self.payload).cmp(&(
            &other.skill_name,
            &other.version,
            &other.payload,
        ))
    }
}

impl DYSkillAttacker {
    pub fn new() -> Self {
        DYSkillAttacker::default()
    }

    pub fn knowledge(&self) -> &BTreeSet<SkillMessage> {
        &self.knowledge
    }

    /// Add `m` to `K` and return it unchanged. Idempotent.
    pub fn intercept(&mut self, m: SkillMessage) -> SkillMessage {
        self.knowledge.insert(m.clone());
        m
    }

    /// Append `m` to the named registry and add it to `K`.
    pub fn inject(
        &mut self,
        m: SkillMessage,
        chain: &mut SupplyChain,
        registry: &str,
    ) -> Result<(), SkillFortifyError> {
        let reg = chain.registry_mut(registry).ok_or_else(|| {
            SkillFortifyError::ClosureViolation(format!("unknown registry: {registry}"))
        })?;
        reg.publish(m.clone());
        self.knowledge.insert(m);
        Ok(())
    }

    /// Combine known components into a new message. Every component must
    /// already be in `K`.
    pub fn synthesize(
        &mut self,
        components: &[SkillMessage],
        extra_payload: &[u8],
    ) -> Result<SkillMessage, SkillFortifyError> {
        for c in components {
            if !self.knowledge.contains(c) {
                return Err(SkillFortifyError::ClosureViolation(format!(
                    "unknown component in synthesis: {}@{}",
                    c.skill_name, c.version
                )));
            }
        }

        let names: Vec<&str> = components.iter().map(|c| c.skill_name.as_str()).collect();
        let skill_name = format!("synthesized-{}", names.join("-"));
        let mut payload: Vec<u8> = components.iter().flat_map(|c| c.payload.clone()).collect();
        payload.extend_from_slice(extra_payload);
        let capabilities: BTreeSet<String> = components
            .iter()
            .flat_map(|c| c.capabilities.iter().cloned())
            .collect();

        let synthesized = SkillMessage {
            skill_name,
            version: "0.0.0-synthesized".to_string(),
            payload,
            capabilities,
        };
        self.knowledge.insert(synthesized.clone());
        Ok(synthesized)
    }

    /// Add `m` to `K`, returning its declared capabilities.
    pub fn decompose(&mut self, m: SkillMessage) -> BTreeSet<String> {
        let caps = m.capabilities.clone();
        self.knowledge.insert(m);
        caps
    }

    /// Replay a previously-known message into a registry. `m` must already
    /// be in `K`.
    pub fn replay(
        &mut self,
        m: &SkillMessage,
        chain: &mut SupplyChain,
        registry: &str,
    ) -> Result<(), SkillFortifyError> {
        if !self.knowledge.contains(m) {
            return Err(SkillFortifyError::ClosureViolation(format!(
                "unknown message in replay: {}@{}",
                m.skill_name, m.version
            )));
        }
        let reg = chain.registry_mut(registry).ok_or_else(|| {
            SkillFortifyError::ClosureViolation(format!("unknown registry: {registry}"))
        })?;
        reg.publish(m.clone());
        Ok(())
    }
}
