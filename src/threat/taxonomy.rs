//! Threat taxonomy: supply chain phases, attack classes, threat actors.

use std::collections::BTreeSet;

/// Ordered phases of the agent skill supply chain lifecycle. A skill
/// traverses these sequentially; an attack at phase `p` may propagate to
/// phases `p+1 ..= PERSIST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SupplyChainPhase {
    Install = 1,
    Load = 2,
    Configure = 3,
    Execute = 4,
    Persist = 5,
}

/// Classification of attacks against the agent skill supply chain. Each
/// class targets a fixed, non-empty subset of supply chain phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackClass {
    DataExfiltration,
    PrivilegeEscalation,
    PromptInjection,
    DependencyConfusion,
    Typosquatting,
    NamespaceSquatting,
}

impl AttackClass {
    /// The supply chain phases where this attack class can manifest.
    /// Guaranteed non-empty.
    pub fn applicable_phases(self) -> BTreeSet<SupplyChainPhase> {
        use SupplyChainPhase::*;
        match self {
            AttackClass::DataExfiltration => [Execute, Persist].into_iter().collect(),
            AttackClass::PrivilegeEscalation => [Configure, Execute].into_iter().collect(),
            AttackClass::PromptInjection => [Load, Configure, Execute].into_iter().collect(),
            AttackClass::DependencyConfusion => [Install].into_iter().collect(),
            AttackClass::Typosquatting => [Install].into_iter().collect(),
            AttackClass::NamespaceSquatting => [Install].into_iter().collect(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttackClass::DataExfiltration => "data_exfiltration",
            AttackClass::PrivilegeEscalation => "privilege_escalation",
            AttackClass::PromptInjection => "prompt_injection",
            AttackClass::DependencyConfusion => "dependency_confusion",
            AttackClass::Typosquatting => "typosquatting",
            AttackClass::NamespaceSquatting => "namespace_squatting",
        }
    }

    pub const ALL: [AttackClass; 6] = [
        AttackClass::DataExfiltration,
        AttackClass::PrivilegeEscalation,
        AttackClass::PromptInjection,
        AttackClass::DependencyConfusion,
        AttackClass::Typosquatting,
        AttackClass::NamespaceSquatting,
    ];
}

impl std::fmt::Display for AttackClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories of adversaries in the agent skill supply chain, distinguished
/// by their level of access and attack vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreatActor {
    /// Creates and publishes trojanized skills; full control over content.
    MaliciousAuthor,
    /// Gains administrative control of a skill registry.
    CompromisedRegistry,
    /// Poisons a transitive dependency rather than the top-level skill.
    SupplyChainAttacker,
    /// Authorized user who introduces malicious changes.
    InsiderThreat,
}

/// A specific attack surface: the intersection of a supply chain phase and
/// an attack class, with a human-readable description.
#[derive(Debug, Clone)]
pub struct AttackSurface {
    pub phase: SupplyChainPhase,
    pub attack_class: AttackClass,
    pub description: &'static str,
}

/// The complete enumeration of attack surfaces: one entry per
/// `(phase, attack_class)` pair where the attack is applicable.
pub fn all_surfaces() -> Vec<AttackSurface> {
    use AttackClass::*;
    use SupplyChainPhase::*;
    vec![
        AttackSurface {
            phase: Execute,
            attack_class: DataExfiltration,
            description: "Skill exfiltrates sensitive data (environment variables, API keys, conversation history) to an attacker-controlled endpoint during execution.",
        },
        AttackSurface {
            phase: Persist,
            attack_class: DataExfiltration,
            description: "Skill writes sensitive data to an attacker-readable location during persistence (e.g. logs, shared storage, external databases).",
        },
        AttackSurface {
            phase: Configure,
            attack_class: PrivilegeEscalation,
            description: "Skill requests excessive permissions during configuration that exceed its declared capability set.",
        },
        AttackSurface {
            phase: Execute,
            attack_class: PrivilegeEscalation,
            description: "Skill exploits runtime privilege boundaries to access resources beyond its granted capabilities.",
        },
        AttackSurface {
            phase: Load,
            attack_class: PromptInjection,
            description: "Skill description or metadata contains adversarial prompts that manipulate the agent's LLM when the skill catalog is loaded.",
        },
        AttackSurface {
            phase: Configure,
            attack_class: PromptInjection,
            description: "Skill configuration templates contain injected instructions that alter agent behavior when parameterized.",
        },
        AttackSurface {
            phase: Execute,
            attack_class: PromptInjection,
            description: "Skill return values contain adversarial content that, when passed back to the agent's LLM, hijack subsequent reasoning or actions.",
        },
        AttackSurface {
            phase: Install,
            attack_class: DependencyConfusion,
            description: "Attacker publishes a public skill with the same name as a private internal skill, and the resolver fetches the public one.",
        },
        AttackSurface {
            phase: Install,
            attack_class: Typosquatting,
            description: "Attacker publishes a skill with a name similar to a popular skill; developers install it due to a typo.",
        },
        AttackSurface {
            phase: Install,
            attack_class: NamespaceSquatting,
            description: "Attacker preemptively registers skill names in a namespace likely to be used by a legitimate organization.",
        },
    ]
}
