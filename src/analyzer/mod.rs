//! The three-phase static analyzer: capability inference, dangerous-pattern
//! detection, capability-violation check.

pub mod patterns;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::capability::{AccessLevel, Capability, CapabilitySet};
use crate::threat::taxonomy::AttackClass;
use crate::util::truncate_evidence;

const MAX_EVIDENCE_BYTES: usize = 120;

/// Ordered severity, `LOW < MEDIUM < HIGH < CRITICAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Severity {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

/// The mechanism that produced a `Finding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    PatternMatch,
    InfoFlow,
    CapabilityViolation,
}

/// An immutable analyzer finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub skill_name: String,
    pub severity: Severity,
    pub message: String,
    pub attack_class: AttackClass,
    pub finding_type: FindingType,
    pub evidence: String,
}

impl Finding {
    fn new(
        skill_name: &str,
        severity: Severity,
        message: impl Into<String>,
        attack_class: AttackClass,
        finding_type: FindingType,
        evidence: &str,
    ) -> Finding {
        Finding {
            skill_name: skill_name.to_string(),
            severity,
            message: message.into(),
            attack_class,
            finding_type,
            evidence: truncate_evidence(evidence, MAX_EVIDENCE_BYTES),
        }
    }
}

// `AttackClass` has no derive for (de)serialization in `threat::taxonomy`
// since it is primarily a formal-model type; the analyzer is the boundary
// that needs to carry it across `ParsedSkill`/JSON output, so the
// serde impls live here next to their only consumer.
impl Serialize for AttackClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AttackClass {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "data_exfiltration" => Ok(AttackClass::DataExfiltration),
            "privilege_escalation" => Ok(AttackClass::PrivilegeEscalation),
            "prompt_injection" => Ok(AttackClass::PromptInjection),
            "dependency_confusion" => Ok(AttackClass::DependencyConfusion),
            "typosquatting" => Ok(AttackClass::Typosquatting),
            "namespace_squatting" => Ok(AttackClass::NamespaceSquatting),
            other => Err(serde::de::Error::custom(format!(
                "unknown attack class: {other}"
            ))),
        }
    }
}

/// The result of analyzing one skill: findings plus inferred capabilities.
/// `is_safe` iff `findings` is empty.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub skill_name: String,
    pub findings: Vec<Finding>,
    pub inferred_capabilities: CapabilitySet,
}

impl AnalysisResult {
    pub fn is_safe(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

/// The input contract produced by external parsers. All fields are
/// read-only and purely textual/byte data; the core never mutates or
/// retains a reference to this after `analyze` returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedSkill {
    pub name: String,
    pub version: String,
    pub source_path: Option<String>,
    pub format: String,
    pub description: String,
    pub instructions: String,
    pub declared_capabilities: Vec<String>,
    pub dependencies: Vec<String>,
    pub code_blocks: Vec<String>,
    pub urls: Vec<String>,
    pub env_vars_referenced: Vec<String>,
    pub shell_commands: Vec<String>,
    pub raw_content: String,
}

/// Run the full three-phase analysis of `skill`. Stateless; concurrent
/// invocations on different skills never interfere.
pub fn analyze(skill: &ParsedSkill) -> AnalysisResult {
    let mut findings = Vec::new();

    let inferred = infer_capabilities(skill);
    trace!(skill = %skill.name, capabilities = inferred.len(), "phase 1 complete");

    detect_dangerous_patterns(skill, &mut findings);
    trace!(skill = %skill.name, findings = findings.len(), "phase 2 complete");

    check_capability_violations(skill, &inferred, &mut findings);
    debug!(
        skill = %skill.name,
        total_findings = findings.len(),
        "analysis complete"
    );

    AnalysisResult {
        skill_name: skill.name.clone(),
        findings,
        inferred_capabilities: inferred,
    }
}

/// Phase 1 — conservative capability inference. A sound over-approximation:
/// any syntactic indicator suggesting a capability is included.
fn infer_capabilities(skill: &ParsedSkill) -> CapabilitySet {
    let mut set = CapabilitySet::new();

    if !skill.urls.is_empty() {
        set.add(Capability::new("network", AccessLevel::Read));
        if skill
            .shell_commands
            .iter()
            .any(|cmd| patterns::HTTP_WRITE_VERB.is_match(cmd))
        {
            set.add(Capability::new("network", AccessLevel::Write));
        }
    }

    if !skill.shell_commands.is_empty() {
        set.add(Capability::new("shell", AccessLevel::Write));
    }

    if !skill.env_vars_referenced.is_empty() {
        set.add(Capability::new("environment", AccessLevel::Read));
    }

    let text = format!("{} {}", skill.instructions, skill.description);
    if patterns::FILE_WRITE_VERB.is_match(&text) {
        set.add(Capability::new("filesystem", AccessLevel::Write));
    } else if patterns::FILE_READ_VERB.is_match(&text) {
        set.add(Capability::new("filesystem", AccessLevel::Read));
    }

    set
}

/// Phase 2 — dangerous pattern detection. Emission order: shell, code
/// block, URL, env var, info-flow; input ordering preserved within a phase.
fn detect_dangerous_patterns(skill: &ParsedSkill, findings: &mut Vec<Finding>) {
    for cmd in &skill.shell_commands {
        if patterns::CURL_PIPE_SHELL.is_match(cmd) {
            findings.push(Finding::new(
                &skill.name,
                Severity::Critical,
                "Shell command pipes a remote script directly into an interpreter",
                AttackClass::PrivilegeEscalation,
                FindingType::PatternMatch,
                cmd,
            ));
        }
        if patterns::RM_RF_ROOT.is_match(cmd) {
            findings.push(Finding::new(
                &skill.name,
                Severity::Critical,
                "Shell command recursively deletes the filesystem root",
                AttackClass::PrivilegeEscalation,
                FindingType::PatternMatch,
                cmd,
            ));
        }
        if patterns::CHMOD_777_SENSITIVE.is_match(cmd) {
            findings.push(Finding::new(
                &skill.name,
                Severity::High,
                "Shell command grants world-writable permissions on a sensitive path",
                AttackClass::PrivilegeEscalation,
                FindingType::PatternMatch,
                cmd,
            ));
        }
        if patterns::BASE64_DECODE_PIPE_SHELL.is_match(cmd) {
            findings.push(Finding::new(
                &skill.name,
                Severity::Critical,
                "Shell command decodes base64 content directly into an interpreter",
                AttackClass::PrivilegeEscalation,
                FindingType::PatternMatch,
                cmd,
            ));
        }
        if patterns::NETCAT_LISTENER.is_match(cmd) {
            findings.push(Finding::new(
                &skill.name,
                Severity::Critical,
                "Shell command opens a netcat listener",
                AttackClass::DataExfiltration,
                FindingType::PatternMatch,
                cmd,
            ));
        }
    }

    for block in &skill.code_blocks {
        if patterns::EVAL_OR_EXEC_CALL.is_match(block) {
            findings.push(Finding::new(
                &skill.name,
                Severity::High,
                "Code block calls eval/exec on dynamic content",
                AttackClass::PrivilegeEscalation,
                FindingType::PatternMatch,
                block,
            ));
        }
    }

    for url in &skill.urls {
        if !patterns::is_allowed_url(url) {
            findings.push(Finding::new(
                &skill.name,
                Severity::High,
                "URL is not on the documentation/registry allow-list",
                AttackClass::DataExfiltration,
                FindingType::PatternMatch,
                url,
            ));
        }
    }

    for var in &skill.env_vars_referenced {
        if patterns::is_sensitive_env_var(var) {
            findings.push(Finding::new(
                &skill.name,
                Severity::High,
                format!("Skill references sensitive environment variable {var}"),
                AttackClass::DataExfiltration,
                FindingType::PatternMatch,
                var,
            ));
        }
    }

    let has_base64 = skill
        .shell_commands
        .iter()
        .chain(skill.code_blocks.iter())
        .any(|s| patterns::BASE64_ENCODE.is_match(s));
    let has_external_url = skill.urls.iter().any(|u| !patterns::is_allowed_url(u));
    if has_base64 && has_external_url {
        findings.push(Finding::new(
            &skill.name,
            Severity::Critical,
            "Skill encodes data as base64 and references an external URL",
            AttackClass::DataExfiltration,
            FindingType::InfoFlow,
            "base64 + external URL",
        ));
    }
}

/// Phase 3 — capability-violation check. Skipped entirely when
/// `declared_capabilities` is empty (no contract, no violation).
fn check_capability_violations(
    skill: &ParsedSkill,
    inferred: &CapabilitySet,
    findings: &mut Vec<Finding>,
) {
    if skill.declared_capabilities.is_empty() {
        return;
    }

    let declared = CapabilitySet::from_list(
        skill
            .declared_capabilities
            .iter()
            .filter_map(|s| Capability::parse(s)),
    );

    for violation in inferred.violations_against(&declared) {
        let declared_level = declared
            .get(&violation.resource)
            .map(|lvl| lvl.to_string())
            .unwrap_or_else(|| "NONE (undeclared)".to_string());
        findings.push(Finding::new(
            &skill.name,
            Severity::High,
            format!(
                "Capability violation: skill requires {}:{} but only declares up to {}:{}",
                violation.resource, violation.access, violation.resource, declared_level
            ),
            AttackClass::PrivilegeEscalation,
            FindingType::CapabilityViolation,
            &format!("inferred={}:{}", violation.resource, violation.access),
        ));
    }
}
