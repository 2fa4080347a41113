//! CycloneDX 1.6 bill-of-materials generation over analyzed, trust-scored
//! skills.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzer::AnalysisResult;
use crate::trust::TrustScore;

const BOM_FORMAT: &str = "CycloneDX";
const SPEC_VERSION: &str = "1.6";

/// One analyzed skill plus its trust score, as fed to the SBOM generator.
/// The generator consumes these and its own bookkeeping; it never mutates
/// the analysis or trust layers.
#[derive(Debug, Clone)]
pub struct SkillComponentInput {
    pub name: String,
    pub version: String,
    pub format: String,
    pub analysis: AnalysisResult,
    pub trust: Option<TrustScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentProperty {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillComponent {
    #[serde(rename = "type")]
    pub component_type: String,
    pub name: String,
    pub version: String,
    pub purl: String,
    pub properties: Vec<ComponentProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomMetadata {
    pub timestamp: DateTime<Utc>,
    pub component: SbomProject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbomProject {
    #[serde(rename = "type")]
    pub component_type: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomDependency {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "dependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sbom {
    #[serde(rename = "bomFormat")]
    pub bom_format: String,
    #[serde(rename = "specVersion")]
    pub spec_version: String,
    pub metadata: BomMetadata,
    pub components: Vec<SkillComponent>,
    pub dependencies: Vec<BomDependency>,
}

/// `pkg:agent-skill/<name>@<version>`.
fn purl(name: &str, version: &str) -> String {
    format!("pkg:agent-skill/{name}@{version}")
}

fn component_properties(input: &SkillComponentInput) -> Vec<ComponentProperty> {
    let trust_score = input
        .trust
        .as_ref()
        .map(|t| t.effective_score.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let trust_level = input
        .trust
        .as_ref()
        .map(|t| format!("{:?}", t.level))
        .unwrap_or_else(|| "unknown".to_string());

    vec![
        ComponentProperty {
            name: "skillfortify:trust-score".to_string(),
            value: trust_score,
        },
        ComponentProperty {
            name: "skillfortify:trust-level".to_string(),
            value: trust_level,
        },
        ComponentProperty {
            name: "skillfortify:is-safe".to_string(),
            value: input.analysis.is_safe().to_string(),
        },
        ComponentProperty {
            name: "skillfortify:format".to_string(),
            value: input.format.clone(),
        },
    ]
}

/// Builds a CycloneDX 1.6 document for `inputs`, a dependency map of
/// `name -> [dependency names]`, a `project_name`, and a generation
/// `timestamp` (caller-supplied, since the core never reads the clock).
pub fn generate(
    project_name: &str,
    inputs: &[SkillComponentInput],
    dependencies: &BTreeMap<String, Vec<String>>,
    timestamp: DateTime<Utc>,
) -> Sbom {
    let components: Vec<SkillComponent> = inputs
        .iter()
        .map(|input| SkillComponent {
            component_type: "application".to_string(),
            name: input.name.clone(),
            version: input.version.clone(),
            purl: purl(&input.name, &input.version),
            properties: component_properties(input),
        })
        .collect();

    let bom_dependencies: Vec<BomDependency> = inputs
        .iter()
        .map(|input| {
            let mut depends_on = dependencies.get(&input.name).cloned().unwrap_or_default();
            depends_on.sort();
            BomDependency {
                reference: purl(&input.name, &input.version),
                depends_on: depends_on
                    .into_iter()
                    .filter_map(|dep_name| {
                        inputs
                            .iter()
                            .find(|c| c.name == dep_name)
                            .map(|c| purl(&c.name, &c.version))
                    })
                    .collect(),
            }
        })
        .collect();

    Sbom {
        bom_format: BOM_FORMAT.to_string(),
        spec_version: SPEC_VERSION.to_string(),
        metadata: BomMetadata {
            timestamp,
            component: SbomProject {
                component_type: "application".to_string(),
                name: project_name.to_string(),
            },
        },
        components,
        dependencies: bom_dependencies,
    }
}

/// Aggregate counts over `inputs`: total, safe, unsafe, total findings,
/// and the format/trust-level distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SbomSummary {
    pub total: usize,
    pub safe: usize,
    pub unsafe_count: usize,
    pub total_findings: usize,
    pub formats: BTreeMap<String, usize>,
    pub trust_levels: BTreeMap<String, usize>,
}

pub fn summary(inputs: &[SkillComponentInput]) -> SbomSummary {
    let mut formats = BTreeMap::new();
    let mut trust_levels = BTreeMap::new();
    let mut safe = 0;
    let mut total_findings = 0;

    for input in inputs {
        *formats.entry(input.format.clone()).or_insert(0) += 1;
        total_findings += input.analysis.findings.len();
        if input.analysis.is_safe() {
            safe += 1;
        }
        let level_name = input
            .trust
            .as_ref()
            .map(|t| format!("{:?}", t.level))
            .unwrap_or_else(|| "unknown".to_string());
        *trust_levels.entry(level_name).or_insert(0) += 1;
    }

    SbomSummary {
        total: inputs.len(),
        safe,
        unsafe_count: inputs.len() - safe,
        total_findings,
        formats,
        trust_levels,
    }
}
