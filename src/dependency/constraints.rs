//! `VersionConstraint`, `SkillDependency`, `SkillConflict`.

use std::fmt;

use semver::{Version, VersionReq};
use tracing::warn;

use crate::error::{InvalidInputKind, SkillFortifyError};

/// A parsed semantic-version expression: `*`, exact `x.y.z`, or a single
/// comparator (`>=`, `>`, `<=`, `<`, `~`, `^`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    raw: String,
    expr: ConstraintExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConstraintExpr {
    Any,
    Req(VersionReq),
}

impl VersionConstraint {
    pub fn parse(raw: &str) -> Result<VersionConstraint, SkillFortifyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(VersionConstraint {
                raw: raw.to_string(),
                expr: ConstraintExpr::Any,
            });
        }

        // `semver::VersionReq` already understands `>=`, `>`, `<=`, `<`, `~`,
        // `^`, and bare exact versions via its default Caret-free comparator
        // syntax once we normalize an exact version into `=x.y.z`.
        let normalized = if trimmed
            .chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
        {
            format!("={trimmed}")
        } else {
            trimmed.to_string()
        };

        let req = VersionReq::parse(&normalized).map_err(|e| {
            InvalidInputKind::InvalidVersionConstraint(format!("{raw}: {e}"))
        })?;

        Ok(VersionConstraint {
            raw: raw.to_string(),
            expr: ConstraintExpr::Req(req),
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn any() -> VersionConstraint {
        VersionConstraint {
            raw: "*".to_string(),
            expr: ConstraintExpr::Any,
        }
    }

    /// True iff `version` satisfies this constraint. Non-semver version
    /// strings are treated as not-satisfying (a warning is logged), matching
    /// the "degrade gracefully rather than panic" rule.
    pub fn satisfies(&self, version: &str) -> bool {
        match &self.expr {
            ConstraintExpr::Any => true,
            ConstraintExpr::Req(req) => match Version::parse(version) {
                Ok(v) => req.matches(&v),
                Err(_) => {
                    warn!(version, "non-semver version string in satisfies() check");
                    false
                }
            },
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compare two version strings for sort ordering. Falls back to
/// lexicographic ordering (with a warning) for non-semver strings, per the
/// documented Open Question resolution.
pub fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => {
            warn!(a, b, "comparing non-semver version strings lexicographically");
            a.cmp(b)
        }
    }
}

/// A dependency edge: `skill_name` must satisfy `constraint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDependency {
    pub skill_name: String,
    pub constraint: VersionConstraint,
}

/// A conflict edge, same shape as `SkillDependency`: the named skill must
/// NOT be installed at a version satisfying `constraint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillConflict {
    pub skill_name: String,
    pub constraint: VersionConstraint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_constraint_satisfies_everything() {
        let c = VersionConstraint::parse("*").unwrap();
        assert!(c.satisfies("1.0.0"));
        assert!(c.satisfies("99.99.99"));
    }

    #[test]
    fn exact_constraint() {
        let c = VersionConstraint::parse("1.2.3").unwrap();
        assert!(c.satisfies("1.2.3"));
        assert!(!c.satisfies("1.2.4"));
    }

    #[test]
    fn gte_constraint() {
        let c = VersionConstraint::parse(">=1.0.0").unwrap();
        assert!(c.satisfies("1.0.0"));
        assert!(c.satisfies("2.0.0"));
        assert!(!c.satisfies("0.9.0"));
    }

    #[test]
    fn caret_constraint() {
        let c = VersionConstraint::parse("^1.2.0").unwrap();
        assert!(c.satisfies("1.5.0"));
        assert!(!c.satisfies("2.0.0"));
    }

    #[test]
    fn tilde_constraint() {
        let c = VersionConstraint::parse("~1.2.0").unwrap();
        assert!(c.satisfies("1.2.9"));
        assert!(!c.satisfies("1.3.0"));
    }

    #[test]
    fn invalid_constraint_errors() {
        assert!(VersionConstraint::parse("not-a-version").is_err());
    }

    #[test]
    fn non_semver_version_does_not_satisfy_but_does_not_panic() {
        let c = VersionConstraint::parse(">=1.0.0").unwrap();
        assert!(!c.satisfies("not-a-version"));
    }

    #[test]
    fn compare_versions_orders_semver() {
        assert_eq!(compare_versions("1.0.0", "2.0.0"), std::cmp::Ordering::Less);
        assert_eq!(compare_versions("2.0.0", "1.0.0"), std::cmp::Ordering::Greater);
    }

    #[test]
    fn compare_versions_falls_back_to_lexicographic() {
        assert_eq!(compare_versions("alpha", "beta"), std::cmp::Ordering::Less);
    }
}
