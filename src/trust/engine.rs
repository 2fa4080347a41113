//! `TrustEngine` — weighted signal combination and dependency propagation.

use crate::error::{InvalidInputKind, SkillFortifyError};
use crate::trust::models::{TrustLevel, TrustScore, TrustSignals, TrustWeights};
use crate::trust::propagation;

/// Computes intrinsic and effective trust scores from signals and weights.
///
/// At this rate (the default), trust halves every ~69 days without updates.
#[derive(Debug, Clone)]
pub struct TrustEngine {
    weights: TrustWeights,
    decay_rate: f64,
}

impl TrustEngine {
    pub const DEFAULT_DECAY_RATE: f64 = 0.01;

    pub fn new(
        weights: Option<TrustWeights>,
        decay_rate: Option<f64>,
    ) -> Result<Self, SkillFortifyError> {
        let weights = weights.unwrap_or_default();
        weights.validate()?;
        let decay_rate = decay_rate.unwrap_or(Self::DEFAULT_DECAY_RATE);
        if decay_rate < 0.0 {
            return Err(InvalidInputKind::NegativeDecayRate(decay_rate).into());
        }
        Ok(TrustEngine {
            weights,
            decay_rate,
        })
    }

    pub fn weights(&self) -> &TrustWeights {
        &self.weights
    }

    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    /// `clamp_[0,1](w_p*s_p + w_b*s_b + w_c*s_c + w_h*s_h)`.
    pub fn compute_intrinsic(&self, signals: &TrustSignals) -> Result<f64, SkillFortifyError> {
        signals.validate()?;
        let w = &self.weights;
        let raw = w.provenance * signals.provenance
            + w.behavioral * signals.behavioral
            + w.community * signals.community
            + w.historical * signals.historical;
        Ok(raw.clamp(0.0, 1.0))
    }

    pub fn compute_score(
        &self,
        skill_name: impl Into<String>,
        version: impl Into<String>,
        signals: TrustSignals,
        dependency_scores: Option<&[TrustScore]>,
    ) -> Result<TrustScore, SkillFortifyError> {
        let intrinsic = self.compute_intrinsic(&signals)?;
        let effective = match dependency_scores {
            Some(deps) if !deps.is_empty() => {
                let min_dep = deps
                    .iter()
                    .map(|d| d.effective_score)
                    .fold(f64::INFINITY, f64::min);
                intrinsic * min_dep
            }
            _ => intrinsic,
        }
        .clamp(0.0, 1.0);

        Ok(TrustScore {
            skill_name: skill_name.into(),
            version: version.into(),
            intrinsic_score: intrinsic,
            effective_score: effective,
            level: self.score_to_level(effective),
            signals,
        })
    }

    pub fn score_to_level(&self, score: f64) -> TrustLevel {
        TrustLevel::from_score(score)
    }

    pub fn propagate_through_chain(
        &self,
        chain: &[(String, String, TrustSignals)],
    ) -> Result<Vec<TrustScore>, SkillFortifyError> {
        propagation::propagate_through_chain(self, chain)
    }

    pub fn apply_decay(
        &self,
        score: &TrustScore,
        last_update: chrono::DateTime<chrono::Utc>,
        now: Option<chrono::DateTime<chrono::Utc>>,
    ) -> TrustScore {
        propagation::apply_decay(self, score, last_update, now)
    }

    pub fn update_with_evidence(
        &self,
        current: &TrustSignals,
        positive_evidence: &[(String, f64)],
    ) -> Result<TrustSignals, SkillFortifyError> {
        propagation::update_with_evidence(current, positive_evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_intrinsic_matches_weighted_sum() {
        let engine = TrustEngine::new(None, None).unwrap();
        let signals = TrustSignals::new(1.0, 1.0, 1.0, 1.0);
        assert!((engine.compute_intrinsic(&signals).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn compute_intrinsic_rejects_invalid_signals() {
        let engine = TrustEngine::new(None, None).unwrap();
        let signals = TrustSignals::new(2.0, 0.0, 0.0, 0.0);
        assert!(engine.compute_intrinsic(&signals).is_err());
    }

    #[test]
    fn compute_score_without_deps_effective_equals_intrinsic() {
        let engine = TrustEngine::new(None, None).unwrap();
        let signals = TrustSignals::new(0.9, 1.0, 0.8, 0.9);
        let score = engine
            .compute_score("skill", "1.0.0", signals, None)
            .unwrap();
        assert!((score.effective_score - score.intrinsic_score).abs() < 1e-9);
    }

    #[test]
    fn compute_score_with_deps_effective_le_intrinsic() {
        let engine = TrustEngine::new(None, None).unwrap();
        let dep = engine
            .compute_score("dep", "1.0.0", TrustSignals::new(0.1, 0.1, 0.1, 0.1), None)
            .unwrap();
        let parent_signals = TrustSignals::new(0.9, 1.0, 0.8, 0.9);
        let parent = engine
            .compute_score("parent", "1.0.0", parent_signals, Some(&[dep]))
            .unwrap();
        assert!(parent.effective_score <= parent.intrinsic_score);
    }

    #[test]
    fn new_rejects_invalid_weights() {
        let bad_weights = TrustWeights::new(0.9, 0.9, 0.9, 0.9);
        assert!(TrustEngine::new(Some(bad_weights), None).is_err());
    }

    #[test]
    fn new_rejects_negative_decay_rate() {
        assert!(TrustEngine::new(None, Some(-0.1)).is_err());
    }

    #[test]
    fn scenario_trust_propagation_parent_intrinsic_and_effective() {
        let engine = TrustEngine::new(None, None).unwrap();
        let dep_signals = TrustSignals::new(0.1, 0.1, 0.1, 0.1);
        let dep = engine
            .compute_score("lib", "1.0.0", dep_signals, None)
            .unwrap();
        assert!((dep.effective_score - 0.1).abs() < 1e-9);

        let parent_signals = TrustSignals::new(0.9, 1.0, 0.8, 0.9);
        let parent = engine
            .compute_score("app", "1.0.0", parent_signals, Some(&[dep]))
            .unwrap();
        assert!((parent.intrinsic_score - 0.90).abs() < 1e-6);
        assert!((parent.effective_score - 0.09).abs() < 1e-6);
        assert_eq!(parent.level, TrustLevel::Unsigned);
    }
}
