//! Chain propagation, temporal decay, and monotone evidence updates.

use chrono::{DateTime, Utc};

use crate::error::{InvalidInputKind, SkillFortifyError};
use crate::trust::engine::TrustEngine;
use crate::trust::models::{SIGNAL_NAMES, TrustScore, TrustSignals};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// `chain` is ordered leaf-to-root; the i-th score uses every previously
/// computed score as its dependency set.
pub fn propagate_through_chain(
    engine: &TrustEngine,
    chain: &[(String, String, TrustSignals)],
) -> Result<Vec<TrustScore>, SkillFortifyError> {
    if chain.is_empty() {
        return Err(InvalidInputKind::EmptyPropagationChain.into());
    }

    let mut scores: Vec<TrustScore> = Vec::with_capacity(chain.len());
    for (name, version, signals) in chain {
        let deps = if scores.is_empty() {
            None
        } else {
            Some(scores.as_slice())
        };
        let score = engine.compute_score(name.clone(), version.clone(), *signals, deps)?;
        scores.push(score);
    }
    Ok(scores)
}

/// Decay `score.effective_score` by `exp(-decay_rate * days_elapsed)`.
/// `days_elapsed` is clamped to `>= 0`, so a `last_update` in the future
/// produces zero decay rather than negative decay.
pub fn apply_decay(
    engine: &TrustEngine,
    score: &TrustScore,
    last_update: DateTime<Utc>,
    now: Option<DateTime<Utc>>,
) -> TrustScore {
    let now = now.unwrap_or_else(Utc::now);
    let days_elapsed = ((now - last_update).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY)
        .max(0.0);
    let factor = (-engine.decay_rate() * days_elapsed).exp();
    let effective = (score.effective_score * factor).clamp(0.0, 1.0);

    TrustScore {
        skill_name: score.skill_name.clone(),
        version: score.version.clone(),
        intrinsic_score: score.intrinsic_score,
        effective_score: effective,
        level: engine.score_to_level(effective),
        signals: score.signals,
    }
}

/// Each entry `(name, delta)` requires `delta >= 0` and `name` to be one of
/// the four known signal names. New signal value is `min(1, current + delta)`.
pub fn update_with_evidence(
    current: &TrustSignals,
    positive_evidence: &[(String, f64)],
) -> Result<TrustSignals, SkillFortifyError> {
    let mut updated = *current;
    for (name, delta) in positive_evidence {
        if !SIGNAL_NAMES.contains(&name.as_str()) {
            return Err(InvalidInputKind::UnknownSignalName(name.clone()).into());
        }
        if *delta < 0.0 {
            return Err(InvalidInputKind::NegativeEvidenceDelta {
                name: name.clone(),
                value: *delta,
            }
            .into());
        }
        let current_value = updated.get(name).expect("name validated above");
        updated = updated.with_signal(name, (current_value + delta).min(1.0));
    }
    Ok(updated)
}
