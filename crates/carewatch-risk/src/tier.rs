use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::RiskError;

/// Scores strictly above this are high risk.
pub const HIGH_THRESHOLD: f64 = 0.7;

/// Scores strictly above this, and not high, are medium risk.
pub const MEDIUM_THRESHOLD: f64 = 0.3;

/// Discrete risk classification derived from a model score.
///
/// Ordered by severity, so `Tier::High > Tier::Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::High, Tier::Medium, Tier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
        }
    }

    /// Badge text shown next to a patient or an assessment.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Low => "low risk",
            Tier::Medium => "medium risk",
            Tier::High => "high risk",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a probability score onto a tier.
///
/// `> 0.7` is high, `(0.3, 0.7]` is medium, `<= 0.3` is low. A score sitting
/// exactly on a threshold gets the less urgent tier.
pub fn classify_tier(score: f64) -> Result<Tier, RiskError> {
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(RiskError::InvalidScore(score));
    }

    let tier = if score > HIGH_THRESHOLD {
        Tier::High
    } else if score > MEDIUM_THRESHOLD {
        Tier::Medium
    } else {
        Tier::Low
    };
    Ok(tier)
}

/// Tier for an optional stored score, as shown on patient badges.
///
/// `None` when there is no score. A stored score outside [0, 1] also yields
/// `None` and is logged, since it points at bad data upstream.
pub fn tier_of(score: Option<f64>) -> Option<Tier> {
    let score = score?;
    match classify_tier(score) {
        Ok(tier) => Some(tier),
        Err(e) => {
            tracing::warn!(score, error = %e, "stored risk score cannot be classified");
            None
        }
    }
}

/// Count of scores per tier, as shown on the dashboard's distribution panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TierDistribution {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl TierDistribution {
    /// Classify every score and count the results. Scores that are not valid
    /// probabilities are skipped.
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut dist = Self::default();
        for score in scores {
            match classify_tier(score) {
                Ok(tier) => dist.record(tier),
                Err(e) => tracing::warn!(score, error = %e, "skipping score in tier distribution"),
            }
        }
        dist
    }

    pub fn record(&mut self, tier: Tier) {
        match tier {
            Tier::High => self.high += 1,
            Tier::Medium => self.medium += 1,
            Tier::Low => self.low += 1,
        }
    }

    pub fn count(&self, tier: Tier) -> u32 {
        match tier {
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }

    pub fn total(&self) -> u32 {
        self.high + self.medium + self.low
    }
}
