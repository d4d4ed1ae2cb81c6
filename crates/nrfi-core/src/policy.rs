// Caller-side handling of unknown predictor values.
//
// Building a training set and predicting today's games have historically
// treated missing history differently: the first drops the row, the second
// plugs in league-typical numbers. Both behaviours are expressed here as
// explicit `FallbackPlan`s so the choice is visible wherever rows are
// resolved.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::assembler::FeatureVector;
use crate::engine::Metric;
use crate::schema::{FeatureSchema, Predictor, PredictorKind};

pub const DEFAULT_ERA: f64 = 4.50;
pub const DEFAULT_K9: f64 = 8.0;
pub const DEFAULT_YRFI_RATE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("feature vector {reference} has no value for `{predictor}`")]
pub struct UnknownFeature {
    pub reference: String,
    pub predictor: Predictor,
}

/// What to do with one unknown predictor value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnknownValuePolicy {
    /// Refuse to produce a numeric row.
    Reject,
    /// Substitute this number.
    Default(f64),
}

impl UnknownValuePolicy {
    pub fn apply(self, metric: Metric) -> Option<f64> {
        match (metric, self) {
            (Metric::Known(v), _) => Some(v),
            (Metric::Unknown, UnknownValuePolicy::Default(v)) => Some(v),
            (Metric::Unknown, UnknownValuePolicy::Reject) => None,
        }
    }
}

/// Config form: the string `"reject"` or a number.
impl Serialize for UnknownValuePolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UnknownValuePolicy::Reject => serializer.serialize_str("reject"),
            UnknownValuePolicy::Default(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for UnknownValuePolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Word(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(UnknownValuePolicy::Default(v)),
            Raw::Word(w) if w.trim().eq_ignore_ascii_case("reject") => Ok(UnknownValuePolicy::Reject),
            Raw::Word(w) => Err(serde::de::Error::custom(format!(
                "expected \"reject\" or a number, got \"{w}\""
            ))),
        }
    }
}

/// One policy per predictor family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackPlan {
    pub era: UnknownValuePolicy,
    pub k9: UnknownValuePolicy,
    pub pitcher_yrfi_rate: UnknownValuePolicy,
    pub team_yrfi_rate: UnknownValuePolicy,
}

impl FallbackPlan {
    /// Drop any row with an unknown value.
    pub fn reject_all() -> Self {
        Self {
            era: UnknownValuePolicy::Reject,
            k9: UnknownValuePolicy::Reject,
            pitcher_yrfi_rate: UnknownValuePolicy::Reject,
            team_yrfi_rate: UnknownValuePolicy::Reject,
        }
    }

    /// League-typical substitutes used for same-day predictions.
    pub fn inference_defaults() -> Self {
        Self {
            era: UnknownValuePolicy::Default(DEFAULT_ERA),
            k9: UnknownValuePolicy::Default(DEFAULT_K9),
            pitcher_yrfi_rate: UnknownValuePolicy::Default(DEFAULT_YRFI_RATE),
            team_yrfi_rate: UnknownValuePolicy::Default(DEFAULT_YRFI_RATE),
        }
    }

    pub fn policy_for(&self, predictor: Predictor) -> UnknownValuePolicy {
        match predictor.kind() {
            PredictorKind::Era => self.era,
            PredictorKind::K9 => self.k9,
            PredictorKind::PitcherYrfiRate => self.pitcher_yrfi_rate,
            PredictorKind::TeamYrfiRate => self.team_yrfi_rate,
        }
    }

    pub fn resolve_one(&self, vector: &FeatureVector, predictor: Predictor) -> Result<f64, UnknownFeature> {
        self.policy_for(predictor)
            .apply(vector.predictors.get(predictor))
            .ok_or_else(|| UnknownFeature {
                reference: vector.reference.to_string(),
                predictor,
            })
    }

    /// Numeric row in schema order, or the first predictor this plan rejects.
    pub fn resolve(&self, vector: &FeatureVector, schema: &FeatureSchema) -> Result<Vec<f64>, UnknownFeature> {
        schema
            .predictors()
            .iter()
            .map(|p| self.resolve_one(vector, *p))
            .collect()
    }
}
