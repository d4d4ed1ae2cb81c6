// Named predictors and the fixed column order shared by training and inference.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown predictor `{0}`")]
    UnknownPredictor(String),

    #[error("predictor `{0}` listed more than once")]
    Duplicate(String),

    #[error("feature schema must list at least one predictor")]
    Empty,
}

/// Which family of statistic a predictor belongs to. Fallback policies are
/// configured per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictorKind {
    Era,
    K9,
    PitcherYrfiRate,
    TeamYrfiRate,
}

/// The eight model inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predictor {
    HomePitcherEra,
    HomePitcherK9,
    AwayPitcherEra,
    AwayPitcherK9,
    HomePitcherYrfiRate,
    AwayPitcherYrfiRate,
    HomeTeamYrfiRate,
    AwayTeamYrfiRate,
}

impl Predictor {
    /// Standard order.
    pub const ALL: [Predictor; 8] = [
        Predictor::HomePitcherEra,
        Predictor::HomePitcherK9,
        Predictor::AwayPitcherEra,
        Predictor::AwayPitcherK9,
        Predictor::HomePitcherYrfiRate,
        Predictor::AwayPitcherYrfiRate,
        Predictor::HomeTeamYrfiRate,
        Predictor::AwayTeamYrfiRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Predictor::HomePitcherEra => "home_pitcher_era",
            Predictor::HomePitcherK9 => "home_pitcher_k9",
            Predictor::AwayPitcherEra => "away_pitcher_era",
            Predictor::AwayPitcherK9 => "away_pitcher_k9",
            Predictor::HomePitcherYrfiRate => "home_pitcher_yrfi_rate",
            Predictor::AwayPitcherYrfiRate => "away_pitcher_yrfi_rate",
            Predictor::HomeTeamYrfiRate => "home_team_yrfi_rate",
            Predictor::AwayTeamYrfiRate => "away_team_yrfi_rate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn kind(self) -> PredictorKind {
        match self {
            Predictor::HomePitcherEra | Predictor::AwayPitcherEra => PredictorKind::Era,
            Predictor::HomePitcherK9 | Predictor::AwayPitcherK9 => PredictorKind::K9,
            Predictor::HomePitcherYrfiRate | Predictor::AwayPitcherYrfiRate => {
                PredictorKind::PitcherYrfiRate
            }
            Predictor::HomeTeamYrfiRate | Predictor::AwayTeamYrfiRate => PredictorKind::TeamYrfiRate,
        }
    }
}

impl fmt::Display for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of predictors a model was (or will be) fitted on.
///
/// Training export and inference both read feature rows through the same
/// schema, so column positions can't drift apart between the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    predictors: Vec<Predictor>,
}

impl FeatureSchema {
    pub fn standard() -> Self {
        Self {
            predictors: Predictor::ALL.to_vec(),
        }
    }

    pub fn new(predictors: Vec<Predictor>) -> Result<Self, SchemaError> {
        if predictors.is_empty() {
            return Err(SchemaError::Empty);
        }
        let mut seen = HashSet::new();
        for p in &predictors {
            if !seen.insert(*p) {
                return Err(SchemaError::Duplicate(p.name().to_string()));
            }
        }
        Ok(Self { predictors })
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, SchemaError> {
        let predictors = names
            .iter()
            .map(|n| {
                Predictor::from_name(n.as_ref())
                    .ok_or_else(|| SchemaError::UnknownPredictor(n.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(predictors)
    }

    pub fn predictors(&self) -> &[Predictor] {
        &self.predictors
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.predictors.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.predictors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictors.is_empty()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::standard()
    }
}
