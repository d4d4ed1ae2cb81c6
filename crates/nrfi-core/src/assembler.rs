// Per-game feature vectors built from the temporal feature engine.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::{Metric, TemporalFeatureEngine};
use crate::identity::{PitcherId, TeamId};
use crate::records::{GameId, GameRecord, Side};
use crate::repository::HistoryRepository;
use crate::schema::{FeatureSchema, Predictor};

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// What a feature vector describes: a stored game, or an upcoming matchup
/// that has no stored record yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceId {
    Game(GameId),
    Matchup(String),
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceId::Game(id) => write!(f, "{id}"),
            ReferenceId::Matchup(id) => f.write_str(id),
        }
    }
}

/// Input to the assembler. `date` is the no-lookahead cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupTarget {
    pub reference: ReferenceId,
    pub date: NaiveDate,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_pitcher: Option<PitcherId>,
    pub away_pitcher: Option<PitcherId>,
    pub home_first_inning_runs: Option<u32>,
    pub away_first_inning_runs: Option<u32>,
}

impl MatchupTarget {
    /// A not-yet-played matchup (no outcome, so no label).
    pub fn upcoming(
        reference: impl Into<String>,
        date: NaiveDate,
        home_team: TeamId,
        away_team: TeamId,
        home_pitcher: Option<PitcherId>,
        away_pitcher: Option<PitcherId>,
    ) -> Self {
        Self {
            reference: ReferenceId::Matchup(reference.into()),
            date,
            home_team,
            away_team,
            home_pitcher,
            away_pitcher,
            home_first_inning_runs: None,
            away_first_inning_runs: None,
        }
    }

    fn pitcher(&self, side: Side) -> Option<&PitcherId> {
        match side {
            Side::Home => self.home_pitcher.as_ref(),
            Side::Away => self.away_pitcher.as_ref(),
        }
    }

    fn team(&self, side: Side) -> &TeamId {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    pub fn label(&self) -> Option<bool> {
        match (self.home_first_inning_runs, self.away_first_inning_runs) {
            (Some(home), Some(away)) => Some(home + away > 0),
            _ => None,
        }
    }
}

impl From<&GameRecord> for MatchupTarget {
    fn from(game: &GameRecord) -> Self {
        Self {
            reference: ReferenceId::Game(game.game_id),
            date: game.date,
            home_team: game.home_team.clone(),
            away_team: game.away_team.clone(),
            home_pitcher: game.home_pitcher.clone(),
            away_pitcher: game.away_pitcher.clone(),
            home_first_inning_runs: game.home_first_inning_runs,
            away_first_inning_runs: game.away_first_inning_runs,
        }
    }
}

// ---------------------------------------------------------------------------
// Feature vector
// ---------------------------------------------------------------------------

/// The eight predictor values, each possibly unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Predictors {
    pub home_pitcher_era: Metric,
    pub home_pitcher_k9: Metric,
    pub away_pitcher_era: Metric,
    pub away_pitcher_k9: Metric,
    pub home_pitcher_yrfi_rate: Metric,
    pub away_pitcher_yrfi_rate: Metric,
    pub home_team_yrfi_rate: Metric,
    pub away_team_yrfi_rate: Metric,
}

impl Predictors {
    pub fn get(&self, predictor: Predictor) -> Metric {
        match predictor {
            Predictor::HomePitcherEra => self.home_pitcher_era,
            Predictor::HomePitcherK9 => self.home_pitcher_k9,
            Predictor::AwayPitcherEra => self.away_pitcher_era,
            Predictor::AwayPitcherK9 => self.away_pitcher_k9,
            Predictor::HomePitcherYrfiRate => self.home_pitcher_yrfi_rate,
            Predictor::AwayPitcherYrfiRate => self.away_pitcher_yrfi_rate,
            Predictor::HomeTeamYrfiRate => self.home_team_yrfi_rate,
            Predictor::AwayTeamYrfiRate => self.away_team_yrfi_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub reference: ReferenceId,
    pub date: NaiveDate,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_pitcher: Option<PitcherId>,
    pub away_pitcher: Option<PitcherId>,
    #[serde(flatten)]
    pub predictors: Predictors,
    /// `Some(true)` = YRFI, `Some(false)` = NRFI, `None` = outcome not known.
    pub label: Option<bool>,
}

impl FeatureVector {
    /// Predictor values in schema order.
    pub fn values(&self, schema: &FeatureSchema) -> Vec<Metric> {
        schema
            .predictors()
            .iter()
            .map(|p| self.predictors.get(*p))
            .collect()
    }

    pub fn unknown_predictors(&self) -> Vec<Predictor> {
        Predictor::ALL
            .into_iter()
            .filter(|p| self.predictors.get(*p).is_unknown())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// Composes feature vectors. Unknown values are passed through untouched;
/// substituting numbers is up to the caller (see [`crate::policy`]).
pub struct FeatureAssembler<'a, R: ?Sized> {
    engine: TemporalFeatureEngine<'a, R>,
}

impl<'a, R: HistoryRepository + ?Sized> FeatureAssembler<'a, R> {
    pub fn new(history: &'a R) -> Self {
        Self {
            engine: TemporalFeatureEngine::new(history),
        }
    }

    pub fn engine(&self) -> TemporalFeatureEngine<'a, R> {
        self.engine
    }

    pub fn assemble(&self, target: &MatchupTarget) -> FeatureVector {
        let date = target.date;
        let mut predictors = Predictors::default();

        for side in Side::BOTH {
            let (era, k9, pitcher_rate) = match target.pitcher(side) {
                Some(pitcher) => {
                    let rates = self.engine.pitcher_rates(pitcher, date);
                    let allowed = self.engine.pitcher_yrfi_allowed_rate(pitcher, date);
                    (rates.era, rates.k9, allowed)
                }
                None => (Metric::Unknown, Metric::Unknown, Metric::Unknown),
            };
            let team_rate = self.engine.team_yrfi_rate(target.team(side), side, date);

            match side {
                Side::Home => {
                    predictors.home_pitcher_era = era;
                    predictors.home_pitcher_k9 = k9;
                    predictors.home_pitcher_yrfi_rate = pitcher_rate;
                    predictors.home_team_yrfi_rate = team_rate;
                }
                Side::Away => {
                    predictors.away_pitcher_era = era;
                    predictors.away_pitcher_k9 = k9;
                    predictors.away_pitcher_yrfi_rate = pitcher_rate;
                    predictors.away_team_yrfi_rate = team_rate;
                }
            }
        }

        FeatureVector {
            reference: target.reference.clone(),
            date,
            home_team: target.home_team.clone(),
            away_team: target.away_team.clone(),
            home_pitcher: target.home_pitcher.clone(),
            away_pitcher: target.away_pitcher.clone(),
            predictors,
            label: target.label(),
        }
    }

    pub fn assemble_game(&self, game: &GameRecord) -> FeatureVector {
        self.assemble(&MatchupTarget::from(game))
    }
}

impl<'a, R: HistoryRepository + Sync + ?Sized> FeatureAssembler<'a, R> {
    /// Assemble many targets in parallel. Output order matches input order.
    pub fn assemble_batch(&self, targets: &[MatchupTarget]) -> Vec<FeatureVector> {
        targets.par_iter().map(|t| self.assemble(t)).collect()
    }
}
