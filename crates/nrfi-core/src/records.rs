// Historical facts the feature engine reads: completed games and pitcher lines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::{PitcherId, TeamId};
use crate::innings::Innings;

/// Provider game identifier (MLB `gamePk`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which half of the matchup a team played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Home, Side::Away];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled or completed game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_pitcher: Option<PitcherId>,
    pub away_pitcher: Option<PitcherId>,
    pub home_first_inning_runs: Option<u32>,
    pub away_first_inning_runs: Option<u32>,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
}

impl GameRecord {
    pub fn team(&self, side: Side) -> &TeamId {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    pub fn pitcher(&self, side: Side) -> Option<&PitcherId> {
        match side {
            Side::Home => self.home_pitcher.as_ref(),
            Side::Away => self.away_pitcher.as_ref(),
        }
    }

    pub fn first_inning_runs(&self, side: Side) -> Option<u32> {
        match side {
            Side::Home => self.home_first_inning_runs,
            Side::Away => self.away_first_inning_runs,
        }
    }

    /// Both first-inning run counts are recorded. Games failing this are
    /// neither labelled nor used as team history.
    pub fn has_complete_first_inning(&self) -> bool {
        self.home_first_inning_runs.is_some() && self.away_first_inning_runs.is_some()
    }

    /// `Some(true)` when either side scored in the first inning.
    pub fn yrfi_label(&self) -> Option<bool> {
        match (self.home_first_inning_runs, self.away_first_inning_runs) {
            (Some(home), Some(away)) => Some(home + away > 0),
            _ => None,
        }
    }

    pub fn has_both_pitchers(&self) -> bool {
        self.home_pitcher.is_some() && self.away_pitcher.is_some()
    }
}

/// A single pitching line from a box score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitcherAppearance {
    pub pitcher: PitcherId,
    pub team: TeamId,
    pub game_id: GameId,
    pub date: NaiveDate,
    pub innings: Innings,
    pub strikeouts: u32,
    pub earned_runs: u32,
}
