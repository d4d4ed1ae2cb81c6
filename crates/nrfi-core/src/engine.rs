// Point-in-time team and pitcher statistics.
//
// Every query takes a reference date and only reads records dated strictly
// before it. Records on the reference date itself never qualify, whatever
// their order within the day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identity::{PitcherId, TeamId};
use crate::innings::Innings;
use crate::records::{GameRecord, PitcherAppearance, Side};
use crate::repository::HistoryRepository;

/// Number of most recent prior games a team YRFI rate looks at.
pub const TEAM_WINDOW: usize = 20;

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// A computed statistic, or an explicit marker that there was no qualifying
/// history to compute it from. `Unknown` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Metric {
    Known(f64),
    #[default]
    Unknown,
}

impl Metric {
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Known(v) => Some(v),
            Metric::Unknown => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Metric::Unknown)
    }

    /// `numerator / denominator`, unknown when the denominator is zero.
    fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator > 0.0 {
            Metric::Known(numerator / denominator)
        } else {
            Metric::Unknown
        }
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) => Metric::Known(v),
            None => Metric::Unknown,
        }
    }
}

impl From<Metric> for Option<f64> {
    fn from(metric: Metric) -> Self {
        metric.value()
    }
}

// ---------------------------------------------------------------------------
// Pitcher aggregates
// ---------------------------------------------------------------------------

/// Rate stats for one pitcher as of a reference date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitcherRates {
    pub era: Metric,
    pub k9: Metric,
    /// Qualifying appearances, including ones with zero recorded innings.
    pub appearances: usize,
    pub innings: Innings,
    pub earned_runs: u32,
    pub strikeouts: u32,
}

impl PitcherRates {
    fn from_appearances(appearances: &[&PitcherAppearance]) -> Self {
        let innings: Innings = appearances.iter().map(|a| a.innings).sum();
        let earned_runs: u32 = appearances.iter().map(|a| a.earned_runs).sum();
        let strikeouts: u32 = appearances.iter().map(|a| a.strikeouts).sum();

        // Per-nine on outs: x / (outs / 3) * 9 == x * 27 / outs.
        let outs = f64::from(innings.outs());
        Self {
            era: Metric::ratio(f64::from(earned_runs) * 27.0, outs),
            k9: Metric::ratio(f64::from(strikeouts) * 27.0, outs),
            appearances: appearances.len(),
            innings,
            earned_runs,
            strikeouts,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Answers point-in-time queries over a [`HistoryRepository`].
///
/// Holds only a shared reference, so one engine can serve many threads as
/// long as the repository is `Sync`.
pub struct TemporalFeatureEngine<'a, R: ?Sized> {
    history: &'a R,
}

impl<R: ?Sized> Clone for TemporalFeatureEngine<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: ?Sized> Copy for TemporalFeatureEngine<'_, R> {}

impl<'a, R: HistoryRepository + ?Sized> TemporalFeatureEngine<'a, R> {
    pub fn new(history: &'a R) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &'a R {
        self.history
    }

    fn prior_appearances(&self, pitcher: &PitcherId, reference_date: NaiveDate) -> Vec<&'a PitcherAppearance> {
        self.history
            .appearances_for(pitcher)
            .into_iter()
            .filter(|a| a.date < reference_date)
            .collect()
    }

    /// ERA and K/9 over all appearances before `reference_date`. Both are
    /// unknown when the qualifying appearances add up to zero innings.
    pub fn pitcher_rates(&self, pitcher: &PitcherId, reference_date: NaiveDate) -> PitcherRates {
        PitcherRates::from_appearances(&self.prior_appearances(pitcher, reference_date))
    }

    /// Share of prior appearances in which the pitcher was charged with at
    /// least one earned run.
    ///
    /// Box scores don't break earned runs out by inning, so any earned run
    /// in the appearance stands in for "allowed a first-inning run".
    pub fn pitcher_yrfi_allowed_rate(&self, pitcher: &PitcherId, reference_date: NaiveDate) -> Metric {
        let prior = self.prior_appearances(pitcher, reference_date);
        let scored_on = prior.iter().filter(|a| a.earned_runs > 0).count();
        Metric::ratio(scored_on as f64, prior.len() as f64)
    }

    /// Share of the team's last [`TEAM_WINDOW`] games as `side` (before
    /// `reference_date`, with a complete first-inning line) in which it
    /// scored in the first inning.
    pub fn team_yrfi_rate(&self, team: &TeamId, side: Side, reference_date: NaiveDate) -> Metric {
        let mut prior: Vec<&GameRecord> = self
            .history
            .games_for_team(team, side)
            .into_iter()
            .filter(|g| g.date < reference_date && g.has_complete_first_inning() && g.team(side) == team)
            .collect();
        prior.sort_by(|a, b| b.date.cmp(&a.date));
        prior.truncate(TEAM_WINDOW);

        let scored = prior
            .iter()
            .filter(|g| g.first_inning_runs(side).is_some_and(|runs| runs > 0))
            .count();
        Metric::ratio(scored as f64, prior.len() as f64)
    }
}
