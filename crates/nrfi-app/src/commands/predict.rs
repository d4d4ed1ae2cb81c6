// `nrfi predict`: same-day feature rows and strikeout projections for
// scheduled matchups.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use nrfi_core::{
    FallbackPlan, FeatureAssembler, FeatureSchema, HistorySnapshot, MatchupTarget, PitcherId, Predictor,
    ReferenceId, TeamId,
};
use nrfi_store::Database;

use crate::config::Config;

/// One entry of the schedule file.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledMatchup {
    pub game_id: ReferenceId,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_probable_pitcher: Option<String>,
    #[serde(default)]
    pub away_probable_pitcher: Option<String>,
}

impl ScheduledMatchup {
    /// `None` unless both probable starters are named.
    pub fn target(&self) -> Option<MatchupTarget> {
        let home_pitcher = self.home_probable_pitcher.as_deref().and_then(PitcherId::new)?;
        let away_pitcher = self.away_probable_pitcher.as_deref().and_then(PitcherId::new)?;
        Some(MatchupTarget {
            reference: self.game_id.clone(),
            date: self.date,
            home_team: TeamId::new(&self.home_team),
            away_team: TeamId::new(&self.away_team),
            home_pitcher: Some(home_pitcher),
            away_pitcher: Some(away_pitcher),
            home_first_inning_runs: None,
            away_first_inning_runs: None,
        })
    }

    pub fn label(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }
}

pub fn load_matchups(path: &Path) -> Result<Vec<ScheduledMatchup>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Expected strikeouts over `innings`, to one decimal.
pub fn projected_strikeouts(k9: f64, innings: f64) -> f64 {
    (k9 * innings / 9.0 * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub reference: ReferenceId,
    pub matchup: String,
    pub home_pitcher: String,
    pub away_pitcher: String,
    /// Resolved predictor values in schema order.
    pub values: Vec<f64>,
    pub home_k_proj: f64,
    pub away_k_proj: f64,
}

#[derive(Debug, Clone)]
pub struct PredictReport {
    pub schema: FeatureSchema,
    pub predictions: Vec<Prediction>,
    /// Matchups without both probable pitchers.
    pub skipped: usize,
    /// Matchups the inference plan refused to fill.
    pub rejected: usize,
}

pub fn predict(
    snapshot: &HistorySnapshot,
    matchups: &[ScheduledMatchup],
    schema: &FeatureSchema,
    plan: &FallbackPlan,
    starter_innings: f64,
) -> PredictReport {
    let mut scheduled = Vec::new();
    let mut targets = Vec::new();
    let mut skipped = 0;
    for m in matchups {
        match m.target() {
            Some(target) => {
                scheduled.push(m);
                targets.push(target);
            }
            None => {
                warn!("{} ({}): probable pitchers not confirmed, skipping", m.label(), m.game_id);
                skipped += 1;
            }
        }
    }

    let vectors = FeatureAssembler::new(snapshot).assemble_batch(&targets);

    let mut predictions = Vec::with_capacity(vectors.len());
    let mut rejected = 0;
    for (m, vector) in scheduled.into_iter().zip(&vectors) {
        let resolved = plan.resolve(vector, schema).and_then(|values| {
            let home_k9 = plan.resolve_one(vector, Predictor::HomePitcherK9)?;
            let away_k9 = plan.resolve_one(vector, Predictor::AwayPitcherK9)?;
            Ok((values, home_k9, away_k9))
        });
        match resolved {
            Ok((values, home_k9, away_k9)) => predictions.push(Prediction {
                reference: m.game_id.clone(),
                matchup: m.label(),
                home_pitcher: m.home_probable_pitcher.clone().unwrap_or_default(),
                away_pitcher: m.away_probable_pitcher.clone().unwrap_or_default(),
                values,
                home_k_proj: projected_strikeouts(home_k9, starter_innings),
                away_k_proj: projected_strikeouts(away_k9, starter_innings),
            }),
            Err(e) => {
                warn!("{}: {}", m.label(), e);
                rejected += 1;
            }
        }
    }

    info!(
        "{} predictions, {} skipped, {} rejected",
        predictions.len(),
        skipped,
        rejected
    );

    PredictReport {
        schema: schema.clone(),
        predictions,
        skipped,
        rejected,
    }
}

pub fn run(config: &Config, db: &Database, matchups_path: &Path) -> Result<PredictReport> {
    let matchups = load_matchups(matchups_path)?;
    let snapshot = db.load_snapshot().context("failed to load history")?;
    Ok(predict(
        &snapshot,
        &matchups,
        &config.schema,
        &config.inference_plan,
        config.expected_starter_innings,
    ))
}

impl fmt::Display for PredictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.predictions.is_empty() {
            writeln!(f, "No games with confirmed pitchers.")?;
        }
        for p in &self.predictions {
            writeln!(f, "{} [{}]", p.matchup, p.reference)?;
            writeln!(f, "  pitchers: {} (home) vs {} (away)", p.home_pitcher, p.away_pitcher)?;
            for (name, value) in self.schema.names().iter().zip(&p.values) {
                writeln!(f, "  {name:<24}{value:.3}")?;
            }
            writeln!(f, "  projected Ks: home {:.1}, away {:.1}", p.home_k_proj, p.away_k_proj)?;
        }
        if self.skipped + self.rejected > 0 {
            writeln!(
                f,
                "({} skipped without probable pitchers, {} rejected)",
                self.skipped, self.rejected
            )?;
        }
        Ok(())
    }
}
