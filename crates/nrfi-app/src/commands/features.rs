// `nrfi features`: build the historical feature set and the training CSV.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use nrfi_core::{FallbackPlan, FeatureAssembler, FeatureSchema, FeatureVector, HistorySnapshot, MatchupTarget};
use nrfi_store::{export_feature_vectors, export_training_rows, Database, TrainingSet};

use crate::config::Config;

/// Stored games usable as training examples: both starters known and a
/// complete first-inning line. Snapshot order, so oldest first.
pub fn training_targets(snapshot: &HistorySnapshot) -> Vec<MatchupTarget> {
    snapshot
        .games()
        .iter()
        .filter(|g| g.has_both_pitchers() && g.has_complete_first_inning())
        .map(MatchupTarget::from)
        .collect()
}

/// Every training target's feature vector plus the rows `plan` accepts.
pub fn build(
    snapshot: &HistorySnapshot,
    schema: &FeatureSchema,
    plan: &FallbackPlan,
) -> (Vec<FeatureVector>, TrainingSet) {
    let targets = training_targets(snapshot);
    let vectors = FeatureAssembler::new(snapshot).assemble_batch(&targets);
    let set = TrainingSet::build(&vectors, schema, plan);
    (vectors, set)
}

#[derive(Debug, Clone)]
pub struct FeaturesReport {
    pub games_stored: usize,
    pub vectors: usize,
    pub training_rows: usize,
    pub rejected: usize,
    pub features_csv: PathBuf,
    pub training_csv: PathBuf,
}

pub fn run(config: &Config, db: &Database) -> Result<FeaturesReport> {
    let snapshot = db.load_snapshot().context("failed to load history")?;
    let (vectors, set) = build(&snapshot, &config.schema, &config.training_plan);

    let features_csv = PathBuf::from(&config.features_csv);
    let training_csv = PathBuf::from(&config.training_csv);
    export_feature_vectors(&features_csv, &vectors, &config.schema)?;
    export_training_rows(&training_csv, &set.rows, &config.schema)?;

    info!(
        "{} feature vectors, {} training rows ({} rejected)",
        vectors.len(),
        set.rows.len(),
        set.rejected
    );

    Ok(FeaturesReport {
        games_stored: snapshot.games().len(),
        vectors: vectors.len(),
        training_rows: set.rows.len(),
        rejected: set.rejected,
        features_csv,
        training_csv,
    })
}

impl fmt::Display for FeaturesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Feature build complete")?;
        writeln!(f, "Games stored: {}", self.games_stored)?;
        writeln!(f, "Feature vectors: {} -> {}", self.vectors, self.features_csv.display())?;
        writeln!(
            f,
            "Training rows: {} -> {} ({} dropped for missing history)",
            self.training_rows,
            self.training_csv.display(),
            self.rejected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nrfi_core::{GameId, GameRecord, Innings, PitcherAppearance, PitcherId, TeamId};

    fn game(id: u64, day: u32, home_p: Option<&str>, runs: (Option<u32>, Option<u32>)) -> GameRecord {
        GameRecord {
            game_id: GameId(id),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            home_team: TeamId::new("Cubs"),
            away_team: TeamId::new("Mets"),
            home_pitcher: home_p.and_then(PitcherId::new),
            away_pitcher: PitcherId::new("Road"),
            home_first_inning_runs: runs.0,
            away_first_inning_runs: runs.1,
            home_score: None,
            away_score: None,
        }
    }

    fn start(name: &str, id: u64, day: u32) -> PitcherAppearance {
        PitcherAppearance {
            pitcher: PitcherId::new(name).unwrap(),
            team: TeamId::new("Cubs"),
            game_id: GameId(id),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            innings: Innings::from_outs(18),
            strikeouts: 6,
            earned_runs: 1,
        }
    }

    #[test]
    fn targets_need_both_starters_and_both_run_counts() {
        let snapshot = HistorySnapshot::new(
            vec![
                game(3, 3, Some("Home"), (Some(0), Some(1))),
                game(1, 1, Some("Home"), (Some(0), Some(0))),
                game(2, 2, None, (Some(1), Some(0))),
                game(4, 4, Some("Home"), (Some(0), None)),
            ],
            vec![],
        );
        let ids: Vec<_> = training_targets(&snapshot)
            .into_iter()
            .map(|t| t.reference.to_string())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn first_game_is_rejected_under_the_training_plan() {
        let snapshot = HistorySnapshot::new(
            vec![
                game(1, 1, Some("Home"), (Some(1), Some(0))),
                game(2, 8, Some("Home"), (Some(0), Some(0))),
            ],
            vec![start("Home", 1, 1), start("Road", 1, 1)],
        );
        let (vectors, set) = build(&snapshot, &FeatureSchema::standard(), &FallbackPlan::reject_all());
        assert_eq!(vectors.len(), 2);
        assert_eq!(set.rejected, 1);
        assert_eq!(set.rows.len(), 1);
        assert_eq!(set.rows[0].reference, "2");
        assert!(!set.rows[0].label);
        // ERA 1 * 27 / 18 outs.
        assert!((set.rows[0].values[0] - 1.5).abs() < 1e-9);

        let (_, filled) = build(&snapshot, &FeatureSchema::standard(), &FallbackPlan::inference_defaults());
        assert_eq!(filled.rows.len(), 2);
    }
}
