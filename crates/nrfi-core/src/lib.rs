// Point-in-time feature engine for first-inning run (YRFI/NRFI) prediction.
//
// Leaf-first: innings parsing, identity keys and records, the read-only
// history repository, the temporal feature engine, and the assembler that
// turns a game or matchup into a feature vector.

pub mod assembler;
pub mod engine;
pub mod identity;
pub mod innings;
pub mod policy;
pub mod records;
pub mod repository;
pub mod schema;

pub use assembler::{FeatureAssembler, FeatureVector, MatchupTarget, Predictors, ReferenceId};
pub use engine::{Metric, PitcherRates, TemporalFeatureEngine, TEAM_WINDOW};
pub use identity::{PitcherId, TeamId};
pub use innings::{parse_innings, Innings, MalformedInnings};
pub use policy::{FallbackPlan, UnknownFeature, UnknownValuePolicy};
pub use records::{GameId, GameRecord, PitcherAppearance, Side};
pub use repository::{HistoryRepository, HistorySnapshot};
pub use schema::{FeatureSchema, Predictor, PredictorKind, SchemaError};
