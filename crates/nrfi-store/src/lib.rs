pub mod db;
pub mod export;
pub mod ingest;
pub mod snapshot;

pub use db::Database;
pub use export::{export_feature_vectors, export_training_rows, TrainingRow, TrainingSet};
pub use ingest::{ingest_folder, FileFailure, IngestError, IngestSummary};
pub use snapshot::{parse_daily_json, DailyGame};
