// Folder ingestion of daily JSON snapshot files into the database.

use std::path::{Path, PathBuf};

use anyhow::Context;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::Database;
use crate::snapshot::parse_daily_json;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read snapshot directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A file that could not be loaded. The rest of the folder still is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub files_read: usize,
    pub games_inserted: usize,
    pub failures: Vec<FileFailure>,
}

/// `*.json` files directly under `dir`, sorted by file name.
pub fn snapshot_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let read_err = |source| IngestError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every daily file in `dir`. Each file is its own transaction, so a bad
/// file leaves nothing half-written and does not stop the others.
pub fn ingest_folder(db: &Database, dir: &Path) -> Result<IngestSummary, IngestError> {
    let mut summary = IngestSummary::default();

    for file in snapshot_files(dir)? {
        match ingest_file(db, &file) {
            Ok(inserted) => {
                info!("{}: {} new games", file.display(), inserted);
                summary.files_read += 1;
                summary.games_inserted += inserted;
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!("skipping {}: {}", file.display(), reason);
                summary.failures.push(FileFailure { file, reason });
            }
        }
    }

    info!(
        "ingested {} files ({} new games, {} failed)",
        summary.files_read,
        summary.games_inserted,
        summary.failures.len()
    );
    Ok(summary)
}

fn ingest_file(db: &Database, file: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(file).context("read error")?;
    let games = parse_daily_json(&raw).context("invalid JSON")?;
    db.insert_daily_games(&games)
}
