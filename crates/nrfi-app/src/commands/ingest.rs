// `nrfi ingest`: load the daily snapshot folder into the database.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use nrfi_store::{ingest_folder, Database, IngestSummary};

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub dir: PathBuf,
    pub summary: IngestSummary,
    pub games_stored: usize,
    pub appearances_stored: usize,
}

pub fn run(db: &Database, dir: &Path) -> Result<IngestReport> {
    info!("ingesting snapshots from {}", dir.display());
    let summary = ingest_folder(db, dir)
        .with_context(|| format!("failed to ingest {}", dir.display()))?;

    Ok(IngestReport {
        dir: dir.to_path_buf(),
        summary,
        games_stored: db.game_count()?,
        appearances_stored: db.appearance_count()?,
    })
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Snapshot ingest complete")?;
        writeln!(f, "Folder: {}", self.dir.display())?;
        writeln!(f, "Files read: {}", self.summary.files_read)?;
        writeln!(f, "New games: {}", self.summary.games_inserted)?;
        writeln!(
            f,
            "Stored: {} games, {} pitching lines",
            self.games_stored, self.appearances_stored
        )?;
        if !self.summary.failures.is_empty() {
            writeln!(f, "Failed files: {}", self.summary.failures.len())?;
            for failure in &self.summary.failures {
                writeln!(f, "  - {}: {}", failure.file.display(), failure.reason)?;
            }
        }
        Ok(())
    }
}
