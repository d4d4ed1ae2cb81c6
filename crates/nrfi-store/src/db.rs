// SQLite store for games, pitching lines and batting lines.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, Transaction};
use tracing::{debug, info};

use nrfi_core::{GameId, GameRecord, HistorySnapshot, Innings, PitcherAppearance, PitcherId, TeamId};

use crate::snapshot::DailyGame;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed store of the historical record sets.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS games (
                id            INTEGER PRIMARY KEY,
                date          TEXT NOT NULL,
                home_team     TEXT NOT NULL,
                away_team     TEXT NOT NULL,
                home_score    INTEGER,
                away_score    INTEGER,
                home_pitcher  TEXT,
                away_pitcher  TEXT,
                home_1st_runs INTEGER,
                away_1st_runs INTEGER,
                status        TEXT
            );

            CREATE TABLE IF NOT EXISTS pitchers (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id         INTEGER NOT NULL REFERENCES games(id),
                name            TEXT NOT NULL,
                pitcher_key     TEXT NOT NULL,
                team            TEXT NOT NULL,
                innings_pitched TEXT NOT NULL,
                strikeouts      INTEGER NOT NULL,
                earned_runs     INTEGER NOT NULL,
                UNIQUE(pitcher_key, game_id)
            );

            CREATE TABLE IF NOT EXISTS hitters (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id INTEGER NOT NULL REFERENCES games(id),
                name    TEXT NOT NULL,
                team    TEXT NOT NULL,
                hits    INTEGER NOT NULL,
                rbi     INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_games_date ON games(date);
            CREATE INDEX IF NOT EXISTS idx_pitchers_key ON pitchers(pitcher_key);
            CREATE INDEX IF NOT EXISTS idx_hitters_game ON hitters(game_id);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Store one day's games in a single transaction and return how many new
    /// games were inserted.
    ///
    /// Games already present are left untouched (INSERT OR IGNORE), and their
    /// pitching and batting lines are not inserted a second time.
    pub fn insert_daily_games(&self, games: &[DailyGame]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin insert transaction")?;

        let mut inserted = 0usize;
        for game in games {
            if insert_game(&tx, game)? {
                insert_lines(&tx, game)?;
                inserted += 1;
            } else {
                debug!("game {} already stored, skipping", game.game_id);
            }
        }

        tx.commit().context("failed to commit daily games")?;
        Ok(inserted)
    }

    /// All stored games, oldest first.
    pub fn load_games(&self) -> Result<Vec<GameRecord>> {
        let conn = self.conn();
        query_games(&conn)
    }

    /// All stored pitching lines joined to their game date, oldest first.
    pub fn load_appearances(&self) -> Result<Vec<PitcherAppearance>> {
        let conn = self.conn();
        query_appearances(&conn)
    }

    /// Read both record sets inside one read transaction, so every feature
    /// computed from the snapshot sees the same history.
    pub fn load_snapshot(&self) -> Result<HistorySnapshot> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin snapshot read")?;
        let games = query_games(&tx)?;
        let appearances = query_appearances(&tx)?;
        tx.commit().context("failed to close snapshot read")?;

        info!(
            "Loaded history snapshot: {} games, {} pitching lines",
            games.len(),
            appearances.len()
        );
        Ok(HistorySnapshot::new(games, appearances))
    }

    pub fn game_count(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM games")
    }

    pub fn appearance_count(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM pitchers")
    }

    pub fn hitter_line_count(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM hitters")
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(sql, [], |row| row.get(0))
            .with_context(|| format!("failed to run count query `{sql}`"))?;
        Ok(count as usize)
    }
}

// ---------------------------------------------------------------------------
// Inserts
// ---------------------------------------------------------------------------

fn sql_id(game_id: u64) -> Result<i64> {
    i64::try_from(game_id).with_context(|| format!("game id {game_id} does not fit in SQLite INTEGER"))
}

/// Returns `true` if the game row was new.
fn insert_game(tx: &Transaction<'_>, game: &DailyGame) -> Result<bool> {
    let changed = tx
        .execute(
            "INSERT OR IGNORE INTO games (
                id, date, home_team, away_team, home_score, away_score,
                home_pitcher, away_pitcher, home_1st_runs, away_1st_runs, status
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                sql_id(game.game_id)?,
                game.date.format(DATE_FORMAT).to_string(),
                game.home_team.trim(),
                game.away_team.trim(),
                game.home_score,
                game.away_score,
                game.starting_pitchers.home.as_deref().map(str::trim),
                game.starting_pitchers.away.as_deref().map(str::trim),
                game.home_first_inning_runs(),
                game.away_first_inning_runs(),
                game.status,
            ],
        )
        .with_context(|| format!("failed to insert game {}", game.game_id))?;
    Ok(changed > 0)
}

fn insert_lines(tx: &Transaction<'_>, game: &DailyGame) -> Result<()> {
    let game_id = sql_id(game.game_id)?;

    for line in &game.pitcher_stats {
        let Some(key) = PitcherId::new(&line.name) else {
            debug!("skipping unnamed pitching line in game {}", game.game_id);
            continue;
        };
        tx.execute(
            "INSERT OR IGNORE INTO pitchers
                (game_id, name, pitcher_key, team, innings_pitched, strikeouts, earned_runs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                game_id,
                line.name.trim(),
                key.as_str(),
                line.team.trim(),
                line.innings_text(),
                line.strikeouts,
                line.earned_runs,
            ],
        )
        .with_context(|| format!("failed to insert pitching line for {} in game {}", line.name, game.game_id))?;
    }

    for line in &game.player_stats {
        tx.execute(
            "INSERT INTO hitters (game_id, name, team, hits, rbi) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![game_id, line.name.trim(), line.team.trim(), line.hits, line.rbi],
        )
        .with_context(|| format!("failed to insert batting line for {} in game {}", line.name, game.game_id))?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

fn read_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn read_game_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<GameId> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw)
        .map(GameId)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn query_games(conn: &Connection) -> Result<Vec<GameRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, date, home_team, away_team, home_pitcher, away_pitcher,
                    home_1st_runs, away_1st_runs, home_score, away_score
             FROM games ORDER BY date, id",
        )
        .context("failed to prepare games query")?;

    let games = stmt
        .query_map([], |row| {
            let home_pitcher: Option<String> = row.get(4)?;
            let away_pitcher: Option<String> = row.get(5)?;
            Ok(GameRecord {
                game_id: read_game_id(row, 0)?,
                date: read_date(row, 1)?,
                home_team: TeamId::new(&row.get::<_, String>(2)?),
                away_team: TeamId::new(&row.get::<_, String>(3)?),
                home_pitcher: home_pitcher.as_deref().and_then(PitcherId::new),
                away_pitcher: away_pitcher.as_deref().and_then(PitcherId::new),
                home_first_inning_runs: row.get(6)?,
                away_first_inning_runs: row.get(7)?,
                home_score: row.get(8)?,
                away_score: row.get(9)?,
            })
        })
        .context("failed to query games")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map game rows")?;

    Ok(games)
}

fn query_appearances(conn: &Connection) -> Result<Vec<PitcherAppearance>> {
    let mut stmt = conn
        .prepare(
            "SELECT p.pitcher_key, p.team, p.game_id, g.date,
                    p.innings_pitched, p.strikeouts, p.earned_runs
             FROM pitchers p
             JOIN games g ON g.id = p.game_id
             ORDER BY g.date, p.id",
        )
        .context("failed to prepare pitchers query")?;

    let rows = stmt
        .query_map([], |row| {
            let key: String = row.get(0)?;
            let Some(pitcher) = PitcherId::new(&key) else {
                return Ok(None);
            };
            let innings: String = row.get(4)?;
            Ok(Some(PitcherAppearance {
                pitcher,
                team: TeamId::new(&row.get::<_, String>(1)?),
                game_id: read_game_id(row, 2)?,
                date: read_date(row, 3)?,
                innings: Innings::parse_lenient(&innings),
                strikeouts: row.get(5)?,
                earned_runs: row.get(6)?,
            }))
        })
        .context("failed to query pitchers")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map pitcher rows")?;

    Ok(rows.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::parse_daily_json;
    use nrfi_core::{HistoryRepository, Side};

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn sample_day() -> Vec<DailyGame> {
        parse_daily_json(
            r#"[
              {"game_id": 1, "date": "2024-04-02", "home_team": "Chicago Cubs", "away_team": "Colorado Rockies",
               "home_score": 5, "away_score": 0, "status": "Final",
               "starting_pitchers": {"home": "Justin Steele", "away": "Kyle Freeland"},
               "first_inning_runs": {"home": {"runs": 1}, "away": {"runs": 0}},
               "player_stats": [{"name": "Ian Happ", "team": "Chicago Cubs", "hits": 2, "rbi": 1}],
               "pitcher_stats": [
                 {"name": "Justin Steele", "team": "Chicago Cubs", "innings_pitched": "6.1", "strikeouts": 7, "earned_runs": 0},
                 {"name": "Kyle Freeland", "team": "Colorado Rockies", "innings_pitched": "4.2", "strikeouts": 3, "earned_runs": 4},
                 {"name": "Kyle  Freeland", "team": "Colorado Rockies", "innings_pitched": "4.2", "strikeouts": 3, "earned_runs": 4}
               ]},
              {"game_id": 2, "date": "2024-04-01", "home_team": "Colorado Rockies", "away_team": "Chicago Cubs",
               "starting_pitchers": {"home": "Unknown", "away": "Jameson Taillon"},
               "first_inning_runs": {"home": {"runs": 0}},
               "pitcher_stats": [
                 {"name": "Jameson Taillon", "team": "Chicago Cubs", "innings_pitched": "n/a", "strikeouts": 2, "earned_runs": 1}
               ]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(tables, vec!["games", "hitters", "pitchers"]);
    }

    #[test]
    fn insert_and_load_games() {
        let db = test_db();
        assert_eq!(db.insert_daily_games(&sample_day()).unwrap(), 2);

        let games = db.load_games().unwrap();
        assert_eq!(games.len(), 2);
        // Oldest first.
        assert_eq!(games[0].game_id, GameId(2));
        assert_eq!(games[0].home_pitcher, None);
        assert_eq!(games[0].away_pitcher, PitcherId::new("Jameson Taillon"));
        assert_eq!(games[0].away_first_inning_runs, None);
        assert_eq!(games[1].home_team, TeamId::new("chicago cubs"));
        assert_eq!(games[1].yrfi_label(), Some(true));
        assert_eq!(games[1].home_score, Some(5));
    }

    #[test]
    fn reinserting_a_day_is_a_no_op() {
        let db = test_db();
        db.insert_daily_games(&sample_day()).unwrap();
        assert_eq!(db.insert_daily_games(&sample_day()).unwrap(), 0);
        assert_eq!(db.game_count().unwrap(), 2);
        assert_eq!(db.appearance_count().unwrap(), 3);
        assert_eq!(db.hitter_line_count().unwrap(), 1);
    }

    #[test]
    fn pitching_lines_are_unique_per_pitcher_and_game() {
        let db = test_db();
        db.insert_daily_games(&sample_day()).unwrap();
        let freeland: Vec<_> = db
            .load_appearances()
            .unwrap()
            .into_iter()
            .filter(|a| a.pitcher == PitcherId::new("kyle freeland").unwrap())
            .collect();
        assert_eq!(freeland.len(), 1);
    }

    #[test]
    fn appearances_carry_game_date_and_parsed_innings() {
        let db = test_db();
        db.insert_daily_games(&sample_day()).unwrap();
        let appearances = db.load_appearances().unwrap();

        let taillon = &appearances[0];
        assert_eq!(taillon.date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert!(taillon.innings.is_zero());

        let steele = appearances
            .iter()
            .find(|a| a.pitcher == PitcherId::new("Justin Steele").unwrap())
            .unwrap();
        assert_eq!(steele.innings.outs(), 19);
        assert_eq!(steele.strikeouts, 7);
    }

    #[test]
    fn snapshot_serves_the_repository_interface() {
        let db = test_db();
        db.insert_daily_games(&sample_day()).unwrap();
        let snapshot = db.load_snapshot().unwrap();

        assert_eq!(snapshot.games().len(), 2);
        let cubs_away = snapshot.games_for_team(&TeamId::new("Chicago Cubs"), Side::Away);
        assert_eq!(cubs_away.len(), 1);
        let steele = snapshot.appearances_for(&PitcherId::new("justin steele").unwrap());
        assert_eq!(steele.len(), 1);
    }
}
