// Daily JSON snapshot format written by the schedule/box-score collector.
//
// One file per calendar day, holding an array of game summaries. Older files
// store first-inning runs as bare integers instead of `{"runs": n}` objects,
// and innings pitched may be a string ("6.1") or a number (6.1).

use chrono::NaiveDate;
use serde::de::IgnoredAny;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DailyGame {
    pub game_id: u64,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub starting_pitchers: StartingPitchers,
    #[serde(default)]
    pub first_inning_runs: Option<FirstInningRuns>,
    #[serde(default)]
    pub player_stats: Vec<BattingLine>,
    #[serde(default)]
    pub pitcher_stats: Vec<PitchingLine>,
}

impl DailyGame {
    pub fn home_first_inning_runs(&self) -> Option<u32> {
        self.first_inning_runs
            .as_ref()
            .and_then(|r| r.home.as_ref())
            .and_then(SideRuns::runs)
    }

    pub fn away_first_inning_runs(&self) -> Option<u32> {
        self.first_inning_runs
            .as_ref()
            .and_then(|r| r.away.as_ref())
            .and_then(SideRuns::runs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartingPitchers {
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub away: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirstInningRuns {
    #[serde(default)]
    pub home: Option<SideRuns>,
    #[serde(default)]
    pub away: Option<SideRuns>,
}

/// One side's first-inning line. Anything without a usable run count
/// (no `runs` key, `"runs": null`, a string) reads as missing rather than
/// failing the whole day.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SideRuns {
    Bare(u32),
    Detailed {
        #[serde(default)]
        runs: Option<u32>,
    },
    Unreadable(IgnoredAny),
}

impl SideRuns {
    pub fn runs(&self) -> Option<u32> {
        match self {
            SideRuns::Bare(runs) => Some(*runs),
            SideRuns::Detailed { runs } => *runs,
            SideRuns::Unreadable(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BattingLine {
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub hits: u32,
    #[serde(default)]
    pub rbi: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PitchingLine {
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub innings_pitched: Option<InningsText>,
    #[serde(default)]
    pub strikeouts: u32,
    #[serde(default)]
    pub earned_runs: u32,
}

impl PitchingLine {
    /// Innings as box-score text, exactly as it will be stored.
    pub fn innings_text(&self) -> String {
        match &self.innings_pitched {
            Some(InningsText::Text(s)) => s.trim().to_string(),
            Some(InningsText::Number(n)) => n.to_string(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InningsText {
    Text(String),
    Number(f64),
}

/// Parse one day's file. A literal `null` is an empty day.
pub fn parse_daily_json(raw: &str) -> Result<Vec<DailyGame>, serde_json::Error> {
    let games: Option<Vec<DailyGame>> = serde_json::from_str(raw)?;
    Ok(games.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: &str = r#"[
      {
        "date": "2024-04-02",
        "home_team": "Chicago Cubs",
        "away_team": "Colorado Rockies",
        "home_score": 5,
        "away_score": 0,
        "status": "Final",
        "game_id": 745000,
        "starting_pitchers": {"home": "Justin Steele", "away": "Kyle Freeland"},
        "first_inning_runs": {"home": {"runs": 1}, "away": {"runs": 0}},
        "player_stats": [{"name": "Ian Happ", "team": "Chicago Cubs", "hits": 2, "rbi": 1}],
        "pitcher_stats": [
          {"name": "Justin Steele", "team": "Chicago Cubs", "innings_pitched": "6.1", "strikeouts": 7, "earned_runs": 0},
          {"name": "Kyle Freeland", "team": "Colorado Rockies", "innings_pitched": 4.2, "strikeouts": 3, "earned_runs": 4}
        ]
      }
    ]"#;

    #[test]
    fn parses_a_full_day() {
        let games = parse_daily_json(DAY).unwrap();
        assert_eq!(games.len(), 1);
        let g = &games[0];
        assert_eq!(g.game_id, 745000);
        assert_eq!(g.date, NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
        assert_eq!(g.home_first_inning_runs(), Some(1));
        assert_eq!(g.away_first_inning_runs(), Some(0));
        assert_eq!(g.starting_pitchers.home.as_deref(), Some("Justin Steele"));
        assert_eq!(g.pitcher_stats[0].innings_text(), "6.1");
        assert_eq!(g.pitcher_stats[1].innings_text(), "4.2");
        assert_eq!(g.player_stats[0].hits, 2);
    }

    #[test]
    fn legacy_bare_integer_runs() {
        let raw = r#"[{"game_id": 1, "date": "2022-05-02", "home_team": "A", "away_team": "B",
                      "first_inning_runs": {"home": 2, "away": 0}}]"#;
        let games = parse_daily_json(raw).unwrap();
        assert_eq!(games[0].home_first_inning_runs(), Some(2));
        assert_eq!(games[0].away_first_inning_runs(), Some(0));
    }

    #[test]
    fn missing_linescore_stays_missing() {
        let raw = r#"[{"game_id": 1, "date": "2022-05-02", "home_team": "A", "away_team": "B",
                      "first_inning_runs": {"home": {"runs": 0}}}]"#;
        let games = parse_daily_json(raw).unwrap();
        assert_eq!(games[0].home_first_inning_runs(), Some(0));
        assert_eq!(games[0].away_first_inning_runs(), None);

        let raw = r#"[{"game_id": 2, "date": "2022-05-02", "home_team": "A", "away_team": "B"}]"#;
        let games = parse_daily_json(raw).unwrap();
        assert_eq!(games[0].home_first_inning_runs(), None);
        assert!(games[0].pitcher_stats.is_empty());
    }

    #[test]
    fn side_without_run_count_is_missing() {
        let raw = r#"[
          {"game_id": 1, "date": "2022-05-02", "home_team": "A", "away_team": "B",
           "first_inning_runs": {"home": {"runs": 1}, "away": {"hits": 0, "errors": 0}}},
          {"game_id": 2, "date": "2022-05-02", "home_team": "C", "away_team": "D",
           "first_inning_runs": {"home": {"runs": null}, "away": "--"}}
        ]"#;
        let games = parse_daily_json(raw).unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].home_first_inning_runs(), Some(1));
        assert_eq!(games[0].away_first_inning_runs(), None);
        assert_eq!(games[1].home_first_inning_runs(), None);
        assert_eq!(games[1].away_first_inning_runs(), None);
    }

    #[test]
    fn null_day_is_empty() {
        assert!(parse_daily_json("null").unwrap().is_empty());
        assert!(parse_daily_json("[]").unwrap().is_empty());
    }

    #[test]
    fn bad_date_is_an_error() {
        let raw = r#"[{"game_id": 1, "date": "May 2", "home_team": "A", "away_team": "B"}]"#;
        assert!(parse_daily_json(raw).is_err());
    }
}
