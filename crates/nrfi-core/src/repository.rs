// Read-only access to historical games and pitcher appearances.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::identity::{PitcherId, TeamId};
use crate::records::{GameId, GameRecord, PitcherAppearance, Side};

/// The two record sets the feature engine reads.
///
/// Implementations return records in ascending date order but are NOT
/// expected to filter by any reference date; the engine applies its own
/// cutoff to whatever comes back.
pub trait HistoryRepository {
    /// Every recorded appearance by `pitcher`, oldest first.
    fn appearances_for(&self, pitcher: &PitcherId) -> Vec<&PitcherAppearance>;

    /// Every game in which `team` played as `side`, oldest first.
    fn games_for_team(&self, team: &TeamId, side: Side) -> Vec<&GameRecord>;
}

/// Immutable in-memory snapshot of the historical record sets, indexed by
/// pitcher and by (team, side).
#[derive(Debug, Default)]
pub struct HistorySnapshot {
    games: Vec<GameRecord>,
    appearances: Vec<PitcherAppearance>,
    by_pitcher: HashMap<PitcherId, Vec<usize>>,
    by_team_side: HashMap<(TeamId, Side), Vec<usize>>,
}

impl HistorySnapshot {
    /// Build a snapshot. Records are sorted by date (stable, so same-day
    /// records keep their input order) and duplicate appearances for the same
    /// (pitcher, game) are dropped, keeping the first.
    pub fn new(mut games: Vec<GameRecord>, mut appearances: Vec<PitcherAppearance>) -> Self {
        games.sort_by_key(|g| g.date);
        appearances.sort_by_key(|a| a.date);

        let mut seen: HashSet<(PitcherId, GameId)> = HashSet::new();
        appearances.retain(|a| {
            let fresh = seen.insert((a.pitcher.clone(), a.game_id));
            if !fresh {
                debug!(
                    "dropping duplicate appearance for {} in game {}",
                    a.pitcher, a.game_id
                );
            }
            fresh
        });

        let mut by_pitcher: HashMap<PitcherId, Vec<usize>> = HashMap::new();
        for (idx, appearance) in appearances.iter().enumerate() {
            by_pitcher
                .entry(appearance.pitcher.clone())
                .or_default()
                .push(idx);
        }

        let mut by_team_side: HashMap<(TeamId, Side), Vec<usize>> = HashMap::new();
        for (idx, game) in games.iter().enumerate() {
            for side in Side::BOTH {
                by_team_side
                    .entry((game.team(side).clone(), side))
                    .or_default()
                    .push(idx);
            }
        }

        Self {
            games,
            appearances,
            by_pitcher,
            by_team_side,
        }
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn appearances(&self) -> &[PitcherAppearance] {
        &self.appearances
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty() && self.appearances.is_empty()
    }
}

impl HistoryRepository for HistorySnapshot {
    fn appearances_for(&self, pitcher: &PitcherId) -> Vec<&PitcherAppearance> {
        self.by_pitcher
            .get(pitcher)
            .map(|idxs| idxs.iter().map(|&i| &self.appearances[i]).collect())
            .unwrap_or_default()
    }

    fn games_for_team(&self, team: &TeamId, side: Side) -> Vec<&GameRecord> {
        self.by_team_side
            .get(&(team.clone(), side))
            .map(|idxs| idxs.iter().map(|&i| &self.games[i]).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innings::Innings;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn game(id: u64, d: u32, home: &str, away: &str) -> GameRecord {
        GameRecord {
            game_id: GameId(id),
            date: day(d),
            home_team: TeamId::new(home),
            away_team: TeamId::new(away),
            home_pitcher: None,
            away_pitcher: None,
            home_first_inning_runs: Some(0),
            away_first_inning_runs: Some(0),
            home_score: None,
            away_score: None,
        }
    }

    fn appearance(pitcher: &str, game_id: u64, d: u32) -> PitcherAppearance {
        PitcherAppearance {
            pitcher: PitcherId::new(pitcher).unwrap(),
            team: TeamId::new("Team"),
            game_id: GameId(game_id),
            date: day(d),
            innings: Innings::from_outs(18),
            strikeouts: 5,
            earned_runs: 2,
        }
    }

    #[test]
    fn games_are_indexed_by_team_and_side() {
        let snapshot = HistorySnapshot::new(
            vec![game(2, 9, "Cubs", "Mets"), game(1, 3, "Mets", "Cubs")],
            vec![],
        );

        let cubs_home = snapshot.games_for_team(&TeamId::new("Cubs"), Side::Home);
        assert_eq!(cubs_home.len(), 1);
        assert_eq!(cubs_home[0].game_id, GameId(2));

        let cubs_away = snapshot.games_for_team(&TeamId::new("Cubs"), Side::Away);
        assert_eq!(cubs_away.len(), 1);
        assert_eq!(cubs_away[0].game_id, GameId(1));

        assert!(snapshot
            .games_for_team(&TeamId::new("Padres"), Side::Home)
            .is_empty());
    }

    #[test]
    fn records_come_back_in_date_order() {
        let snapshot = HistorySnapshot::new(
            vec![],
            vec![
                appearance("Ace", 3, 20),
                appearance("Ace", 1, 2),
                appearance("Ace", 2, 11),
            ],
        );
        let dates: Vec<_> = snapshot
            .appearances_for(&PitcherId::new("ace").unwrap())
            .iter()
            .map(|a| a.date)
            .collect();
        assert_eq!(dates, vec![day(2), day(11), day(20)]);
    }

    #[test]
    fn duplicate_appearances_are_dropped() {
        let snapshot = HistorySnapshot::new(
            vec![],
            vec![appearance("Ace", 1, 2), appearance("ACE", 1, 2)],
        );
        assert_eq!(snapshot.appearances().len(), 1);
    }
}
