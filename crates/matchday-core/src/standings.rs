// League table: one row per fantasy team, ranked by points then goal difference.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// League points for a head-to-head win.
pub const POINTS_FOR_WIN: u32 = 3;
/// League points for a head-to-head draw.
pub const POINTS_FOR_DRAW: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StandingsError {
    #[error("team `{0}` is not in the table")]
    UnknownTeam(String),

    #[error("team `{0}` cannot play itself")]
    SameTeam(String),
}

/// A single line of the league table.
///
/// "Goals" here are the fantasy points each side put up in its head-to-head
/// fixtures, not real-world goals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team_id: String,
    pub team_name: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: i64,
    pub goals_against: i64,
    pub goal_difference: i64,
    pub points: u32,
}

impl StandingsRow {
    pub fn new(team_id: &str, team_name: &str) -> Self {
        StandingsRow {
            team_id: team_id.to_string(),
            team_name: team_name.to_string(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
        }
    }

    fn set_goals(&mut self, goals_for: i64, goals_against: i64) {
        self.goals_for = goals_for;
        self.goals_against = goals_against;
        self.goal_difference = goals_for - goals_against;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsTable {
    rows: Vec<StandingsRow>,
}

impl StandingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(team_id, team_name)` pairs, all rows zeroed.
    pub fn with_teams<'a, I>(teams: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        StandingsTable {
            rows: teams
                .into_iter()
                .map(|(id, name)| StandingsRow::new(id, name))
                .collect(),
        }
    }

    /// Insert a row, replacing any existing row for the same team.
    pub fn upsert(&mut self, row: StandingsRow) {
        match self.rows.iter_mut().find(|r| r.team_id == row.team_id) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
    }

    pub fn rows(&self) -> &[StandingsRow] {
        &self.rows
    }

    pub fn get(&self, team_id: &str) -> Option<&StandingsRow> {
        self.rows.iter().find(|r| r.team_id == team_id)
    }

    fn row_mut(&mut self, team_id: &str) -> Result<&mut StandingsRow, StandingsError> {
        self.rows
            .iter_mut()
            .find(|r| r.team_id == team_id)
            .ok_or_else(|| StandingsError::UnknownTeam(team_id.to_string()))
    }

    /// Overwrite a team's for/against totals. Goal difference follows.
    pub fn set_goals(
        &mut self,
        team_id: &str,
        goals_for: i64,
        goals_against: i64,
    ) -> Result<(), StandingsError> {
        self.row_mut(team_id)?.set_goals(goals_for, goals_against);
        Ok(())
    }

    /// Record one head-to-head fixture between two fantasy teams, where each
    /// side's score is its lineup's points for the round.
    pub fn record_result(
        &mut self,
        home_id: &str,
        home_score: i32,
        away_id: &str,
        away_score: i32,
    ) -> Result<(), StandingsError> {
        if home_id == away_id {
            return Err(StandingsError::SameTeam(home_id.to_string()));
        }
        // Both lookups before any write.
        self.row_mut(home_id)?;
        self.row_mut(away_id)?;

        for (id, scored, conceded) in [
            (home_id, home_score, away_score),
            (away_id, away_score, home_score),
        ] {
            let row = self.row_mut(id)?;
            row.played += 1;
            let (gf, ga) = (
                row.goals_for + i64::from(scored),
                row.goals_against + i64::from(conceded),
            );
            row.set_goals(gf, ga);
            match scored.cmp(&conceded) {
                std::cmp::Ordering::Greater => {
                    row.wins += 1;
                    row.points += POINTS_FOR_WIN;
                }
                std::cmp::Ordering::Equal => {
                    row.draws += 1;
                    row.points += POINTS_FOR_DRAW;
                }
                std::cmp::Ordering::Less => row.losses += 1,
            }
        }
        debug!(
            "result recorded: {} {} - {} {}",
            home_id, home_score, away_score, away_id
        );
        Ok(())
    }

    /// Rows in table order with their 1-based rank.
    ///
    /// Points descending, then goal difference descending, then team name so
    /// the order is stable for exact ties.
    pub fn ranked(&self) -> Vec<(usize, &StandingsRow)> {
        let mut sorted: Vec<&StandingsRow> = self.rows.iter().collect();
        sorted.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(b.goal_difference.cmp(&a.goal_difference))
                .then_with(|| a.team_name.cmp(&b.team_name))
        });
        sorted
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i + 1, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, points: u32, gf: i64, ga: i64) -> StandingsRow {
        let mut r = StandingsRow::new(id, id);
        r.points = points;
        r.set_goals(gf, ga);
        r
    }

    #[test]
    fn set_goals_recomputes_difference() {
        let mut table = StandingsTable::with_teams([("harale", "Harale")]);
        table.set_goals("harale", 955, 839).unwrap();
        let r = table.get("harale").unwrap();
        assert_eq!(r.goal_difference, 116);
        table.set_goals("harale", 800, 900).unwrap();
        assert_eq!(table.get("harale").unwrap().goal_difference, -100);
    }

    #[test]
    fn set_goals_unknown_team() {
        let mut table = StandingsTable::new();
        assert_eq!(
            table.set_goals("ghost", 1, 0),
            Err(StandingsError::UnknownTeam("ghost".into()))
        );
    }

    #[test]
    fn ranking_uses_points_then_difference() {
        let mut table = StandingsTable::new();
        table.upsert(row("tampa", 24, 896, 930));
        table.upsert(row("harale", 35, 955, 839));
        table.upsert(row("tumali", 24, 889, 871));
        let ranked: Vec<(usize, &str)> = table
            .ranked()
            .into_iter()
            .map(|(rank, r)| (rank, r.team_id.as_str()))
            .collect();
        assert_eq!(ranked, vec![(1, "harale"), (2, "tumali"), (3, "tampa")]);
    }

    #[test]
    fn exact_ties_fall_back_to_name() {
        let mut table = StandingsTable::new();
        table.upsert(row("zeta", 10, 50, 50));
        table.upsert(row("alpha", 10, 50, 50));
        let ranked = table.ranked();
        assert_eq!(ranked[0].1.team_id, "alpha");
        assert_eq!(ranked[1].1.team_id, "zeta");
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let mut table = StandingsTable::with_teams([("a", "A"), ("b", "B")]);
        table.upsert(row("a", 7, 1, 0));
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.get("a").unwrap().points, 7);
    }

    #[test]
    fn record_result_win_and_draw() {
        let mut table = StandingsTable::with_teams([("a", "A"), ("b", "B")]);
        table.record_result("a", 45, "b", 38).unwrap();
        table.record_result("b", 40, "a", 40).unwrap();

        let a = table.get("a").unwrap();
        assert_eq!((a.played, a.wins, a.draws, a.losses), (2, 1, 1, 0));
        assert_eq!(a.points, POINTS_FOR_WIN + POINTS_FOR_DRAW);
        assert_eq!((a.goals_for, a.goals_against, a.goal_difference), (85, 78, 7));

        let b = table.get("b").unwrap();
        assert_eq!((b.played, b.wins, b.draws, b.losses), (2, 0, 1, 1));
        assert_eq!(b.points, POINTS_FOR_DRAW);
        assert_eq!(b.goal_difference, -7);
    }

    #[test]
    fn record_result_rejects_bad_teams_without_partial_update() {
        let mut table = StandingsTable::with_teams([("a", "A")]);
        let before = table.clone();
        assert_eq!(
            table.record_result("a", 1, "missing", 0),
            Err(StandingsError::UnknownTeam("missing".into()))
        );
        assert_eq!(
            table.record_result("a", 1, "a", 0),
            Err(StandingsError::SameTeam("a".into()))
        );
        assert_eq!(table, before);
    }

    #[test]
    fn negative_round_scores_are_allowed() {
        let mut table = StandingsTable::with_teams([("a", "A"), ("b", "B")]);
        table.record_result("a", -2, "b", -5).unwrap();
        assert_eq!(table.get("a").unwrap().wins, 1);
        assert_eq!(table.get("b").unwrap().goals_for, -5);
    }
}
