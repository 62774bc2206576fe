// Fantasy points: per-match stat lines in, totals and breakdowns out.
//
// The engine is a fixed sequence of independent rules. Every rule that applies
// appends exactly one entry to the breakdown, so the breakdown order is the
// rule order and the total is always the sum of the breakdown.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::{Player, Position};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// How much of the match a player took part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MinutesBucket {
    /// Not named in the matchday squad.
    #[default]
    #[serde(rename = "not_in_squad")]
    NotInSquad,
    /// Named in the squad but never came on.
    #[serde(rename = "unused")]
    Unused,
    #[serde(rename = "<60")]
    UnderSixty,
    #[serde(rename = "60+")]
    SixtyPlus,
}

impl MinutesBucket {
    /// Parse a minutes bucket from the spellings used by data entry.
    ///
    /// - "not_in_squad", "dnp", "none" -> NotInSquad
    /// - "unused", "bench", "unused_sub" -> Unused
    /// - "<60", "sub60", "under_60" -> UnderSixty
    /// - "60+", "60", "full" -> SixtyPlus
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "not_in_squad" | "not in squad" | "dnp" | "none" => Some(MinutesBucket::NotInSquad),
            "unused" | "bench" | "unused_sub" => Some(MinutesBucket::Unused),
            "<60" | "sub60" | "under_60" => Some(MinutesBucket::UnderSixty),
            "60+" | "60" | "full" => Some(MinutesBucket::SixtyPlus),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            MinutesBucket::NotInSquad => "not_in_squad",
            MinutesBucket::Unused => "unused",
            MinutesBucket::UnderSixty => "<60",
            MinutesBucket::SixtyPlus => "60+",
        }
    }

    /// Whether the player actually stepped onto the pitch.
    pub fn appeared(&self) -> bool {
        matches!(self, MinutesBucket::UnderSixty | MinutesBucket::SixtyPlus)
    }
}

impl fmt::Display for MinutesBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// One player's raw statistics for one match.
///
/// Counts are unsigned, so negative inputs cannot reach the engine. Huge
/// counts saturate the points at the `i32` bounds, and at most
/// [`MAX_EVENTS_PER_KIND`] badge events are emitted per kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchStatLine {
    pub minutes: MinutesBucket,
    pub goals: u32,
    pub assists: u32,
    /// Goals conceded while on the pitch. Only scored for GK/DEF.
    pub goals_conceded: u32,
    pub own_goals: u32,
    pub clean_sheet: bool,
    pub yellow_card: bool,
    pub red_card: bool,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Discrete match events, used for badges rather than scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchEvent {
    Goal,
    Assist,
    OwnGoal,
}

/// Which rule produced a breakdown entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ScoringReason {
    Minutes { bucket: MinutesBucket },
    Goals { count: u32 },
    Assists { count: u32 },
    CleanSheet,
    GoalsConceded { count: u32 },
    YellowCard,
    RedCard,
    OwnGoals { count: u32 },
}

impl ScoringReason {
    /// Human-readable label for display next to the points.
    pub fn label(&self) -> String {
        match self {
            ScoringReason::Minutes { bucket } => match bucket {
                MinutesBucket::SixtyPlus => "played 60+".to_string(),
                MinutesBucket::UnderSixty => "played under 60".to_string(),
                MinutesBucket::Unused => "in squad, unused".to_string(),
                MinutesBucket::NotInSquad => "not in squad".to_string(),
            },
            ScoringReason::Goals { count } => counted(*count, "goal", "goals"),
            ScoringReason::Assists { count } => counted(*count, "assist", "assists"),
            ScoringReason::CleanSheet => "clean sheet".to_string(),
            ScoringReason::GoalsConceded { count } => {
                format!("{} conceded", counted(*count, "goal", "goals"))
            }
            ScoringReason::YellowCard => "yellow card".to_string(),
            ScoringReason::RedCard => "red card".to_string(),
            ScoringReason::OwnGoals { count } => counted(*count, "own goal", "own goals"),
        }
    }
}

fn counted(count: u32, singular: &str, plural: &str) -> String {
    if count == 1 {
        singular.to_string()
    } else {
        format!("{count} {plural}")
    }
}

/// One line of a points breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsAction {
    pub reason: ScoringReason,
    pub pts: i32,
}

impl PointsAction {
    pub fn label(&self) -> String {
        self.reason.label()
    }
}

/// The result of scoring one stat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub total: i32,
    /// Entries in rule-evaluation order; their `pts` sum to `total`.
    pub breakdown: Vec<PointsAction>,
    /// Repeated per occurrence: two goals produce two `Goal` events.
    pub events: Vec<MatchEvent>,
}

// ---------------------------------------------------------------------------
// Scoring table
// ---------------------------------------------------------------------------

/// Per-position point values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionValues {
    pub goal: i32,
    pub assist: i32,
    /// Awarded for a clean sheet with 60+ minutes. Zero disables the rule.
    pub clean_sheet: i32,
    /// Applied per goal conceded. Zero disables the rule.
    pub goal_conceded: i32,
}

/// The complete rule table. `Default` is the league's standard scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTable {
    pub minutes_sixty_plus: i32,
    pub minutes_under_sixty: i32,
    pub minutes_unused: i32,
    pub minutes_not_in_squad: i32,
    pub yellow_card: i32,
    pub red_card: i32,
    pub own_goal: i32,
    pub goalkeeper: PositionValues,
    pub defender: PositionValues,
    pub midfielder: PositionValues,
    pub forward: PositionValues,
}

impl Default for ScoringTable {
    fn default() -> Self {
        ScoringTable {
            minutes_sixty_plus: 2,
            minutes_under_sixty: 1,
            minutes_unused: 0,
            minutes_not_in_squad: -1,
            yellow_card: -2,
            red_card: -5,
            own_goal: -3,
            goalkeeper: PositionValues {
                goal: 10,
                assist: 6,
                clean_sheet: 5,
                goal_conceded: -1,
            },
            defender: PositionValues {
                goal: 8,
                assist: 4,
                clean_sheet: 4,
                goal_conceded: -1,
            },
            midfielder: PositionValues {
                goal: 5,
                assist: 3,
                clean_sheet: 0,
                goal_conceded: 0,
            },
            forward: PositionValues {
                goal: 5,
                assist: 3,
                clean_sheet: 0,
                goal_conceded: 0,
            },
        }
    }
}

impl ScoringTable {
    pub fn values_for(&self, position: Position) -> &PositionValues {
        match position {
            Position::Goalkeeper => &self.goalkeeper,
            Position::Defender => &self.defender,
            Position::Midfielder => &self.midfielder,
            Position::Forward => &self.forward,
        }
    }

    pub fn minutes_points(&self, bucket: MinutesBucket) -> i32 {
        match bucket {
            MinutesBucket::SixtyPlus => self.minutes_sixty_plus,
            MinutesBucket::UnderSixty => self.minutes_under_sixty,
            MinutesBucket::Unused => self.minutes_unused,
            MinutesBucket::NotInSquad => self.minutes_not_in_squad,
        }
    }

    /// Score one player's stat line.
    ///
    /// Rules run in a fixed order: minutes, goals, assists, clean sheet,
    /// goals conceded, yellow card, red card, own goals. No rule suppresses
    /// another, and no rounding is applied, so totals can go negative.
    /// Arithmetic saturates rather than overflowing.
    pub fn score(&self, position: Position, stats: &MatchStatLine) -> PlayerScore {
        let values = self.values_for(position);
        let mut breakdown = Vec::new();
        let mut events = Vec::new();

        // 1. Minutes: exactly one bucket always fires, even at zero points.
        breakdown.push(PointsAction {
            reason: ScoringReason::Minutes {
                bucket: stats.minutes,
            },
            pts: self.minutes_points(stats.minutes),
        });

        // 2. Goals
        if stats.goals > 0 {
            breakdown.push(PointsAction {
                reason: ScoringReason::Goals { count: stats.goals },
                pts: per_count(stats.goals, values.goal),
            });
            events.extend(repeat_event(MatchEvent::Goal, stats.goals));
        }

        // 3. Assists
        if stats.assists > 0 {
            breakdown.push(PointsAction {
                reason: ScoringReason::Assists {
                    count: stats.assists,
                },
                pts: per_count(stats.assists, values.assist),
            });
            events.extend(repeat_event(MatchEvent::Assist, stats.assists));
        }

        // 4. Clean sheet: GK/DEF with a full appearance only.
        if position.is_defensive()
            && stats.clean_sheet
            && stats.minutes == MinutesBucket::SixtyPlus
            && values.clean_sheet != 0
        {
            breakdown.push(PointsAction {
                reason: ScoringReason::CleanSheet,
                pts: values.clean_sheet,
            });
        }

        // 5. Goals conceded: GK/DEF only.
        if position.is_defensive() && stats.goals_conceded > 0 && values.goal_conceded != 0 {
            breakdown.push(PointsAction {
                reason: ScoringReason::GoalsConceded {
                    count: stats.goals_conceded,
                },
                pts: per_count(stats.goals_conceded, values.goal_conceded),
            });
        }

        // 6. Cards
        if stats.yellow_card {
            breakdown.push(PointsAction {
                reason: ScoringReason::YellowCard,
                pts: self.yellow_card,
            });
        }
        if stats.red_card {
            breakdown.push(PointsAction {
                reason: ScoringReason::RedCard,
                pts: self.red_card,
            });
        }

        // 7. Own goals
        if stats.own_goals > 0 {
            breakdown.push(PointsAction {
                reason: ScoringReason::OwnGoals {
                    count: stats.own_goals,
                },
                pts: per_count(stats.own_goals, self.own_goal),
            });
            events.extend(repeat_event(MatchEvent::OwnGoal, stats.own_goals));
        }

        let total = breakdown
            .iter()
            .fold(0i32, |acc, a| acc.saturating_add(a.pts));

        PlayerScore {
            total,
            breakdown,
            events,
        }
    }
}

/// Badge events emitted per kind are capped; the breakdown keeps the full count.
pub const MAX_EVENTS_PER_KIND: u32 = 32;

fn repeat_event(event: MatchEvent, count: u32) -> impl Iterator<Item = MatchEvent> {
    std::iter::repeat(event).take(count.min(MAX_EVENTS_PER_KIND) as usize)
}

fn per_count(count: u32, value: i32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX).saturating_mul(value)
}

/// Score a stat line against the standard league table.
pub fn score(position: Position, stats: &MatchStatLine) -> PlayerScore {
    ScoringTable::default().score(position, stats)
}

/// Sum the points of a set of lineup players.
///
/// Players without a stat line contribute nothing.
pub fn score_lineup(
    table: &ScoringTable,
    players: &[&Player],
    stats_by_id: &HashMap<String, MatchStatLine>,
) -> i32 {
    players
        .iter()
        .filter_map(|p| {
            stats_by_id
                .get(&p.id)
                .map(|stats| table.score(p.position, stats).total)
        })
        .fold(0i32, i32::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(minutes: MinutesBucket) -> MatchStatLine {
        MatchStatLine {
            minutes,
            ..MatchStatLine::default()
        }
    }

    fn minutes_entries(score: &PlayerScore) -> usize {
        score
            .breakdown
            .iter()
            .filter(|a| matches!(a.reason, ScoringReason::Minutes { .. }))
            .count()
    }

    #[test]
    fn goalkeeper_goal_and_clean_sheet() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            goals: 1,
            clean_sheet: true,
            ..MatchStatLine::default()
        };
        let s = score(Position::Goalkeeper, &stats);
        assert_eq!(s.total, 17);
        let pts: Vec<i32> = s.breakdown.iter().map(|a| a.pts).collect();
        assert_eq!(pts, vec![2, 10, 5]);
        assert_eq!(s.events, vec![MatchEvent::Goal]);
    }

    #[test]
    fn defender_short_shift_with_assist_and_booking() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::UnderSixty,
            assists: 1,
            goals_conceded: 2,
            yellow_card: true,
            ..MatchStatLine::default()
        };
        let s = score(Position::Defender, &stats);
        assert_eq!(s.total, 1);
        let reasons: Vec<ScoringReason> = s.breakdown.iter().map(|a| a.reason).collect();
        assert_eq!(
            reasons,
            vec![
                ScoringReason::Minutes {
                    bucket: MinutesBucket::UnderSixty
                },
                ScoringReason::Assists { count: 1 },
                ScoringReason::GoalsConceded { count: 2 },
                ScoringReason::YellowCard,
            ]
        );
    }

    #[test]
    fn forward_not_in_squad_is_single_penalty() {
        let s = score(Position::Forward, &line(MinutesBucket::NotInSquad));
        assert_eq!(s.total, -1);
        assert_eq!(s.breakdown.len(), 1);
        assert_eq!(s.breakdown[0].label(), "not in squad");
        assert!(s.events.is_empty());
    }

    #[test]
    fn unused_substitute_is_recorded_at_zero() {
        let s = score(Position::Midfielder, &line(MinutesBucket::Unused));
        assert_eq!(s.total, 0);
        assert_eq!(s.breakdown.len(), 1);
        assert_eq!(s.breakdown[0].pts, 0);
        assert_eq!(s.breakdown[0].label(), "in squad, unused");
    }

    #[test]
    fn exactly_one_minutes_entry_per_bucket() {
        let buckets = [
            MinutesBucket::NotInSquad,
            MinutesBucket::Unused,
            MinutesBucket::UnderSixty,
            MinutesBucket::SixtyPlus,
        ];
        for bucket in buckets {
            for pos in Position::ALL {
                let stats = MatchStatLine {
                    minutes: bucket,
                    goals: 1,
                    clean_sheet: true,
                    yellow_card: true,
                    ..MatchStatLine::default()
                };
                assert_eq!(minutes_entries(&score(pos, &stats)), 1, "{pos} {bucket}");
            }
        }
    }

    #[test]
    fn goal_values_by_position() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            goals: 2,
            ..MatchStatLine::default()
        };
        assert_eq!(score(Position::Goalkeeper, &stats).breakdown[1].pts, 20);
        assert_eq!(score(Position::Defender, &stats).breakdown[1].pts, 16);
        assert_eq!(score(Position::Midfielder, &stats).breakdown[1].pts, 10);
        assert_eq!(score(Position::Forward, &stats).breakdown[1].pts, 10);
    }

    #[test]
    fn assist_values_by_position() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            assists: 1,
            ..MatchStatLine::default()
        };
        assert_eq!(score(Position::Goalkeeper, &stats).total, 8);
        assert_eq!(score(Position::Defender, &stats).total, 6);
        assert_eq!(score(Position::Midfielder, &stats).total, 5);
        assert_eq!(score(Position::Forward, &stats).total, 5);
    }

    #[test]
    fn clean_sheet_never_scores_for_midfielders() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            clean_sheet: true,
            ..MatchStatLine::default()
        };
        let s = score(Position::Midfielder, &stats);
        assert!(!s
            .breakdown
            .iter()
            .any(|a| a.reason == ScoringReason::CleanSheet));
        assert_eq!(s.total, 2);
    }

    #[test]
    fn clean_sheet_requires_sixty_minutes() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::UnderSixty,
            clean_sheet: true,
            ..MatchStatLine::default()
        };
        assert_eq!(score(Position::Goalkeeper, &stats).total, 1);
        assert_eq!(score(Position::Defender, &stats).total, 1);
    }

    #[test]
    fn conceded_goals_ignored_for_attackers() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            goals_conceded: 4,
            ..MatchStatLine::default()
        };
        assert_eq!(score(Position::Forward, &stats).breakdown.len(), 1);
        assert_eq!(score(Position::Goalkeeper, &stats).total, -2);
    }

    #[test]
    fn both_cards_apply_and_total_goes_negative() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::UnderSixty,
            yellow_card: true,
            red_card: true,
            own_goals: 2,
            ..MatchStatLine::default()
        };
        let s = score(Position::Defender, &stats);
        assert_eq!(s.total, 1 - 2 - 5 - 6);
        assert_eq!(s.events, vec![MatchEvent::OwnGoal, MatchEvent::OwnGoal]);
        assert_eq!(s.breakdown.last().unwrap().label(), "2 own goals");
    }

    #[test]
    fn events_repeat_per_occurrence_in_rule_order() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            goals: 2,
            assists: 1,
            own_goals: 1,
            ..MatchStatLine::default()
        };
        let s = score(Position::Forward, &stats);
        assert_eq!(
            s.events,
            vec![
                MatchEvent::Goal,
                MatchEvent::Goal,
                MatchEvent::Assist,
                MatchEvent::OwnGoal
            ]
        );
    }

    #[test]
    fn total_equals_breakdown_sum() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            goals: 3,
            assists: 2,
            goals_conceded: 1,
            own_goals: 1,
            clean_sheet: true,
            yellow_card: true,
            red_card: false,
        };
        for pos in Position::ALL {
            let s = score(pos, &stats);
            assert_eq!(s.total, s.breakdown.iter().map(|a| a.pts).sum::<i32>());
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            goals: 1,
            assists: 1,
            ..MatchStatLine::default()
        };
        assert_eq!(
            score(Position::Midfielder, &stats),
            score(Position::Midfielder, &stats)
        );
    }

    #[test]
    fn goals_still_count_without_minutes() {
        // Data-entry oddity: the engine stays additive.
        let stats = MatchStatLine {
            minutes: MinutesBucket::NotInSquad,
            goals: 1,
            ..MatchStatLine::default()
        };
        assert_eq!(score(Position::Forward, &stats).total, 4);
    }

    #[test]
    fn custom_table_changes_values() {
        let mut table = ScoringTable::default();
        table.forward.goal = 4;
        table.red_card = -3;
        let stats = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            goals: 1,
            red_card: true,
            ..MatchStatLine::default()
        };
        assert_eq!(table.score(Position::Forward, &stats).total, 2 + 4 - 3);
    }

    #[test]
    fn labels_pluralize_counts() {
        assert_eq!(ScoringReason::Goals { count: 1 }.label(), "goal");
        assert_eq!(ScoringReason::Goals { count: 3 }.label(), "3 goals");
        assert_eq!(
            ScoringReason::GoalsConceded { count: 2 }.label(),
            "2 goals conceded"
        );
        assert_eq!(
            ScoringReason::Minutes {
                bucket: MinutesBucket::SixtyPlus
            }
            .label(),
            "played 60+"
        );
    }

    #[test]
    fn minutes_bucket_parse_and_serde() {
        assert_eq!(MinutesBucket::parse("60+"), Some(MinutesBucket::SixtyPlus));
        assert_eq!(MinutesBucket::parse("<60"), Some(MinutesBucket::UnderSixty));
        assert_eq!(MinutesBucket::parse("BENCH"), Some(MinutesBucket::Unused));
        assert_eq!(
            MinutesBucket::parse("not_in_squad"),
            Some(MinutesBucket::NotInSquad)
        );
        assert_eq!(MinutesBucket::parse("45"), None);

        let parsed: MatchStatLine =
            serde_json::from_str(r#"{"minutes":"60+","goals":1}"#).unwrap();
        assert_eq!(parsed.minutes, MinutesBucket::SixtyPlus);
        assert_eq!(parsed.goals, 1);
        assert!(!parsed.clean_sheet);
    }

    #[test]
    fn score_lineup_skips_players_without_stats() {
        let gk = Player::new("g1", "Keeper", "Club A", Position::Goalkeeper);
        let fwd = Player::new("f1", "Striker", "Club B", Position::Forward);
        let mut stats = HashMap::new();
        stats.insert(
            "f1".to_string(),
            MatchStatLine {
                minutes: MinutesBucket::SixtyPlus,
                goals: 2,
                ..MatchStatLine::default()
            },
        );
        let total = score_lineup(&ScoringTable::default(), &[&gk, &fwd], &stats);
        assert_eq!(total, 12);
    }

    #[test]
    fn extreme_counts_saturate_instead_of_overflowing() {
        let stats = MatchStatLine {
            minutes: MinutesBucket::NotInSquad,
            goals_conceded: u32::MAX,
            yellow_card: true,
            red_card: true,
            ..MatchStatLine::default()
        };
        let score = score(Position::Goalkeeper, &stats);
        assert_eq!(score.total, i32::MIN);

        let goals = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            goals: u32::MAX,
            ..MatchStatLine::default()
        };
        let score = super::score(Position::Forward, &goals);
        assert_eq!(score.total, i32::MAX);
        assert_eq!(score.events.len(), MAX_EVENTS_PER_KIND as usize);
        assert_eq!(
            score.breakdown[1].reason,
            ScoringReason::Goals { count: u32::MAX }
        );
    }

    #[test]
    fn lineup_total_saturates() {
        let a = Player::new("a", "A", "Club A", Position::Forward);
        let b = Player::new("b", "B", "Club B", Position::Forward);
        let line = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            goals: u32::MAX,
            ..MatchStatLine::default()
        };
        let stats: HashMap<String, MatchStatLine> =
            [("a".to_string(), line.clone()), ("b".to_string(), line)]
                .into_iter()
                .collect();
        assert_eq!(score_lineup(&ScoringTable::default(), &[&a, &b], &stats), i32::MAX);
    }

    #[test]
    fn table_overrides_cannot_give_attackers_defensive_rules() {
        let mut table = ScoringTable::default();
        table.midfielder.clean_sheet = 1;
        table.forward.goal_conceded = -1;
        let stats = MatchStatLine {
            minutes: MinutesBucket::SixtyPlus,
            clean_sheet: true,
            goals_conceded: 2,
            ..MatchStatLine::default()
        };

        let mid = table.score(Position::Midfielder, &stats);
        assert!(mid
            .breakdown
            .iter()
            .all(|a| a.reason != ScoringReason::CleanSheet));
        assert_eq!(mid.total, 2);

        let fwd = table.score(Position::Forward, &stats);
        assert!(!fwd
            .breakdown
            .iter()
            .any(|a| matches!(a.reason, ScoringReason::GoalsConceded { .. })));
        assert_eq!(fwd.total, 2);
    }
}
