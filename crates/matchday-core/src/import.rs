// CSV loading for squads and per-round stat lines.
//
// Rows that don't parse are logged and skipped so one bad line in a
// hand-edited sheet doesn't block the whole round.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::player::{Player, Position};
use crate::scoring::{MatchStatLine, MinutesBucket};
use crate::team::{Team, TeamError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("team {team_id}: {source}")]
    Team { team_id: String, source: TeamError },
}

// ---------------------------------------------------------------------------
// Public row types
// ---------------------------------------------------------------------------

/// One squad membership line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquadRow {
    pub team_id: String,
    /// Display name of the fantasy team; falls back to the id.
    pub team_name: String,
    pub manager: String,
    pub player: Player,
}

/// One player's stat line for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRow {
    pub player_id: String,
    pub position: Position,
    pub stats: MatchStatLine,
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawSquadRow {
    team_id: String,
    #[serde(default)]
    team_name: Option<String>,
    #[serde(default)]
    manager: Option<String>,
    id: String,
    name: String,
    real_team: String,
    position: String,
    #[serde(default)]
    frozen: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStatRow {
    player_id: String,
    position: String,
    minutes: String,
    #[serde(default)]
    goals: Option<u32>,
    #[serde(default)]
    assists: Option<u32>,
    #[serde(default)]
    goals_conceded: Option<u32>,
    #[serde(default)]
    own_goals: Option<u32>,
    #[serde(default)]
    clean_sheet: Option<String>,
    #[serde(default)]
    yellow_card: Option<String>,
    #[serde(default)]
    red_card: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a yes/no cell. Blank or missing is `false`.
fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") => Some(false),
        Some("1" | "true" | "yes" | "y" | "x") => Some(true),
        Some("0" | "false" | "no" | "n") => Some(false),
        Some(_) => None,
    }
}

/// A line that records goals, assists or own goals for a player who never
/// came on. Still scored, but worth flagging.
fn events_without_appearance(stats: &MatchStatLine) -> bool {
    let has_events = stats.goals > 0 || stats.assists > 0 || stats.own_goals > 0;
    !stats.minutes.appeared() && has_events
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_squad_from_reader<R: Read>(rdr: R) -> Result<Vec<SquadRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawSquadRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed squad row: {}", e);
                continue;
            }
        };
        let Some(position) = Position::from_str_pos(&raw.position) else {
            warn!("skipping squad player '{}': unknown position '{}'", raw.name, raw.position);
            continue;
        };
        let Some(frozen) = parse_flag(raw.frozen.as_deref()) else {
            warn!("skipping squad player '{}': bad frozen flag", raw.name);
            continue;
        };
        if raw.id.is_empty() || raw.team_id.is_empty() {
            warn!("skipping squad player '{}': missing id or team_id", raw.name);
            continue;
        }
        let team_name = non_empty(raw.team_name).unwrap_or_else(|| raw.team_id.clone());
        let mut player = Player::new(&raw.id, &raw.name, &raw.real_team, position);
        player.frozen = frozen;
        rows.push(SquadRow {
            team_id: raw.team_id,
            team_name,
            manager: non_empty(raw.manager).unwrap_or_default(),
            player,
        });
    }
    Ok(rows)
}

fn load_stats_from_reader<R: Read>(rdr: R) -> Result<Vec<StatRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawStatRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed stat row: {}", e);
                continue;
            }
        };
        let Some(position) = Position::from_str_pos(&raw.position) else {
            warn!("skipping stats for '{}': unknown position '{}'", raw.player_id, raw.position);
            continue;
        };
        let Some(minutes) = MinutesBucket::parse(&raw.minutes) else {
            warn!("skipping stats for '{}': unknown minutes '{}'", raw.player_id, raw.minutes);
            continue;
        };
        let flags = (
            parse_flag(raw.clean_sheet.as_deref()),
            parse_flag(raw.yellow_card.as_deref()),
            parse_flag(raw.red_card.as_deref()),
        );
        let (Some(clean_sheet), Some(yellow_card), Some(red_card)) = flags else {
            warn!("skipping stats for '{}': bad yes/no flag", raw.player_id);
            continue;
        };
        let stats = MatchStatLine {
            minutes,
            goals: raw.goals.unwrap_or(0),
            assists: raw.assists.unwrap_or(0),
            goals_conceded: raw.goals_conceded.unwrap_or(0),
            own_goals: raw.own_goals.unwrap_or(0),
            clean_sheet,
            yellow_card,
            red_card,
        };
        if events_without_appearance(&stats) {
            warn!(
                "stats for '{}' record match events with minutes '{}'",
                raw.player_id, minutes
            );
        }
        rows.push(StatRow {
            player_id: raw.player_id,
            position,
            stats,
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Public file-based loaders
// ---------------------------------------------------------------------------

/// Load squad memberships from a CSV with header
/// `team_id,id,name,real_team,position,frozen` (plus optional `team_name`
/// and `manager` columns).
pub fn load_squad(path: &Path) -> Result<Vec<SquadRow>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_squad_from_reader(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load a round of stat lines.
pub fn load_stat_lines(path: &Path) -> Result<Vec<StatRow>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_stats_from_reader(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Group squad rows into teams, preserving first-seen team order.
pub fn build_teams(rows: Vec<SquadRow>, sub_limit: u32) -> Result<Vec<Team>, ImportError> {
    let mut teams: Vec<Team> = Vec::new();
    for row in rows {
        let idx = match teams.iter().position(|t| t.id == row.team_id) {
            Some(idx) => idx,
            None => {
                teams.push(Team::new(&row.team_id, &row.team_name, &row.manager, sub_limit));
                teams.len() - 1
            }
        };
        teams[idx]
            .add_to_squad(row.player)
            .map_err(|source| ImportError::Team {
                team_id: row.team_id.clone(),
                source,
            })?;
    }
    Ok(teams)
}

/// Index stat lines by player id. A later line for the same player wins.
pub fn stat_lines_by_id(rows: &[StatRow]) -> HashMap<String, MatchStatLine> {
    let mut map = HashMap::new();
    for row in rows {
        if map.insert(row.player_id.clone(), row.stats.clone()).is_some() {
            warn!("duplicate stat line for '{}', using latest", row.player_id);
        }
    }
    map
}
