// Player identity and positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Football positions a player can be listed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    /// All positions in display order (goal to attack).
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Accepts the three-letter codes used throughout the league
    /// ("GK", "DEF", "MID", "FWD") plus single-letter shorthands and "ATT"
    /// for forwards. Matching is case-insensitive.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "G" => Some(Position::Goalkeeper),
            "DEF" | "D" => Some(Position::Defender),
            "MID" | "M" => Some(Position::Midfielder),
            "FWD" | "F" | "ATT" => Some(Position::Forward),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// Maximum number of players at this position in a lineup.
    pub fn lineup_quota(&self) -> usize {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    /// Goalkeepers and defenders earn clean sheets and lose points for
    /// goals conceded.
    pub fn is_defensive(&self) -> bool {
        matches!(self, Position::Goalkeeper | Position::Defender)
    }

    /// Deterministic ordering index for lineup display.
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::Goalkeeper => 0,
            Position::Defender => 1,
            Position::Midfielder => 2,
            Position::Forward => 3,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A real-world player owned by a fantasy team's squad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Stable identifier, unique within the league.
    pub id: String,
    pub name: String,
    /// The real club the player turns out for.
    pub real_team: String,
    pub position: Position,
    /// Frozen players stay in the squad but cannot be newly added to a lineup.
    #[serde(default)]
    pub frozen: bool,
}

impl Player {
    pub fn new(id: &str, name: &str, real_team: &str, position: Position) -> Self {
        Player {
            id: id.to_string(),
            name: name.to_string(),
            real_team: real_team.to_string(),
            position,
            frozen: false,
        }
    }
}
