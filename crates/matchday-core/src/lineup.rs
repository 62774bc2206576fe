// Lineup shape rules: position quotas, the per-club cap, and formations.
//
// Validation is addition-only. Callers that swap players remove the outgoing
// player from the current lineup first and validate the incoming one against
// what is left. Removal itself is never rejected.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::player::{Player, Position};

/// Players on the pitch in a complete lineup.
pub const LINEUP_SIZE: usize = 11;

/// Maximum lineup players drawn from one real club.
pub const MAX_PER_CLUB: usize = 2;

// ---------------------------------------------------------------------------
// Formations
// ---------------------------------------------------------------------------

/// Outfield shape of a lineup as a DEF-MID-FWD triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Formation {
    pub defenders: usize,
    pub midfielders: usize,
    pub forwards: usize,
}

/// The formations a complete lineup may take.
pub const VALID_FORMATIONS: [Formation; 7] = [
    Formation::new(5, 3, 2),
    Formation::new(5, 4, 1),
    Formation::new(4, 5, 1),
    Formation::new(4, 4, 2),
    Formation::new(4, 3, 3),
    Formation::new(3, 5, 2),
    Formation::new(3, 4, 3),
];

impl Formation {
    pub const fn new(defenders: usize, midfielders: usize, forwards: usize) -> Self {
        Formation {
            defenders,
            midfielders,
            forwards,
        }
    }

    /// Parse a "D-M-F" string such as "4-4-2".
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('-').map(|p| p.trim().parse::<usize>());
        let formation = match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(d)), Some(Ok(m)), Some(Ok(f))) => Formation::new(d, m, f),
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(formation)
    }

    pub fn is_valid(&self) -> bool {
        VALID_FORMATIONS.contains(self)
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.defenders, self.midfielders, self.forwards)
    }
}

impl Serialize for Formation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Formation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Formation::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid formation `{s}`")))
    }
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

/// Per-position head count of a set of players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineupCounts {
    pub goalkeepers: usize,
    pub defenders: usize,
    pub midfielders: usize,
    pub forwards: usize,
}

impl LineupCounts {
    pub fn from_players<'a, I>(players: I) -> Self
    where
        I: IntoIterator<Item = &'a Player>,
    {
        let mut counts = LineupCounts::default();
        for p in players {
            *counts.slot_mut(p.position) += 1;
        }
        counts
    }

    pub fn get(&self, position: Position) -> usize {
        match position {
            Position::Goalkeeper => self.goalkeepers,
            Position::Defender => self.defenders,
            Position::Midfielder => self.midfielders,
            Position::Forward => self.forwards,
        }
    }

    fn slot_mut(&mut self, position: Position) -> &mut usize {
        match position {
            Position::Goalkeeper => &mut self.goalkeepers,
            Position::Defender => &mut self.defenders,
            Position::Midfielder => &mut self.midfielders,
            Position::Forward => &mut self.forwards,
        }
    }

    pub fn total(&self) -> usize {
        self.goalkeepers + self.defenders + self.midfielders + self.forwards
    }

    pub fn formation(&self) -> Formation {
        Formation::new(self.defenders, self.midfielders, self.forwards)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Why a player cannot join a lineup.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LineupRejection {
    #[error("maximum 2 players from the same club ({club})")]
    TooManyFromSameClub { club: String },

    #[error("a lineup can only have one goalkeeper")]
    TooManyGoalkeepers,

    #[error("a lineup can have at most 5 defenders")]
    TooManyDefenders,

    #[error("a lineup can have at most 5 midfielders")]
    TooManyMidfielders,

    #[error("a lineup can have at most 3 forwards")]
    TooManyForwards,

    #[error("formation {formation} is not allowed")]
    InvalidFormation { formation: Formation },
}

impl LineupRejection {
    /// Stable identifier for front ends that localize their own messages.
    pub fn code(&self) -> &'static str {
        match self {
            LineupRejection::TooManyFromSameClub { .. } => "TOO_MANY_FROM_SAME_CLUB",
            LineupRejection::TooManyGoalkeepers => "TOO_MANY_GK",
            LineupRejection::TooManyDefenders => "TOO_MANY_DEF",
            LineupRejection::TooManyMidfielders => "TOO_MANY_MID",
            LineupRejection::TooManyForwards => "TOO_MANY_FWD",
            LineupRejection::InvalidFormation { .. } => "INVALID_FORMATION",
        }
    }

    fn over_quota(position: Position) -> Self {
        match position {
            Position::Goalkeeper => LineupRejection::TooManyGoalkeepers,
            Position::Defender => LineupRejection::TooManyDefenders,
            Position::Midfielder => LineupRejection::TooManyMidfielders,
            Position::Forward => LineupRejection::TooManyForwards,
        }
    }
}

/// Check whether `candidate` can join `current`.
///
/// Builds the hypothetical lineup `current ∪ {candidate}` and checks, stopping
/// at the first violation:
/// 1. no more than [`MAX_PER_CLUB`] players from the candidate's club
/// 2. position quotas (GK, DEF, MID, FWD in that order)
/// 3. a whitelisted formation, only once the lineup reaches [`LINEUP_SIZE`]
///
/// Frozen players and full lineups are the caller's concern and are not
/// checked here.
pub fn validate_addition(candidate: &Player, current: &[&Player]) -> Result<(), LineupRejection> {
    let hypothetical: Vec<&Player> = current
        .iter()
        .copied()
        .filter(|p| p.id != candidate.id)
        .chain(std::iter::once(candidate))
        .collect();

    let same_club = hypothetical
        .iter()
        .filter(|p| p.real_team == candidate.real_team)
        .count();
    if same_club > MAX_PER_CLUB {
        return Err(LineupRejection::TooManyFromSameClub {
            club: candidate.real_team.clone(),
        });
    }

    let counts = LineupCounts::from_players(hypothetical.iter().copied());
    for pos in Position::ALL {
        if counts.get(pos) > pos.lineup_quota() {
            return Err(LineupRejection::over_quota(pos));
        }
    }

    if hypothetical.len() == LINEUP_SIZE {
        let formation = counts.formation();
        if !formation.is_valid() {
            return Err(LineupRejection::InvalidFormation { formation });
        }
    }

    Ok(())
}

/// Whether a set of players is a complete, playable lineup: eleven players,
/// one goalkeeper, and a whitelisted formation.
pub fn is_complete_and_valid(players: &[&Player]) -> bool {
    let counts = LineupCounts::from_players(players.iter().copied());
    counts.total() == LINEUP_SIZE && counts.goalkeepers == 1 && counts.formation().is_valid()
}
