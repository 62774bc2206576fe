// Team aggregate: squad, lineup, transfer log, and the substitution budget.
//
// Every mutation goes through a method that checks first and writes second,
// so a rejected edit leaves the team exactly as it was.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::lineup::{self, Formation, LineupCounts, LineupRejection, LINEUP_SIZE};
use crate::player::Player;
use crate::scoring::{self, MatchStatLine, ScoringTable};

/// Default season cap on transfers outside the freeze window.
pub const DEFAULT_SUB_LIMIT: u32 = 14;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamError {
    #[error("player `{player_id}` is not in the squad")]
    UnknownPlayer { player_id: String },

    #[error("player `{player_id}` is already in the squad")]
    DuplicatePlayer { player_id: String },

    #[error("{name} is already in the lineup")]
    AlreadyInLineup { name: String },

    #[error("player `{player_id}` is not in the lineup")]
    NotInLineup { player_id: String },

    #[error("{name} is frozen and cannot be added to the lineup")]
    PlayerFrozen { name: String },

    #[error("the lineup already has 11 players")]
    LineupFull,

    #[error("substitution limit of {limit} reached")]
    SubstitutionLimitReached { limit: u32 },

    #[error(transparent)]
    Rejected(#[from] LineupRejection),
}

/// One entry in a team's transfer log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: String,
    pub date: NaiveDate,
    /// Name of the player leaving the squad. Empty when filling a vacancy.
    #[serde(default)]
    pub player_out: String,
    pub player_in: Player,
    /// Freeze-window moves do not count against the substitution limit and
    /// lock the incoming player out of lineup additions.
    #[serde(default)]
    pub freeze: bool,
}

/// A fantasy team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub manager: String,
    squad: Vec<Player>,
    /// Lineup player ids in the order they were picked.
    lineup: Vec<String>,
    #[serde(default)]
    transfers: Vec<Transfer>,
    pub sub_limit: u32,
    /// Manual correction applied by an administrator to the used count.
    #[serde(default)]
    pub sub_adjustment: i32,
}

impl Team {
    pub fn new(id: &str, name: &str, manager: &str, sub_limit: u32) -> Self {
        Team {
            id: id.to_string(),
            name: name.to_string(),
            manager: manager.to_string(),
            squad: Vec::new(),
            lineup: Vec::new(),
            transfers: Vec::new(),
            sub_limit,
            sub_adjustment: 0,
        }
    }

    // -- Squad --

    pub fn squad(&self) -> &[Player] {
        &self.squad
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.squad.iter().find(|p| p.id == player_id)
    }

    /// Add a player to the squad during season setup.
    pub fn add_to_squad(&mut self, player: Player) -> Result<(), TeamError> {
        if self.player(&player.id).is_some() {
            return Err(TeamError::DuplicatePlayer {
                player_id: player.id,
            });
        }
        self.squad.push(player);
        Ok(())
    }

    /// Set or clear a player's freeze flag. A frozen player already in the
    /// lineup stays there.
    pub fn set_frozen(&mut self, player_id: &str, frozen: bool) -> Result<(), TeamError> {
        let player = self
            .squad
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| TeamError::UnknownPlayer {
                player_id: player_id.to_string(),
            })?;
        player.frozen = frozen;
        Ok(())
    }

    // -- Lineup --

    pub fn lineup_ids(&self) -> &[String] {
        &self.lineup
    }

    /// Lineup players resolved against the squad, in pick order.
    pub fn lineup_players(&self) -> Vec<&Player> {
        self.lineup
            .iter()
            .filter_map(|id| self.player(id))
            .collect()
    }

    /// Lineup players grouped GK, DEF, MID, FWD; pick order within a group.
    pub fn lineup_by_position(&self) -> Vec<&Player> {
        let mut players = self.lineup_players();
        players.sort_by_key(|p| p.position.sort_order());
        players
    }

    pub fn is_in_lineup(&self, player_id: &str) -> bool {
        self.lineup.iter().any(|id| id == player_id)
    }

    /// Move a squad player onto the pitch.
    ///
    /// Checks, in order: the player exists, is not already in the lineup, is
    /// not frozen, the lineup is not full, and the lineup rules accept them.
    pub fn add_to_lineup(&mut self, player_id: &str) -> Result<(), TeamError> {
        let name = {
            let current = self.lineup_players();
            self.check_candidate(player_id, &current, self.lineup.len())?
                .name
                .clone()
        };
        self.lineup.push(player_id.to_string());
        debug!(team = %self.id, player = %name, "added to lineup");
        Ok(())
    }

    /// Move a lineup player back to the bench. Never rejected for shape
    /// reasons: a team may always drop below eleven.
    pub fn remove_from_lineup(&mut self, player_id: &str) -> Result<(), TeamError> {
        let idx = self
            .lineup
            .iter()
            .position(|id| id == player_id)
            .ok_or_else(|| TeamError::NotInLineup {
                player_id: player_id.to_string(),
            })?;
        self.lineup.remove(idx);
        debug!(team = %self.id, player = %player_id, "removed from lineup");
        Ok(())
    }

    /// Replace a lineup player with a bench player in one step.
    ///
    /// The incoming player is validated against the lineup with the outgoing
    /// player already removed. Either both changes apply or neither does; the
    /// incoming player takes the outgoing player's slot.
    pub fn swap(&mut self, out_id: &str, in_id: &str) -> Result<(), TeamError> {
        let idx = self
            .lineup
            .iter()
            .position(|id| id == out_id)
            .ok_or_else(|| TeamError::NotInLineup {
                player_id: out_id.to_string(),
            })?;
        {
            let remaining: Vec<&Player> = self
                .lineup_players()
                .into_iter()
                .filter(|p| p.id != out_id)
                .collect();
            self.check_candidate(in_id, &remaining, self.lineup.len() - 1)?;
        }
        self.lineup[idx] = in_id.to_string();
        debug!(team = %self.id, outgoing = %out_id, incoming = %in_id, "lineup swap");
        Ok(())
    }

    /// `occupied` counts lineup slots by id, so an entry that no longer
    /// resolves against the squad still takes up a slot.
    fn check_candidate<'a>(
        &'a self,
        player_id: &str,
        current: &[&Player],
        occupied: usize,
    ) -> Result<&'a Player, TeamError> {
        let player = self
            .player(player_id)
            .ok_or_else(|| TeamError::UnknownPlayer {
                player_id: player_id.to_string(),
            })?;
        if current.iter().any(|p| p.id == player.id) {
            return Err(TeamError::AlreadyInLineup {
                name: player.name.clone(),
            });
        }
        if player.frozen {
            return Err(TeamError::PlayerFrozen {
                name: player.name.clone(),
            });
        }
        if occupied >= LINEUP_SIZE {
            return Err(TeamError::LineupFull);
        }
        lineup::validate_addition(player, current)?;
        Ok(player)
    }

    pub fn lineup_counts(&self) -> LineupCounts {
        LineupCounts::from_players(self.lineup_players())
    }

    /// Current outfield shape, complete or not.
    pub fn formation(&self) -> Formation {
        self.lineup_counts().formation()
    }

    pub fn has_valid_lineup(&self) -> bool {
        lineup::is_complete_and_valid(&self.lineup_players())
    }

    /// Points earned by the lineup for one round of stat lines.
    pub fn lineup_points(
        &self,
        table: &ScoringTable,
        stats_by_id: &HashMap<String, MatchStatLine>,
    ) -> i32 {
        scoring::score_lineup(table, &self.lineup_players(), stats_by_id)
    }

    // -- Transfers --

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Transfers counted against the limit, including the admin adjustment.
    pub fn substitutions_used(&self) -> u32 {
        let counted = self.transfers.iter().filter(|t| !t.freeze).count() as i64;
        let used = counted + i64::from(self.sub_adjustment);
        u32::try_from(used.max(0)).unwrap_or(u32::MAX)
    }

    pub fn substitutions_remaining(&self) -> u32 {
        self.sub_limit.saturating_sub(self.substitutions_used())
    }

    /// Apply a transfer and append it to the log.
    ///
    /// The outgoing player (matched by name, ignoring case) leaves both the
    /// squad and the lineup. The incoming player joins the squad only; a
    /// freeze-window transfer brings them in frozen.
    pub fn record_transfer(&mut self, transfer: Transfer) -> Result<(), TeamError> {
        if !transfer.freeze && self.substitutions_remaining() == 0 {
            return Err(TeamError::SubstitutionLimitReached {
                limit: self.sub_limit,
            });
        }

        let out_name = transfer.player_out.trim().to_lowercase();
        let outgoing_id = if out_name.is_empty() {
            None
        } else {
            self.squad
                .iter()
                .find(|p| p.name.trim().to_lowercase() == out_name)
                .map(|p| p.id.clone())
        };

        let incoming_id = &transfer.player_in.id;
        let replaces_itself = outgoing_id.as_deref() == Some(incoming_id.as_str());
        if self.player(incoming_id).is_some() && !replaces_itself {
            return Err(TeamError::DuplicatePlayer {
                player_id: incoming_id.clone(),
            });
        }

        match &outgoing_id {
            Some(id) => {
                self.squad.retain(|p| &p.id != id);
                self.lineup.retain(|l| l != id);
            }
            None if !out_name.is_empty() => {
                warn!(
                    team = %self.id,
                    "transfer {}: outgoing player '{}' not found in squad",
                    transfer.id, transfer.player_out
                );
            }
            None => {}
        }

        let mut incoming = transfer.player_in.clone();
        if transfer.freeze {
            incoming.frozen = true;
        }
        debug!(
            team = %self.id,
            "transfer {}: {} out, {} in{}",
            transfer.id,
            transfer.player_out,
            incoming.name,
            if transfer.freeze { " (freeze)" } else { "" }
        );
        self.squad.push(incoming);
        self.transfers.push(transfer);
        Ok(())
    }
}
