use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Stable 0-based join index, unique within one session.
pub type PlayerId = u32;

pub const DEFAULT_LIVES: u32 = 3;
pub const MIN_COMBO: u32 = 1;
pub const MAX_COMBO: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub avatar_index: u32,
    pub score: i32,
    pub lives: u32,
    pub streak: u32,
    pub combo: u32,
    pub is_eliminated: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String, avatar_index: u32, lives: u32) -> Self {
        Self {
            id,
            name,
            avatar_index,
            score: 0,
            lives,
            streak: 0,
            combo: MIN_COMBO,
            is_eliminated: false,
        }
    }
}

/// Additive change to a player's stats, produced by a scoring policy.
///
/// Resets are expressed relative to the current value, e.g. a streak reset is
/// `streak: -(player.streak as i32)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerDelta {
    pub score: i32,
    pub lives: i32,
    pub streak: i32,
    pub combo: i32,
}

impl PlayerDelta {
    pub fn score(score: i32) -> Self {
        Self {
            score,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One row of the final ranking. Equal scores share a rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Standing {
    pub rank: u32,
    pub player: Player,
}
