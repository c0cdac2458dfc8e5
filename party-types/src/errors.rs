use crate::{Phase, PlayerId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum EngineError {
    /// Player or round counts outside supported bounds. The host should never
    /// let a player reach this.
    #[error("invalid game configuration: {reason}")]
    InvalidConfig { reason: String },
    /// An event arrived in a phase that has no transition for it.
    #[error("illegal transition from {from} on {event}")]
    IllegalTransition { from: Phase, event: String },
    #[error("unknown player {player_id}")]
    UnknownPlayer { player_id: PlayerId },
}

impl EngineError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            reason: reason.into(),
        }
    }
}
