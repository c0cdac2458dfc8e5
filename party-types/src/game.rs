use crate::{Player, PlayerId, Standing};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Phase {
    Intro,    // Round title card
    Present,  // Question, sequence or phrase on screen
    Input,    // Waiting on a buzzer, tap or answer
    Resolve,  // Correct/incorrect feedback
    Next,     // Handing over to the next player
    RoundEnd, // Round summary
    GameEnd,  // Terminal, final scores available
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::GameEnd)
    }

    /// Phases in which a turn is open and can still be resolved.
    pub fn accepts_outcome(&self) -> bool {
        matches!(self, Phase::Present | Phase::Input)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Intro => "INTRO",
            Phase::Present => "PRESENT",
            Phase::Input => "INPUT",
            Phase::Resolve => "RESOLVE",
            Phase::Next => "NEXT",
            Phase::RoundEnd => "ROUND_END",
            Phase::GameEnd => "GAME_END",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum OutcomeKind {
    Correct,
    Incorrect,
    Timeout,
    Draw,
    BothFailed,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 5] = [
        OutcomeKind::Correct,
        OutcomeKind::Incorrect,
        OutcomeKind::Timeout,
        OutcomeKind::Draw,
        OutcomeKind::BothFailed,
    ];
}

/// What happened in the current turn. Consumed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OutcomeEvent {
    pub kind: OutcomeKind,
    pub reaction_time_ms: Option<u64>,
    /// Who acted. Defaults to the current player.
    pub responder: Option<PlayerId>,
    /// The other side in head-to-head and pairwise games. Defaults to the next
    /// active player in seat order.
    pub opponent: Option<PlayerId>,
}

impl OutcomeEvent {
    pub fn new(kind: OutcomeKind) -> Self {
        Self {
            kind,
            reaction_time_ms: None,
            responder: None,
            opponent: None,
        }
    }

    pub fn correct() -> Self {
        Self::new(OutcomeKind::Correct)
    }

    pub fn incorrect() -> Self {
        Self::new(OutcomeKind::Incorrect)
    }

    pub fn timeout() -> Self {
        Self::new(OutcomeKind::Timeout)
    }

    pub fn with_reaction_time(mut self, reaction_time_ms: u64) -> Self {
        self.reaction_time_ms = Some(reaction_time_ms);
        self
    }

    pub fn by(mut self, responder: PlayerId) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn against(mut self, opponent: PlayerId) -> Self {
        self.opponent = Some(opponent);
        self
    }
}

/// One-shot resolution token for a turn. Whichever of user input or the
/// countdown presents the live token first resolves the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TurnToken {
    pub serial: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

/// A trivia question, memory sequence, phrase or challenge prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContentItem {
    pub category: String,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub answer: Option<String>,
}

/// Read-only projection of a session handed to the UI for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Snapshot {
    pub phase: Phase,
    pub round_index: u32,
    pub total_rounds: u32,
    pub current_player: Option<Player>,
    pub players: Vec<Player>,
    pub active_players: Vec<PlayerId>,
    pub content: Vec<ContentItem>,
    pub turn: Option<TurnToken>,
    pub final_standings: Option<Vec<Standing>>,
}
