use party_types::{OutcomeEvent, Player, PlayerDelta, PlayerId, Standing, TurnToken};
use serde::Serialize;

/// Notifications published by the engine. Sound cues and analytics hook in
/// here; the engine itself never talks to either.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EngineEvent {
    SessionStarted {
        players: Vec<Player>,
        total_rounds: u32,
    },
    TurnStarted {
        round_index: u32,
        player_id: PlayerId,
        token: TurnToken,
    },
    OutcomeResolved {
        round_index: u32,
        player_id: PlayerId,
        outcome: OutcomeEvent,
        adjustments: Vec<(PlayerId, PlayerDelta)>,
    },
    HintUsed {
        player_id: PlayerId,
        delta: PlayerDelta,
    },
    PlayerEliminated {
        player_id: PlayerId,
        round_index: u32,
        by_judge: bool,
    },
    RoundCompleted {
        round_index: u32,
    },
    /// Content ran out before the round's turns were played.
    RoundCutShort {
        round_index: u32,
        requested: usize,
        available: usize,
    },
    GameCompleted {
        standings: Vec<Standing>,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::SessionStarted { .. } => "session_started",
            EngineEvent::TurnStarted { .. } => "turn_started",
            EngineEvent::OutcomeResolved { .. } => "outcome_resolved",
            EngineEvent::HintUsed { .. } => "hint_used",
            EngineEvent::PlayerEliminated { .. } => "player_eliminated",
            EngineEvent::RoundCompleted { .. } => "round_completed",
            EngineEvent::RoundCutShort { .. } => "round_cut_short",
            EngineEvent::GameCompleted { .. } => "game_completed",
        }
    }
}

/// Event handler trait for processing engine events
pub trait EngineEventHandler: Send {
    fn handle_event(&mut self, event: EngineEvent);
}

/// Simple event bus for distributing engine events
pub struct EngineEventBus {
    handlers: Vec<Box<dyn EngineEventHandler>>,
}

impl EngineEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn EngineEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn publish(&mut self, event: EngineEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

impl Default for EngineEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EngineEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineEventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
