//! Legal sequence of screens within a round.
//!
//! ```text
//! INTRO -> PRESENT -> INPUT -> RESOLVE -> NEXT -> PRESENT ...
//!             |                  |  ^        |
//!             +----> RESOLVE     +--+ (rebound to INPUT)
//!             |                          +-> ROUND_END -> INTRO | GAME_END
//!             +----> ROUND_END (content exhausted)
//! ```
//!
//! Any non-terminal phase may jump to GAME_END. Nothing leaves GAME_END.

use party_types::{EngineError, Phase, TurnToken};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Show the next piece of content; starts a new turn.
    Begin,
    OpenInput,
    Resolve,
    /// Re-open input for another participant after a wrong answer.
    Rebound,
    Continue,
    EndRound,
    NextRound,
    EndGame,
}

impl fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseEvent::Begin => "begin",
            PhaseEvent::OpenInput => "open_input",
            PhaseEvent::Resolve => "resolve",
            PhaseEvent::Rebound => "rebound",
            PhaseEvent::Continue => "continue",
            PhaseEvent::EndRound => "end_round",
            PhaseEvent::NextRound => "next_round",
            PhaseEvent::EndGame => "end_game",
        };
        f.write_str(name)
    }
}

/// The transition table. `None` means the event is illegal in `from`.
pub fn transition(from: Phase, event: PhaseEvent) -> Option<Phase> {
    use Phase::*;
    use PhaseEvent as E;

    match (from, event) {
        (GameEnd, _) => None,
        (_, E::EndGame) => Some(GameEnd),
        (Intro | Next, E::Begin) => Some(Present),
        (Present, E::OpenInput) => Some(Input),
        (Present | Input, E::Resolve) => Some(Resolve),
        (Resolve, E::Rebound) => Some(Input),
        (Resolve, E::Continue) => Some(Next),
        (Present | Next, E::EndRound) => Some(RoundEnd),
        (RoundEnd, E::NextRound) => Some(Intro),
        _ => None,
    }
}

/// Phase plus the single-resolution token of the current turn.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: Phase,
    serial: u64,
    resolved: bool,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Intro,
            serial: 0,
            resolved: true,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Serial of the most recent turn token, live or not.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn fire(&mut self, event: PhaseEvent) -> Result<Phase, EngineError> {
        let next = transition(self.phase, event).ok_or_else(|| EngineError::IllegalTransition {
            from: self.phase,
            event: event.to_string(),
        })?;

        match event {
            PhaseEvent::Begin | PhaseEvent::Rebound => {
                self.serial += 1;
                self.resolved = false;
            }
            PhaseEvent::Resolve | PhaseEvent::EndRound | PhaseEvent::EndGame => {
                self.resolved = true;
            }
            _ => {}
        }

        self.phase = next;
        Ok(next)
    }

    /// The token that may still resolve the current turn.
    pub fn live_token(&self) -> Option<TurnToken> {
        (self.phase.accepts_outcome() && !self.resolved).then_some(TurnToken {
            serial: self.serial,
        })
    }

    /// Consume the live token and enter RESOLVE.
    ///
    /// `None` stands for direct user input on the current turn. A timer must
    /// present the token it was armed with; anything but the live token is
    /// rejected, so the loser of the input/timer race is a no-op.
    pub fn claim(&mut self, token: Option<TurnToken>) -> Result<TurnToken, EngineError> {
        let live = self.live_token().ok_or_else(|| EngineError::IllegalTransition {
            from: self.phase,
            event: PhaseEvent::Resolve.to_string(),
        })?;

        if let Some(presented) = token {
            if presented != live {
                return Err(EngineError::IllegalTransition {
                    from: self.phase,
                    event: format!("stale token {}", presented.serial),
                });
            }
        }

        self.fire(PhaseEvent::Resolve)?;
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut machine = PhaseMachine::new();
        assert_eq!(machine.phase(), Phase::Intro);
        assert_eq!(machine.live_token(), None);

        assert_eq!(machine.fire(PhaseEvent::Begin), Ok(Phase::Present));
        assert_eq!(machine.fire(PhaseEvent::OpenInput), Ok(Phase::Input));
        let token = machine.live_token().unwrap();
        assert_eq!(machine.claim(Some(token)), Ok(token));
        assert_eq!(machine.phase(), Phase::Resolve);
        assert_eq!(machine.fire(PhaseEvent::Continue), Ok(Phase::Next));
        assert_eq!(machine.fire(PhaseEvent::EndRound), Ok(Phase::RoundEnd));
        assert_eq!(machine.fire(PhaseEvent::NextRound), Ok(Phase::Intro));
    }

    #[test]
    fn test_answer_in_intro_is_illegal() {
        let mut machine = PhaseMachine::new();
        let result = machine.claim(None);
        assert!(matches!(
            result,
            Err(EngineError::IllegalTransition { from: Phase::Intro, .. })
        ));
        assert_eq!(machine.phase(), Phase::Intro);
    }

    #[test]
    fn test_single_resolution() {
        let mut machine = PhaseMachine::new();
        machine.fire(PhaseEvent::Begin).unwrap();
        machine.fire(PhaseEvent::OpenInput).unwrap();
        let token = machine.live_token().unwrap();

        // User input wins the race
        assert!(machine.claim(None).is_ok());
        // The countdown fires afterwards and must be ignored
        assert!(machine.claim(Some(token)).is_err());
        assert!(machine.claim(None).is_err());
        assert_eq!(machine.phase(), Phase::Resolve);
    }

    #[test]
    fn test_stale_token_from_previous_turn() {
        let mut machine = PhaseMachine::new();
        machine.fire(PhaseEvent::Begin).unwrap();
        machine.fire(PhaseEvent::OpenInput).unwrap();
        let old = machine.live_token().unwrap();
        machine.claim(None).unwrap();
        machine.fire(PhaseEvent::Continue).unwrap();
        machine.fire(PhaseEvent::Begin).unwrap();
        machine.fire(PhaseEvent::OpenInput).unwrap();

        assert!(machine.claim(Some(old)).is_err());
        assert_eq!(machine.phase(), Phase::Input);
        assert!(machine.claim(None).is_ok());
    }

    #[test]
    fn test_rebound_issues_fresh_token() {
        let mut machine = PhaseMachine::new();
        machine.fire(PhaseEvent::Begin).unwrap();
        machine.fire(PhaseEvent::OpenInput).unwrap();
        let first = machine.claim(None).unwrap();

        assert_eq!(machine.fire(PhaseEvent::Rebound), Ok(Phase::Input));
        let second = machine.live_token().unwrap();
        assert_ne!(first, second);
        assert!(machine.claim(Some(first)).is_err());
        assert!(machine.claim(Some(second)).is_ok());
    }

    #[test]
    fn test_game_end_is_terminal() {
        let mut machine = PhaseMachine::new();
        machine.fire(PhaseEvent::Begin).unwrap();
        assert_eq!(machine.fire(PhaseEvent::EndGame), Ok(Phase::GameEnd));

        for event in [
            PhaseEvent::Begin,
            PhaseEvent::OpenInput,
            PhaseEvent::Resolve,
            PhaseEvent::Rebound,
            PhaseEvent::Continue,
            PhaseEvent::EndRound,
            PhaseEvent::NextRound,
            PhaseEvent::EndGame,
        ] {
            assert!(machine.fire(event).is_err());
        }
        assert_eq!(machine.live_token(), None);
    }

    #[test]
    fn test_resolve_directly_from_present() {
        assert_eq!(
            transition(Phase::Present, PhaseEvent::Resolve),
            Some(Phase::Resolve)
        );
        assert_eq!(transition(Phase::Intro, PhaseEvent::Resolve), None);
        assert_eq!(transition(Phase::Resolve, PhaseEvent::Resolve), None);
    }
}
