use crate::{
    ContentProvider, EngineEvent, EngineEventBus, EngineEventHandler, PhaseEvent, PhaseMachine,
    PlayerRegistry, ScoringContext, ScoringPolicy, TurnAdvance, TurnSequencer, build_policy,
};
use party_types::{
    ContentItem, EngineError, GameConfig, MAX_LIVES, MAX_PLAYERS, MAX_RESOLVE_DELAY_MS,
    MAX_ROUNDS, MIN_PLAYERS, MIN_RESOLVE_DELAY_MS, MIN_ROUNDS, MIN_TIME_LIMIT_MS, NextMode,
    OutcomeEvent, OutcomeKind, Phase, Player, PlayerDelta, PlayerId, ResolveMode, Snapshot,
    Standing, TurnToken,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-turn scratch state, reset whenever a new turn is presented.
#[derive(Debug, Default)]
struct TurnState {
    content: Vec<ContentItem>,
    locked_out: Vec<PlayerId>,
    rebound_to: Option<PlayerId>,
    hint_used: bool,
}

/// One game session: the only owner of game truth.
///
/// The UI renders [`RoundEngine::snapshot`] and forwards taps to the
/// mutating methods. Events arriving in the wrong phase (double taps, late
/// timers) are ignored and reported as `false`.
pub struct RoundEngine {
    config: GameConfig,
    registry: PlayerRegistry,
    phases: PhaseMachine,
    sequencer: TurnSequencer,
    policy: Box<dyn ScoringPolicy>,
    content: Box<dyn ContentProvider>,
    event_bus: EngineEventBus,
    turn: TurnState,
    started: bool,
}

impl RoundEngine {
    /// Validate `config`, seat the players and enter INTRO.
    pub fn start(
        config: GameConfig,
        content: Box<dyn ContentProvider>,
    ) -> Result<Self, EngineError> {
        let policy = build_policy(config.policy);
        Self::with_policy(config, policy, content)
    }

    /// Like [`RoundEngine::start`] with a custom scoring policy.
    pub fn with_policy(
        config: GameConfig,
        policy: Box<dyn ScoringPolicy>,
        content: Box<dyn ContentProvider>,
    ) -> Result<Self, EngineError> {
        validate_config(&config, policy.as_ref())?;

        let registry = PlayerRegistry::create_players(
            &config.player_names,
            config.starting_lives,
            config.default_blank_names,
        )?;
        let player_ids: Vec<PlayerId> = registry.players().iter().map(|p| p.id).collect();
        let sequencer = TurnSequencer::new(player_ids, config.total_rounds);

        info!(
            "Starting {} session with {} players over {} rounds",
            policy.name(),
            registry.len(),
            config.total_rounds
        );

        Ok(Self {
            config,
            registry,
            phases: PhaseMachine::new(),
            sequencer,
            policy,
            content,
            event_bus: EngineEventBus::new(),
            turn: TurnState::default(),
            started: false,
        })
    }

    pub fn subscribe(&mut self, handler: Box<dyn EngineEventHandler>) {
        self.event_bus.add_handler(handler);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phases.phase()
    }

    pub fn is_finished(&self) -> bool {
        self.phases.phase().is_terminal()
    }

    pub fn round_index(&self) -> u32 {
        self.sequencer.round_index()
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.sequencer
            .current_player()
            .and_then(|id| self.registry.get(id))
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.registry.get(player_id)
    }

    pub fn active_players(&self) -> Vec<PlayerId> {
        self.sequencer.active_players()
    }

    /// Token that can still resolve the current turn, if any.
    pub fn live_token(&self) -> Option<TurnToken> {
        self.phases.live_token()
    }

    /// Serial of the latest turn token, resolved or not.
    pub fn turn_serial(&self) -> u64 {
        self.phases.serial()
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.config.time_limit_ms.map(Duration::from_millis)
    }

    /// Reading delay before the host should advance on its own.
    pub fn resolve_delay(&self) -> Option<Duration> {
        match self.config.resolve_mode {
            ResolveMode::Manual => None,
            ResolveMode::Auto { delay_ms } => Some(Duration::from_millis(delay_ms)),
        }
    }

    /// INTRO -> PRESENT.
    pub fn begin(&mut self) -> bool {
        if self.phases.phase() != Phase::Intro {
            debug!("begin ignored in {}", self.phases.phase());
            return false;
        }

        if !self.started {
            self.started = true;
            self.event_bus.publish(EngineEvent::SessionStarted {
                players: self.registry.players().to_vec(),
                total_rounds: self.config.total_rounds,
            });
        }

        self.present_turn()
    }

    /// PRESENT -> INPUT. Returns the token a countdown should be armed with.
    pub fn open_input(&mut self) -> Option<TurnToken> {
        if self.fire(PhaseEvent::OpenInput) {
            self.phases.live_token()
        } else {
            None
        }
    }

    /// Resolve the current turn from user input.
    pub fn submit_outcome(&mut self, outcome: OutcomeEvent) -> bool {
        self.resolve(None, outcome)
    }

    /// Countdown callback. Only the live token of an unresolved turn counts,
    /// so a timer that loses the race against input does nothing.
    pub fn expire(&mut self, token: TurnToken) -> bool {
        self.resolve(Some(token), OutcomeEvent::timeout())
    }

    /// Charge the current player for a hint. At most once per turn.
    pub fn use_hint(&mut self) -> bool {
        if self.phases.live_token().is_none() || self.turn.hint_used {
            return false;
        }
        // During a rebound the hint goes to whoever is answering now
        let Some(player_id) = self.turn.rebound_to.or(self.sequencer.current_player()) else {
            return false;
        };

        let delta = self.policy.hint_delta(self.config.hint_cost);
        if let Err(e) = self.registry.apply_delta(player_id, delta) {
            warn!("Failed to charge hint: {}", e);
            return false;
        }
        self.turn.hint_used = true;
        self.event_bus
            .publish(EngineEvent::HintUsed { player_id, delta });
        true
    }

    /// Continue from RESOLVE, NEXT or ROUND_END.
    pub fn advance(&mut self) -> bool {
        match self.phases.phase() {
            Phase::Resolve => {
                if !self.fire(PhaseEvent::Continue) {
                    return false;
                }
                self.step_turn();
                true
            }
            Phase::Next => self.present_turn(),
            Phase::RoundEnd => {
                if self.sequencer.start_next_round() {
                    self.fire(PhaseEvent::NextRound)
                } else {
                    self.finish_game();
                    true
                }
            }
            phase => {
                debug!("advance ignored in {}", phase);
                false
            }
        }
    }

    /// Judge-driven elimination, e.g. "did they laugh?".
    pub fn eliminate(&mut self, player_id: PlayerId) -> bool {
        if self.is_finished() {
            return false;
        }

        match self.registry.eliminate(player_id) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                debug!("eliminate ignored: {}", e);
                return false;
            }
        }

        self.sequencer.deactivate(player_id);
        info!("Player {} eliminated by judge", player_id);
        self.event_bus.publish(EngineEvent::PlayerEliminated {
            player_id,
            round_index: self.sequencer.round_index(),
            by_judge: true,
        });

        if self.end_if_no_contest() {
            return true;
        }

        // The eliminated player can no longer answer; close their open turn.
        let is_current = self.sequencer.current_player() == Some(player_id);
        let acting = is_current || self.turn.rebound_to == Some(player_id);
        if acting && self.phases.claim(None).is_ok() {
            self.sequencer.mark_acted();
        } else if is_current && matches!(self.phases.phase(), Phase::Intro | Phase::Next) {
            // Their turn has not been presented yet; hand it to the next seat.
            self.skip_current_seat();
        }
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        let finished = self.is_finished();
        Snapshot {
            phase: self.phases.phase(),
            round_index: self.sequencer.round_index(),
            total_rounds: self.config.total_rounds,
            current_player: if finished {
                None
            } else {
                self.current_player().cloned()
            },
            players: self.registry.players().to_vec(),
            active_players: self.sequencer.active_players(),
            content: self.turn.content.clone(),
            turn: self.phases.live_token(),
            final_standings: finished.then(|| self.standings()),
        }
    }

    /// All players by score, highest first, ties in join order.
    pub fn standings(&self) -> Vec<Standing> {
        rank_players(self.registry.players())
    }

    fn resolve(&mut self, token: Option<TurnToken>, outcome: OutcomeEvent) -> bool {
        if self.is_finished() {
            debug!("{:?} ignored after game end", outcome.kind);
            return false;
        }
        if !self.policy.handles(outcome.kind) {
            warn!(
                "{} policy does not score {:?}; outcome ignored",
                self.policy.name(),
                outcome.kind
            );
            return false;
        }

        let Some(current) = self.sequencer.current_player() else {
            return false;
        };
        let responder = outcome
            .responder
            .or(self.turn.rebound_to)
            .unwrap_or(current);
        if !self.sequencer.is_active(responder) || self.turn.locked_out.contains(&responder) {
            debug!("Player {} cannot answer this turn", responder);
            return false;
        }

        if let Err(e) = self.phases.claim(token) {
            debug!("{:?} ignored: {}", outcome.kind, e);
            return false;
        }

        let opponent = outcome.opponent.or_else(|| {
            if responder != current {
                Some(current)
            } else {
                self.sequencer.peek_next()
            }
        });

        let mut scoring = {
            let ctx = ScoringContext {
                players: self.registry.players(),
                responder,
                opponent,
                time_limit_ms: self.config.time_limit_ms,
                locked_out: &self.turn.locked_out,
            };
            self.policy.score(&ctx, &outcome)
        };

        scoring.adjustments.retain(|(_, delta)| !delta.is_empty());

        self.sequencer.mark_acted();
        self.event_bus.publish(EngineEvent::OutcomeResolved {
            round_index: self.sequencer.round_index(),
            player_id: responder,
            outcome,
            adjustments: scoring.adjustments.clone(),
        });
        self.apply_adjustments(&scoring.adjustments);

        if self.end_if_no_contest() {
            return true;
        }

        if let Some(target) = scoring
            .rebound
            .filter(|target| self.sequencer.is_active(*target))
        {
            self.turn.locked_out.push(responder);
            self.turn.rebound_to = Some(target);
            self.fire(PhaseEvent::Rebound);
        }
        true
    }

    fn apply_adjustments(&mut self, adjustments: &[(PlayerId, PlayerDelta)]) {
        for &(player_id, delta) in adjustments {
            if let Err(e) = self.registry.apply_delta(player_id, delta) {
                warn!("Dropping adjustment: {}", e);
                continue;
            }

            if self.registry.is_eliminated(player_id) && self.sequencer.deactivate(player_id) {
                info!("Player {} is out of lives", player_id);
                self.event_bus.publish(EngineEvent::PlayerEliminated {
                    player_id,
                    round_index: self.sequencer.round_index(),
                    by_judge: false,
                });
            }
        }
    }

    /// Show the next turn's content. Runs from INTRO or NEXT.
    fn present_turn(&mut self) -> bool {
        if !self.fire(PhaseEvent::Begin) {
            return false;
        }
        self.turn = TurnState::default();

        if let Some(request) = &self.config.content {
            let items = self
                .content
                .sample(&request.category, request.difficulty, request.per_turn);

            if items.len() < request.per_turn {
                info!(
                    "Content for {} ran out in round {}; ending round early",
                    request.category,
                    self.sequencer.round_index()
                );
                self.event_bus.publish(EngineEvent::RoundCutShort {
                    round_index: self.sequencer.round_index(),
                    requested: request.per_turn,
                    available: items.len(),
                });
                self.fire(PhaseEvent::EndRound);
                return true;
            }
            self.turn.content = items;
        }

        if let (Some(player_id), Some(token)) =
            (self.sequencer.current_player(), self.phases.live_token())
        {
            self.event_bus.publish(EngineEvent::TurnStarted {
                round_index: self.sequencer.round_index(),
                player_id,
                token,
            });
        }
        true
    }

    fn step_turn(&mut self) {
        match self.sequencer.advance_turn() {
            TurnAdvance::GameComplete => self.finish_game(),
            TurnAdvance::RoundComplete => self.end_round(),
            TurnAdvance::Continue(player_id) => {
                debug!("Turn passes to player {}", player_id);
                if self.config.next_mode == NextMode::Immediate {
                    self.present_turn();
                }
            }
        }
    }

    /// Move past an inactive current seat without presenting anything.
    /// Only valid while no turn is on screen (INTRO or NEXT).
    fn skip_current_seat(&mut self) {
        match self.sequencer.advance_turn() {
            TurnAdvance::GameComplete => self.finish_game(),
            TurnAdvance::RoundComplete => self.end_round(),
            TurnAdvance::Continue(player_id) => {
                debug!("Player {} takes the eliminated player's turn", player_id);
            }
        }
    }

    fn end_round(&mut self) {
        let round_index = self.sequencer.round_index();
        if self.fire(PhaseEvent::EndRound) {
            info!("Round {} complete", round_index);
            self.event_bus
                .publish(EngineEvent::RoundCompleted { round_index });
        }
    }

    /// Ends the game when nobody (or, if configured, only one player) is
    /// left. Returns true if the game is now over.
    fn end_if_no_contest(&mut self) -> bool {
        let active = self.sequencer.active_count();
        if active == 0 || (self.config.end_when_one_remains && active <= 1) {
            self.finish_game();
            return true;
        }
        false
    }

    fn finish_game(&mut self) {
        if !self.fire(PhaseEvent::EndGame) {
            return;
        }
        let standings = self.standings();
        info!(
            "Game over after round {}; leader: {}",
            self.sequencer.round_index().min(self.config.total_rounds),
            standings
                .first()
                .map(|s| s.player.name.as_str())
                .unwrap_or("nobody")
        );
        self.event_bus
            .publish(EngineEvent::GameCompleted { standings });
    }

    fn fire(&mut self, event: PhaseEvent) -> bool {
        match self.phases.fire(event) {
            Ok(_) => true,
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for RoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundEngine")
            .field("policy", &self.policy.name())
            .field("phase", &self.phases.phase())
            .field("round_index", &self.sequencer.round_index())
            .field("players", &self.registry.players())
            .field("event_bus", &self.event_bus)
            .finish()
    }
}

/// Stable sort by score, competition ranking (1, 1, 3).
pub fn rank_players(players: &[Player]) -> Vec<Standing> {
    let mut ordered: Vec<&Player> = players.iter().collect();
    ordered.sort_by(|a, b| b.score.cmp(&a.score));

    let mut standings = Vec::with_capacity(ordered.len());
    let mut rank = 0;
    let mut previous_score = None;
    for (position, player) in ordered.into_iter().enumerate() {
        if previous_score != Some(player.score) {
            rank = position as u32 + 1;
            previous_score = Some(player.score);
        }
        standings.push(Standing {
            rank,
            player: player.clone(),
        });
    }
    standings
}

fn validate_config(config: &GameConfig, policy: &dyn ScoringPolicy) -> Result<(), EngineError> {
    let players = config.player_names.len();
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players) {
        return Err(EngineError::invalid_config(format!(
            "player count {} outside {}..={}",
            players, MIN_PLAYERS, MAX_PLAYERS
        )));
    }

    if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&config.total_rounds) {
        return Err(EngineError::invalid_config(format!(
            "round count {} outside {}..={}",
            config.total_rounds, MIN_ROUNDS, MAX_ROUNDS
        )));
    }

    if let Some(lives) = config.starting_lives {
        if lives == 0 || lives > MAX_LIVES {
            return Err(EngineError::invalid_config(format!(
                "starting lives {} outside 1..={}",
                lives, MAX_LIVES
            )));
        }
    }

    if let Some(limit) = config.time_limit_ms {
        if limit < MIN_TIME_LIMIT_MS {
            return Err(EngineError::invalid_config(format!(
                "time limit {}ms is below {}ms",
                limit, MIN_TIME_LIMIT_MS
            )));
        }
        if !policy.handles(OutcomeKind::Timeout) {
            return Err(EngineError::invalid_config(format!(
                "{} policy cannot score timeouts but the game has a countdown",
                policy.name()
            )));
        }
    }

    if let ResolveMode::Auto { delay_ms } = config.resolve_mode {
        if !(MIN_RESOLVE_DELAY_MS..=MAX_RESOLVE_DELAY_MS).contains(&delay_ms) {
            return Err(EngineError::invalid_config(format!(
                "resolve delay {}ms outside {}..={}ms",
                delay_ms, MIN_RESOLVE_DELAY_MS, MAX_RESOLVE_DELAY_MS
            )));
        }
    }

    if let Some(request) = &config.content {
        if request.per_turn == 0 || request.category.trim().is_empty() {
            return Err(EngineError::invalid_config(
                "content request needs a category and at least one item per turn",
            ));
        }
    }

    if config.hint_cost < 0 {
        return Err(EngineError::invalid_config("hint cost cannot be negative"));
    }

    if policy.outcome_domain().is_empty() {
        return Err(EngineError::invalid_config(format!(
            "{} policy declares no outcomes",
            policy.name()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoContent;
    use party_types::PolicyKind;

    fn config(players: &[&str], rounds: u32) -> GameConfig {
        GameConfig::new(
            players.iter().map(|p| p.to_string()).collect(),
            rounds,
            PolicyKind::Simple { speed_bonus: false },
        )
    }

    fn start(config: GameConfig) -> RoundEngine {
        RoundEngine::start(config, Box::new(NoContent)).unwrap()
    }

    #[test]
    fn test_start_enters_intro() {
        let engine = start(config(&["Ana", "Ben"], 3));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.phase, Phase::Intro);
        assert_eq!(snapshot.round_index, 1);
        assert_eq!(snapshot.current_player.unwrap().name, "Ana");
        assert_eq!(snapshot.active_players, vec![0, 1]);
        assert!(snapshot.final_standings.is_none());
    }

    #[test]
    fn test_invalid_configs() {
        let too_few = RoundEngine::start(config(&["Ana"], 3), Box::new(NoContent));
        assert!(matches!(too_few, Err(EngineError::InvalidConfig { .. })));

        let names: Vec<&str> = vec!["X"; MAX_PLAYERS + 1];
        let too_many = RoundEngine::start(config(&names, 3), Box::new(NoContent));
        assert!(matches!(too_many, Err(EngineError::InvalidConfig { .. })));

        let no_rounds = RoundEngine::start(config(&["Ana", "Ben"], 0), Box::new(NoContent));
        assert!(matches!(no_rounds, Err(EngineError::InvalidConfig { .. })));

        let long_game = RoundEngine::start(config(&["Ana", "Ben"], MAX_ROUNDS + 1), Box::new(NoContent));
        assert!(matches!(long_game, Err(EngineError::InvalidConfig { .. })));

        let slow_feedback = config(&["Ana", "Ben"], 3)
            .with_resolve_mode(ResolveMode::Auto { delay_ms: 5_000 });
        assert!(RoundEngine::start(slow_feedback, Box::new(NoContent)).is_err());
    }

    #[test]
    fn test_countdown_requires_timeout_scoring() {
        let mut battle = config(&["Ana", "Ben"], 3).with_time_limit(10_000);
        battle.policy = PolicyKind::RoundRobinBattle;
        let result = RoundEngine::start(battle, Box::new(NoContent));
        assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
    }

    #[test]
    fn test_answer_in_intro_is_ignored() {
        let mut engine = start(config(&["Ana", "Ben"], 3));
        assert!(!engine.submit_outcome(OutcomeEvent::correct()));
        assert_eq!(engine.phase(), Phase::Intro);
        assert_eq!(engine.player(0).unwrap().score, 0);
    }

    #[test]
    fn test_outcome_outside_policy_domain_is_ignored() {
        let mut engine = start(config(&["Ana", "Ben"], 3));
        engine.begin();
        assert!(!engine.submit_outcome(OutcomeEvent::new(OutcomeKind::Draw)));
        assert_eq!(engine.phase(), Phase::Present);
        assert!(engine.submit_outcome(OutcomeEvent::correct()));
    }

    #[test]
    fn test_pass_device_rests_in_next() {
        let mut engine = start(config(&["Ana", "Ben"], 3).with_next_mode(NextMode::PassDevice));
        engine.begin();
        engine.submit_outcome(OutcomeEvent::correct());
        assert!(engine.advance());
        assert_eq!(engine.phase(), Phase::Next);
        assert_eq!(engine.current_player().unwrap().name, "Ben");
        assert!(engine.advance());
        assert_eq!(engine.phase(), Phase::Present);
    }

    #[test]
    fn test_hint_once_per_turn() {
        let mut engine = start(config(&["Ana", "Ben"], 3));
        assert!(!engine.use_hint());
        engine.begin();
        assert!(engine.use_hint());
        assert!(!engine.use_hint());
        assert_eq!(engine.player(0).unwrap().score, -1);
    }

    struct NoChangePolicy;

    impl ScoringPolicy for NoChangePolicy {
        fn name(&self) -> &'static str {
            "no_change"
        }

        fn outcome_domain(&self) -> &'static [OutcomeKind] {
            &[OutcomeKind::Correct]
        }

        fn score(&self, ctx: &ScoringContext<'_>, _outcome: &OutcomeEvent) -> crate::Scoring {
            crate::Scoring {
                adjustments: vec![
                    (ctx.responder, PlayerDelta::default()),
                    (ctx.responder, PlayerDelta::score(2)),
                ],
                rebound: None,
            }
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(std::sync::Arc<std::sync::Mutex<Vec<EngineEvent>>>);

    impl EngineEventHandler for Recorder {
        fn handle_event(&mut self, event: EngineEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_empty_adjustments_are_not_published() {
        let mut engine = RoundEngine::with_policy(
            config(&["Ana", "Ben"], 3),
            Box::new(NoChangePolicy),
            Box::new(NoContent),
        )
        .unwrap();
        let recorder = Recorder::default();
        engine.subscribe(Box::new(recorder.clone()));

        engine.begin();
        assert!(engine.submit_outcome(OutcomeEvent::correct()));

        let events = recorder.0.lock().unwrap();
        let adjustments = events
            .iter()
            .find_map(|event| match event {
                EngineEvent::OutcomeResolved { adjustments, .. } => Some(adjustments.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(adjustments, vec![(0, PlayerDelta::score(2))]);
        assert_eq!(engine.player(0).unwrap().score, 2);
    }

    #[test]
    fn test_judge_elimination_before_turn_passes_it_on() {
        let mut engine = start(config(&["Ana", "Ben", "Cleo"], 3));
        assert!(engine.eliminate(0));
        assert_eq!(engine.phase(), Phase::Intro);
        assert_eq!(engine.current_player().unwrap().name, "Ben");

        engine.begin();
        assert!(engine.submit_outcome(OutcomeEvent::correct()));
        assert_eq!(engine.player(1).unwrap().score, 1);
    }

    #[test]
    fn test_rank_players_competition_ranking() {
        let mut players: Vec<Player> = (0..4)
            .map(|id| Player::new(id, format!("P{}", id), id, 0))
            .collect();
        players[0].score = 2;
        players[1].score = 5;
        players[2].score = 2;
        players[3].score = 1;

        let standings = rank_players(&players);
        let order: Vec<(u32, PlayerId)> =
            standings.iter().map(|s| (s.rank, s.player.id)).collect();
        assert_eq!(order, vec![(1, 1), (2, 0), (2, 2), (4, 3)]);
    }
}
