#![allow(dead_code)]

use party_core::{ContentPool, EngineEvent, EngineEventHandler, NoContent, PoolSampler, RoundEngine};
use party_types::{GameConfig, OutcomeEvent, Phase, Player, PolicyKind};
use std::sync::{Arc, Mutex};

pub const TEST_CONTENT: &str = "\
trivia|easy|Capital of France?|Paris
trivia|easy|How many legs does a spider have?|8
trivia|easy|What colour is a ripe banana?|Yellow
trivia|medium|Largest ocean on Earth?|Pacific
";

pub fn names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("Player{}", i)).collect()
}

/// Creates a config with `count` players and no lives
pub fn create_config(count: usize, rounds: u32, policy: PolicyKind) -> GameConfig {
    GameConfig::new(names(count), rounds, policy)
}

pub fn simple_policy() -> PolicyKind {
    PolicyKind::Simple { speed_bonus: false }
}

pub fn create_engine(config: GameConfig) -> RoundEngine {
    RoundEngine::start(config, Box::new(NoContent)).expect("valid test config")
}

pub fn create_engine_with_content(config: GameConfig, seed: u64) -> RoundEngine {
    let pool = Arc::new(ContentPool::parse(TEST_CONTENT).expect("valid test content"));
    RoundEngine::start(config, Box::new(PoolSampler::seeded(pool, seed))).expect("valid test config")
}

/// Event collector for testing event emissions
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.name() == name)
            .count()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&EngineEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl EngineEventHandler for EventCollector {
    fn handle_event(&mut self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Walk the engine from wherever it is to an open turn.
pub fn open_turn(engine: &mut RoundEngine) {
    if engine.phase() == Phase::Intro {
        engine.begin();
    }
    if engine.phase() == Phase::Present {
        engine.open_input();
    }
}

/// Play one turn for the current player and continue past RESOLVE.
pub fn play_turn(engine: &mut RoundEngine, outcome: OutcomeEvent) -> bool {
    open_turn(engine);
    let applied = engine.submit_outcome(outcome);
    engine.advance();
    applied
}

/// Let the countdown win the current turn.
pub fn time_out_turn(engine: &mut RoundEngine) -> bool {
    open_turn(engine);
    let token = engine.live_token().expect("turn should be open");
    let applied = engine.expire(token);
    engine.advance();
    applied
}

pub fn player<'a>(engine: &'a RoundEngine, name: &str) -> &'a Player {
    (0..)
        .map_while(|id| engine.player(id))
        .find(|p| p.name == name)
        .expect("player exists")
}

pub fn assert_phase(engine: &RoundEngine, expected: Phase) {
    assert_eq!(
        engine.phase(),
        expected,
        "Expected phase {:?}, got {:?}",
        expected,
        engine.phase()
    );
}
