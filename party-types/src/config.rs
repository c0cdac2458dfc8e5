use crate::{Difficulty, DEFAULT_LIVES};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 12;
pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 10;
pub const MAX_LIVES: u32 = 9;
pub const MIN_TIME_LIMIT_MS: u64 = 1_000;
pub const MIN_RESOLVE_DELAY_MS: u64 = 1_000;
pub const MAX_RESOLVE_DELAY_MS: u64 = 2_000;

/// How a turn leaves the feedback screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ResolveMode {
    /// Players tap "continue".
    Manual,
    /// The host advances after a short reading delay.
    Auto { delay_ms: u64 },
}

/// Whether the engine rests in NEXT so the phone can be passed along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum NextMode {
    Immediate,
    PassDevice,
}

/// Built-in scoring rules. Custom rules go through `RoundEngine::with_policy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PolicyKind {
    Simple { speed_bonus: bool },
    HeadToHead,
    RoundRobinBattle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContentRequest {
    pub category: String,
    pub difficulty: Difficulty,
    pub per_turn: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameConfig {
    pub player_names: Vec<String>,
    /// `None` for games without a lives mechanic.
    pub starting_lives: Option<u32>,
    pub total_rounds: u32,
    /// Countdown for the INPUT phase in timer-driven games.
    pub time_limit_ms: Option<u64>,
    pub resolve_mode: ResolveMode,
    pub next_mode: NextMode,
    pub policy: PolicyKind,
    pub content: Option<ContentRequest>,
    /// Blank names become "Player N" instead of failing validation.
    pub default_blank_names: bool,
    pub end_when_one_remains: bool,
    pub hint_cost: i32,
}

impl GameConfig {
    pub fn new(player_names: Vec<String>, total_rounds: u32, policy: PolicyKind) -> Self {
        Self {
            player_names,
            starting_lives: None,
            total_rounds,
            time_limit_ms: None,
            resolve_mode: ResolveMode::Manual,
            next_mode: NextMode::Immediate,
            policy,
            content: None,
            default_blank_names: false,
            end_when_one_remains: false,
            hint_cost: 1,
        }
    }

    pub fn with_lives(mut self, lives: u32) -> Self {
        self.starting_lives = Some(lives);
        self
    }

    pub fn with_default_lives(self) -> Self {
        self.with_lives(DEFAULT_LIVES)
    }

    pub fn with_time_limit(mut self, time_limit_ms: u64) -> Self {
        self.time_limit_ms = Some(time_limit_ms);
        self
    }

    pub fn with_resolve_mode(mut self, resolve_mode: ResolveMode) -> Self {
        self.resolve_mode = resolve_mode;
        self
    }

    pub fn with_next_mode(mut self, next_mode: NextMode) -> Self {
        self.next_mode = next_mode;
        self
    }

    pub fn with_content(mut self, content: ContentRequest) -> Self {
        self.content = Some(content);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "player_names": ["Ana", "Ben", "Cy"],
            "starting_lives": 3,
            "total_rounds": 5,
            "time_limit_ms": 10000,
            "resolve_mode": { "Auto": { "delay_ms": 1500 } },
            "next_mode": "PassDevice",
            "policy": { "Simple": { "speed_bonus": true } },
            "content": null,
            "default_blank_names": true,
            "end_when_one_remains": false,
            "hint_cost": 1
        }"#;

        let config: GameConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.player_names.len(), 3);
        assert_eq!(config.starting_lives, Some(3));
        assert_eq!(config.resolve_mode, ResolveMode::Auto { delay_ms: 1500 });
        assert_eq!(config.policy, PolicyKind::Simple { speed_bonus: true });
    }

    #[test]
    fn test_builder_defaults() {
        let config = GameConfig::new(vec!["A".into(), "B".into()], 3, PolicyKind::HeadToHead)
            .with_default_lives();
        assert_eq!(config.starting_lives, Some(DEFAULT_LIVES));
        assert_eq!(config.resolve_mode, ResolveMode::Manual);
        assert_eq!(config.next_mode, NextMode::Immediate);
        assert_eq!(config.hint_cost, 1);
    }
}
