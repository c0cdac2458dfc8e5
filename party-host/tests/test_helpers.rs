#![allow(dead_code)]

use party_host::{SessionId, SessionManager};
use party_types::{GameConfig, Phase, PlayerId, PolicyKind, ResolveMode};
use std::time::Duration;

pub fn names(players: &[&str]) -> Vec<String> {
    players.iter().map(|name| name.to_string()).collect()
}

/// Two-player simple game, no countdown, manual resolve.
pub fn simple_config(rounds: u32) -> GameConfig {
    GameConfig::new(
        names(&["Alice", "Bob"]),
        rounds,
        PolicyKind::Simple { speed_bonus: false },
    )
}

pub fn timed_config(time_limit_ms: u64) -> GameConfig {
    simple_config(3).with_time_limit(time_limit_ms)
}

pub fn auto_config(delay_ms: u64) -> GameConfig {
    simple_config(3).with_resolve_mode(ResolveMode::Auto { delay_ms })
}

/// Creates a session and walks it to an open answer window.
pub async fn open_session(manager: &SessionManager, config: GameConfig) -> SessionId {
    let session_id = manager.create_session(config).await.unwrap();
    assert!(manager.begin(session_id).await.unwrap());
    assert!(manager.open_input(session_id).await.unwrap().is_some());
    session_id
}

pub async fn phase(manager: &SessionManager, session_id: SessionId) -> Phase {
    manager.snapshot(session_id).await.unwrap().phase
}

pub async fn score(manager: &SessionManager, session_id: SessionId, player_id: PlayerId) -> i32 {
    manager.snapshot(session_id).await.unwrap().players[player_id as usize].score
}

pub async fn current_player(manager: &SessionManager, session_id: SessionId) -> Option<PlayerId> {
    manager
        .snapshot(session_id)
        .await
        .unwrap()
        .current_player
        .map(|player| player.id)
}

pub async fn wait_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
