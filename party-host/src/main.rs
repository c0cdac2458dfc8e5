use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use party_core::ContentPool;
use party_host::{HostConfig, SessionManager};
use party_types::{ContentRequest, OutcomeEvent, OutcomeKind, Phase, PolicyKind};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting party host demo...");

    let config = HostConfig::from_env()?;

    let pool = match &config.content_file {
        Some(path) => {
            info!("Loading content from {}", path.display());
            let pool = Arc::new(ContentPool::from_file(path)?);
            info!("Loaded {} content items", pool.len());
            Some(pool)
        }
        None => None,
    };
    let manager = match &pool {
        Some(pool) => SessionManager::with_content(pool.clone()),
        None => SessionManager::new(),
    };

    // Start cleanup task
    let cleanup_manager = manager.clone();
    let idle_timeout = config.session_idle_timeout;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            cleanup_manager.cleanup_idle_sessions(idle_timeout).await;
        }
    });

    let mut game_config = config.demo_game_config(PolicyKind::Simple { speed_bonus: true });
    if let Some(item) = pool.as_ref().and_then(|pool| pool.items().first()) {
        game_config = game_config.with_content(ContentRequest {
            category: item.category.clone(),
            difficulty: item.difficulty,
            per_turn: 1,
        });
    }
    let time_limit_ms = game_config.time_limit_ms;

    let mut rng = match config.demo_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let session_id = manager.create_session(game_config).await?;

    loop {
        let snapshot = manager.snapshot(session_id).await?;
        match snapshot.phase {
            Phase::GameEnd => {
                let standings = snapshot.final_standings.unwrap_or_default();
                println!("{}", serde_json::to_string_pretty(&standings)?);
                break;
            }
            Phase::Intro => {
                manager.begin(session_id).await?;
            }
            Phase::Present => {
                if rng.random_bool(0.1) {
                    manager.use_hint(session_id).await?;
                }
                manager.open_input(session_id).await?;
            }
            Phase::Input => {
                if let Some(limit_ms) = time_limit_ms {
                    if rng.random_bool(0.15) {
                        // Nobody answers; the countdown resolves the turn
                        tokio::time::sleep(Duration::from_millis(limit_ms + 50)).await;
                        continue;
                    }
                }

                let reaction_ms = rng.random_range(300..time_limit_ms.unwrap_or(10_000));
                let kind = if rng.random_bool(0.7) {
                    OutcomeKind::Correct
                } else {
                    OutcomeKind::Incorrect
                };
                manager
                    .submit_outcome(
                        session_id,
                        OutcomeEvent::new(kind).with_reaction_time(reaction_ms),
                    )
                    .await?;
            }
            Phase::Resolve | Phase::Next | Phase::RoundEnd => {
                manager.advance(session_id).await?;
            }
        }
    }

    manager.close_session(session_id).await;
    info!("Demo complete.");
    Ok(())
}
