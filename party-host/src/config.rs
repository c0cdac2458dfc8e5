use anyhow::{Context, Result};
use party_types::{GameConfig, PolicyKind, ResolveMode};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// Countdown per turn. `PARTY_TIME_LIMIT_MS=0` turns it off.
    pub time_limit_ms: Option<u64>,
    /// Reading delay before auto-advancing. `0` means the host waits for a tap.
    pub resolve_delay_ms: Option<u64>,
    pub session_idle_timeout: Duration,
    pub content_file: Option<PathBuf>,
    pub demo_players: Vec<String>,
    pub demo_rounds: u32,
    pub demo_seed: Option<u64>,
}

impl HostConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source. Missing keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let time_limit_ms = match parse_var::<u64>(&lookup, "PARTY_TIME_LIMIT_MS")? {
            Some(0) => None,
            Some(ms) => Some(ms),
            None => defaults.time_limit_ms,
        };
        let resolve_delay_ms = match parse_var::<u64>(&lookup, "PARTY_RESOLVE_DELAY_MS")? {
            Some(0) => None,
            Some(ms) => Some(ms),
            None => defaults.resolve_delay_ms,
        };
        let session_idle_timeout = parse_var::<u64>(&lookup, "PARTY_SESSION_IDLE_SECONDS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_idle_timeout);

        let demo_players = lookup("PARTY_DEMO_PLAYERS")
            .map(|names| names.split(',').map(|name| name.trim().to_string()).collect())
            .unwrap_or(defaults.demo_players);

        Ok(Self {
            time_limit_ms,
            resolve_delay_ms,
            session_idle_timeout,
            content_file: lookup("PARTY_CONTENT_FILE").map(PathBuf::from),
            demo_players,
            demo_rounds: parse_var(&lookup, "PARTY_DEMO_ROUNDS")?.unwrap_or(defaults.demo_rounds),
            demo_seed: parse_var(&lookup, "PARTY_DEMO_SEED")?,
        })
    }

    /// Session config for the demo players under the given scoring policy.
    pub fn demo_game_config(&self, policy: PolicyKind) -> GameConfig {
        let mut config = GameConfig::new(self.demo_players.clone(), self.demo_rounds, policy);
        config.time_limit_ms = self.time_limit_ms;
        config.resolve_mode = match self.resolve_delay_ms {
            Some(delay_ms) => ResolveMode::Auto { delay_ms },
            None => ResolveMode::Manual,
        };
        config.default_blank_names = true;
        config
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: Some(10_000),
            resolve_delay_ms: Some(1_500),
            session_idle_timeout: Duration::from_secs(30 * 60),
            content_file: None,
            demo_players: vec!["Ana".to_string(), "Ben".to_string(), "Cleo".to_string()],
            demo_rounds: 3,
            demo_seed: None,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .with_context(|| format!("Invalid {}: {:?}", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = HostConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = HostConfig::from_lookup(lookup_from(&[
            ("PARTY_TIME_LIMIT_MS", "0"),
            ("PARTY_RESOLVE_DELAY_MS", "2000"),
            ("PARTY_SESSION_IDLE_SECONDS", "60"),
            ("PARTY_DEMO_PLAYERS", "Dee, Eli ,"),
            ("PARTY_DEMO_ROUNDS", "5"),
            ("PARTY_DEMO_SEED", "42"),
            ("PARTY_CONTENT_FILE", "content.txt"),
        ]))
        .unwrap();

        assert_eq!(config.time_limit_ms, None);
        assert_eq!(config.resolve_delay_ms, Some(2_000));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(60));
        assert_eq!(config.demo_players, vec!["Dee", "Eli", ""]);
        assert_eq!(config.demo_rounds, 5);
        assert_eq!(config.demo_seed, Some(42));
        assert_eq!(config.content_file, Some(PathBuf::from("content.txt")));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let result = HostConfig::from_lookup(lookup_from(&[("PARTY_DEMO_ROUNDS", "three")]));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("PARTY_DEMO_ROUNDS"));
    }

    #[test]
    fn test_demo_game_config() {
        let config = HostConfig::default().demo_game_config(PolicyKind::HeadToHead);
        assert_eq!(config.player_names.len(), 3);
        assert_eq!(config.total_rounds, 3);
        assert_eq!(config.time_limit_ms, Some(10_000));
        assert_eq!(config.resolve_mode, ResolveMode::Auto { delay_ms: 1_500 });
        assert!(config.default_blank_names);
    }
}
