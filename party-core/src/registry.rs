use party_types::{EngineError, MAX_COMBO, MIN_COMBO, MIN_PLAYERS, Player, PlayerDelta, PlayerId};

/// Number of avatars bundled with the app.
pub const AVATAR_COUNT: u32 = 8;

/// Canonical player list for one session. Only the engine mutates it.
#[derive(Debug, Clone)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    starting_lives: Option<u32>,
}

impl PlayerRegistry {
    /// Build the roster from the pre-game name screen.
    ///
    /// Names are trimmed. A blank name either becomes "Player N" or fails the
    /// whole roster, depending on the game.
    pub fn create_players(
        names: &[String],
        starting_lives: Option<u32>,
        default_blank_names: bool,
    ) -> Result<Self, EngineError> {
        if names.len() < MIN_PLAYERS {
            return Err(EngineError::invalid_config(format!(
                "at least {} players are required, got {}",
                MIN_PLAYERS,
                names.len()
            )));
        }

        let mut players = Vec::with_capacity(names.len());
        for (index, raw) in names.iter().enumerate() {
            let id = index as PlayerId;
            let trimmed = raw.trim();
            let name = if !trimmed.is_empty() {
                trimmed.to_string()
            } else if default_blank_names {
                format!("Player {}", index + 1)
            } else {
                return Err(EngineError::invalid_config(format!(
                    "name for player {} is empty",
                    index + 1
                )));
            };

            players.push(Player::new(
                id,
                name,
                id % AVATAR_COUNT,
                starting_lives.unwrap_or(0),
            ));
        }

        Ok(Self {
            players,
            starting_lives,
        })
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(player_id as usize)
    }

    pub fn uses_lives(&self) -> bool {
        self.starting_lives.is_some()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Apply an additive delta. Lives clamp to `[0, starting_lives]`, combo to
    /// `[1, 5]`, streak never drops below zero.
    pub fn apply_delta(
        &mut self,
        player_id: PlayerId,
        delta: PlayerDelta,
    ) -> Result<&Player, EngineError> {
        let starting_lives = self.starting_lives;
        let player = self
            .players
            .get_mut(player_id as usize)
            .ok_or(EngineError::UnknownPlayer { player_id })?;

        player.score = player.score.saturating_add(delta.score);
        player.streak = clamp_add(player.streak, delta.streak, 0, u32::MAX);
        player.combo = clamp_add(player.combo, delta.combo, MIN_COMBO, MAX_COMBO);

        if let Some(max_lives) = starting_lives {
            player.lives = clamp_add(player.lives, delta.lives, 0, max_lives);
            if player.lives == 0 {
                player.is_eliminated = true;
            }
        }

        Ok(player)
    }

    /// True iff the player is out: lives exhausted in a lives game, or removed
    /// by a judge.
    pub fn is_eliminated(&self, player_id: PlayerId) -> bool {
        self.get(player_id).is_some_and(|player| {
            player.is_eliminated || (self.uses_lives() && player.lives == 0)
        })
    }

    /// Manual elimination. Returns false if the player was already out.
    pub fn eliminate(&mut self, player_id: PlayerId) -> Result<bool, EngineError> {
        let player = self
            .players
            .get_mut(player_id as usize)
            .ok_or(EngineError::UnknownPlayer { player_id })?;

        if player.is_eliminated {
            return Ok(false);
        }
        player.is_eliminated = true;
        Ok(true)
    }
}

fn clamp_add(value: u32, delta: i32, min: u32, max: u32) -> u32 {
    (i64::from(value) + i64::from(delta)).clamp(i64::from(min), i64::from(max)) as u32
}
