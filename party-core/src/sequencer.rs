use party_types::PlayerId;

/// What the sequencer decided after a turn finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAdvance {
    /// The round continues with this player.
    Continue(PlayerId),
    /// Every active player has taken a turn this round.
    RoundComplete,
    /// Everyone is eliminated or the last round has been played.
    GameComplete,
}

#[derive(Debug, Clone)]
struct Seat {
    id: PlayerId,
    active: bool,
    acted: bool,
}

/// Decides whose turn it is and when rounds and the game end.
///
/// Seats never move. Elimination clears a seat's `active` flag, so the
/// current player is always a seat lookup and no index shifting happens
/// when someone drops out mid-round.
#[derive(Debug, Clone)]
pub struct TurnSequencer {
    seats: Vec<Seat>,
    current: usize,
    round_index: u32,
    total_rounds: u32,
}

impl TurnSequencer {
    pub fn new(player_ids: impl IntoIterator<Item = PlayerId>, total_rounds: u32) -> Self {
        let seats = player_ids
            .into_iter()
            .map(|id| Seat {
                id,
                active: true,
                acted: false,
            })
            .collect();

        Self {
            seats,
            current: 0,
            round_index: 1,
            total_rounds,
        }
    }

    /// 1-based; reaches `total_rounds + 1` once the last round is over.
    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        self.seats.get(self.current).map(|seat| seat.id)
    }

    pub fn is_active(&self, player_id: PlayerId) -> bool {
        self.seat_of(player_id)
            .is_some_and(|index| self.seats[index].active)
    }

    /// Active players in join order.
    pub fn active_players(&self) -> Vec<PlayerId> {
        self.seats
            .iter()
            .filter(|seat| seat.active)
            .map(|seat| seat.id)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.seats.iter().filter(|seat| seat.active).count()
    }

    /// Remove a player from play. Returns true if they were active.
    pub fn deactivate(&mut self, player_id: PlayerId) -> bool {
        match self.seat_of(player_id) {
            Some(index) if self.seats[index].active => {
                self.seats[index].active = false;
                true
            }
            _ => false,
        }
    }

    /// Record that the current player has had their turn this round.
    pub fn mark_acted(&mut self) {
        if let Some(seat) = self.seats.get_mut(self.current) {
            seat.acted = true;
        }
    }

    /// Next active player after the current seat, wrapping around.
    pub fn peek_next(&self) -> Option<PlayerId> {
        self.next_seat_after(self.current, |seat| seat.active)
            .map(|index| self.seats[index].id)
    }

    pub fn is_round_complete(&self) -> bool {
        self.seats
            .iter()
            .filter(|seat| seat.active)
            .all(|seat| seat.acted)
    }

    pub fn is_game_complete(&self) -> bool {
        self.active_count() == 0 || self.round_index > self.total_rounds
    }

    /// Move to the next player who still owes a turn this round.
    pub fn advance_turn(&mut self) -> TurnAdvance {
        if self.is_game_complete() {
            return TurnAdvance::GameComplete;
        }
        if self.is_round_complete() {
            return TurnAdvance::RoundComplete;
        }

        match self.next_seat_after(self.current, |seat| seat.active && !seat.acted) {
            Some(index) => {
                self.current = index;
                TurnAdvance::Continue(self.seats[index].id)
            }
            None => TurnAdvance::RoundComplete,
        }
    }

    /// Close the current round. Order carries on from the seat after the last
    /// player to act. Returns false when the game is over.
    pub fn start_next_round(&mut self) -> bool {
        if self.round_index <= self.total_rounds {
            self.round_index += 1;
        }
        for seat in &mut self.seats {
            seat.acted = false;
        }
        if let Some(index) = self.next_seat_after(self.current, |seat| seat.active) {
            self.current = index;
        }

        !self.is_game_complete()
    }

    fn seat_of(&self, player_id: PlayerId) -> Option<usize> {
        self.seats.iter().position(|seat| seat.id == player_id)
    }

    fn next_seat_after(&self, from: usize, eligible: impl Fn(&Seat) -> bool) -> Option<usize> {
        let len = self.seats.len();
        (1..=len)
            .map(|offset| (from + offset) % len)
            .find(|&index| index != from && eligible(&self.seats[index]))
    }
}
