use party_types::{OutcomeEvent, OutcomeKind, Player, PlayerDelta, PlayerId, PolicyKind};

/// Everything a policy may look at when scoring one outcome.
pub struct ScoringContext<'a> {
    pub players: &'a [Player],
    pub responder: PlayerId,
    pub opponent: Option<PlayerId>,
    pub time_limit_ms: Option<u64>,
    /// Participants already locked out of this turn after a wrong answer.
    pub locked_out: &'a [PlayerId],
}

impl ScoringContext<'_> {
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == player_id)
    }
}

/// Result of scoring one outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoring {
    pub adjustments: Vec<(PlayerId, PlayerDelta)>,
    /// Hand the same question to this player instead of resolving the turn.
    pub rebound: Option<PlayerId>,
}

impl Scoring {
    pub fn none() -> Self {
        Self::default()
    }

    fn single(player_id: PlayerId, delta: PlayerDelta) -> Self {
        Self {
            adjustments: vec![(player_id, delta)],
            rebound: None,
        }
    }
}

/// Game-specific rules mapping an outcome to stat changes.
///
/// `score` must be total: every `OutcomeKind` gets an answer, and kinds outside
/// `outcome_domain` score nothing. The engine only forwards kinds inside the
/// domain.
pub trait ScoringPolicy: Send {
    fn name(&self) -> &'static str;

    fn outcome_domain(&self) -> &'static [OutcomeKind];

    fn handles(&self, kind: OutcomeKind) -> bool {
        self.outcome_domain().contains(&kind)
    }

    fn score(&self, ctx: &ScoringContext<'_>, outcome: &OutcomeEvent) -> Scoring;

    /// Cost of an optional hint, applied on its own as soon as it is used.
    fn hint_delta(&self, hint_cost: i32) -> PlayerDelta {
        PlayerDelta::score(-hint_cost)
    }
}

pub fn build_policy(kind: PolicyKind) -> Box<dyn ScoringPolicy> {
    match kind {
        PolicyKind::Simple { speed_bonus } => Box::new(SimplePolicy { speed_bonus }),
        PolicyKind::HeadToHead => Box::new(HeadToHeadPolicy),
        PolicyKind::RoundRobinBattle => Box::new(RoundRobinBattlePolicy),
    }
}

const STREAK_MILESTONE: u32 = 3;

/// Correct/incorrect/timeout scoring with streak milestones, a combo
/// multiplier and an optional speed bonus.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePolicy {
    pub speed_bonus: bool,
}

impl SimplePolicy {
    fn penalty(player: &Player, score: i32) -> PlayerDelta {
        PlayerDelta {
            score,
            lives: -1,
            streak: -(player.streak as i32),
            combo: 1 - player.combo as i32,
        }
    }

    fn base_gain(&self, ctx: &ScoringContext<'_>, outcome: &OutcomeEvent) -> i32 {
        let fast = match (outcome.reaction_time_ms, ctx.time_limit_ms) {
            (Some(reaction), Some(limit)) => reaction < limit / 2,
            _ => false,
        };
        if self.speed_bonus && fast { 2 } else { 1 }
    }
}

impl ScoringPolicy for SimplePolicy {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn outcome_domain(&self) -> &'static [OutcomeKind] {
        &[OutcomeKind::Correct, OutcomeKind::Incorrect, OutcomeKind::Timeout]
    }

    fn score(&self, ctx: &ScoringContext<'_>, outcome: &OutcomeEvent) -> Scoring {
        let Some(player) = ctx.player(ctx.responder) else {
            return Scoring::none();
        };

        let delta = match outcome.kind {
            OutcomeKind::Correct => {
                let streak = player.streak + 1;
                let milestone_bonus = if streak >= STREAK_MILESTONE {
                    (streak / STREAK_MILESTONE) as i32
                } else {
                    0
                };
                PlayerDelta {
                    score: self.base_gain(ctx, outcome) * player.combo as i32 + milestone_bonus,
                    lives: 0,
                    streak: 1,
                    combo: 1,
                }
            }
            OutcomeKind::Incorrect => Self::penalty(player, -1),
            OutcomeKind::Timeout => Self::penalty(player, -2),
            OutcomeKind::Draw | OutcomeKind::BothFailed => return Scoring::none(),
        };

        Scoring::single(player.id, delta)
    }
}

/// Buzzer duel: first correct responder takes the point, a wrong answer hands
/// the question to the opponent.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadToHeadPolicy;

impl ScoringPolicy for HeadToHeadPolicy {
    fn name(&self) -> &'static str {
        "head_to_head"
    }

    fn outcome_domain(&self) -> &'static [OutcomeKind] {
        &[
            OutcomeKind::Correct,
            OutcomeKind::Incorrect,
            OutcomeKind::Timeout,
            OutcomeKind::BothFailed,
        ]
    }

    fn score(&self, ctx: &ScoringContext<'_>, outcome: &OutcomeEvent) -> Scoring {
        match outcome.kind {
            OutcomeKind::Correct => Scoring::single(
                ctx.responder,
                PlayerDelta {
                    score: 1,
                    streak: 1,
                    ..PlayerDelta::default()
                },
            ),
            OutcomeKind::Incorrect => Scoring {
                adjustments: Vec::new(),
                rebound: ctx
                    .opponent
                    .filter(|opponent| *opponent != ctx.responder)
                    .filter(|opponent| !ctx.locked_out.contains(opponent)),
            },
            OutcomeKind::Timeout | OutcomeKind::BothFailed | OutcomeKind::Draw => Scoring::none(),
        }
    }
}

/// Pairwise battle: Draw means nobody lost, BothFailed means both lost,
/// Incorrect names the responder as the loser and Correct names them the
/// winner.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobinBattlePolicy;

impl ScoringPolicy for RoundRobinBattlePolicy {
    fn name(&self) -> &'static str {
        "round_robin_battle"
    }

    fn outcome_domain(&self) -> &'static [OutcomeKind] {
        &[
            OutcomeKind::Correct,
            OutcomeKind::Incorrect,
            OutcomeKind::Draw,
            OutcomeKind::BothFailed,
        ]
    }

    fn score(&self, ctx: &ScoringContext<'_>, outcome: &OutcomeEvent) -> Scoring {
        let point = PlayerDelta::score(1);
        let adjustments = match (outcome.kind, ctx.opponent) {
            (OutcomeKind::Draw, Some(opponent)) => vec![(ctx.responder, point), (opponent, point)],
            (OutcomeKind::Draw, None) => vec![(ctx.responder, point)],
            (OutcomeKind::Correct, _) => vec![(ctx.responder, point)],
            (OutcomeKind::Incorrect, Some(opponent)) => vec![(opponent, point)],
            (OutcomeKind::Incorrect, None)
            | (OutcomeKind::BothFailed, _)
            | (OutcomeKind::Timeout, _) => Vec::new(),
        };

        Scoring {
            adjustments,
            rebound: None,
        }
    }
}
