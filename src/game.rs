//! A competitive fitness source: a two player game on a small grid.
//!
//! Two agents take turns moving one cell left, right, down or up on a 4x4 grid. An agent that
//! repeats its own previous move loses immediately, while an agent that moves onto its opponent's
//! cell captures it and wins. If neither happens within `MAX_PLIES` rounds the game is a draw.
//!
//! Each turn the moving agent is given a view of the board:
//!
//! `[own x, own y, opponent x, opponent y, own last move or -1]`
//!
//! and the value it produces is reduced modulo 4 to pick its move.

use crate::error::{Error, Result};
use crate::ga::{sort_ranked, Rank, Ranked};
use crate::gp::expr::Expr;
use log::debug;
use rand::Rng;

/// The largest coordinate on either axis.
pub const GRID_MAX: i64 = 3;

/// The maximum number of rounds, each consisting of one turn per agent.
pub const MAX_PLIES: usize = 50;

/// The length of the view given to an agent each turn.
pub const VIEW_LEN: usize = 5;

/// The value used in the view in place of the last move before an agent has moved.
pub const NO_MOVE: i64 = -1;

/// Anything capable of choosing a move from a view of the board.
pub trait Player {
    /// Produce a value from which the next move is derived.
    fn choose(&self, view: &[i64]) -> Result<i64>;
}

impl Player for Expr {
    fn choose(&self, view: &[i64]) -> Result<i64> {
        self.evaluate(view)
    }
}

impl<P> Player for Box<P>
where
    P: Player + ?Sized,
{
    fn choose(&self, view: &[i64]) -> Result<i64> {
        (**self).choose(view)
    }
}

/// A single step in one of four directions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    /// Decrease x.
    Left,
    /// Increase x.
    Right,
    /// Decrease y.
    Down,
    /// Increase y.
    Up,
}

impl Move {
    /// Interpret any value as a move, modulo 4.
    pub fn from_value(value: i64) -> Self {
        match value.rem_euclid(4) {
            0 => Move::Left,
            1 => Move::Right,
            2 => Move::Down,
            _ => Move::Up,
        }
    }

    /// The value of this move as seen within an agent's view.
    pub fn code(self) -> i64 {
        match self {
            Move::Left => 0,
            Move::Right => 1,
            Move::Down => 2,
            Move::Up => 3,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Position { x, y }
    }

    /// The position after the given move, clamped to the grid.
    pub fn step(self, mv: Move) -> Self {
        let Position { x, y } = self;
        let (x, y) = match mv {
            Move::Left => (x - 1, y),
            Move::Right => (x + 1, y),
            Move::Down => (x, y - 1),
            Move::Up => (x, y + 1),
        };
        Position::new(x.max(0).min(GRID_MAX), y.max(0).min(GRID_MAX))
    }
}

/// The result of a finished game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    AWins,
    BWins,
    Draw,
}

impl Outcome {
    /// The index of the winning agent, if any.
    pub fn winner(self) -> Option<usize> {
        match self {
            Outcome::AWins => Some(0),
            Outcome::BWins => Some(1),
            Outcome::Draw => None,
        }
    }

    fn win_for(agent: usize) -> Self {
        if agent == 0 {
            Outcome::AWins
        } else {
            Outcome::BWins
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    InProgress,
    Finished(Outcome),
}

/// The state of a single game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    positions: [Position; 2],
    last_moves: [Option<Move>; 2],
    ply: usize,
    status: Status,
}

impl GameState {
    /// Agent `0` starts at `start`, agent `1` two cells away on both axes, wrapping around.
    pub fn new(start: Position) -> Self {
        let side = GRID_MAX + 1;
        let opposite = Position::new((start.x + 2) % side, (start.y + 2) % side);
        Self::with_positions([start, opposite])
    }

    pub fn with_positions(positions: [Position; 2]) -> Self {
        GameState {
            positions,
            last_moves: [None; 2],
            ply: 0,
            status: Status::InProgress,
        }
    }

    /// A game where agent `0` starts at a uniformly random cell.
    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        let start = Position::new(rng.gen_range(0..=GRID_MAX), rng.gen_range(0..=GRID_MAX));
        Self::new(start)
    }

    pub fn positions(&self) -> [Position; 2] {
        self.positions
    }

    pub fn last_moves(&self) -> [Option<Move>; 2] {
        self.last_moves
    }

    /// The number of completed rounds.
    pub fn ply(&self) -> usize {
        self.ply
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The board as seen by the given agent.
    pub fn view(&self, agent: usize) -> [i64; VIEW_LEN] {
        let own = self.positions[agent];
        let other = self.positions[1 - agent];
        let last = self.last_moves[agent].map_or(NO_MOVE, Move::code);
        [own.x, own.y, other.x, other.y, last]
    }

    /// Apply the given agent's turn, where `value` is the output of its player.
    ///
    /// Agents must alternate, starting with agent `0`. Agent `1`'s turn completes a round and the
    /// game is drawn once `MAX_PLIES` rounds complete. Has no effect once the game is finished.
    pub fn turn(&mut self, agent: usize, value: i64) -> Status {
        if self.status != Status::InProgress {
            return self.status;
        }
        let mv = Move::from_value(value);
        if self.last_moves[agent] == Some(mv) {
            self.status = Status::Finished(Outcome::win_for(1 - agent));
            return self.status;
        }
        self.last_moves[agent] = Some(mv);
        self.positions[agent] = self.positions[agent].step(mv);
        if self.positions[agent] == self.positions[1 - agent] {
            self.status = Status::Finished(Outcome::win_for(agent));
        } else if agent == 1 {
            self.ply += 1;
            if self.ply >= MAX_PLIES {
                self.status = Status::Finished(Outcome::Draw);
            }
        }
        self.status
    }

    /// Play the game out between the two players, agent `0` moving first in every round.
    pub fn play<P>(mut self, players: [&P; 2]) -> Result<Outcome>
    where
        P: Player + ?Sized,
    {
        loop {
            for (agent, player) in players.iter().enumerate() {
                let value = player.choose(&self.view(agent))?;
                if let Status::Finished(outcome) = self.turn(agent, value) {
                    return Ok(outcome);
                }
            }
        }
    }
}

/// Play a single game from a random starting position.
pub fn play<R, P>(rng: &mut R, a: &P, b: &P) -> Result<Outcome>
where
    R: Rng,
    P: Player + ?Sized,
{
    GameState::random(rng).play([a, b])
}

/// Play every ordered pair of players in the pool against each other once.
///
/// A loss adds `2` to the loser's count while a draw adds `1` to both. The pool is returned in
/// ascending order of losses.
pub fn tournament<R, P>(rng: &mut R, pool: Vec<P>) -> Result<Vec<Ranked<P, u32>>>
where
    R: Rng,
    P: Player,
{
    if pool.is_empty() {
        return Err(Error::EmptyPopulation);
    }
    let mut losses = vec![0u32; pool.len()];
    for i in 0..pool.len() {
        for j in 0..pool.len() {
            if i == j {
                continue;
            }
            let outcome = play(rng, &pool[i], &pool[j])?;
            match outcome {
                Outcome::AWins => losses[j] += 2,
                Outcome::BWins => losses[i] += 2,
                Outcome::Draw => {
                    losses[i] += 1;
                    losses[j] += 1;
                }
            }
        }
    }
    debug!("Tournament losses: {:?}", losses);

    let mut ranked = losses
        .into_iter()
        .zip(pool)
        .map(|(fitness, individual)| Ranked { fitness, individual })
        .collect::<Vec<_>>();
    sort_ranked(&mut ranked);
    Ok(ranked)
}

/// Ranks a population by playing a `tournament`.
pub struct TournamentRank<R> {
    rng: R,
}

impl<R> TournamentRank<R>
where
    R: Rng,
{
    /// Starting positions are drawn from the given generator.
    pub fn new(rng: R) -> Self {
        TournamentRank { rng }
    }
}

impl<R, P> Rank<P> for TournamentRank<R>
where
    R: Rng,
    P: Player,
{
    type Fitness = u32;

    fn rank(&mut self, population: Vec<P>) -> Result<Vec<Ranked<P, u32>>> {
        tournament(&mut self.rng, population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::expr::gen::{self, GenParams};
    use crate::gp::func::OperatorId;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    /// Cycles through its moves, never repeating and never standing still.
    struct Cycle;

    impl Player for Cycle {
        fn choose(&self, view: &[i64]) -> Result<i64> {
            Ok(view[4] + 1)
        }
    }

    #[test]
    fn constant_players_lose_on_repeat() {
        let a = Expr::constant(0);
        let b = Expr::constant(0);
        let mut rng = XorShiftRng::seed_from_u64(0);
        for _ in 0..20 {
            assert_eq!(play(&mut rng, &a, &b).unwrap(), Outcome::BWins);
        }
    }

    #[test]
    fn second_agent_repeating_loses() {
        // Agent 0 alternates between left and right so only agent 1 ever repeats.
        let alternate = Expr::operator(
            OperatorId::IsGreater,
            vec![Expr::constant(1), Expr::parameter(4)],
        )
        .unwrap();
        let still = Expr::constant(2);
        let state = GameState::with_positions([Position::new(0, 0), Position::new(3, 3)]);
        assert_eq!(state.play([&alternate, &still]).unwrap(), Outcome::AWins);
    }

    #[test]
    fn moving_onto_the_opponent_captures() {
        let mut state = GameState::with_positions([Position::new(0, 0), Position::new(1, 0)]);
        assert_eq!(state.turn(0, Move::Right.code()), Status::Finished(Outcome::AWins));
        assert_eq!(state.positions()[0], Position::new(1, 0));
        // Finished games ignore further turns.
        assert_eq!(state.turn(1, 0), Status::Finished(Outcome::AWins));
    }

    #[test]
    fn moves_are_clamped_to_the_grid() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.step(Move::Left), corner);
        assert_eq!(corner.step(Move::Down), corner);
        let far = Position::new(GRID_MAX, GRID_MAX);
        assert_eq!(far.step(Move::Right), far);
        assert_eq!(far.step(Move::Up), far);
        assert_eq!(corner.step(Move::Up), Position::new(0, 1));
    }

    #[test]
    fn negative_values_map_to_valid_moves() {
        assert_eq!(Move::from_value(-1), Move::Up);
        assert_eq!(Move::from_value(-4), Move::Left);
        assert_eq!(Move::from_value(6), Move::Down);
    }

    #[test]
    fn views_are_relative_to_the_agent() {
        let mut state = GameState::new(Position::new(1, 3));
        assert_eq!(state.positions()[1], Position::new(3, 1));
        assert_eq!(state.view(0), [1, 3, 3, 1, NO_MOVE]);
        state.turn(1, Move::Down.code());
        assert_eq!(state.view(1), [3, 0, 1, 3, Move::Down.code()]);
    }

    #[test]
    fn cycling_players_draw_after_the_ply_budget() {
        // Two cyclers starting in opposite corners never meet.
        let state = GameState::with_positions([Position::new(0, 0), Position::new(3, 3)]);
        let mut check = state.clone();
        let players: [&dyn Player; 2] = [&Cycle, &Cycle];
        assert_eq!(state.play(players).unwrap(), Outcome::Draw);

        // The game stays in progress until the final turn of the last round.
        for ply in 0..MAX_PLIES {
            assert_eq!(check.ply(), ply);
            for agent in 0..2 {
                let value = Cycle.choose(&check.view(agent)).unwrap();
                let status = check.turn(agent, value);
                if ply + 1 == MAX_PLIES && agent == 1 {
                    assert_eq!(status, Status::Finished(Outcome::Draw));
                } else {
                    assert_eq!(status, Status::InProgress);
                }
            }
        }
    }

    #[test]
    fn random_games_always_terminate() {
        let mut rng = XorShiftRng::seed_from_u64(12);
        let params = GenParams::default();
        for _ in 0..200 {
            let a = gen::random_tree(&mut rng, VIEW_LEN, &params);
            let b = gen::random_tree(&mut rng, VIEW_LEN, &params);
            assert!(play(&mut rng, &a, &b).is_ok());
        }
    }

    #[test]
    fn tournament_conserves_losses() {
        let mut rng = XorShiftRng::seed_from_u64(13);
        let params = GenParams::default();
        for n in 1..8 {
            let pool = (0..n)
                .map(|_| gen::random_tree(&mut rng, VIEW_LEN, &params))
                .collect::<Vec<_>>();
            let ranked = tournament(&mut rng, pool).unwrap();
            let total: u32 = ranked.iter().map(|r| r.fitness).sum();
            assert_eq!(total as usize, 2 * n * (n - 1));
            assert!(ranked.windows(2).all(|w| w[0].fitness <= w[1].fitness));
        }
    }

    #[test]
    fn tournament_rewards_the_cycler() {
        // Constants always lose on their second move while the cycler never repeats.
        let pool: Vec<Box<dyn Player>> = vec![
            Box::new(Cycle),
            Box::new(Expr::constant(1)),
            Box::new(Expr::constant(3)),
        ];
        let mut ranker = TournamentRank::new(XorShiftRng::seed_from_u64(14));
        let ranked = ranker.rank(pool).unwrap();
        assert_eq!(ranked[0].fitness, 0);
        assert_eq!(ranked[0].individual.choose(&[0, 0, 0, 0, 1]).unwrap(), 2);
    }

    #[test]
    fn empty_tournaments_are_errors() {
        let mut rng = XorShiftRng::seed_from_u64(15);
        match tournament(&mut rng, Vec::<Expr>::new()) {
            Err(Error::EmptyPopulation) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
