//! Evolves players for the grid game by having each generation play a round-robin tournament,
//! then pits the champion against a handful of random players.

extern crate ecgp;
extern crate env_logger;
extern crate rand;
extern crate rand_xorshift;

use ecgp::config::EvolveConfig;
use ecgp::game::{self, Outcome, TournamentRank, VIEW_LEN};
use ecgp::gp;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

const CHALLENGERS: usize = 20;

fn main() -> ecgp::Result<()> {
    env_logger::init();

    let config = EvolveConfig {
        population_size: 100,
        max_generations: 50,
        ..EvolveConfig::default()
    };
    let mut rng = config.rng();
    let mut ranker = TournamentRank::new(XorShiftRng::seed_from_u64(rng.gen()));

    let champion = gp::evolve(&mut rng, VIEW_LEN, &mut ranker, &config)?;
    println!("Champion ({} losses in its final tournament):", champion.fitness);
    println!("{}", champion.individual);

    let (mut wins, mut draws, mut losses) = (0, 0, 0);
    for _ in 0..CHALLENGERS {
        let challenger = gp::random_tree(&mut rng, VIEW_LEN, &config.tree);
        for &champion_first in &[true, false] {
            let outcome = if champion_first {
                game::play(&mut rng, &champion.individual, &challenger)?
            } else {
                game::play(&mut rng, &challenger, &champion.individual)?
            };
            match (outcome, champion_first) {
                (Outcome::Draw, _) => draws += 1,
                (Outcome::AWins, true) | (Outcome::BWins, false) => wins += 1,
                _ => losses += 1,
            }
        }
    }
    println!("Against random challengers: {} wins, {} draws, {} losses", wins, draws, losses);
    Ok(())
}
