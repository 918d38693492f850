use std::cmp::Ordering;

use log::debug;
use rand::Rng;
use rayon::prelude::*;

use crate::config::LookAheadConfig;
use crate::game::Game;

/// A candidate action sequence and how it played out on the simulated board.
#[derive(Clone, Debug)]
struct Scored {
    plan: Vec<usize>,
    fitness: f32,
    // moves before the first one that changed nothing
    valid_prefix: usize,
}

impl Scored {
    // plans that open with a real move always outrank plans that waste the first turn
    fn rank(&self, other: &Scored) -> Ordering {
        (self.valid_prefix > 0)
            .cmp(&(other.valid_prefix > 0))
            .then(self.fitness.total_cmp(&other.fitness))
    }
}

/// Genetic search over fixed-length action sequences, played out on non-spawning
/// copies of the board.
pub struct LookAhead {
    actions: usize,
    config: LookAheadConfig,
}

impl LookAhead {
    pub fn new(actions: usize, config: LookAheadConfig) -> Self {
        Self { actions, config }
    }

    /// Best plan found for `game`, cut before its first move that changes nothing.
    /// Never empty.
    pub fn find_best<R: Rng>(&self, game: &Game, rng: &mut R) -> Vec<usize> {
        let depth = self.config.depth.max(1);
        let population: Vec<Vec<usize>> = (0..self.config.population.max(1))
            .map(|i| {
                let mut plan: Vec<usize> = (0..depth).map(|_| rng.random_range(0..self.actions)).collect();
                // every opening move is represented at least once
                plan[0] = i % self.actions;
                plan
            })
            .collect();

        let mut scored = self.evaluate(game, population);
        for _ in 0..self.config.generations {
            let next = self.breed(&scored, rng);
            scored = self.evaluate(game, next);
        }

        let best = &scored[0];
        debug!("lookahead plan {:?} fitness {:.1}", best.plan, best.fitness);
        best.plan[..best.valid_prefix.max(1)].to_vec()
    }

    // sorted best first
    fn evaluate(&self, game: &Game, population: Vec<Vec<usize>>) -> Vec<Scored> {
        let mut scored: Vec<Scored> = population
            .into_par_iter()
            .map(|plan| {
                let (fitness, valid_prefix) = self.fitness(game, &plan);
                Scored { plan, fitness, valid_prefix }
            })
            .collect();
        scored.sort_by(|a, b| b.rank(a));
        scored
    }

    /// Accumulated reward plus the empty cells left at the end of the plan.
    fn fitness(&self, game: &Game, plan: &[usize]) -> (f32, usize) {
        let mut sim = game.simulation();
        let mut total = 0.0;
        let mut valid_prefix = None;

        for (i, &action) in plan.iter().enumerate() {
            let moves_before = sim.moves();
            let (reward, done) = sim.step(action);
            total += reward;
            if sim.moves() == moves_before && valid_prefix.is_none() {
                valid_prefix = Some(i);
            }
            if done {
                break;
            }
        }

        let fitness = total + sim.board().empty_cells() as f32;
        (fitness, valid_prefix.unwrap_or(plan.len()))
    }

    fn breed<R: Rng>(&self, scored: &[Scored], rng: &mut R) -> Vec<Vec<usize>> {
        let elite = self.config.elite.clamp(1, scored.len());
        let parents = &scored[..elite];
        let mut next: Vec<Vec<usize>> = parents.iter().map(|s| s.plan.clone()).collect();

        while next.len() < scored.len() {
            let a = &parents[rng.random_range(0..elite)].plan;
            let b = &parents[rng.random_range(0..elite)].plan;

            // single-point crossover, then per-gene mutation
            let cut = rng.random_range(0..=a.len());
            let mut child: Vec<usize> = a[..cut].iter().chain(b[cut..].iter()).copied().collect();
            for gene in child.iter_mut() {
                if rng.random::<f32>() < self.config.mutation_rate {
                    *gene = rng.random_range(0..self.actions);
                }
            }
            next.push(child);
        }

        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Move, ACTIONS};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn only_left_is_valid() -> Game {
        Game::from_board(Board::from_tiles(4, &[
            0, 2, 4, 8,
            0, 4, 8, 16,
            0, 8, 16, 32,
            0, 16, 32, 64,
        ]), true)
    }

    #[test]
    fn test_plan_opens_with_the_only_valid_move() {
        let thinker = LookAhead::new(ACTIONS, LookAheadConfig::default());
        let mut rng = StdRng::seed_from_u64(11);

        let plan = thinker.find_best(&only_left_is_valid(), &mut rng);

        assert!(!plan.is_empty());
        assert!(plan.len() <= LookAheadConfig::default().depth);
        assert_eq!(plan[0], Move::Left.index());
    }

    #[test]
    fn test_plan_prefers_the_merge() {
        let game = Game::from_board(Board::from_tiles(4, &[
            0, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
            512, 512, 0, 0,
        ]), true);
        let config = LookAheadConfig { depth: 1, ..LookAheadConfig::default() };
        let thinker = LookAhead::new(ACTIONS, config);

        let plan = thinker.find_best(&game, &mut StdRng::seed_from_u64(5));

        assert_eq!(plan.len(), 1);
        assert!(plan[0] == Move::Left.index() || plan[0] == Move::Right.index());
    }

    #[test]
    fn test_fitness_stops_counting_at_first_wasted_move() {
        let thinker = LookAhead::new(ACTIONS, LookAheadConfig::default());
        let game = only_left_is_valid();
        let left = Move::Left.index();
        let up = Move::Up.index();
        let right = Move::Right.index();

        let (fitness, valid_prefix) = thinker.fitness(&game, &[left, up, right]);

        assert_eq!(valid_prefix, 1);
        // one wasted move, the right shift scores nothing, four empty cells remain
        assert_eq!(fitness, -10.0 + 4.0);
    }

    #[test]
    fn test_search_leaves_the_game_untouched() {
        let game = Game::seeded(4, 9);
        let before = game.copy_board();
        let thinker = LookAhead::new(ACTIONS, LookAheadConfig::default());

        thinker.find_best(&game, &mut StdRng::seed_from_u64(1));

        assert_eq!(game.copy_board(), before);
    }

    #[test]
    fn test_zero_generations_still_plans() {
        let config = LookAheadConfig { generations: 0, population: 4, elite: 1, ..LookAheadConfig::default() };
        let thinker = LookAhead::new(ACTIONS, config);
        let plan = thinker.find_best(&only_left_is_valid(), &mut StdRng::seed_from_u64(2));
        assert_eq!(plan[0], Move::Left.index());
    }
}
