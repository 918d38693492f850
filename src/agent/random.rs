use rand::prelude::*;
use rand::rngs::StdRng;

use super::Agent;
use crate::error::CheckpointError;
use crate::game::Game;

/// Baseline that ignores the board. Useful to tell whether training helped.
pub struct RandomAgent {
    actions: usize,
    rng: StdRng
}

impl RandomAgent {
    pub fn new(actions: usize) -> Self {
        Self { actions, rng: StdRng::from_os_rng() }
    }

    pub fn seeded(actions: usize, seed: u64) -> Self {
        Self { actions, rng: StdRng::seed_from_u64(seed) }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "RandomAgent"
    }

    fn get_action(&mut self, _game: &Game) -> usize {
        self.rng.random_range(0..self.actions)
    }

    fn give_reward(&mut self, _reward: f32) {}

    fn learn(&mut self) {}

    fn save(&self) -> Result<(), CheckpointError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ACTIONS;

    #[test]
    fn test_random_agent_covers_every_action() {
        let mut agent = RandomAgent::seeded(ACTIONS, 4);
        let game = Game::seeded(4, 4);
        let mut seen = [false; ACTIONS];
        for _ in 0..200 {
            seen[agent.get_action(&game)] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert!(agent.last_loss().is_none());
    }
}
