use log::info;
use serde::Serialize;

use crate::agent::Agent;
use crate::config::TrainerConfig;
use crate::error::TrainingError;
use crate::game::Game;

/// Outcome of one game, one CSV row.
#[derive(Debug, Clone, Serialize)]
pub struct GameStats {
    pub game: usize,
    pub score: u32,
    pub max_tile: u32,
    /// Moves that changed the board.
    pub moves: usize,
    /// Actions taken, wasted ones included.
    pub steps: usize,
    pub total_reward: f32,
    pub loss: Option<f32>,
}

pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Trainer { config }
    }

    /// Plays one game from a fresh board, feeding every reward back to the agent.
    /// Does not learn.
    pub fn play_game(&self, agent: &mut dyn Agent, game: &mut Game) -> (usize, f32) {
        game.reset();
        let mut steps = 0;
        let mut total_reward = 0.0;

        while game.alive() && steps < self.config.max_moves {
            let action = agent.get_action(game);
            let (reward, done) = game.step(action);
            agent.give_reward(reward);
            total_reward += reward;
            steps += 1;
            if done {
                break;
            }
        }

        (steps, total_reward)
    }

    pub fn run(&self, agent: &mut dyn Agent, game: &mut Game) -> Result<Vec<GameStats>, TrainingError> {
        let mut writer = match &self.config.stats_path {
            Some(path) => Some(csv::Writer::from_path(path)?),
            None => None,
        };
        let mut history = Vec::with_capacity(self.config.num_games);

        for index in 0..self.config.num_games {
            let (steps, total_reward) = self.play_game(agent, game);
            agent.learn();

            let stats = GameStats {
                game: index + 1,
                score: game.score(),
                max_tile: game.board().max_tile(),
                moves: game.moves(),
                steps,
                total_reward,
                loss: agent.last_loss(),
            };
            info!(
                "{} game {}/{}: score {}, best tile {}, {} moves",
                agent.name(), stats.game, self.config.num_games, stats.score, stats.max_tile, stats.moves
            );

            if let Some(writer) = writer.as_mut() {
                writer.serialize(&stats)?;
            }
            if self.config.save_every > 0 && stats.game % self.config.save_every == 0 {
                agent.save()?;
            }
            history.push(stats);
        }

        if let Some(writer) = writer.as_mut() {
            writer.flush()?;
        }
        agent.save()?;

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::LookAheadAgent;
    use crate::agent::random::RandomAgent;
    use crate::config::{AgentConfig, LookAheadConfig};
    use crate::game::ACTIONS;
    use tempdir::TempDir;

    #[test]
    fn test_run_writes_one_row_per_game() {
        let dir = TempDir::new("trainer").unwrap();
        let stats_path = dir.path().join("stats.csv");
        let trainer = Trainer::new(TrainerConfig {
            num_games: 3,
            max_moves: 40,
            save_every: 0,
            stats_path: Some(stats_path.clone()),
        });
        let mut agent = RandomAgent::seeded(ACTIONS, 1);
        let mut game = Game::seeded(4, 1);

        let history = trainer.run(&mut agent, &mut game).unwrap();

        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|s| s.steps <= 40 && s.moves <= s.steps));
        let csv = std::fs::read_to_string(&stats_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "game,score,max_tile,moves,steps,total_reward,loss");
    }

    #[test]
    fn test_run_trains_and_saves_lookahead_agent() {
        let dir = TempDir::new("trainer").unwrap();
        let models_dir = dir.path().join("models");
        let agent_config = AgentConfig {
            models_dir: models_dir.clone(),
            double_q_learning_steps: 2,
            ..AgentConfig::default()
        };
        let lookahead = LookAheadConfig { population: 8, generations: 2, elite: 2, ..LookAheadConfig::default() };
        let mut agent = LookAheadAgent::seeded(16, ACTIONS, &agent_config, lookahead, 3);
        let mut game = Game::seeded(4, 3);
        let trainer = Trainer::new(TrainerConfig {
            num_games: 3,
            max_moves: 30,
            save_every: 2,
            stats_path: None,
        });

        let history = trainer.run(&mut agent, &mut game).unwrap();

        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|s| s.loss.is_some()));
        assert!(models_dir.join("network1.bin").exists());
        assert!(models_dir.join("network2.bin").exists());
        // three games with a swap every two
        assert_eq!(agent.decider_name(), "network2");
    }

    #[test]
    fn test_play_game_stops_at_max_moves() {
        let trainer = Trainer::new(TrainerConfig { max_moves: 5, ..TrainerConfig::default() });
        let mut agent = RandomAgent::seeded(ACTIONS, 2);
        let mut game = Game::seeded(4, 2);

        let (steps, _) = trainer.play_game(&mut agent, &mut game);

        assert_eq!(steps, 5);
    }
}
