pub mod episode;
pub mod lookahead;
pub mod perceptron;
pub mod random;
pub mod replaybuffer;

use std::collections::VecDeque;

use log::debug;
use rand::prelude::*;
use rand::rngs::StdRng;

use episode::Episode;
use lookahead::LookAhead;
use perceptron::Perceptron;
use replaybuffer::ReplayBuffer;
use crate::config::{AgentConfig, LookAheadConfig};
use crate::error::CheckpointError;
use crate::game::{Board, Game};

/// Exponent that maps to a feature of 1.0 (the 65536 tile).
pub const MAX_EXPONENT: f32 = 16.0;

/// One feature per cell, row-major: the tile exponent scaled by `MAX_EXPONENT`.
pub fn map_state_to_inputs(board: &Board) -> Vec<f32> {
    board.exponents().iter().map(|&e| e as f32 / MAX_EXPONENT).collect()
}

pub trait Agent {
    fn name(&self) -> &str;
    fn get_action(&mut self, game: &Game) -> usize;
    fn give_reward(&mut self, reward: f32);
    fn learn(&mut self);
    fn save(&self) -> Result<(), CheckpointError>;

    // loss of the most recent update, for agents that train
    fn last_loss(&self) -> Option<f32> {
        None
    }
}

/// Uniform choice among the largest values. Non-finite values only count when
/// nothing else is finite.
pub fn greedy_action<R: Rng + ?Sized>(values: &[f32], rng: &mut R) -> usize {
    let best = values.iter().copied().filter(|v| v.is_finite()).fold(f32::NEG_INFINITY, f32::max);
    let candidates: Vec<usize> = if best.is_finite() {
        (0..values.len()).filter(|&i| values[i] == best).collect()
    } else {
        (0..values.len()).collect()
    };
    candidates[rng.random_range(0..candidates.len())]
}

/// Double Q-learning agent with a genetic lookahead on the exploratory branch.
///
/// The decider picks actions and is the network being trained; the evaluator
/// scores the decider's choice for the next state. The two trade places every
/// `double_q_learning_steps` games.
pub struct LookAheadAgent {
    actions: usize,
    exploration: f32,
    gamma: f32,
    lookahead_prob: f32,
    double_q_learning_steps: usize,
    games: usize,
    last_loss: Option<f32>,

    episodes: Vec<Episode>,
    previous: ReplayBuffer,
    action_queue: VecDeque<usize>,

    decider: Perceptron,
    evaluator: Perceptron,
    thinker: LookAhead,
    rng: StdRng
}

impl LookAheadAgent {
    pub fn new(features: usize, actions: usize, config: &AgentConfig, lookahead: LookAheadConfig) -> Self {
        Self::with_rng(features, actions, config, lookahead, StdRng::from_os_rng())
    }

    pub fn seeded(features: usize, actions: usize, config: &AgentConfig, lookahead: LookAheadConfig, seed: u64) -> Self {
        Self::with_rng(features, actions, config, lookahead, StdRng::seed_from_u64(seed))
    }

    fn with_rng(features: usize, actions: usize, config: &AgentConfig, lookahead: LookAheadConfig, rng: StdRng) -> Self {
        let mut agent = Self {
            actions,
            exploration: config.exploration,
            gamma: config.gamma,
            lookahead_prob: config.lookahead_prob,
            double_q_learning_steps: config.double_q_learning_steps,
            games: 0,
            last_loss: None,
            episodes: Vec::new(),
            previous: ReplayBuffer::new(config.experience_replays),
            action_queue: VecDeque::new(),
            decider: Perceptron::new("network1", features, actions, config),
            evaluator: Perceptron::new("network2", features, actions, config),
            thinker: LookAhead::new(actions, lookahead),
            rng
        };
        agent.load();
        agent
    }

    pub fn load(&mut self) {
        self.decider.load();
        self.evaluator.load();
    }

    pub fn decider_name(&self) -> &str {
        self.decider.name()
    }

    pub fn evaluator_name(&self) -> &str {
        self.evaluator.name()
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn replay_len(&self) -> usize {
        self.previous.len()
    }

    pub fn get_action_values(&mut self, state: &[f32]) -> Vec<f32> {
        self.decider.infer(state)
    }

    // exploration None always takes the greedy branch
    fn select_actions(&mut self, values: &[f32], exploration: Option<f32>, game: Option<&Game>) -> Vec<usize> {
        let greedy = match exploration {
            None => true,
            Some(e) => self.rng.random::<f32>() >= e,
        };
        if greedy {
            return vec![greedy_action(values, &mut self.rng)];
        }

        match game {
            Some(game) if self.rng.random::<f32>() < self.lookahead_prob => {
                let plan = self.thinker.find_best(game, &mut self.rng);
                debug!("exploring with lookahead plan {:?}", plan);
                plan
            }
            _ => vec![self.rng.random_range(0..self.actions)],
        }
    }

    /// Per-step targets: zero except at the taken action, which holds the reward plus,
    /// unless the step is the last one, the evaluator's discounted value of the
    /// decider's greedy choice in the next state.
    pub fn target_vectors(&mut self, episodes: &[Episode]) -> Vec<Vec<f32>> {
        let mut targets = Vec::with_capacity(episodes.len());

        for (i, episode) in episodes.iter().enumerate() {
            let mut reward = episode.reward;
            if let Some(next) = episodes.get(i + 1) {
                let next_values = self.decider.infer(&next.state);
                let next_action = greedy_action(&next_values, &mut self.rng);
                reward += self.gamma * self.evaluator.infer(&next.state)[next_action];
            }

            let mut target = vec![0.0; self.actions];
            target[episode.action] = reward;
            targets.push(target);
        }

        targets
    }

    fn learn_episodes(&mut self, episodes: &[Episode]) -> Option<f32> {
        if episodes.is_empty() {
            return None;
        }
        let states: Vec<Vec<f32>> = episodes.iter().map(|e| e.state.clone()).collect();
        let targets = self.target_vectors(episodes);
        Some(self.decider.train_step(&states, &targets))
    }

    fn experience_replay(&mut self) {
        let previous = std::mem::take(&mut self.previous.buffer);
        for episodes in &previous {
            self.learn_episodes(episodes);
        }
        self.previous.buffer = previous;
    }
}

impl Agent for LookAheadAgent {
    fn name(&self) -> &str {
        "LookAheadAgent"
    }

    fn get_action(&mut self, game: &Game) -> usize {
        let state = map_state_to_inputs(game.board());
        if self.action_queue.is_empty() {
            let values = self.get_action_values(&state);
            let plan = self.select_actions(&values, Some(self.exploration), Some(game));
            self.action_queue.extend(plan);
        }

        let action = self.action_queue.pop_front().expect("action plans are never empty");
        self.episodes.push(Episode::new(state, action, 0.0));
        action
    }

    fn give_reward(&mut self, reward: f32) {
        match self.episodes.last_mut() {
            Some(episode) => episode.reward = reward,
            None => debug!("reward {} given before any action", reward),
        }
    }

    fn learn(&mut self) {
        self.experience_replay();

        let episodes = std::mem::take(&mut self.episodes);
        self.previous.add(episodes.clone());
        self.last_loss = self.learn_episodes(&episodes);
        self.action_queue.clear();

        self.games += 1;
        if self.games == self.double_q_learning_steps {
            self.games = 0;
            std::mem::swap(&mut self.decider, &mut self.evaluator);
            debug!("swapped roles, {} now decides", self.decider.name());
        }
    }

    fn save(&self) -> Result<(), CheckpointError> {
        self.decider.save()?;
        self.evaluator.save()?;
        Ok(())
    }

    fn last_loss(&self) -> Option<f32> {
        self.last_loss
    }
}
