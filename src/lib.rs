pub mod network;

pub use network::tensor::Tensor;
pub use network::layer::{
    Layer,
    Linear,
    WeightInit,
};
pub use network::loss::{
    Loss,
    MeanSquaredError,
};
pub use network::optimizer::{
    Optimizer,
    OptimizerKind,
    Adam,
    SGD,
};
pub use network::Network;

pub mod agent;

pub use agent::{Agent, LookAheadAgent, map_state_to_inputs};
pub use agent::episode::Episode;
pub use agent::lookahead::LookAhead;
pub use agent::perceptron::Perceptron;
pub use agent::random::RandomAgent;
pub use agent::replaybuffer::ReplayBuffer;

pub mod config;
pub mod error;
pub mod game;
pub mod trainer;
