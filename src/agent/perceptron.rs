use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::AgentConfig;
use crate::error::CheckpointError;
use crate::network::{
    Network,
    tensor::Tensor,
    layer::{Layer, Linear, WeightInit},
    loss::MeanSquaredError,
    optimizer::OptimizerKind,
};

// one bias-free linear layer under MSE
fn fresh_network(
    features: usize,
    actions: usize,
    init: WeightInit,
    init_std: f32,
    optimizer: OptimizerKind,
    learning_rate: f32,
) -> Network {
    let layers: Vec<Box<dyn Layer>> = vec![Box::new(Linear::new(features, actions, init, init_std))];
    Network::new(layers, Box::new(MeanSquaredError), optimizer.build(learning_rate))
}

/// Linear action-value model: one row of features in, one value per action out.
///
/// Checkpoints live at `<models_dir>/<name>.bin` and carry the optimizer state
/// along with the weights.
pub struct Perceptron {
    name: String,
    path: PathBuf,
    features: usize,
    actions: usize,
    learning_rate: f32,
    optimizer: OptimizerKind,
    init: WeightInit,
    init_std: f32,
    network: Network
}

impl Perceptron {
    pub fn new(name: &str, features: usize, actions: usize, config: &AgentConfig) -> Self {
        Self {
            name: name.to_string(),
            path: config.models_dir.join(format!("{}.bin", name)),
            features,
            actions,
            learning_rate: config.alpha,
            optimizer: config.optimizer,
            network: fresh_network(features, actions, config.init, config.init_std, config.optimizer, config.alpha),
            init: config.init,
            init_std: config.init_std
        }
    }

    fn initialize(&mut self) {
        self.network = fresh_network(
            self.features, self.actions, self.init, self.init_std, self.optimizer, self.learning_rate
        );
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.path
    }

    pub fn infer(&mut self, state: &[f32]) -> Vec<f32> {
        let input = Tensor::from_vec(state.to_vec(), vec![1, self.features]);
        self.network.predict(&input).row(0)
    }

    /// One optimizer step toward `targets`; returns the loss before the step.
    pub fn train_step(&mut self, states: &[Vec<f32>], targets: &[Vec<f32>]) -> f32 {
        assert_eq!(states.len(), targets.len(), "every state needs a target vector");
        if states.is_empty() {
            return 0.0;
        }

        let x = Tensor::from_rows(states, self.features);
        let y = Tensor::from_rows(targets, self.actions);
        self.network.train_on_batch(&x, &y)
    }

    pub fn save(&self) -> Result<PathBuf, CheckpointError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| CheckpointError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let bytes = bincode::serialize(&self.network).map_err(|source| CheckpointError::Codec {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, bytes).map_err(|source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!("saved {} to {}", self.name, self.path.display());
        Ok(self.path.clone())
    }

    /// Restores the checkpoint if there is a usable one, otherwise starts from fresh
    /// parameters. Returns whether a checkpoint was restored.
    pub fn load(&mut self) -> bool {
        match self.read_checkpoint() {
            Ok(network) => {
                self.network = network;
                info!("restored {} from {}", self.name, self.path.display());
                true
            }
            Err(CheckpointError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                info!("no checkpoint for {} at {}, starting fresh", self.name, self.path.display());
                self.initialize();
                false
            }
            Err(err) => {
                warn!("{}; starting {} fresh", err, self.name);
                self.initialize();
                false
            }
        }
    }

    fn read_checkpoint(&self) -> Result<Network, CheckpointError> {
        let bytes = fs::read(&self.path).map_err(|source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        })?;
        let network: Network = bincode::deserialize(&bytes).map_err(|source| CheckpointError::Codec {
            path: self.path.clone(),
            source,
        })?;

        let found = (network.input_size(), network.output_size());
        if found != (self.features, self.actions) {
            return Err(CheckpointError::ShapeMismatch {
                path: self.path.clone(),
                expected: (self.features, self.actions),
                found,
            });
        }
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn config_in(dir: &Path) -> AgentConfig {
        AgentConfig {
            models_dir: dir.to_path_buf(),
            ..AgentConfig::default()
        }
    }

    fn assert_vec_approx_eq(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len(), "vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < 1e-6, "mismatch at index {}: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn test_fresh_perceptron_infers_zeros() {
        let dir = TempDir::new("perceptron").unwrap();
        let mut perceptron = Perceptron::new("network1", 16, 4, &config_in(dir.path()));

        assert_eq!(perceptron.infer(&[0.25; 16]), vec![0.0; 4]);
        assert_eq!(perceptron.checkpoint_path(), dir.path().join("network1.bin"));
    }

    #[test]
    fn test_new_and_reload_build_the_configured_network() {
        let dir = TempDir::new("perceptron").unwrap();
        let mut perceptron = Perceptron::new("network1", 9, 4, &config_in(dir.path()));
        assert_eq!(perceptron.network.layers.len(), 1);
        assert_eq!((perceptron.network.input_size(), perceptron.network.output_size()), (9, 4));

        perceptron.train_step(&[vec![1.0; 9]], &[vec![1.0, 0.0, 0.0, 0.0]]);
        assert!(!perceptron.load());
        assert_eq!(perceptron.network.layers.len(), 1);
        assert_eq!(perceptron.infer(&[1.0; 9]), vec![0.0; 4]);
    }

    #[test]
    fn test_train_step_fits_one_hot_target() {
        let dir = TempDir::new("perceptron").unwrap();
        let mut perceptron = Perceptron::new("network1", 3, 4, &config_in(dir.path()));
        let states = vec![vec![1.0, 0.0, 0.5]];
        let targets = vec![vec![0.0, 2.0, 0.0, 0.0]];

        let first = perceptron.train_step(&states, &targets);
        let mut last = first;
        for _ in 0..500 {
            last = perceptron.train_step(&states, &targets);
        }

        assert!(last < first * 0.01, "loss went from {} to {}", first, last);
        let values = perceptron.infer(&states[0]);
        assert!((values[1] - 2.0).abs() < 0.1, "{:?}", values);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let dir = TempDir::new("perceptron").unwrap();
        let mut perceptron = Perceptron::new("network1", 2, 4, &config_in(dir.path()));
        assert_eq!(perceptron.train_step(&[], &[]), 0.0);
        assert_eq!(perceptron.infer(&[1.0, 1.0]), vec![0.0; 4]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new("perceptron").unwrap();
        let config = config_in(&dir.path().join("models"));
        let state = vec![0.5, 0.25, 1.0];

        let mut original = Perceptron::new("network2", 3, 4, &config);
        original.train_step(&[state.clone()], &[vec![1.0, -1.0, 3.0, 0.0]]);
        let path = original.save().unwrap();
        assert!(path.exists());

        let mut restored = Perceptron::new("network2", 3, 4, &config);
        assert!(restored.load());
        assert_vec_approx_eq(&restored.infer(&state), &original.infer(&state));
    }

    #[test]
    fn test_load_without_checkpoint_starts_fresh() {
        let dir = TempDir::new("perceptron").unwrap();
        let mut perceptron = Perceptron::new("network1", 2, 4, &config_in(dir.path()));
        perceptron.train_step(&[vec![1.0, 1.0]], &[vec![5.0, 5.0, 5.0, 5.0]]);

        assert!(!perceptron.load());
        assert_eq!(perceptron.infer(&[1.0, 1.0]), vec![0.0; 4]);
    }

    #[test]
    fn test_load_corrupt_checkpoint_starts_fresh() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = TempDir::new("perceptron").unwrap();
        std::fs::write(dir.path().join("network1.bin"), b"not a checkpoint").unwrap();

        let mut perceptron = Perceptron::new("network1", 2, 4, &config_in(dir.path()));
        assert!(!perceptron.load());
        assert_eq!(perceptron.infer(&[1.0, 1.0]), vec![0.0; 4]);
    }

    #[test]
    fn test_load_rejects_other_shape() {
        let dir = TempDir::new("perceptron").unwrap();
        let config = config_in(dir.path());
        Perceptron::new("network1", 9, 4, &config).save().unwrap();

        let mut perceptron = Perceptron::new("network1", 16, 4, &config);
        assert!(matches!(perceptron.read_checkpoint(), Err(CheckpointError::ShapeMismatch { found: (9, 4), .. })));
        assert!(!perceptron.load());
        assert_eq!(perceptron.infer(&[0.0; 16]).len(), 4);
    }
}
