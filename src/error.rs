use std::path::PathBuf;

/// Errors writing or reading perceptron checkpoints.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode or decode {path}: {source}")]
    Codec {
        path: PathBuf,
        source: bincode::Error,
    },

    #[error("checkpoint {path} holds a {found:?} network, expected {expected:?}")]
    ShapeMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors during a training run.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("failed to write statistics: {0}")]
    Stats(#[from] csv::Error),

    #[error("failed to flush statistics: {0}")]
    StatsFlush(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = CheckpointError::ShapeMismatch {
            path: PathBuf::from("models/network1.bin"),
            expected: (16, 4),
            found: (9, 4),
        };
        assert_eq!(
            err.to_string(),
            "checkpoint models/network1.bin holds a (9, 4) network, expected (16, 4)"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("agent.gamma must be in [0, 1]".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: agent.gamma must be in [0, 1]"
        );
    }

    #[test]
    fn test_training_error_wraps_checkpoint() {
        let err: TrainingError = CheckpointError::Io {
            path: PathBuf::from("models"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert_eq!(err.to_string(), "checkpoint error: I/O error on models: denied");
    }
}
