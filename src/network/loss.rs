use super::tensor::Tensor;
use serde::{Serialize, Deserialize};

#[typetag::serde]
pub trait Loss {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32;
    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor;
}


// mean squared error over every element of the batch

#[derive(Serialize, Deserialize, Clone)]
pub struct MeanSquaredError;

#[typetag::serde]
impl Loss for MeanSquaredError {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32 {
        let count = y_pred.read().len();
        if count == 0 {
            return 0.0;
        }
        let squared_errors = y_pred.map2(y_true, |pred, target| (pred - target) * (pred - target));
        let total: f32 = squared_errors.read().iter().sum();
        total / count as f32
    }

    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor {
        let count = y_pred.read().len().max(1) as f32;
        y_pred.map2(y_true, move |pred, target| 2.0 * (pred - target) / count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-6, "mismatch: {} vs {}", a, b);
    }

    #[test]
    fn test_mse_matches_reduce_mean() {
        // two rows of action values against one-hot targets
        let y_pred = Tensor::from_vec(vec![1.0, 0.0, 0.0, 2.0], vec![2, 2]);
        let y_true = Tensor::from_vec(vec![3.0, 0.0, 0.0, 0.0], vec![2, 2]);

        // (4 + 0 + 0 + 4) / 4
        assert_approx_eq(MeanSquaredError.calculate(&y_pred, &y_true), 2.0);
    }

    #[test]
    fn test_mse_gradient() {
        let y_pred = Tensor::from_vec(vec![1.0, 0.0, 0.0, 2.0], vec![2, 2]);
        let y_true = Tensor::from_vec(vec![3.0, 0.0, 0.0, 0.0], vec![2, 2]);

        let gradient = MeanSquaredError.gradient(&y_pred, &y_true);
        let expected = [-1.0, 0.0, 0.0, 1.0];
        for (g, e) in gradient.read().iter().zip(expected) {
            assert_approx_eq(*g, e);
        }
    }

    #[test]
    fn test_mse_empty_batch() {
        let empty = Tensor::zeros(vec![0, 4]);
        assert_eq!(MeanSquaredError.calculate(&empty, &empty), 0.0);
    }
}
