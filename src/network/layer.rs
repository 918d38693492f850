use super::tensor::Tensor;
use std::any::Any;
use serde::{Serialize, Deserialize};

#[typetag::serde]
pub trait Layer {
    fn forward(&mut self, input: &Tensor) -> Tensor;
    fn backward(&mut self, d_output: &Tensor) -> Tensor;
    fn input_size(&self) -> usize;
    fn output_size(&self) -> usize;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn as_any(&self) -> &dyn Any;
}


// how fresh weights are drawn
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum WeightInit {
    Zeros,
    Normal,
}


// linear layer, y = x @ W

/// Bias-free fully connected layer. The perceptron's only layer.
#[derive(Serialize, Deserialize, Clone)]
pub struct Linear {
    pub weights: Tensor,
    #[serde(skip)]
    cached_input: Option<Tensor>,
    #[serde(skip)]
    pub d_weights: Option<Tensor>
}

impl Linear {
    pub fn new(input_size: usize, output_size: usize, init: WeightInit, std: f32) -> Self {
        let shape = vec![input_size, output_size];
        let weights = match init {
            WeightInit::Zeros => Tensor::zeros(shape),
            WeightInit::Normal => Tensor::random_normal(shape, std),
        };
        Self {
            weights,
            cached_input: None,
            d_weights: None
        }
    }
}

#[typetag::serde]
impl Layer for Linear {
    fn forward(&mut self, input: &Tensor) -> Tensor {
        self.cached_input = Some(input.clone());
        input.matmul(&self.weights)
    }

    fn backward(&mut self, d_output: &Tensor) -> Tensor {
        let cached_input = self.cached_input.as_ref().expect("complete forward pass first.");

        // dL/dW = input.T @ dL/dY
        self.d_weights = Some(cached_input.transpose().matmul(d_output));

        // dL/dX = dL/dY @ W.T
        d_output.matmul(&self.weights.transpose())
    }

    fn input_size(&self) -> usize {
        self.weights.rows()
    }

    fn output_size(&self) -> usize {
        self.weights.cols()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
