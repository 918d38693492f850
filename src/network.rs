pub mod tensor;
pub mod layer;
pub mod loss;
pub mod optimizer;

use tensor::Tensor;
use layer::Layer;
use loss::Loss;
use optimizer::Optimizer;

use serde::{Serialize, Deserialize};

/// Layers applied in order, trained against one loss with one optimizer.
#[derive(Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Box<dyn Layer>>,
    pub loss: Box<dyn Loss>,
    pub optimizer: Box<dyn Optimizer>
}

impl Network {
    pub fn new(layers: Vec<Box<dyn Layer>>, loss: Box<dyn Loss>, optimizer: Box<dyn Optimizer>) -> Self {
        Self {
            layers,
            loss,
            optimizer
        }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.input_size())
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.output_size())
    }

    pub fn predict(&mut self, input: &Tensor) -> Tensor {
        let mut output = input.clone();
        for layer in &mut self.layers {
            output = layer.forward(&output);
        }
        output
    }

    /// One optimizer step on the batch. Returns the loss measured before the update.
    pub fn train_on_batch(&mut self, x_batch: &Tensor, y_batch: &Tensor) -> f32 {
        let y_pred = self.predict(x_batch);
        let loss = self.loss.calculate(&y_pred, y_batch);

        let mut d_output = self.loss.gradient(&y_pred, y_batch);
        for layer in self.layers.iter_mut().rev() {
            d_output = layer.backward(&d_output);
        }
        self.optimizer.step(&mut self.layers);

        loss
    }
}
