use super::layer::{Layer, Linear};
use super::tensor::Tensor;
use serde::{Serialize, Deserialize};

#[typetag::serde]
pub trait Optimizer {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]);
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn build(self, learning_rate: f32) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate)),
            OptimizerKind::Sgd => Box::new(SGD::new(learning_rate)),
        }
    }
}


// SGD

#[derive(Serialize, Deserialize, Clone)]
pub struct SGD {
    learning_rate: f32
}

impl SGD {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate
        }
    }
}

#[typetag::serde]
impl Optimizer for SGD {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        let learning_rate = self.learning_rate;
        for layer in layers {
            if let Some(linear) = layer.as_any_mut().downcast_mut::<Linear>() {
                if let Some(d_weights) = linear.d_weights.take() {
                    linear.weights = linear.weights.map2(&d_weights, |w, dw| w - learning_rate * dw);
                }
            }
        }
    }
}


// Adam, bias-corrected step size folded into the learning rate

/// Moment estimates are kept per layer index and travel with checkpoints.
#[derive(Serialize, Deserialize, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    steps: i32,
    moments: Vec<Option<(Tensor, Tensor)>>
}

impl Adam {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            steps: 0,
            moments: Vec::new()
        }
    }
}

#[typetag::serde]
impl Optimizer for Adam {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        self.steps += 1;
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let step_size = self.learning_rate * (1.0 - beta2.powi(self.steps)).sqrt() / (1.0 - beta1.powi(self.steps));

        if self.moments.len() < layers.len() {
            self.moments.resize(layers.len(), None);
        }

        for (layer, moments) in layers.iter_mut().zip(self.moments.iter_mut()) {
            let Some(linear) = layer.as_any_mut().downcast_mut::<Linear>() else {
                continue;
            };
            let Some(grad) = linear.d_weights.take() else {
                continue;
            };

            let (m, v) = moments.get_or_insert_with(|| {
                (Tensor::zeros(grad.shape.clone()), Tensor::zeros(grad.shape.clone()))
            });
            *m = m.map2(&grad, |m, g| beta1 * m + (1.0 - beta1) * g);
            *v = v.map2(&grad, |v, g| beta2 * v + (1.0 - beta2) * g * g);

            let update = m.map2(v, |m, v| step_size * m / (v.sqrt() + epsilon));
            linear.weights = linear.weights.map2(&update, |w, u| w - u);
        }
    }
}
