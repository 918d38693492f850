/// One step of play: the features seen, the action taken, and the reward it earned.
#[derive(Clone, Debug, PartialEq)]
pub struct Episode {
    pub state: Vec<f32>,
    pub action: usize,
    pub reward: f32
}

impl Episode {
    pub fn new(state: Vec<f32>, action: usize, reward: f32) -> Self {
        Self {
            state,
            action,
            reward
        }
    }
}
