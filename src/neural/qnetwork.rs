//! Convolutional Q-network
//!
//! Stacked frames in, one Q-value per action out. The last layer feeds the
//! DQN output operator, so training never needs an explicit loss.

use tch::{nn, Tensor};

use crate::neural::dqn_output::{DqnOutput, TdErrorClip};

/// Spatial size after a valid convolution
fn conv_out(size: i64, kernel: i64, stride: i64) -> i64 {
    (size - kernel) / stride + 1
}

#[derive(Debug)]
pub struct QNetwork {
    conv1: nn::Conv2D,
    conv2: nn::Conv2D,
    fc3: nn::Linear,
    fc4: nn::Linear,
    dqn: DqnOutput,
    action_num: i64,
}

impl QNetwork {
    pub fn new(p: &nn::Path, frames: i64, frame_size: i64, action_num: i64, clip: TdErrorClip) -> Self {
        let conv1 = nn::conv2d(p / "conv1", frames, 16, 8, nn::ConvConfig { stride: 4, ..Default::default() });
        let conv2 = nn::conv2d(p / "conv2", 16, 32, 4, nn::ConvConfig { stride: 2, ..Default::default() });

        let side = conv_out(conv_out(frame_size, 8, 4), 4, 2);
        let fc3 = nn::linear(p / "fc3", 32 * side * side, 256, Default::default());
        let fc4 = nn::linear(p / "fc4", 256, action_num, Default::default());

        Self { conv1, conv2, fc3, fc4, dqn: DqnOutput::new(clip), action_num }
    }

    pub fn action_num(&self) -> i64 {
        self.action_num
    }

    pub fn dqn(&self) -> &DqnOutput {
        &self.dqn
    }

    /// Q-values of shape [batch, action_num]
    pub fn forward(&self, x: &Tensor) -> Tensor {
        let h = x.apply(&self.conv1).relu();
        let h = h.apply(&self.conv2).relu();
        let h = h.flat_view();
        let h = h.apply(&self.fc3).relu();
        self.dqn.forward(&h.apply(&self.fc4))
    }
}
