//! DQN output operator
//!
//! Sits on top of a Q-network. The forward pass hands the Q-values through
//! untouched; the backward pass ignores any incoming gradient and injects,
//! for every example, `q[i, action[i]] - reward[i]` at the chosen action
//! and zero everywhere else. This is the gradient of half the squared TD
//! error restricted to the actions actually taken.

use serde::{Deserialize, Serialize};
use tch::{Kind, Tensor};

use crate::neural::pick::{pick, PickMode};
use crate::{DemoError, Result};

/// Treatment of the TD error term before it is injected
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub enum TdErrorClip {
    #[default]
    Unclipped,
    /// Clamp the error to `[-bound, bound]`
    Clipped(f64),
}

/// Shapes of the operator's arguments and output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DqnShapes {
    pub data: Vec<i64>,
    pub action: Vec<i64>,
    pub reward: Vec<i64>,
    pub output: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DqnOutput {
    clip: TdErrorClip,
}

impl DqnOutput {
    pub fn new(clip: TdErrorClip) -> Self {
        Self { clip }
    }

    pub fn clip(&self) -> TdErrorClip {
        self.clip
    }

    pub fn list_arguments() -> [&'static str; 3] {
        ["data", "action", "reward"]
    }

    pub fn list_outputs() -> [&'static str; 1] {
        ["output"]
    }

    /// Action and reward are one scalar per example; the output mirrors data
    pub fn infer_shape(data_shape: &[i64]) -> Result<DqnShapes> {
        if data_shape.len() != 2 {
            return Err(DemoError::Shape(format!(
                "dqn output expects (batch, action_count) data, got {:?}",
                data_shape
            )));
        }
        let batch = data_shape[0];
        Ok(DqnShapes {
            data: data_shape.to_vec(),
            action: vec![batch],
            reward: vec![batch],
            output: data_shape.to_vec(),
        })
    }

    /// Identity. The returned tensor shares storage and autograd history
    /// with `data`.
    pub fn forward(&self, data: &Tensor) -> Tensor {
        data.shallow_clone()
    }

    /// Gradient the operator injects for the given output, action and reward
    pub fn gradient(&self, output: &Tensor, action: &Tensor, reward: &Tensor) -> Result<Tensor> {
        let shapes = Self::infer_shape(&output.size())?;
        check_shape("action", &action.size(), &shapes.action)?;
        check_shape("reward", &reward.size(), &shapes.reward)?;

        let output = output.detach();
        let device = output.device();
        let action = action.to_device(device).to_kind(Kind::Int64);
        let reward = reward.to_device(device).to_kind(output.kind());

        let chosen = pick(&output, &action, 1, PickMode::Strict)?;
        let error = match self.clip {
            TdErrorClip::Unclipped => chosen - reward,
            TdErrorClip::Clipped(bound) => (chosen - reward).clamp(-bound, bound),
        };

        let index = action.view([-1, 1]);
        Ok(output
            .zeros_like()
            .f_scatter(1, &index, &error.view([-1, 1]))?)
    }

    /// Backpropagate `scale * gradient` from `output` into the graph
    ///
    /// `output` must be the tensor returned by [`DqnOutput::forward`] and
    /// must require grad.
    pub fn backward(&self, output: &Tensor, action: &Tensor, reward: &Tensor, scale: f64) -> Result<Tensor> {
        if !output.requires_grad() {
            return Err(DemoError::Shape(
                "dqn output does not require grad, nothing to backpropagate".to_string(),
            ));
        }
        let grad = self.gradient(output, action, reward)? * scale;
        // d/d(output) of sum(output * g) is g, with g held constant
        let surrogate = (output * &grad).sum(output.kind());
        surrogate.f_backward()?;
        Ok(grad)
    }
}

fn check_shape(name: &str, got: &[i64], expected: &[i64]) -> Result<()> {
    if got != expected {
        return Err(DemoError::Shape(format!(
            "dqn {} expected shape {:?}, got {:?}",
            name, expected, got
        )));
    }
    Ok(())
}
