//! Critic: a Q-network together with its optimizer
//!
//! Wraps inference, one-step TD training through the DQN output operator,
//! target-network synchronisation, parameter statistics and checkpoints.

use std::path::Path;

use tch::nn::OptimizerConfig;
use tch::{nn, Kind, Tensor};

use crate::config::CriticConfig;
use crate::neural::model_io::{load_varstore_strict, save_varstore};
use crate::neural::pick::argmax_channel;
use crate::neural::qnetwork::QNetwork;
use crate::{DemoError, Result};

/// Summary of one parameter tensor
#[derive(Debug, Clone, PartialEq)]
pub struct ParamStat {
    pub name: String,
    pub shape: Vec<i64>,
    pub mean: f64,
    pub std: f64,
}

pub struct Critic {
    name: String,
    config: CriticConfig,
    vs: nn::VarStore,
    net: QNetwork,
    optimizer: nn::Optimizer,
}

impl Critic {
    pub fn new(name: &str, config: CriticConfig) -> Result<Self> {
        config.validate()?;
        let device = config.device.device();
        log::debug!("Building critic {} on {:?}: {:?}", name, device, config);

        let vs = nn::VarStore::new(device);
        let net = QNetwork::new(&vs.root(), config.frames, config.frame_size, config.action_num, config.clip);
        let optimizer = nn::Sgd { wd: config.wd, ..Default::default() }.build(&vs, config.lr)?;

        Ok(Self { name: name.to_string(), config, vs, net, optimizer })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CriticConfig {
        &self.config
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    fn check_data(&self, data: &Tensor) -> Result<()> {
        let size = data.size();
        let c = &self.config;
        if size.len() != 4 || size[1] != c.frames || size[2] != c.frame_size || size[3] != c.frame_size {
            return Err(DemoError::Shape(format!(
                "critic {} expects (batch, {}, {}, {}) input, got {:?}",
                self.name, c.frames, c.frame_size, c.frame_size, size
            )));
        }
        Ok(())
    }

    /// Q-values for a batch of states, without gradient tracking
    pub fn calc_score(&self, data: &Tensor) -> Result<Tensor> {
        self.check_data(data)?;
        let data = data.to_device(self.vs.device()).to_kind(Kind::Float);
        Ok(tch::no_grad(|| self.net.forward(&data)))
    }

    /// Index of the best action for each state
    pub fn greedy_actions(&self, data: &Tensor) -> Result<Tensor> {
        argmax_channel(&self.calc_score(data)?)
    }

    /// One SGD step on a (state, action, reward) minibatch
    ///
    /// Returns the mean absolute TD error before the update.
    pub fn train_step(&mut self, data: &Tensor, action: &Tensor, reward: &Tensor) -> Result<f64> {
        self.check_data(data)?;
        let device = self.vs.device();
        let data = data.to_device(device).to_kind(Kind::Float);
        let batch = data.size()[0] as f64;
        let scale = self.config.rescale_grad();

        self.optimizer.zero_grad();
        let q = self.net.forward(&data);
        let grad = self.net.dqn().backward(&q, action, reward, scale)?;
        self.optimizer.step();

        // grad holds scale * error at the chosen actions, zero elsewhere
        let td_error = grad.abs().sum(Kind::Double).double_value(&[]) / (scale * batch);
        Ok(td_error)
    }

    /// Copy all parameters from `other`, e.g. into a target network
    pub fn sync_from(&mut self, other: &Critic) -> Result<()> {
        self.vs.copy(&other.vs)?;
        log::debug!("Critic {} synchronised from {}", self.name, other.name);
        Ok(())
    }

    pub fn param_stats(&self) -> Vec<ParamStat> {
        let mut stats: Vec<ParamStat> = self
            .vs
            .variables()
            .into_iter()
            .map(|(name, tensor)| {
                let values = tensor.detach().to_kind(Kind::Double);
                ParamStat {
                    name,
                    shape: tensor.size(),
                    mean: values.mean(Kind::Double).double_value(&[]),
                    std: if values.numel() > 1 {
                        values.std(true).double_value(&[])
                    } else {
                        0.0
                    },
                }
            })
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Log the name, shape, mean and std of every parameter
    pub fn print_stat(&self) {
        log::info!("Name: {}", self.name);
        for stat in self.param_stats() {
            log::info!(
                "  {:<12} {:?} mean={:.6} std={:.6}",
                stat.name,
                stat.shape,
                stat.mean,
                stat.std
            );
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_varstore(&self.vs, path)
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        load_varstore_strict(&mut self.vs, path)
    }
}
