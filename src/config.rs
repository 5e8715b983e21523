//! Run configuration
//!
//! Plain structs with sensible defaults. The binaries map their `clap`
//! arguments into these; the DCGAN run also dumps its effective
//! configuration next to its outputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tch::Device;

use crate::neural::dqn_output::TdErrorClip;
use crate::{DemoError, Result};

/// Image source for the DCGAN trainer
#[derive(clap::ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// CIFAR-10 binary batches
    Cifar10,
    /// Any directory tree of png/jpg images
    Folder,
}

/// Device selection shared by both programs
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DeviceConfig {
    pub cuda: bool,
    pub ngpu: usize,
}

impl DeviceConfig {
    pub fn device(&self) -> Device {
        if self.cuda && self.ngpu > 0 {
            Device::cuda_if_available()
        } else {
            Device::Cpu
        }
    }
}

/// Configuration of one DCGAN training run
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DcganConfig {
    pub dataset: DatasetKind,
    pub dataroot: PathBuf,
    pub batch_size: i64,
    pub image_size: i64,
    /// Latent vector size
    pub nz: i64,
    /// Generator feature-map width
    pub ngf: i64,
    /// Discriminator feature-map width
    pub ndf: i64,
    /// Image channels
    pub nc: i64,
    /// Number of epochs
    pub niter: usize,
    pub lr: f64,
    pub beta1: f64,
    pub device: DeviceConfig,
    /// Generator weights to resume from (empty for none)
    pub net_g: String,
    /// Discriminator weights to resume from (empty for none)
    pub net_d: String,
    pub outf: PathBuf,
    pub manual_seed: Option<i64>,
    /// Save per-epoch checkpoints
    pub check_point: bool,
    /// Iterations between image grids
    pub visual_interval: usize,
}

impl Default for DcganConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetKind::Cifar10,
            dataroot: PathBuf::from("data/cifar10"),
            batch_size: 64,
            image_size: 64,
            nz: 100,
            ngf: 64,
            ndf: 64,
            nc: 3,
            niter: 25,
            lr: 0.0002,
            beta1: 0.5,
            device: DeviceConfig { cuda: false, ngpu: 1 },
            net_g: String::new(),
            net_d: String::new(),
            outf: PathBuf::from("./results"),
            manual_seed: None,
            check_point: true,
            visual_interval: 200,
        }
    }
}

impl DcganConfig {
    /// Reject values the networks cannot be built with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size < 2 {
            // batch norm needs more than one sample per channel
            return Err(DemoError::Config(format!(
                "batch_size must be at least 2, got {}",
                self.batch_size
            )));
        }
        if self.image_size != 64 {
            return Err(DemoError::Config(format!(
                "networks produce and consume 64x64 images, got image_size {}",
                self.image_size
            )));
        }
        for (name, value) in [("nz", self.nz), ("ngf", self.ngf), ("ndf", self.ndf), ("nc", self.nc)] {
            if value <= 0 {
                return Err(DemoError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if !(self.lr > 0.0) {
            return Err(DemoError::Config(format!("lr must be positive, got {}", self.lr)));
        }
        if !(0.0..1.0).contains(&self.beta1) {
            return Err(DemoError::Config(format!("beta1 must be in [0, 1), got {}", self.beta1)));
        }
        if self.visual_interval == 0 {
            return Err(DemoError::Config("visual_interval must be positive".to_string()));
        }
        Ok(())
    }

    /// Write the configuration as pretty JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Configuration of a Q-network critic
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CriticConfig {
    pub action_num: i64,
    /// Stacked input frames
    pub frames: i64,
    pub frame_size: i64,
    pub minibatch_size: i64,
    pub lr: f64,
    pub wd: f64,
    pub clip: TdErrorClip,
    pub device: DeviceConfig,
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            action_num: 4,
            frames: 4,
            frame_size: 84,
            minibatch_size: 128,
            lr: 0.01,
            wd: 0.00001,
            clip: TdErrorClip::Unclipped,
            device: DeviceConfig::default(),
        }
    }
}

impl CriticConfig {
    /// Input shape of one minibatch: (batch, frames, size, size)
    pub fn data_shape(&self) -> [i64; 4] {
        [self.minibatch_size, self.frames, self.frame_size, self.frame_size]
    }

    /// Gradients are scaled by 1 / minibatch size before the update
    pub fn rescale_grad(&self) -> f64 {
        1.0 / self.minibatch_size as f64
    }

    pub fn validate(&self) -> Result<()> {
        if self.action_num <= 0 || self.frames <= 0 || self.minibatch_size <= 0 {
            return Err(DemoError::Config(format!(
                "action_num, frames and minibatch_size must be positive, got {}, {}, {}",
                self.action_num, self.frames, self.minibatch_size
            )));
        }
        // conv1 (8/4) then conv2 (4/2) must leave at least one pixel
        if self.frame_size < 20 {
            return Err(DemoError::Config(format!(
                "frame_size must be at least 20, got {}",
                self.frame_size
            )));
        }
        if let TdErrorClip::Clipped(bound) = self.clip {
            if !(bound > 0.0) {
                return Err(DemoError::Config(format!("clip bound must be positive, got {}", bound)));
            }
        }
        Ok(())
    }
}
