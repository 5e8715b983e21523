//! DQN critic inspection
//!
//! Builds a Q-network critic and its target copy, scores one minibatch of
//! random frames and prints parameter statistics. With `--train-steps` it
//! also runs TD updates on random transitions through the DQN output
//! operator.

use std::error::Error;

use clap::Parser;
use tch::{Kind, Tensor};
use torch_demos::config::{CriticConfig, DeviceConfig};
use torch_demos::logging::setup_logging;
use torch_demos::neural::{Critic, TdErrorClip};
use torch_demos::utils::seed_everything;

#[derive(Parser, Debug)]
#[command(name = "test-critic", about = "Build and inspect a DQN critic")]
struct Args {
    /// Number of actions
    #[arg(long, default_value_t = 4)]
    action_num: i64,

    #[arg(long, default_value_t = 128)]
    minibatch_size: i64,

    /// Stacked frames per state
    #[arg(long, default_value_t = 4)]
    frames: i64,

    /// Frame height and width
    #[arg(long, default_value_t = 84)]
    frame_size: i64,

    /// SGD learning rate
    #[arg(long, default_value_t = 0.01)]
    lr: f64,

    /// SGD weight decay
    #[arg(long, default_value_t = 0.00001)]
    wd: f64,

    /// Clamp the TD error to [-clip, clip]
    #[arg(long)]
    clip_error: Option<f64>,

    /// Enable CUDA
    #[arg(long, default_value_t = false)]
    cuda: bool,

    /// TD updates on random transitions
    #[arg(long, default_value_t = 0)]
    train_steps: usize,

    /// Manual seed
    #[arg(long)]
    seed: Option<i64>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<&Args> for CriticConfig {
    fn from(args: &Args) -> Self {
        Self {
            action_num: args.action_num,
            frames: args.frames,
            frame_size: args.frame_size,
            minibatch_size: args.minibatch_size,
            lr: args.lr,
            wd: args.wd,
            clip: args.clip_error.map_or(TdErrorClip::Unclipped, TdErrorClip::Clipped),
            device: DeviceConfig { cuda: args.cuda, ngpu: 1 },
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let _logger = setup_logging(&args.log_level, None)?;
    seed_everything(args.seed);

    let config = CriticConfig::from(&args);
    let mut q_net = Critic::new("QNet", config.clone())?;
    let mut target_q_net = Critic::new("Target_QNet", config.clone())?;
    target_q_net.sync_from(&q_net)?;
    log::info!("{} synchronised from {}", target_q_net.name(), q_net.name());
    target_q_net.print_stat();

    let data = Tensor::randn(config.data_shape(), (Kind::Float, tch::Device::Cpu));
    let scores = q_net.calc_score(&data)?;
    log::info!("Q-values of the first state: {:?}", Vec::<f32>::try_from(&scores.get(0).to_device(tch::Device::Cpu))?);

    for step in 0..args.train_steps {
        let data = Tensor::randn(config.data_shape(), (Kind::Float, tch::Device::Cpu));
        let action = Tensor::randint(config.action_num, [config.minibatch_size], (Kind::Int64, tch::Device::Cpu));
        let reward = Tensor::randn([config.minibatch_size], (Kind::Float, tch::Device::Cpu));
        let td_error = q_net.train_step(&data, &action, &reward)?;
        log::info!("step {}: mean |TD error| = {:.6}", step, td_error);
    }

    if args.train_steps > 0 {
        q_net.print_stat();
    } else {
        log::info!("{} unchanged since the sync", q_net.name());
    }
    Ok(())
}
