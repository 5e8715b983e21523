//! DCGAN Trainer
//!
//! Trains a generator/discriminator pair on CIFAR-10 or an image folder,
//! writing sample grids, per-epoch checkpoints and a loss log to `--outf`.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use torch_demos::config::{DatasetKind, DcganConfig, DeviceConfig};
use torch_demos::data::ImageDataset;
use torch_demos::logging::setup_logging;
use torch_demos::training::GanTrainer;
use torch_demos::utils::seed_everything;

#[derive(Parser, Debug)]
#[command(name = "train-dcgan", about = "Train a DCGAN on 64x64 images")]
struct Args {
    /// Dataset to use
    #[arg(long, value_enum, default_value = "cifar10")]
    dataset: DatasetKind,

    /// Dataset root (CIFAR-10 binary directory or image folder)
    #[arg(long, default_value = "data/cifar10")]
    dataroot: PathBuf,

    /// Input batch size
    #[arg(long, default_value_t = 64)]
    batch_size: i64,

    /// Height / width of the images fed to the discriminator
    #[arg(long, default_value_t = 64)]
    image_size: i64,

    /// Size of the latent z vector
    #[arg(long, default_value_t = 100)]
    nz: i64,

    #[arg(long, default_value_t = 64)]
    ngf: i64,

    #[arg(long, default_value_t = 64)]
    ndf: i64,

    /// Number of epochs to train for
    #[arg(long, default_value_t = 25)]
    niter: usize,

    /// Learning rate
    #[arg(long, default_value_t = 0.0002)]
    lr: f64,

    /// Beta1 for Adam
    #[arg(long, default_value_t = 0.5)]
    beta1: f64,

    /// Enable CUDA
    #[arg(long, default_value_t = false)]
    cuda: bool,

    /// Number of GPUs to use
    #[arg(long, default_value_t = 1)]
    ngpu: usize,

    /// Generator weights to continue training from
    #[arg(long, default_value = "")]
    net_g: String,

    /// Discriminator weights to continue training from
    #[arg(long, default_value = "")]
    net_d: String,

    /// Folder for images, checkpoints and logs
    #[arg(long, default_value = "./results")]
    outf: PathBuf,

    /// Manual seed
    #[arg(long)]
    manual_seed: Option<i64>,

    /// Save checkpoints at each epoch
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    check_point: bool,

    /// Iterations between sample grids
    #[arg(long, default_value_t = 200)]
    visual_interval: usize,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<Args> for DcganConfig {
    fn from(args: Args) -> Self {
        Self {
            dataset: args.dataset,
            dataroot: args.dataroot,
            batch_size: args.batch_size,
            image_size: args.image_size,
            nz: args.nz,
            ngf: args.ngf,
            ndf: args.ndf,
            nc: 3,
            niter: args.niter,
            lr: args.lr,
            beta1: args.beta1,
            device: DeviceConfig { cuda: args.cuda, ngpu: args.ngpu },
            net_g: args.net_g,
            net_d: args.net_d,
            outf: args.outf,
            manual_seed: args.manual_seed,
            check_point: args.check_point,
            visual_interval: args.visual_interval,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    fs::create_dir_all(&args.outf)?;
    let _logger = setup_logging(&args.log_level, Some(&args.outf))?;
    log::info!("{:?}", args);

    let mut config = DcganConfig::from(args);
    config.manual_seed = Some(seed_everything(config.manual_seed));
    config.validate()?;

    let dataset = ImageDataset::load(config.dataset, &config.dataroot, config.image_size)?;
    let mut trainer = GanTrainer::new(config)?;
    let summary = trainer.train(&dataset)?;

    log::info!(
        "Done: {} epochs, {} iterations, final D loss {:.6}, final G loss {:.6}",
        summary.epochs,
        summary.iterations,
        summary.final_loss_d,
        summary.final_loss_g
    );
    Ok(())
}
