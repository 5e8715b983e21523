//! DCGAN adversarial training
//!
//! Each minibatch runs one discriminator update on a real batch and a
//! detached fake batch, then one generator update that reuses the same fake
//! batch with gradients flowing back into the generator.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use tch::nn::{ModuleT, OptimizerConfig};
use tch::{nn, Device, Kind, Tensor};

use crate::config::DcganConfig;
use crate::data::{BatchIter, ImageDataset};
use crate::neural::dcgan::{discriminator, generator};
use crate::neural::model_io::{load_varstore_strict, save_varstore};
use crate::training::loss_log::{LossLog, LossRecord};
use crate::training::metrics::Accuracy;
use crate::utils::image::visual;
use crate::{DemoError, Result};

/// Losses of one minibatch and the fake images it produced
#[derive(Debug)]
pub struct StepOutcome {
    pub loss_d: f64,
    pub loss_g: f64,
    pub fake: Tensor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub epochs: usize,
    pub iterations: usize,
    pub final_loss_d: f64,
    pub final_loss_g: f64,
}

#[derive(Debug)]
pub struct GanTrainer {
    config: DcganConfig,
    device: Device,
    vs_g: nn::VarStore,
    vs_d: nn::VarStore,
    net_g: nn::SequentialT,
    net_d: nn::SequentialT,
    opt_g: nn::Optimizer,
    opt_d: nn::Optimizer,
    metric: Accuracy,
    iter: usize,
}

impl GanTrainer {
    pub fn new(config: DcganConfig) -> Result<Self> {
        config.validate()?;
        let device = config.device.device();
        log::info!("🧠 Building DCGAN on {:?} (nz={}, ngf={}, ndf={})", device, config.nz, config.ngf, config.ndf);

        let mut vs_g = nn::VarStore::new(device);
        let mut vs_d = nn::VarStore::new(device);
        let net_g = generator(&vs_g.root(), config.nz, config.ngf, config.nc);
        let net_d = discriminator(&vs_d.root(), config.nc, config.ndf);

        if !config.net_g.is_empty() {
            log::info!("📂 Resuming generator from {}", config.net_g);
            load_varstore_strict(&mut vs_g, &config.net_g)?;
        }
        if !config.net_d.is_empty() {
            log::info!("📂 Resuming discriminator from {}", config.net_d);
            load_varstore_strict(&mut vs_d, &config.net_d)?;
        }

        let adam = || nn::Adam { beta1: config.beta1, ..Default::default() };
        let opt_g = adam().build(&vs_g, config.lr)?;
        let opt_d = adam().build(&vs_d, config.lr)?;

        Ok(Self {
            config,
            device,
            vs_g,
            vs_d,
            net_g,
            net_d,
            opt_g,
            opt_d,
            metric: Accuracy::new(),
            iter: 0,
        })
    }

    pub fn config(&self) -> &DcganConfig {
        &self.config
    }

    pub fn generator_store(&self) -> &nn::VarStore {
        &self.vs_g
    }

    pub fn discriminator_store(&self) -> &nn::VarStore {
        &self.vs_d
    }

    pub fn metric(&self) -> &Accuracy {
        &self.metric
    }

    /// Whether either network started from a saved checkpoint
    pub fn is_resumed(&self) -> bool {
        !self.config.net_g.is_empty() || !self.config.net_d.is_empty()
    }

    /// Iterations run so far, across epochs
    pub fn iteration(&self) -> usize {
        self.iter
    }

    fn noise(&self, batch: i64) -> Tensor {
        Tensor::randn([batch, self.config.nz, 1, 1], (Kind::Float, self.device))
    }

    fn discriminate(&self, images: &Tensor, batch: i64) -> Tensor {
        self.net_d.forward_t(images, true).view([batch, 2])
    }

    /// One discriminator update followed by one generator update
    pub fn step(&mut self, real: &Tensor) -> Result<StepOutcome> {
        let size = real.size();
        let expected = [self.config.nc, self.config.image_size, self.config.image_size];
        if size.len() != 4 || size[1..] != expected {
            return Err(DemoError::Shape(format!(
                "expected (batch, {}, {}, {}) real images, got {:?}",
                expected[0], expected[1], expected[2], size
            )));
        }
        let batch = size[0];
        let real = real.to_device(self.device).to_kind(Kind::Float);
        let real_label = Tensor::ones([batch], (Kind::Int64, self.device));
        let fake_label = Tensor::zeros([batch], (Kind::Int64, self.device));

        // (1) update D: maximize log(D(x)) + log(1 - D(G(z)))
        let output = self.discriminate(&real, batch);
        let err_d_real = output.cross_entropy_for_logits(&real_label);
        self.metric.update(&real_label, &output)?;

        let fake = self.net_g.forward_t(&self.noise(batch), true);
        let output = self.discriminate(&fake.detach(), batch);
        let err_d_fake = output.cross_entropy_for_logits(&fake_label);
        self.metric.update(&fake_label, &output)?;

        let err_d = err_d_real + err_d_fake;
        self.opt_d.zero_grad();
        err_d.f_backward()?;
        self.opt_d.step();

        // (2) update G: maximize log(D(G(z))) on the same fake batch
        let output = self.discriminate(&fake, batch);
        let err_g = output.cross_entropy_for_logits(&real_label);
        self.opt_g.zero_grad();
        err_g.f_backward()?;
        self.opt_g.step();

        Ok(StepOutcome {
            loss_d: err_d.double_value(&[]),
            loss_g: err_g.double_value(&[]),
            fake: fake.detach(),
        })
    }

    fn output_path(&self, file: String) -> PathBuf {
        self.config.outf.join(file)
    }

    /// Save both networks, tagged with `epoch` or as the final pair
    pub fn save_checkpoint(&self, epoch: Option<usize>) -> Result<(PathBuf, PathBuf)> {
        let (g, d) = match epoch {
            Some(e) => (
                self.output_path(format!("generator_epoch_{}.params", e)),
                self.output_path(format!("discriminator_epoch_{}.params", e)),
            ),
            None => (
                self.output_path("generator.params".to_string()),
                self.output_path("discriminator.params".to_string()),
            ),
        };
        save_varstore(&self.vs_g, &g)?;
        save_varstore(&self.vs_d, &d)?;
        log::info!("💾 Saved {} and {}", g.display(), d.display());
        Ok((g, d))
    }

    /// Run `niter` epochs over `dataset`
    pub fn train(&mut self, dataset: &ImageDataset) -> Result<TrainingSummary> {
        fs::create_dir_all(&self.config.outf)?;
        self.config.save_json(self.output_path("config.json".to_string()))?;
        let log_path = self.output_path("training_log.csv".to_string());
        let mut loss_log = if self.is_resumed() {
            LossLog::open_append(log_path)?
        } else {
            LossLog::create(log_path)?
        };

        let mut batches = BatchIter::new(dataset, self.config.batch_size);
        if batches.batches_per_epoch() == 0 {
            return Err(DemoError::Data(format!(
                "dataset of {} images is smaller than one batch of {}",
                dataset.len(),
                self.config.batch_size
            )));
        }

        log::info!("Training... ({} batches per epoch)", batches.batches_per_epoch());
        let mut summary = TrainingSummary {
            epochs: 0,
            iterations: 0,
            final_loss_d: f64::NAN,
            final_loss_g: f64::NAN,
        };

        for epoch in 0..self.config.niter {
            let tic = Instant::now();
            batches.reset();

            for real in batches.by_ref() {
                let real = real?;
                let outcome = self.step(&real)?;
                let (_, acc) = self.metric.get();
                log::info!(
                    "discriminator loss = {:.6}, generator loss = {:.6}, binary training acc = {:.6} at iter {} epoch {}",
                    outcome.loss_d,
                    outcome.loss_g,
                    acc,
                    self.iter,
                    epoch
                );
                loss_log.append(&LossRecord::now(epoch, self.iter, outcome.loss_d, outcome.loss_g, acc))?;

                if self.iter % self.config.visual_interval == 0 {
                    visual("gout", &outcome.fake, self.output_path(format!("fake_img_iter_{}.png", self.iter)))?;
                    visual("data", &real, self.output_path(format!("real_img_iter_{}.png", self.iter)))?;
                }

                summary.final_loss_d = outcome.loss_d;
                summary.final_loss_g = outcome.loss_g;
                self.iter += 1;
            }

            let (name, acc) = self.metric.get();
            self.metric.reset();
            log::info!("binary training acc at epoch {}: {}={:.6}", epoch, name, acc);
            log::info!("time: {:.3}s", tic.elapsed().as_secs_f64());
            loss_log.flush()?;

            if self.config.check_point {
                self.save_checkpoint(Some(epoch))?;
            }
            summary.epochs = epoch + 1;
        }

        self.save_checkpoint(None)?;
        summary.iterations = self.iter;
        log::info!("🎉 Training complete after {} iterations", self.iter);
        Ok(summary)
    }
}
