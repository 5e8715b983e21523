//! Image datasets for the DCGAN trainer
//!
//! Pixels stay in memory as `u8` at their stored resolution. Each minibatch
//! is resized to `image_size` and mapped to `[-1, 1]`, the range of the
//! generator's tanh output, only when it is drawn.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tch::{Kind, Tensor};

use crate::config::DatasetKind;
use crate::{DemoError, Result};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug)]
pub struct ImageDataset {
    images: Tensor,
    image_size: i64,
}

impl ImageDataset {
    /// Wrap a `(N, C, H, W)` u8 tensor whose batches are served at `image_size`
    pub fn from_tensor(images: Tensor, image_size: i64) -> Result<Self> {
        if images.dim() != 4 {
            return Err(DemoError::Shape(format!(
                "dataset expects (N, C, H, W) images, got {:?}",
                images.size()
            )));
        }
        if images.kind() != Kind::Uint8 {
            return Err(DemoError::Data(format!("dataset expects u8 pixels, got {:?}", images.kind())));
        }
        if image_size <= 0 {
            return Err(DemoError::Config(format!("image_size must be positive, got {}", image_size)));
        }
        Ok(Self { images, image_size })
    }

    pub fn load(kind: DatasetKind, root: impl AsRef<Path>, image_size: i64) -> Result<Self> {
        let root = root.as_ref();
        log::info!("📂 Loading {:?} dataset from {}", kind, root.display());
        let pixels = match kind {
            DatasetKind::Cifar10 => load_cifar10(root)?,
            DatasetKind::Folder => load_folder(root, image_size)?,
        };
        let dataset = Self::from_tensor(pixels, image_size)?;
        log::info!(
            "Loaded {} images of shape {:?}, served at {}x{}",
            dataset.len(),
            &dataset.images.size()[1..],
            image_size,
            image_size
        );
        Ok(dataset)
    }

    pub fn len(&self) -> i64 {
        self.images.size()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored u8 pixels
    pub fn images(&self) -> &Tensor {
        &self.images
    }

    pub fn image_size(&self) -> i64 {
        self.image_size
    }

    /// Images at `index`, resized to `image_size` and scaled to `[-1, 1]`
    pub fn batch(&self, index: &Tensor) -> Result<Tensor> {
        let pixels = self.images.f_index_select(0, index)?;
        let unit = pixels.to_kind(Kind::Float) / 255.0;
        Ok(to_tanh_range(&resize(&unit, self.image_size)?))
    }
}

/// CIFAR-10 train split, `(50000, 3, 32, 32)` u8
fn load_cifar10(root: &Path) -> Result<Tensor> {
    let dataset = tch::vision::cifar::load_dir(root)?;
    Ok((dataset.train_images * 255.0).round().to_kind(Kind::Uint8))
}

/// Every png/jpg below `root`, decoded at `image_size` as u8
fn load_folder(root: &Path, image_size: i64) -> Result<Tensor> {
    let paths = list_images(root)?;
    if paths.is_empty() {
        return Err(DemoError::Data(format!("no images found under {}", root.display())));
    }
    log::debug!("Decoding {} images", paths.len());

    let images: Vec<Tensor> = paths
        .par_iter()
        .map(|path| {
            tch::vision::image::load_and_resize(path, image_size, image_size).map_err(|e| {
                DemoError::Data(format!("failed to load {}: {}", path.display(), e))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Tensor::stack(&images, 0).to_kind(Kind::Uint8))
}

/// Sorted image paths below `root`, searched recursively
pub fn list_images(root: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for ext in IMAGE_EXTENSIONS {
        let pattern = root.join("**").join(format!("*.{}", ext));
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern)
            .map_err(|e| DemoError::Data(format!("bad pattern {}: {}", pattern, e)))?;
        for entry in entries {
            paths.push(entry.map_err(|e| DemoError::Data(e.to_string()))?);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Bilinear resize of a `(N, C, H, W)` batch to `size x size`
pub fn resize(images: &Tensor, size: i64) -> Result<Tensor> {
    let (_, _, h, w) = images.size4()?;
    if h == size && w == size {
        return Ok(images.shallow_clone());
    }
    Ok(images.f_upsample_bilinear2d([size, size], false, None::<f64>, None::<f64>)?)
}

/// `[0, 1]` to `[-1, 1]`
pub fn to_tanh_range(images: &Tensor) -> Tensor {
    images * 2.0 - 1.0
}
