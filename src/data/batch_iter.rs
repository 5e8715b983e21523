use tch::{Device, Kind, Tensor};

use crate::data::image_dataset::ImageDataset;
use crate::Result;

/// Shuffled fixed-size minibatches over an [`ImageDataset`]
///
/// The order is redrawn on every [`BatchIter::reset`]. A trailing batch
/// smaller than `batch_size` is dropped so every batch has the same shape.
/// Batches come out resized and scaled by [`ImageDataset::batch`].
pub struct BatchIter<'a> {
    dataset: &'a ImageDataset,
    batch_size: i64,
    order: Tensor,
    position: i64,
}

impl<'a> BatchIter<'a> {
    pub fn new(dataset: &'a ImageDataset, batch_size: i64) -> Self {
        let mut iter = Self {
            dataset,
            batch_size,
            order: Tensor::empty([0], (Kind::Int64, Device::Cpu)),
            position: 0,
        };
        iter.reset();
        iter
    }

    /// Reshuffle and rewind
    pub fn reset(&mut self) {
        self.order = Tensor::randperm(self.dataset.len(), (Kind::Int64, Device::Cpu));
        self.position = 0;
    }

    /// Number of full batches per pass
    pub fn batches_per_epoch(&self) -> i64 {
        if self.batch_size <= 0 {
            return 0;
        }
        self.dataset.len() / self.batch_size
    }
}

impl Iterator for BatchIter<'_> {
    type Item = Result<Tensor>;

    fn next(&mut self) -> Option<Result<Tensor>> {
        if self.batch_size <= 0 || self.position + self.batch_size > self.dataset.len() {
            return None;
        }
        let index = self.order.narrow(0, self.position, self.batch_size);
        self.position += self.batch_size;
        Some(self.dataset.batch(&index))
    }
}
