//! Image loading and minibatch iteration for the DCGAN trainer

pub mod batch_iter;
pub mod image_dataset;

pub use batch_iter::BatchIter;
pub use image_dataset::{list_images, ImageDataset};
