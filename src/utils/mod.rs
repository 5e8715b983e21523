pub mod image;
pub mod seed;

pub use image::{grid_side, image_grid, visual};
pub use seed::seed_everything;
