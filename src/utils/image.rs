//! Tiling image batches into square grids and writing them out as PNG

use std::path::Path;

use tch::{Device, Kind, Tensor};

use crate::{DemoError, Result};

/// Cells per side of the square grid holding `count` images
pub fn grid_side(count: i64) -> i64 {
    (count as f64).sqrt().ceil() as i64
}

/// Tile a `(N, C, H, W)` batch into one `(C, n*H, n*W)` u8 image, `n = ceil(sqrt(N))`
///
/// Pixels are min-max normalised over the whole batch to `[0, 255]` and
/// clipped. Images fill the grid row by row; unused cells stay black. A
/// constant batch renders black.
pub fn image_grid(images: &Tensor) -> Result<Tensor> {
    if images.dim() != 4 {
        return Err(DemoError::Shape(format!(
            "image grid expects (N, C, H, W), got {:?}",
            images.size()
        )));
    }
    let (count, channels, height, width) = images.size4()?;
    if count == 0 {
        return Err(DemoError::Data("cannot render an empty batch".to_string()));
    }

    let images = images.detach().to_device(Device::Cpu).to_kind(Kind::Float);
    let lo = images.min().double_value(&[]);
    let hi = images.max().double_value(&[]);
    let pixels = if hi > lo {
        ((&images - lo) * (255.0 / (hi - lo))).clamp(0.0, 255.0)
    } else {
        images.zeros_like()
    };
    let pixels = pixels.to_kind(Kind::Uint8);

    let side = grid_side(count);
    let grid = Tensor::zeros([channels, side * height, side * width], (Kind::Uint8, Device::Cpu));
    for i in 0..count {
        let (row, col) = (i / side, i % side);
        let mut cell = grid.narrow(1, row * height, height).narrow(2, col * width, width);
        cell.copy_(&pixels.get(i));
    }
    Ok(grid)
}

/// Render `images` as a grid and write it to `path` (format from extension)
pub fn visual(title: &str, images: &Tensor, path: impl AsRef<Path>) -> Result<()> {
    let grid = image_grid(images)?;
    tch::vision::image::save(&grid, path.as_ref())?;
    log::debug!("{}: {} images -> {}", title, images.size()[0], path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn pixel(grid: &Tensor, c: i64, y: i64, x: i64) -> i64 {
        grid.int64_value(&[c, y, x])
    }

    #[test]
    fn test_grid_side() {
        assert_eq!(grid_side(1), 1);
        assert_eq!(grid_side(4), 2);
        assert_eq!(grid_side(5), 3);
        assert_eq!(grid_side(64), 8);
    }

    #[test]
    fn test_grid_layout_and_normalisation() {
        let images = Tensor::arange(5, (Kind::Float, Device::Cpu)).view([5, 1, 1, 1]);
        let grid = image_grid(&images).unwrap();
        assert_eq!(grid.size(), vec![1, 3, 3]);
        assert_eq!(grid.kind(), Kind::Uint8);

        let pixels = Vec::<u8>::try_from(&grid.flatten(0, -1)).unwrap();
        assert_eq!(pixels, vec![0, 63, 127, 191, 255, 0, 0, 0, 0]);
    }

    #[test]
    fn test_grid_places_multi_pixel_images() {
        let images = Tensor::arange(16, (Kind::Float, Device::Cpu)).view([4, 1, 2, 2]);
        let grid = image_grid(&images).unwrap();
        assert_eq!(grid.size(), vec![1, 4, 4]);
        // second image starts at column 2, fourth image ends bottom-right
        assert_eq!(pixel(&grid, 0, 0, 2), 68);
        assert_eq!(pixel(&grid, 0, 3, 3), 255);
        assert_eq!(pixel(&grid, 0, 0, 0), 0);
    }

    #[test]
    fn test_constant_batch_is_black() {
        let images = Tensor::ones([4, 3, 2, 2], (Kind::Float, Device::Cpu));
        let grid = image_grid(&images).unwrap();
        assert_eq!(grid.size(), vec![3, 4, 4]);
        assert_eq!(grid.sum(Kind::Int64).int64_value(&[]), 0);
    }

    #[test]
    fn test_rejects_non_batched_input() {
        let images = Tensor::ones([3, 2, 2], (Kind::Float, Device::Cpu));
        assert_matches!(image_grid(&images), Err(DemoError::Shape(_)));
    }

    #[test]
    fn test_visual_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake_img_iter_0.png");
        let images = Tensor::randn([3, 3, 8, 8], (Kind::Float, Device::Cpu));
        visual("gout", &images, &path).unwrap();
        assert!(path.exists());
    }
}
