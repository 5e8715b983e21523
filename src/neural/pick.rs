//! Index-selection helpers along one axis
//!
//! `pick` takes one element per position along `axis`:
//! `output[.., j, ..] = data[.., index[.., j, ..], ..]`, dropping `axis`.
//! Gradients flow back into `data` at the picked positions only.

use tch::{Kind, Tensor};

use crate::{DemoError, Result};

/// What to do with indices outside `0..data.size()[axis]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickMode {
    /// Out-of-range indices are an error
    #[default]
    Strict,
    /// Clamp into range
    Clip,
    /// Wrap around modulo the axis length
    Wrap,
}

fn normalize_axis(axis: i64, ndim: usize) -> Result<i64> {
    let ndim = ndim as i64;
    let normalized = if axis < 0 { axis + ndim } else { axis };
    if normalized < 0 || normalized >= ndim {
        return Err(DemoError::Shape(format!(
            "axis {} out of range for a {}-d tensor",
            axis, ndim
        )));
    }
    Ok(normalized)
}

/// Pick elements of `data` along `axis` using `index`
///
/// `index` must have the shape of `data` with `axis` removed. Any numeric
/// kind is accepted and truncated to integers.
pub fn pick(data: &Tensor, index: &Tensor, axis: i64, mode: PickMode) -> Result<Tensor> {
    let data_shape = data.size();
    let axis = normalize_axis(axis, data_shape.len())?;

    let mut expected = data_shape.clone();
    let len = expected.remove(axis as usize);
    if index.size() != expected {
        return Err(DemoError::Shape(format!(
            "pick index expected shape {:?}, got {:?}",
            expected,
            index.size()
        )));
    }

    let index = index.to_device(data.device()).to_kind(Kind::Int64);
    let index = match mode {
        PickMode::Strict => {
            if index.numel() > 0 {
                let lo = index.min().int64_value(&[]);
                let hi = index.max().int64_value(&[]);
                if lo < 0 || hi >= len {
                    return Err(DemoError::Shape(format!(
                        "pick index range [{}, {}] outside axis of length {}",
                        lo, hi, len
                    )));
                }
            }
            index
        }
        PickMode::Clip => index.clamp(0i64, len - 1),
        PickMode::Wrap => index.remainder(len),
    };

    Ok(data
        .f_gather(axis, &index.unsqueeze(axis), false)?
        .squeeze_dim(axis))
}

/// Indices of the maximum values along `axis`; first occurrence wins
pub fn argmax(data: &Tensor, axis: i64, keepdims: bool) -> Result<Tensor> {
    let axis = normalize_axis(axis, data.dim())?;
    Ok(data.f_argmax(axis, keepdims)?)
}

/// Indices of the minimum values along `axis`; first occurrence wins
pub fn argmin(data: &Tensor, axis: i64, keepdims: bool) -> Result<Tensor> {
    let axis = normalize_axis(axis, data.dim())?;
    Ok(data.f_argmin(axis, keepdims)?)
}

/// Per-row argmax of a 2-d tensor
pub fn argmax_channel(data: &Tensor) -> Result<Tensor> {
    argmax(data, 1, false)
}
