//! Parameter checkpoints in safetensors format
//!
//! Checkpoints are portable across libtorch versions: every variable of a
//! `VarStore` is written under its full path name as a little-endian
//! buffer. Batch-norm running statistics are part of the store and are
//! saved alongside the trainable weights.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use safetensors::serialize_to_file;
use tch::{nn, Kind, Tensor};

use crate::{DemoError, Result};

/// Outcome of loading a checkpoint into a store
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// Store variables absent from the file
    pub missing: Vec<String>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Save every variable of `vs` to `path`
pub fn save_varstore(vs: &nn::VarStore, path: impl AsRef<Path>) -> Result<()> {
    let mut buffers: Vec<(String, Dtype, Vec<usize>, Vec<u8>)> = Vec::new();

    for (name, tensor) in vs.variables() {
        let shape: Vec<usize> = tensor.size().iter().map(|&x| x as usize).collect();
        let (data, dtype) = tensor_to_bytes(&tensor)?;
        buffers.push((name, dtype, shape, data));
    }

    let mut views: HashMap<String, TensorView<'_>> = HashMap::new();
    for (name, dtype, shape, data) in &buffers {
        let view = TensorView::new(*dtype, shape.clone(), data)?;
        views.insert(name.clone(), view);
    }

    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    serialize_to_file(views, &None, path.as_ref())?;

    log::debug!("Saved {} tensors to {}", buffers.len(), path.as_ref().display());
    Ok(())
}

/// Copy matching tensors from `path` into `vs`
///
/// Variables missing from the file keep their current values and are listed
/// in the report. A tensor whose shape disagrees with the store is an error.
pub fn load_varstore(vs: &mut nn::VarStore, path: impl AsRef<Path>) -> Result<LoadReport> {
    let buffer = fs::read(path.as_ref())?;
    let tensors = SafeTensors::deserialize(&buffer)?;
    let mut report = LoadReport::default();

    for (name, mut var) in vs.variables() {
        let view = match tensors.tensor(&name) {
            Ok(view) => view,
            Err(_) => {
                log::warn!("Tensor '{}' not found in {}", name, path.as_ref().display());
                report.missing.push(name);
                continue;
            }
        };

        let loaded = tensor_view_to_tensor(&view)?;
        if loaded.size() != var.size() {
            return Err(DemoError::Checkpoint(format!(
                "tensor '{}' has shape {:?} in {}, expected {:?}",
                name,
                loaded.size(),
                path.as_ref().display(),
                var.size()
            )));
        }

        tch::no_grad(|| {
            var.copy_(&loaded.to_kind(var.kind()).to_device(var.device()));
        });
        report.loaded.push(name);
    }

    Ok(report)
}

/// Like [`load_varstore`] but every store variable must be present
pub fn load_varstore_strict(vs: &mut nn::VarStore, path: impl AsRef<Path>) -> Result<()> {
    let report = load_varstore(vs, path.as_ref())?;
    if !report.is_complete() {
        return Err(DemoError::Checkpoint(format!(
            "{} is missing {} tensors: {}",
            path.as_ref().display(),
            report.missing.len(),
            report.missing.join(", ")
        )));
    }
    Ok(())
}

fn tensor_to_bytes(tensor: &Tensor) -> Result<(Vec<u8>, Dtype)> {
    let tensor = tensor.to_device(tch::Device::Cpu).flatten(0, -1).contiguous();

    match tensor.kind() {
        // half precision is widened and stays f32 on disk
        Kind::Float | Kind::Half | Kind::BFloat16 => {
            let data = Vec::<f32>::try_from(&tensor.to_kind(Kind::Float))?;
            Ok((data.iter().flat_map(|x| x.to_le_bytes()).collect(), Dtype::F32))
        }
        Kind::Double => {
            let data = Vec::<f64>::try_from(&tensor)?;
            Ok((data.iter().flat_map(|x| x.to_le_bytes()).collect(), Dtype::F64))
        }
        Kind::Int => {
            let data = Vec::<i32>::try_from(&tensor)?;
            Ok((data.iter().flat_map(|x| x.to_le_bytes()).collect(), Dtype::I32))
        }
        Kind::Int64 => {
            let data = Vec::<i64>::try_from(&tensor)?;
            Ok((data.iter().flat_map(|x| x.to_le_bytes()).collect(), Dtype::I64))
        }
        kind => Err(DemoError::Checkpoint(format!("unsupported tensor kind: {:?}", kind))),
    }
}

fn tensor_view_to_tensor(view: &TensorView) -> Result<Tensor> {
    let shape: Vec<i64> = view.shape().iter().map(|&x| x as i64).collect();
    let data = view.data();

    let tensor = match view.dtype() {
        Dtype::F32 => {
            let values: Vec<f32> = data
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            Tensor::from_slice(&values)
        }
        Dtype::F64 => {
            let values: Vec<f64> = data
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect();
            Tensor::from_slice(&values)
        }
        Dtype::I32 => {
            let values: Vec<i32> = data
                .chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            Tensor::from_slice(&values)
        }
        Dtype::I64 => {
            let values: Vec<i64> = data
                .chunks_exact(8)
                .map(|c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect();
            Tensor::from_slice(&values)
        }
        other => {
            return Err(DemoError::Checkpoint(format!("unsupported dtype: {:?}", other)));
        }
    };

    Ok(tensor.reshape(&shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_save_load_restores_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linear.params");

        let vs1 = nn::VarStore::new(tch::Device::Cpu);
        let _layer = nn::linear(vs1.root() / "fc", 10, 5, Default::default());
        save_varstore(&vs1, &path).unwrap();

        let mut vs2 = nn::VarStore::new(tch::Device::Cpu);
        let _layer2 = nn::linear(vs2.root() / "fc", 10, 5, Default::default());
        let report = load_varstore(&mut vs2, &path).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.loaded.len(), 2);

        let loaded = vs2.variables();
        for (name, t1) in vs1.variables() {
            assert!(t1.allclose(&loaded[&name], 1e-6, 1e-6, false), "{} differs", name);
        }
    }

    #[test]
    fn test_missing_tensor_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.params");

        let vs1 = nn::VarStore::new(tch::Device::Cpu);
        let _layer = nn::linear(vs1.root() / "fc", 4, 2, Default::default());
        save_varstore(&vs1, &path).unwrap();

        let mut vs2 = nn::VarStore::new(tch::Device::Cpu);
        let _layer = nn::linear(vs2.root() / "fc", 4, 2, Default::default());
        let _extra = nn::linear(vs2.root() / "head", 2, 1, Default::default());

        let report = load_varstore(&mut vs2, &path).unwrap();
        assert_eq!(report.missing.len(), 2);
        assert_matches!(load_varstore_strict(&mut vs2, &path), Err(DemoError::Checkpoint(_)));
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.params");

        let vs1 = nn::VarStore::new(tch::Device::Cpu);
        let _layer = nn::linear(vs1.root() / "fc", 4, 3, Default::default());
        save_varstore(&vs1, &path).unwrap();

        let mut vs2 = nn::VarStore::new(tch::Device::Cpu);
        let _layer = nn::linear(vs2.root() / "fc", 4, 2, Default::default());
        assert_matches!(load_varstore(&mut vs2, &path), Err(DemoError::Checkpoint(_)));
    }
}
