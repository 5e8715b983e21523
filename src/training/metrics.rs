//! Classification accuracy accumulated over many batches

use tch::{Kind, Tensor};

use crate::neural::pick::argmax_channel;
use crate::{DemoError, Result};

#[derive(Debug, Default, Clone)]
pub struct Accuracy {
    correct: i64,
    total: i64,
}

impl Accuracy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count rows of `outputs` (batch, classes) whose argmax equals `labels`
    pub fn update(&mut self, labels: &Tensor, outputs: &Tensor) -> Result<()> {
        let predicted = argmax_channel(outputs)?;
        let labels = labels.to_device(predicted.device()).to_kind(Kind::Int64);
        if labels.size() != predicted.size() {
            return Err(DemoError::Shape(format!(
                "accuracy labels {:?} do not match predictions {:?}",
                labels.size(),
                predicted.size()
            )));
        }
        self.correct += predicted.eq_tensor(&labels).sum(Kind::Int64).int64_value(&[]);
        self.total += labels.numel() as i64;
        Ok(())
    }

    /// Samples counted since the last reset
    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn correct(&self) -> i64 {
        self.correct
    }

    /// `("accuracy", value)`; NaN before any update
    pub fn get(&self) -> (&'static str, f64) {
        let value = if self.total == 0 {
            f64::NAN
        } else {
            self.correct as f64 / self.total as f64
        };
        ("accuracy", value)
    }

    pub fn reset(&mut self) {
        self.correct = 0;
        self.total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_across_updates() {
        let mut metric = Accuracy::new();
        assert!(metric.get().1.is_nan());

        let outputs = Tensor::from_slice(&[0.1f32, 0.9, 0.8, 0.2]).view([2, 2]);
        metric.update(&Tensor::from_slice(&[1.0f32, 1.0]), &outputs).unwrap();
        metric.update(&Tensor::from_slice(&[1i64, 0]), &outputs).unwrap();

        let (name, value) = metric.get();
        assert_eq!(name, "accuracy");
        assert!((value - 0.75).abs() < 1e-12);

        metric.reset();
        assert!(metric.get().1.is_nan());
    }

    #[test]
    fn test_int_labels_against_known_outputs() {
        let mut metric = Accuracy::new();
        // predictions: 2, 0, 1
        let outputs = Tensor::from_slice(&[0.1f32, 0.2, 0.7, 0.9, 0.05, 0.05, 0.3, 0.6, 0.1]).view([3, 3]);
        metric.update(&Tensor::from_slice(&[2i64, 1, 1]), &outputs).unwrap();

        assert_eq!(metric.correct(), 2);
        assert_eq!(metric.total(), 3);
        assert!((metric.get().1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_mismatched_labels() {
        let mut metric = Accuracy::new();
        let outputs = Tensor::zeros([3, 2], tch::kind::FLOAT_CPU);
        assert!(metric.update(&Tensor::from_slice(&[1i64, 0]), &outputs).is_err());
    }
}
