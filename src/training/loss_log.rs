//! CSV log of per-iteration GAN losses
//!
//! Format: timestamp,epoch,iter,loss_d,loss_g,accuracy

use std::fs::{File, OpenOptions};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossRecord {
    pub timestamp: String,
    pub epoch: usize,
    pub iter: usize,
    pub loss_d: f64,
    pub loss_g: f64,
    pub accuracy: f64,
}

impl LossRecord {
    pub fn now(epoch: usize, iter: usize, loss_d: f64, loss_g: f64, accuracy: f64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            epoch,
            iter,
            loss_d,
            loss_g,
            accuracy,
        }
    }
}

pub struct LossLog {
    writer: csv::Writer<File>,
}

impl LossLog {
    /// Create (truncate) the log file and write its header
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let writer = csv::Writer::from_path(path)?;
        Ok(Self { writer })
    }

    /// Continue an existing log without repeating its header
    ///
    /// Falls back to [`LossLog::create`] when there is nothing to continue.
    pub fn open_append<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let has_content = path.metadata().map(|m| m.len() > 0).unwrap_or(false);
        if !has_content {
            return Self::create(path);
        }
        let file = OpenOptions::new().append(true).open(path)?;
        let writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        Ok(Self { writer })
    }

    pub fn append(&mut self, record: &LossRecord) -> Result<()> {
        self.writer.serialize(record)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Read a log back, e.g. for plotting
pub fn read_loss_log<P: AsRef<Path>>(path: P) -> Result<Vec<LossRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_survive_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training_log.csv");

        let mut log = LossLog::create(&path).unwrap();
        log.append(&LossRecord::now(0, 0, 1.4, 0.7, 0.5)).unwrap();
        log.append(&LossRecord::now(0, 1, 1.2, 0.9, 0.625)).unwrap();
        log.flush().unwrap();

        let records = read_loss_log(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].iter, 1);
        assert_eq!(records[1].accuracy, 0.625);

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("timestamp,epoch,iter,loss_d,loss_g,accuracy"));
    }

    #[test]
    fn test_open_append_keeps_previous_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training_log.csv");

        let mut log = LossLog::create(&path).unwrap();
        log.append(&LossRecord::now(0, 0, 1.4, 0.7, 0.5)).unwrap();
        log.flush().unwrap();
        drop(log);

        let mut log = LossLog::open_append(&path).unwrap();
        log.append(&LossRecord::now(0, 0, 1.1, 0.8, 0.75)).unwrap();
        log.flush().unwrap();

        let records = read_loss_log(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].loss_d, 1.4);
        assert_eq!(records[1].loss_d, 1.1);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("timestamp").count(), 1);
    }

    #[test]
    fn test_open_append_creates_missing_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.csv");
        let mut log = LossLog::open_append(&path).unwrap();
        log.append(&LossRecord::now(0, 0, 1.0, 1.0, 0.5)).unwrap();
        log.flush().unwrap();
        assert_eq!(read_loss_log(&path).unwrap().len(), 1);
    }
}
