pub mod gan_trainer;
pub mod loss_log;
pub mod metrics;

pub use gan_trainer::{GanTrainer, StepOutcome, TrainingSummary};
pub use loss_log::{read_loss_log, LossLog, LossRecord};
pub use metrics::Accuracy;
