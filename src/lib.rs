//! # Torch Demos Library
//!
//! Two small deep-learning programs built on `tch`.
//!
//! ## Features
//!
//! - **DQN critic**: convolutional Q-network whose output operator injects a
//!   TD-error gradient at the chosen action only
//! - **DCGAN**: generator/discriminator pair trained with alternating updates
//! - **Visualisation**: image-grid rendering of generated and real batches
//! - **Checkpoints**: portable safetensors parameter files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use torch_demos::{
//!     config::CriticConfig,
//!     neural::critic::Critic,
//! };
//!
//! let critic = Critic::new("QNet", CriticConfig::default()).unwrap();
//! critic.print_stat();
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Run configuration for both programs
pub mod config;

/// Image datasets and batch iteration
pub mod data;

/// Logger initialisation
pub mod logging;

/// Network definitions, the DQN output operator and checkpoint I/O
pub mod neural;

/// Adversarial training loop, metrics and loss logging
pub mod training;

/// Utility functions and helpers
pub mod utils;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::{CriticConfig, DatasetKind, DcganConfig};

pub use neural::*;

pub use training::*;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the library
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    #[error("Safetensors error: {0}")]
    Safetensors(#[from] safetensors::SafeTensorError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logger error: {0}")]
    Logger(#[from] flexi_logger::FlexiLoggerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DemoError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
