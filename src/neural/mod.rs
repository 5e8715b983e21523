pub mod critic;
pub mod dcgan;
pub mod dqn_output;
pub mod model_io;
pub mod pick;
pub mod qnetwork;

// Re-export key components for convenience
pub use critic::{Critic, ParamStat};
pub use dqn_output::{DqnOutput, TdErrorClip};
pub use model_io::{load_varstore, load_varstore_strict, save_varstore, LoadReport};
pub use qnetwork::QNetwork;
