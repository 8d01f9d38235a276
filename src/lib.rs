pub mod cargo;
pub mod config;
pub mod error;
pub mod git;
pub mod history;
pub mod logging;
pub mod permute;
pub mod report;
pub mod sampler;
pub mod shell;
pub mod stats;
pub mod store;
pub mod tests;
pub mod timing;
pub mod touch;

pub use error::{Error, Result};
