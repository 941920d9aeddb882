pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod monitor;
pub mod report;
pub mod search;

pub use error::{Result, SubwatchError};
