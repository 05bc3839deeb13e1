//! CLI tool for exercising segment placement offline.
//!
//! Provides commands for:
//! - Simulating placement decisions against training data
//! - Evaluating a table's decay curve for one segment
//! - Computing a server's load report from its hosted segments

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
