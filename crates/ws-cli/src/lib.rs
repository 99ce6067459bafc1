//! Work session tracker CLI library.
//!
//! This crate provides the CLI interface over `ws-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, SummaryArgs};
pub use config::Config;
