//! CLI subcommand implementations.

pub mod render;
pub mod replay;
pub mod summary;
pub mod util;
