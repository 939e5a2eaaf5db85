//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the scrivener binary.

mod commands;
mod generate;
mod server;
mod suggestions;
mod write;

pub use commands::{Cli, Commands};
pub use generate::run_generate;
pub use server::{check_health, list_models};
pub use suggestions::print_suggestions;
pub use write::run_write;
