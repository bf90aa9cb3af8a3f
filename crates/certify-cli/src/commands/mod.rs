//! CLI subcommands.

pub mod batch;
pub mod certificate;
pub mod config;
pub mod process;
