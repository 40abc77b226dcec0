//! Command implementations for lintpass CLI
//!
//! Each command is organized into its own module.

pub mod check;
pub mod config;
