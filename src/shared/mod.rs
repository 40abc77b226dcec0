//! Helpers shared by the builder and the command line

pub mod glob;
