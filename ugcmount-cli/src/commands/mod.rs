//! Subcommand implementations.

pub mod check;
pub mod common;
pub mod mount;
pub mod scan;
