//! CLI command implementations.

pub mod common;
pub mod config;
pub mod distance;
pub mod simulate;
