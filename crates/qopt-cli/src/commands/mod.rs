//! CLI command implementations.

pub mod common;
pub mod optimize;
pub mod stats;
pub mod version;
