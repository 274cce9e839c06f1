//! CLI command implementations.

pub mod pack;
pub mod size;
pub mod types;
pub mod unpack;
