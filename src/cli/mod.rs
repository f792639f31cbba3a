//! CLI command handlers

pub mod commands;

pub use commands::{classify, import, preview, verify};
