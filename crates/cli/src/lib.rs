//! `vox` command-line client library crate.
//!
//! Re-exports the CLI modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod artifacts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod indicator;
pub mod render;
