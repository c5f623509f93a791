//! `rowseed-cli` library crate.
//!
//! Configuration, the school dataset and the exit policy live here so they
//! can be tested; the binary entrypoint lives in `main.rs`.

pub mod config;
pub mod dataset;
pub mod exit;
pub mod load;
pub mod shutdown;
