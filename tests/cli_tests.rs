//! CLI command tests

#[cfg(feature = "cli")]
mod common;

mod cli;
