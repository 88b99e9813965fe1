//! CLI tests module

#[cfg(feature = "cli")]
pub mod command_tests;
#[cfg(feature = "cli")]
pub mod run_tests;
