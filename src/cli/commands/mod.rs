//! CLI command implementations

#[cfg(feature = "cli")]
pub mod config;
#[cfg(feature = "cli")]
pub mod inspect;
#[cfg(feature = "cli")]
pub mod run;
#[cfg(feature = "cli")]
pub mod validate;
