//! CLI support for car-listing-cli

pub mod commands;
pub mod error;
pub mod logging;
