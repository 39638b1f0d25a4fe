//! propel-cli: Command-line interface for Propel
//!
//! Provides the `pcli` binary for logging in, managing agents, keys, seats
//! and variables, and deploying services.

pub mod commands;
pub mod output;
pub mod session;
