//! ridesched CLI library.
//!
//! Configuration loading, secret references and the subcommands behind the
//! `ridesched` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
