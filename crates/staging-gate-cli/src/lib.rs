//! CLI argument model for the staging deploy gate binary.
//!
//! Exposes the clap-backed `Cli` struct and the value parsers used to
//! validate its numeric flags.

pub mod cli_args;

pub use cli_args::Cli;
