//! Polyshape Admin - Command-line interface for the Polyshape content API
//!
//! This crate provides the CLI application that ties together all Polyshape components.

pub mod config;
pub mod progress;
pub mod render;
pub mod shell;

pub use config::{CollectionArg, Command, Config, RecordArgs};
pub use shell::{Shell, ShellExit};
