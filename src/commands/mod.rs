//! # CLI Subcommands
//!
//! Contains modules that run the subcommands.

pub mod convert;
pub mod uef;
pub mod completions;

const RCH: &str = "unreachable was reached";

#[derive(thiserror::Error,Debug)]
pub enum CommandError {
    #[error("Command could not be interpreted")]
    InvalidCommand,
    #[error("Input source could not be interpreted")]
    UnknownFormat,
    #[error("Format is not supported in this direction")]
    UnsupportedFormat,
    #[error("No files could be converted")]
    NoFilesConverted
}
