//! Error handling for the qescript-cli binary.

use thiserror::Error;

/// Errors the CLI itself can raise, on top of whatever the interpreter
/// reports through [`qescript::Error`].
#[derive(Error, Debug)]
pub enum CliError {
    /// The interpreter rejected the script; already carries source name
    /// and line.
    #[error("{0}")]
    Interp(#[from] qescript::Error),

    /// A configuration file failed to load or parse.
    #[error("configuration error: {0}")]
    Config(String),

    /// A region's `--start`/`--end` bytes don't describe a valid slice.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
