//! Error values the `sochi` binary prints before exiting.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::SochiError;

#[derive(Debug, Error)]
pub enum CliError {
    /// A file the command itself opens, e.g. the CSV export target.
    #[error("cannot {operation} '{}': {source}. {}", .path.display(), io_hint(.source))]
    File {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A library call failed; the message carries a hint for the variant.
    #[error("{context}: {}", cli_hint(.source))]
    Sochi {
        context: &'static str,
        #[source]
        source: SochiError,
    },
    /// Bad flag combination or argument value.
    #[error("{0}")]
    Usage(String),
}

/// Suggestion for an I/O failure on a user-supplied path.
pub fn io_hint(err: &io::Error) -> &'static str {
    match err.kind() {
        io::ErrorKind::NotFound => "Check that the directory exists.",
        io::ErrorKind::PermissionDenied => "Check the permissions of the target.",
        io::ErrorKind::WriteZero => "The disk may be full.",
        _ if err.raw_os_error() == Some(28) => "The disk may be full.",
        _ => "Check the path and free disk space.",
    }
}

pub fn io_cli_error(operation: &'static str, path: &Path, source: io::Error) -> CliError {
    CliError::File {
        operation,
        path: path.to_path_buf(),
        source,
    }
}

pub fn usage_error(msg: impl Into<String>) -> CliError {
    CliError::Usage(msg.into())
}

pub fn sochi_cli_error(context: &'static str, source: SochiError) -> CliError {
    CliError::Sochi { context, source }
}

/// Return an actionable hint for an error variant.
pub fn cli_hint(err: &SochiError) -> String {
    use SochiError::*;
    match err {
        InvalidInput(msg) => format!("{msg}. Check the input data."),
        DataUnavailable(msg) => format!("{msg}. Is the catalog present and readable?"),
        Conflict(msg) => format!("{msg}. A record with the same key already exists."),
        NotFound(msg) => format!("{msg}. Check the id and the configured directories."),
        Config(msg) => format!("{msg}. Invalid configuration."),
        Io(io) => format!("{io}"),
        Json(e) => format!("{e}. The JSON file is malformed."),
        Csv(e) => format!("{e}"),
    }
}
