//! Error handling for the flatmask CLI

use flatmask_core::{OverlayError, TileError};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for flatmask CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid polygon '{polygon}': {message}")]
    Polygon { polygon: String, message: String },

    #[error("Tile production failed: {message}")]
    Tile { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn polygon<S: Into<String>, M: Into<String>>(polygon: S, message: M) -> Self {
        Self::Polygon {
            polygon: polygon.into(),
            message: message.into(),
        }
    }

    pub fn tile<S: Into<String>>(message: S) -> Self {
        Self::Tile { message: message.into() }
    }

    pub fn export<S: Into<String>>(message: S) -> Self {
        Self::Export { message: message.into() }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(format!("TOML serialization error: {}", err))
    }
}

impl From<OverlayError> for CliError {
    fn from(err: OverlayError) -> Self {
        Self::config(err.to_string())
    }
}

impl From<TileError> for CliError {
    fn from(err: TileError) -> Self {
        Self::tile(err.to_string())
    }
}

impl From<image::ImageError> for CliError {
    fn from(err: image::ImageError) -> Self {
        Self::export(err.to_string())
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Ensure you have read permissions for the file",
                path.display()
            ));
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your flatmask.toml configuration file\n\
                 • Use 'flatmask example-config' to generate a sample configuration\n\
                 • Every [[polygons]] entry needs a height and at least 3 vertices",
            );
        }

        CliError::Polygon { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Vertices are [longitude, latitude] pairs in degrees\n\
                 • Explicit indices must come in groups of 3 and reference existing vertices\n\
                 • Drop the indices to triangulate the outline automatically",
            );
        }

        CliError::Tile { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Re-run with -vv to see per-tile worker logs\n\
                 • Reduce the number of worker threads with --threads",
            );
        }

        CliError::Validation { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Rectangle bounds are degrees with west < east and south < north\n\
                 • Screen sizes must be positive",
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}
