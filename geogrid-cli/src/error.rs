//! Error handling for the GeoGrid CLI

use geogrid_core::GridError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for GeoGrid CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid argument {arg}: {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("Parsing error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn invalid_argument<A: Into<String>, S: Into<String>>(arg: A, message: S) -> Self {
        Self::InvalidArgument {
            arg: arg.into(),
            message: message.into(),
        }
    }

    pub fn parse<S: Into<String>>(file: S, message: S) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
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

        CliError::InvalidArgument { arg, .. } => {
            let hint = match arg.as_str() {
                "--center" | "--then" => "use 'lat,lng' or 'lat,lng,zoom', e.g. 48.85,2.35,12",
                "--size" => "use 'WIDTHxHEIGHT' in pixels, e.g. 1280x800",
                "--bounds" => "use 'south,west,north,east' in degrees",
                _ => "run with --help to see the expected format",
            };
            message.push_str(&format!("\n\nSuggestions:\n • {}", hint));
        }

        CliError::Parse { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Points must be a JSON array of {\"id\": ..., \"location\": {\"lat\": ..., \"lng\": ...}}\n\
                 • Use null for a point without a known location",
            );
        }

        CliError::Config { .. } | CliError::Grid(GridError::InvalidConfig { .. }) => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your geogrid.toml configuration file\n\
                 • Use 'geogrid config --example' to generate a sample configuration",
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
