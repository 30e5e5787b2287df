//! Common helper functions shared across CLI commands

use crate::cli::args::ColorChoice;
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::error::ConfigError;
use std::io::IsTerminal;
use std::path::Path;

/// Process exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ISSUES: i32 = 1;
pub const EXIT_ERROR: i32 = 2;
pub const EXIT_PARSE_ERROR: i32 = 3;

/// Load the configuration for a command
///
/// An explicitly requested file must exist. Without one, `.tfpolicy.toml` in
/// the working directory is used when present, and defaults otherwise.
///
/// # Errors
///
/// Returns `ConfigError::Io` if an explicit file cannot be read.
/// Returns `ConfigError::Parse` if the file is not valid TOML.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file {} not found", path.display()),
                )));
            }
            Config::load(path)
        }
        None => Config::load_or_default(DEFAULT_CONFIG_FILE),
    }
}

/// Resolve the `--color` flag for a stream
pub(crate) fn color_choice(choice: ColorChoice, is_terminal: bool) -> termcolor::ColorChoice {
    match choice {
        ColorChoice::Always => termcolor::ColorChoice::Always,
        ColorChoice::Never => termcolor::ColorChoice::Never,
        ColorChoice::Auto if is_terminal => termcolor::ColorChoice::Auto,
        ColorChoice::Auto => termcolor::ColorChoice::Never,
    }
}

pub(crate) fn stdout_color(choice: ColorChoice) -> termcolor::ColorChoice {
    color_choice(choice, std::io::stdout().is_terminal())
}

pub(crate) fn stderr_color(choice: ColorChoice) -> termcolor::ColorChoice {
    color_choice(choice, std::io::stderr().is_terminal())
}
