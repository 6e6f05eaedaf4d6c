//! Config command - show the effective tracking options.

use std::path::PathBuf;

use geotrack::config::{config_file_path, to_ini_string};

use super::common::load_options;
use crate::error::CliError;

/// Run the config command.
pub fn run(config: Option<PathBuf>, path_only: bool) -> Result<(), CliError> {
    let path = config.clone().unwrap_or_else(config_file_path);

    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    let options = load_options(config.as_deref())?;

    if !path.exists() {
        println!("; {} not found, showing defaults", path.display());
    }
    print!("{}", to_ini_string(&options));

    Ok(())
}
