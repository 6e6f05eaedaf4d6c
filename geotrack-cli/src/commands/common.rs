//! Helpers shared across CLI commands.

use std::path::Path;

use geotrack::config;
use geotrack::coord::Coordinate;
use geotrack::tracking::TrackingOptions;

use crate::error::CliError;

/// Load tracking options from `path`, or the default config file.
pub fn load_options(path: Option<&Path>) -> Result<TrackingOptions, CliError> {
    let options = match path {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };
    Ok(options)
}

/// Build a coordinate from CLI arguments, rejecting out-of-range values.
pub fn parse_coordinate(lat: f64, lon: f64) -> Result<Coordinate, CliError> {
    let coord = Coordinate::new(lat, lon);
    if coord.is_valid() {
        Ok(coord)
    } else {
        Err(CliError::InvalidArgument(format!(
            "coordinate ({}, {}) is outside lat [-90, 90] / lon [-180, 180]",
            lat, lon
        )))
    }
}
