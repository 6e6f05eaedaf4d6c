//! Distance command - haversine distance and initial bearing.

use geotrack::coord::{distance_meters, initial_bearing};

use super::common::parse_coordinate;
use crate::error::CliError;

/// Run the distance command.
pub fn run(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<(), CliError> {
    let from = parse_coordinate(lat1, lon1)?;
    let to = parse_coordinate(lat2, lon2)?;

    let meters = distance_meters(from, to);

    println!("From:     {}", from);
    println!("To:       {}", to);
    println!("Distance: {:.2} m ({:.3} km)", meters, meters / 1000.0);
    if meters > 0.0 {
        println!("Bearing:  {:.1}°", initial_bearing(from, to));
    }

    Ok(())
}
