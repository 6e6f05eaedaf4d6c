//! Configuration file support.
//!
//! Tracking options can be kept in an INI file with a `[tracking]` section:
//!
//! ```ini
//! [tracking]
//! update_interval_ms = 30000
//! min_distance_threshold_m = 50
//! enable_periodic_update = true
//! enable_distance_tracking = true
//! enable_high_accuracy = true
//! timeout_ms = 10000
//! maximum_age_ms = 5000
//! ```
//!
//! Missing files and missing keys fall back to the defaults.

mod file;
mod parser;
mod writer;

pub use file::{config_directory, config_file_path, load, load_from, save_to, ConfigFileError};
pub use parser::parse_ini;
pub use writer::to_ini_string;

/// INI section holding the tracking options.
pub const TRACKING_SECTION: &str = "tracking";
