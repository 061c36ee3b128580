//! `rosterpage` - Static participant list with gated PDF downloads
//!
//! This library loads registration records from a JSON file, groups them by
//! school, renders a self-contained HTML page, and models the verification
//! gate that sits in front of each school's PDF.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod logging;
pub mod render;
pub mod roster;

pub use config::Config;
pub use error::{Error, Result};
pub use gate::{GateController, GateTarget, Rejection};
pub use logging::init_logging;
pub use render::{render_data_file, render_page, write_page};
pub use roster::{group_records, load_records, RegistrationRecord, Roster};
