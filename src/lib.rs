//! Attendance defaulters reporting.
//!
//! Loads defaulter lists and attendance records exported by the monitoring
//! API, classifies every entity into a red/orange/yellow/green tier, groups
//! them by a level of the state → region → old group → group → district
//! hierarchy, and writes CSV, tab-separated, HTML and JSON reports.
pub mod config;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod html;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod status;
pub mod types;
pub mod util;

pub use error::{ReportError, Result};
