//! `gatelog` - Access logging and sensor-data processing for gated sites
//!
//! This library provides the core functionality for recording debounced QR
//! detections in an access log, uploading CSV sensor data, and computing
//! derived energy values for unprocessed readings. Every gated operation
//! receives an explicit operator identity; there is no ambient session
//! state.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod process;
pub mod reading;
pub mod scanner;
pub mod storage;
pub mod upload;

pub use auth::Identity;
pub use config::Config;
pub use error::{Error, Result};
pub use event::{AccessEvent, CodeType};
pub use logging::init_logging;
pub use reading::{SensorReading, Unit};
pub use storage::{Storage, StorageStats};
