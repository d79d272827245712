//! # shellypv - Shelly Pro 3EM as a Victron PV inverter
//!
//! Polls a Shelly Pro 3EM energy meter over its local HTTP RPC API and
//! republishes the reading of one phase on the Venus OS D-Bus as a
//! `com.victronenergy.pvinverter` service.
//!
//! ## Architecture
//!
//! One cycle per poll tick, data flowing one way:
//!
//! - `shelly`: HTTP client reading identity, live status and energy counters
//! - `mapper`: pure phase remapping, sign inversion and energy direction policy
//! - `dbus`: the pvinverter service and its BusItem objects
//! - `driver`: the poll loop and its per-cycle failure boundary
//! - `config`: YAML configuration and validation
//! - `logging`: structured logging with daily rotated files

pub mod config;
pub mod dbus;
pub mod driver;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod shelly;

// Re-export commonly used types
pub use config::Config;
pub use driver::PvInverterDriver;
pub use error::{Result, ShellyPvError};
