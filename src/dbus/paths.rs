//! Object paths of the pvinverter service

use crate::mapper::Line;

pub const MGMT_PROCESS_NAME: &str = "/Mgmt/ProcessName";
pub const MGMT_PROCESS_VERSION: &str = "/Mgmt/ProcessVersion";
pub const MGMT_CONNECTION: &str = "/Mgmt/Connection";

pub const DEVICE_INSTANCE: &str = "/DeviceInstance";
pub const PRODUCT_ID: &str = "/ProductId";
pub const PRODUCT_NAME: &str = "/ProductName";
pub const CUSTOM_NAME: &str = "/CustomName";
pub const CONNECTED: &str = "/Connected";
pub const LATENCY: &str = "/Latency";
pub const FIRMWARE_VERSION: &str = "/FirmwareVersion";
pub const HARDWARE_VERSION: &str = "/HardwareVersion";
pub const SERIAL: &str = "/Serial";
pub const POSITION: &str = "/Position";
pub const MAX_POWER: &str = "/Ac/MaxPower";
pub const UPDATE_INDEX: &str = "/UpdateIndex";
pub const STATUS_CODE: &str = "/StatusCode";
pub const STATUS: &str = "/Status";
pub const MODE: &str = "/Mode";

pub const AC_POWER: &str = "/Ac/Power";
pub const AC_ENERGY_FORWARD: &str = "/Ac/Energy/Forward";
pub const AC_ENERGY_REVERSE: &str = "/Ac/Energy/Reverse";

/// Product id Victron assigned to the SDM630 meter driver
pub const PVINVERTER_PRODUCT_ID: u32 = 41281;
pub const PRODUCT_NAME_VALUE: &str = "Shelly Pro3EM";

/// The five per-line paths of `line`
pub struct LinePaths {
    pub voltage: String,
    pub current: String,
    pub power: String,
    pub energy_forward: String,
    pub energy_reverse: String,
}

impl LinePaths {
    pub fn new(line: Line) -> Self {
        let p = line.prefix();
        Self {
            voltage: format!("{}/Voltage", p),
            current: format!("{}/Current", p),
            power: format!("{}/Power", p),
            energy_forward: format!("{}/Energy/Forward", p),
            energy_reverse: format!("{}/Energy/Reverse", p),
        }
    }

    pub fn all(&self) -> [&str; 5] {
        [
            &self.voltage,
            &self.current,
            &self.power,
            &self.energy_forward,
            &self.energy_reverse,
        ]
    }
}

/// Measurement paths other bus clients may write to
pub fn measurement_paths() -> Vec<String> {
    let mut paths = vec![
        AC_POWER.to_string(),
        AC_ENERGY_FORWARD.to_string(),
        AC_ENERGY_REVERSE.to_string(),
    ];
    for line in Line::ALL {
        paths.extend(LinePaths::new(line).all().iter().map(|s| s.to_string()));
    }
    paths
}

/// Display unit and precision for a path's text representation
pub fn unit_for(path: &str) -> Option<(&'static str, usize)> {
    if path.ends_with("/Energy/Forward") || path.ends_with("/Energy/Reverse") {
        Some(("kWh", 2))
    } else if path.ends_with("/Power") || path == MAX_POWER {
        Some(("W", 1))
    } else if path.ends_with("/Voltage") {
        Some(("V", 1))
    } else if path.ends_with("/Current") {
        Some(("A", 1))
    } else {
        None
    }
}
