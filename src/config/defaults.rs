use super::*;

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/data/log/shellypv/current.log".to_string(),
            backup_count: 31,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for ShellyConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.50".to_string(),
            username: String::new(),
            password: String::new(),
            timeout_ms: 5000,
        }
    }
}

impl Default for PvInverterConfig {
    fn default() -> Self {
        Self {
            position: 0,
            phase: "A".to_string(),
            phase_destination: "L1".to_string(),
            invert_power_sign: false,
            energy_type: "direct".to_string(),
            max_power_w: 500.1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_instance: 40,
            custom_name: "Shelly Pro3EM PV".to_string(),
            require_dbus: true,
            poll_interval_ms: 1000,
            sign_of_life_interval_s: 600,
            logging: LoggingConfig::default(),
            shelly: ShellyConfig::default(),
            pvinverter: PvInverterConfig::default(),
        }
    }
}
