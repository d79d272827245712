use shellypv::config::Config;
use shellypv::mapper::{EnergyDirection, Line, SourcePhase};
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.shelly.host = "10.0.0.5".to_string();
    cfg.shelly.username = "admin".to_string();
    cfg.pvinverter.phase = "C".to_string();
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.shelly.host, "10.0.0.5");
    assert_eq!(loaded.shelly.username, "admin");
    assert_eq!(loaded.pvinverter.phase, "C");
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn partial_yaml_falls_back_to_defaults() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        b"device_instance: 43\nshelly:\n  host: meter.lan\npvinverter:\n  phase: b\n  phase_destination: l2\n  energy_type: return\n  invert_power_sign: 1\n",
    )
    .unwrap();

    let cfg = Config::from_file(tmp.path()).unwrap();
    assert_eq!(cfg.device_instance, 43);
    assert_eq!(cfg.shelly.host, "meter.lan");
    assert_eq!(cfg.shelly.timeout_ms, 5000);
    assert_eq!(cfg.poll_interval_ms, 1000);
    assert_eq!(cfg.logging.backup_count, 31);
    assert!(cfg.validate().is_ok());

    let pc = cfg.phase_config().unwrap();
    assert_eq!(pc.source, SourcePhase::B);
    assert_eq!(pc.destination, Line::L2);
    assert_eq!(pc.energy_direction, EnergyDirection::Return);
    assert!(pc.invert_sign);
    assert_eq!(cfg.service_name(), "com.victronenergy.pvinverter.http_43");
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();

    cfg.shelly.host = "  ".to_string();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.shelly.timeout_ms = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.poll_interval_ms = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.pvinverter.position = 5;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.pvinverter.phase = "L1".to_string();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.logging.level = "verbose".to_string();
    assert!(cfg.validate().is_err());

    // Unknown energy type degrades to direct instead of failing
    cfg = Config::default();
    cfg.pvinverter.energy_type = "net".to_string();
    assert!(cfg.validate().is_ok());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn from_missing_file_is_an_io_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(tmp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(format!("{}", err).contains("I/O error"));
}
