use shellypv::error::ShellyPvError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        ShellyPvError::config("x"),
        ShellyPvError::Config { .. }
    ));
    assert!(matches!(ShellyPvError::dbus("x"), ShellyPvError::DBus { .. }));
    assert!(matches!(
        ShellyPvError::parse("x"),
        ShellyPvError::Parse { .. }
    ));
    assert!(matches!(
        ShellyPvError::http(404, "x"),
        ShellyPvError::Http { status: 404, .. }
    ));
}

#[test]
fn error_constructors_group_2() {
    let ser = ShellyPvError::Serialization {
        message: "s".into(),
    };
    assert!(matches!(ser, ShellyPvError::Serialization { .. }));
    assert!(matches!(ShellyPvError::io("x"), ShellyPvError::Io { .. }));
    assert!(matches!(
        ShellyPvError::network("x"),
        ShellyPvError::Network { .. }
    ));
    assert!(matches!(
        ShellyPvError::timeout("x"),
        ShellyPvError::Timeout { .. }
    ));
    assert!(matches!(
        ShellyPvError::validation("f", "m"),
        ShellyPvError::Validation { .. }
    ));
    assert!(matches!(
        ShellyPvError::generic("x"),
        ShellyPvError::Generic { .. }
    ));
}

#[test]
fn upstream_classification() {
    assert!(ShellyPvError::network("refused").is_upstream());
    assert!(ShellyPvError::timeout("5s").is_upstream());
    assert!(ShellyPvError::http(500, "x").is_upstream());
    assert!(ShellyPvError::parse("{}").is_upstream());
    assert!(!ShellyPvError::dbus("x").is_upstream());
    assert!(!ShellyPvError::config("x").is_upstream());
}

#[test]
fn json_errors_become_parse_errors() {
    let err: ShellyPvError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(err, ShellyPvError::Parse { .. }));
}

#[test]
fn display_messages() {
    let e = ShellyPvError::validation("field", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));
    assert_eq!(
        format!("{}", ShellyPvError::timeout("5s elapsed")),
        "Timeout error: 5s elapsed"
    );
}
