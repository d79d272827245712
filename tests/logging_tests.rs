use shellypv::logging::{LogContext, get_logger_with_context, min_level, parse_log_level};
use tracing::Level;

#[test]
fn configured_level_names() {
    assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
    assert_eq!(parse_log_level(" WARNING ").unwrap(), Level::WARN);
    assert_eq!(parse_log_level("critical").unwrap(), Level::ERROR);
    assert!(parse_log_level("").is_err());
    assert!(parse_log_level("FATAL").is_err());
}

#[test]
fn layer_levels_combine_to_most_verbose() {
    assert_eq!(min_level(Level::WARN, Level::TRACE), Level::TRACE);
    assert_eq!(min_level(Level::INFO, Level::INFO), Level::INFO);
}

#[test]
fn component_logger_carries_context() {
    let logger = get_logger_with_context(
        LogContext::new("shelly")
            .with_device_instance(40)
            .with_field("host", "192.168.1.50".to_string()),
    );
    // No subscriber installed: logging is a no-op and must not panic
    logger.info("meter reachable");
    logger.critical("meter unreachable");
}
