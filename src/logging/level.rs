use crate::error::{Result, ShellyPvError};
use tracing::Level;

/// Parse a configured level name; CRITICAL has no tracing equivalent and maps to ERROR
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" => Ok(Level::ERROR),
        _ => Err(ShellyPvError::config(format!(
            "Invalid log level: {}",
            level_str
        ))),
    }
}

/// 0 for TRACE up to 4 for ERROR
pub fn level_rank(level: Level) -> u8 {
    [Level::TRACE, Level::DEBUG, Level::INFO, Level::WARN]
        .iter()
        .position(|l| *l == level)
        .map_or(4, |i| i as u8)
}

/// The more verbose of two levels
pub fn min_level(a: Level, b: Level) -> Level {
    if level_rank(a) <= level_rank(b) { a } else { b }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("Warning").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("CRITICAL").unwrap(), Level::ERROR);
        assert!(parse_log_level("invalid").is_err());
    }

    #[test]
    fn min_level_prefers_verbose() {
        assert_eq!(min_level(Level::INFO, Level::DEBUG), Level::DEBUG);
        assert_eq!(min_level(Level::ERROR, Level::WARN), Level::WARN);
    }

    #[test]
    fn ranks_follow_severity() {
        assert_eq!(level_rank(Level::TRACE), 0);
        assert_eq!(level_rank(Level::WARN), 3);
        assert_eq!(level_rank(Level::ERROR), 4);
    }
}
