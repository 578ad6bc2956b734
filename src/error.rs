//! Error types for fallible configuration.
//!
//! Data-plane operations in this crate never fail: a missed `get` is `None`,
//! an insert into a capacity-0 engine is a silent no-op, removing an absent
//! key does nothing. The only errors surface at construction time, when a
//! caller hands a tunable that is out of range.

use std::fmt;

/// Returned by `try_`-constructors when a tunable is out of range.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A ratio parameter fell outside its legal interval.
    RatioOutOfRange {
        /// Parameter name, e.g. `"window_ratio"`.
        name: &'static str,
        /// Value the caller supplied.
        value: f64,
        /// Human-readable legal interval, e.g. `"(0, 1]"`.
        expected: &'static str,
    },
    /// An integer parameter must be at least 1.
    ZeroParameter {
        /// Parameter name, e.g. `"k"`.
        name: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::RatioOutOfRange {
                name,
                value,
                expected,
            } => {
                write!(f, "{name} must lie in {expected}, got {value}")
            },
            ConfigError::ZeroParameter { name } => {
                write!(f, "{name} must be at least 1")
            },
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_display_names_parameter_and_bounds() {
        let err = ConfigError::RatioOutOfRange {
            name: "window_ratio",
            value: 2.0,
            expected: "(0, 1]",
        };
        let text = err.to_string();
        assert!(text.contains("window_ratio"));
        assert!(text.contains("(0, 1]"));
        assert!(text.contains('2'));
    }

    #[test]
    fn zero_parameter_display() {
        let err = ConfigError::ZeroParameter { name: "k" };
        assert_eq!(err.to_string(), "k must be at least 1");
    }

    #[test]
    fn implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }
}
