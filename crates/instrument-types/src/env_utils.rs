//! Environment variable parsing utilities.
//!
//! The command-line tool reads its optional settings from the environment
//! through these helpers, falling back to defaults when a variable is unset or
//! unparsable.
//!
//! # Example
//!
//! ```
//! use instrument_types::env_utils::{env_bool, env_var};
//!
//! let threads: Option<usize> = env_var("CLASSPATH_INSTRUMENT_THREADS");
//! let pretty = env_bool("CLASSPATH_INSTRUMENT_PRETTY");
//! ```

use std::str::FromStr;

/// Value of `key` parsed as `T`, surrounding whitespace ignored.
///
/// Unset and unparsable variables both read as `None`, so
/// `CLASSPATH_INSTRUMENT_THREADS=auto` falls back to the default pool size.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Switch-style flag such as `CLASSPATH_INSTRUMENT_PRETTY`.
///
/// On for `1`, `true`, `yes` or `on` in any case; off for anything else,
/// including an unset variable.
pub fn env_bool(key: &str) -> bool {
    match std::env::var(key) {
        Ok(v) => ["1", "true", "yes", "on"]
            .iter()
            .any(|on| v.trim().eq_ignore_ascii_case(on)),
        Err(_) => false,
    }
}

/// Raw value of `key`, or `default` when unset or not valid UTF-8.
///
/// ```
/// use instrument_types::env_utils::env_string_or;
///
/// let style = env_string_or("CLASSPATH_INSTRUMENT_LOG_STYLE_UNSET", "compact");
/// assert_eq!(style, "compact");
/// ```
pub fn env_string_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .unwrap_or_else(|| default.to_owned())
}
