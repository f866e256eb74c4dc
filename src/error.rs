//! Error types for the clockpro library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when construction parameters are invalid
//!   (e.g. zero capacity, out-of-range cold percentages).
//! - [`InvariantError`]: Returned when internal engine invariants are
//!   violated (debug-only `check_invariants` methods). An invariant failure
//!   is a bug in the engine, not a recoverable condition.
//!
//! ## Example Usage
//!
//! ```
//! use clockpro::config::ClockProConfig;
//! use clockpro::error::ConfigError;
//! use clockpro::policy::clock_pro::ClockProPolicy;
//!
//! // Fallible constructor for user-configurable parameters
//! let policy: Result<ClockProPolicy, ConfigError> =
//!     ClockProPolicy::new(&ClockProConfig::new(100));
//! assert!(policy.is_ok());
//!
//! // Invalid capacity is caught without panicking
//! let bad = ClockProPolicy::new(&ClockProConfig::new(0));
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when construction parameters are invalid.
///
/// Produced by [`ClockProConfig::validate`](crate::config::ClockProConfig::validate)
/// and by the fallible policy constructors. Carries a human-readable
/// description of which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal engine invariants are violated.
///
/// Produced by debug-only `check_invariants` methods on the policy types.
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
