//! Construction parameters for the replacement policies.
//!
//! The configuration is read once at construction; the engines hold no
//! other external state. `percent_min_cold` and `percent_max_cold` bound
//! the band within which the adaptive cold target moves, and
//! `lower_bound_cold` puts an absolute floor under that band so tiny caches
//! keep at least a few resident cold slots.
//!
//! ## Example
//!
//! ```
//! use clockpro::config::ClockProConfig;
//!
//! let config = ClockProConfig {
//!     maximum_size: 512,
//!     percent_min_cold: 0.05,
//!     ..ClockProConfig::new(512)
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::ConfigError;

/// Parameters for [`ClockProPolicy`](crate::policy::clock_pro::ClockProPolicy)
/// and [`ThreeHandClockProPolicy`](crate::policy::three_hand::ThreeHandClockProPolicy).
#[derive(Debug, Clone)]
pub struct ClockProConfig {
    /// Maximum number of resident descriptors (hot + resident cold).
    pub maximum_size: usize,

    /// Fraction of `maximum_size` forming the lower edge of the cold band.
    /// Must be in `(0.0, 1.0]`.
    pub percent_min_cold: f64,

    /// Fraction of `maximum_size` forming the upper edge of the cold band.
    /// Must be in `[percent_min_cold, 1.0]`.
    pub percent_max_cold: f64,

    /// Absolute floor for the cold band; the band is never narrower than
    /// this many slots. Must be at least 1.
    pub lower_bound_cold: usize,

    /// Reserved for future tuning of the non-resident population. The
    /// engines recognise the parameter but cap the non-resident count at
    /// `maximum_size` regardless of its value.
    pub non_resident_multiplier: f64,
}

impl ClockProConfig {
    /// Creates a configuration with the default tuning for the given
    /// capacity: cold band between 1% and 99% of `maximum_size`, floor of
    /// two slots.
    pub fn new(maximum_size: usize) -> Self {
        Self {
            maximum_size,
            percent_min_cold: 0.01,
            percent_max_cold: 0.99,
            lower_bound_cold: 2,
            non_resident_multiplier: 2.0,
        }
    }

    /// Validates every parameter, returning a descriptive error for the
    /// first one out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maximum_size == 0 {
            return Err(ConfigError::new("maximum_size must be greater than zero"));
        }
        if !self.percent_min_cold.is_finite()
            || self.percent_min_cold <= 0.0
            || self.percent_min_cold > 1.0
        {
            return Err(ConfigError::new(format!(
                "percent_min_cold must be in (0.0, 1.0], got {}",
                self.percent_min_cold
            )));
        }
        if !self.percent_max_cold.is_finite()
            || self.percent_max_cold < self.percent_min_cold
            || self.percent_max_cold > 1.0
        {
            return Err(ConfigError::new(format!(
                "percent_max_cold must be in [percent_min_cold, 1.0], got {}",
                self.percent_max_cold
            )));
        }
        if self.lower_bound_cold < 1 {
            return Err(ConfigError::new("lower_bound_cold must be at least 1"));
        }
        if !self.non_resident_multiplier.is_finite() || self.non_resident_multiplier < 0.0 {
            return Err(ConfigError::new(format!(
                "non_resident_multiplier must be finite and non-negative, got {}",
                self.non_resident_multiplier
            )));
        }
        Ok(())
    }
}
