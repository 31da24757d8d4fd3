//! Engine configuration.

use crate::geo::LatLng;
use std::fmt;
use std::time::Duration;

/// How often the engine refreshes all layers.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// How long a single provider call may take before it is abandoned.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Command channel capacity shared by all handles.
pub const DEFAULT_COMMAND_CHANNEL_CAPACITY: usize = 64;

const DEFAULT_HOME_CENTER: LatLng = LatLng::new_unchecked(37.7749, -122.4194);
const DEFAULT_HOME_ZOOM: u8 = 13;

/// Tunable engine parameters.
///
/// # Example
///
/// ```
/// use cityscope::engine::EngineConfig;
/// use std::time::Duration;
///
/// let config = EngineConfig::new()
///     .with_refresh_interval(Duration::from_secs(30));
/// assert_eq!(config.refresh_interval, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub refresh_interval: Duration,
    pub provider_timeout: Duration,
    pub command_capacity: usize,
    /// Where the viewport starts, and where planned routes depart from.
    pub home_center: LatLng,
    pub home_zoom: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            command_capacity: DEFAULT_COMMAND_CHANNEL_CAPACITY,
            home_center: DEFAULT_HOME_CENTER,
            home_zoom: DEFAULT_HOME_ZOOM,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_home_viewport(mut self, center: LatLng, zoom: u8) -> Self {
        self.home_center = center;
        self.home_zoom = zoom;
        self
    }
}

/// Visual theme applied by the frontend.
///
/// Purely presentational: switching modes restyles markers in place and
/// never touches data, selection, or markers themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    #[default]
    Standard,
    Neon,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Standard => "standard",
            DisplayMode::Neon => "neon",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.refresh_interval, DEFAULT_REFRESH_INTERVAL);
        assert_eq!(config.provider_timeout, DEFAULT_PROVIDER_TIMEOUT);
        assert_eq!(config.home_center.latitude(), 37.7749);
        assert_eq!(config.home_zoom, 13);
    }

    #[test]
    fn test_builders_override_defaults() {
        let center = LatLng::new(40.7128, -74.0060).unwrap();
        let config = EngineConfig::new()
            .with_refresh_interval(Duration::from_secs(5))
            .with_provider_timeout(Duration::from_secs(2))
            .with_home_viewport(center, 11);

        assert_eq!(config.refresh_interval, Duration::from_secs(5));
        assert_eq!(config.provider_timeout, Duration::from_secs(2));
        assert_eq!(config.home_center, center);
        assert_eq!(config.home_zoom, 11);
    }

    #[test]
    fn test_display_mode_default_is_standard() {
        assert_eq!(DisplayMode::default(), DisplayMode::Standard);
        assert_eq!(DisplayMode::Neon.to_string(), "neon");
    }
}
