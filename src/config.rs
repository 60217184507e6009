//! # Configuration Management
//!
//! This module loads the sign's settings from `sign-config.toml`. It covers
//! the departures API and station, which departures to show, the panel
//! geometry and colors, the night window and the connectivity self-test.
//!
//! Every section and field has a default, so a file only needs to list what
//! differs. The sign reads its settings once at start-up and never writes
//! them back.
//!
//! ```toml
//! [api]
//! station_id = "900120003"   # S Ostkreuz
//!
//! [filter]
//! excluded_lines = ["N94"]
//! walk_delay_secs = 180
//! bus = false
//!
//! [night]
//! start = "23:00"
//! end = "06:30"
//! dim_level = 2
//! ```

use crate::countdown::{ColorScheme, CountdownSettings};
use crate::dimming::{parse_hhmm, NightWindow, FULL_BRIGHTNESS};
use crate::renderer::RowGeometry;
use crate::Product;
use log::info;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_PATH: &str = "sign-config.toml";

/// Offsets that exist on a real clock.
const UTC_OFFSET_HOURS: RangeInclusive<i32> = -12..=14;

/// Settings could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config file format: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Application configuration loaded from `sign-config.toml`
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Departures API and station
    pub api: ApiConfig,
    /// Which departures are shown
    pub filter: FilterConfig,
    /// Panel geometry and colors
    pub display: DisplayConfig,
    /// Night dimming
    pub night: NightConfig,
    /// Connectivity self-test
    pub network: NetworkConfig,
}

/// Departures API configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of a `transport.rest` compatible API
    pub base_url: String,
    /// Stop to show (e.g. "900100003" for S+U Alexanderplatz)
    pub station_id: String,
    /// Maximum number of departures per request
    pub results: u32,
    /// Look-ahead window in minutes
    pub duration_minutes: u32,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

/// Departure filtering
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Line names never shown (e.g. night buses)
    pub excluded_lines: Vec<String>,
    /// Seconds needed to walk to the stop; earlier departures are hidden
    pub walk_delay_secs: i64,
    pub bus: bool,
    pub tram: bool,
    pub subway: bool,
    pub suburban: bool,
    pub regional: bool,
    pub express: bool,
    pub ferry: bool,
}

/// Panel configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Matrix width in pixels
    pub width: i32,
    /// Matrix height in pixels (64 px panels get spaced rows)
    pub height: i32,
    /// Column where the destination text starts
    pub dest_offset: i32,
    /// Color line labels by transport mode
    pub colored: bool,
    /// Use the official subway line colors when `colored` is set
    pub line_colors: bool,
}

/// Night dimming configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NightConfig {
    /// Local time the night starts, `HH:MM`
    pub start: String,
    /// Local time the night ends, `HH:MM`
    pub end: String,
    /// Brightness at night, 0 (off) to 10 (no dimming)
    pub dim_level: u8,
    /// Whole-hour offset of local time from UTC
    pub utc_offset_hours: i32,
}

/// Connectivity self-test configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// `address:port` to connect to
    pub probe_host: String,
    pub probe_timeout_secs: u64,
    /// Consecutive failed fetches before probing again (0 disables)
    pub probe_after_failures: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "https://v6.bvg.transport.rest".to_string(),
            station_id: "900100003".to_string(),
            results: 14,
            duration_minutes: 30,
            timeout_secs: 15,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            excluded_lines: Vec::new(),
            walk_delay_secs: 0,
            bus: true,
            tram: true,
            subway: true,
            suburban: true,
            regional: true,
            express: true,
            ferry: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width: 128,
            height: 32,
            dest_offset: 23,
            colored: true,
            line_colors: true,
        }
    }
}

impl Default for NightConfig {
    fn default() -> Self {
        NightConfig {
            start: "22:00".to_string(),
            end: "06:00".to_string(),
            dim_level: 3,
            utc_offset_hours: 1,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            probe_host: "1.1.1.1:80".to_string(),
            probe_timeout_secs: 60,
            probe_after_failures: 3,
        }
    }
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// A missing file means defaults. A file that exists but cannot be read,
    /// parsed or validated is an error, so the sign never silently shows the
    /// wrong stop.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<Config>(&contents)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "No config file at {}, using default configuration",
                    path.display()
                );
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        info!(
            "Loaded configuration for station {} ({}x{} panel)",
            config.api.station_id, config.display.width, config.display.height
        );
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let display = &self.display;
        if display.width <= 0 || display.height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "display size {}x{} must be positive",
                display.width, display.height
            )));
        }
        if !(0..display.width).contains(&display.dest_offset) {
            return Err(ConfigError::Invalid(format!(
                "dest_offset {} must be within the display width {}",
                display.dest_offset, display.width
            )));
        }
        if self.api.station_id.trim().is_empty() {
            return Err(ConfigError::Invalid("station_id is empty".to_string()));
        }
        if !UTC_OFFSET_HOURS.contains(&self.night.utc_offset_hours) {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_hours {} is outside {}..={}",
                self.night.utc_offset_hours,
                UTC_OFFSET_HOURS.start(),
                UTC_OFFSET_HOURS.end()
            )));
        }
        self.night_window().map(drop)
    }

    /// Night window in minutes of the local day.
    pub fn night_window(&self) -> Result<NightWindow, ConfigError> {
        let night = &self.night;
        if night.dim_level > FULL_BRIGHTNESS {
            return Err(ConfigError::Invalid(format!(
                "dim_level {} is above {}",
                night.dim_level, FULL_BRIGHTNESS
            )));
        }
        let minutes = |value: &str| {
            parse_hhmm(value)
                .ok_or_else(|| ConfigError::Invalid(format!("night time {value:?} is not HH:MM")))
        };
        Ok(NightWindow {
            start_minutes: minutes(&night.start)?,
            end_minutes: minutes(&night.end)?,
            dim_level: night.dim_level,
        })
    }

    pub fn geometry(&self) -> RowGeometry {
        RowGeometry::new(
            self.display.width,
            self.display.height,
            self.display.dest_offset,
        )
    }

    pub fn color_scheme(&self) -> ColorScheme {
        if self.display.colored {
            ColorScheme::ByProduct {
                line_colors: self.display.line_colors,
            }
        } else {
            ColorScheme::Flat
        }
    }

    /// Countdown inputs for a panel holding `max_rows` rows.
    pub fn countdown_settings(&self, max_rows: usize) -> CountdownSettings {
        CountdownSettings {
            walk_delay_secs: self.filter.walk_delay_secs,
            excluded_lines: self.filter.excluded_lines.clone(),
            scheme: self.color_scheme(),
            max_rows,
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.network.probe_timeout_secs)
    }
}

impl ApiConfig {
    /// Overall timeout of one departures request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FilterConfig {
    /// Whether departures of `product` are requested from the API.
    pub fn shows(&self, product: Product) -> bool {
        match product {
            Product::Bus => self.bus,
            Product::Tram => self.tram,
            Product::Subway => self.subway,
            Product::Suburban => self.suburban,
            Product::Regional => self.regional,
            Product::Express => self.express,
            Product::Ferry => self.ferry,
            Product::Other => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.station_id, "900100003");
        assert_eq!(config.api.results, 14);
        assert_eq!(config.display.width, 128);
        assert_eq!(config.display.dest_offset, 23);
        assert_eq!(config.night.dim_level, 3);
        assert_eq!(config.network.probe_host, "1.1.1.1:80");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_config(
            "[api]\nstation_id = \"900120003\"\n\n[filter]\nexcluded_lines = [\"N94\"]\nbus = false\n",
        );
        let config = Config::load_from_path(file.path()).unwrap();

        assert_eq!(config.api.station_id, "900120003");
        assert_eq!(config.api.base_url, "https://v6.bvg.transport.rest");
        assert_eq!(config.filter.excluded_lines, ["N94"]);
        assert!(!config.filter.shows(Product::Bus));
        assert!(config.filter.shows(Product::Tram));
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_config("[display\nwidth = 64");
        assert!(matches!(
            Config::load_from_path(file.path()),
            Err(ConfigError::Parse(_))
        ));

        let file = write_config("[display]\nwidth = \"wide\"\n");
        assert!(matches!(
            Config::load_from_path(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for contents in [
            "[night]\ndim_level = 11\n",
            "[night]\nstart = \"25:00\"\n",
            "[night]\nend = \"6\"\n",
            "[display]\ndest_offset = 128\n",
            "[display]\nheight = 0\n",
            "[api]\nstation_id = \"\"\n",
            "[night]\nutc_offset_hours = 15\n",
            "[night]\nutc_offset_hours = -13\n",
            "[night]\nutc_offset_hours = 2147483647\n",
        ] {
            let file = write_config(contents);
            assert!(
                matches!(Config::load_from_path(file.path()), Err(ConfigError::Invalid(_))),
                "{contents}"
            );
        }
    }

    #[test]
    fn utc_offset_extremes_are_accepted() {
        for offset in [-12, 0, 14] {
            let mut config = Config::default();
            config.night.utc_offset_hours = offset;
            assert!(config.validate().is_ok(), "offset {offset}");
        }
    }

    #[test]
    fn timeouts_come_from_their_sections() {
        let mut config = Config::default();
        config.api.timeout_secs = 7;
        config.network.probe_timeout_secs = 20;
        assert_eq!(config.api.request_timeout(), Duration::from_secs(7));
        assert_eq!(config.probe_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn night_window_from_clock_times() {
        let mut config = Config::default();
        config.night.start = "23:30".to_string();
        config.night.end = "05:45".to_string();
        let window = config.night_window().unwrap();
        assert_eq!(window.start_minutes, 1410);
        assert_eq!(window.end_minutes, 345);
        assert_eq!(window.dim_level, 3);
    }

    #[test]
    fn color_scheme_follows_display_flags() {
        let mut config = Config::default();
        assert_eq!(
            config.color_scheme(),
            ColorScheme::ByProduct { line_colors: true }
        );
        config.display.line_colors = false;
        assert_eq!(
            config.color_scheme(),
            ColorScheme::ByProduct { line_colors: false }
        );
        config.display.colored = false;
        assert_eq!(config.color_scheme(), ColorScheme::Flat);

        let settings = config.countdown_settings(4);
        assert_eq!(settings.max_rows, 4);
        assert_eq!(settings.scheme, ColorScheme::Flat);
    }
}
