use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ccwave_decode::DEFAULT_XOSC_HZ;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PACKET_TIMEOUT_RANGE_US: (f64, f64) = (0.1, 1000.0);
pub const XOSC_RANGE_MHZ: (f64, f64) = (10.0, 50.0);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Analyzer settings as entered by the user, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Gap that separates two transactions, in microseconds.
    #[serde(default = "default_packet_timeout_us")]
    pub packet_timeout_us: f64,
    /// Crystal oscillator frequency in MHz. Resolved to the nearest whole Hz,
    /// so fractional crystals such as 27.12 MHz keep their fraction instead of
    /// being truncated to whole MHz.
    #[serde(default = "default_xosc_mhz")]
    pub f_xosc_mhz: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            packet_timeout_us: default_packet_timeout_us(),
            f_xosc_mhz: default_xosc_mhz(),
        }
    }
}

fn default_packet_timeout_us() -> f64 {
    10.0
}

fn default_xosc_mhz() -> f64 {
    26.0
}

/// Settings ready to drive a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub packet_timeout: Duration,
    pub f_xosc_hz: u64,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/ccwave/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ccwave").join("settings.json"))
    }

    /// Loads the default settings file when present, else the built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Validates the raw values. Out-of-range input falls back with a warning
    /// instead of failing.
    pub fn resolve(&self) -> ResolvedSettings {
        ResolvedSettings {
            packet_timeout: self.packet_timeout(),
            f_xosc_hz: self.f_xosc_hz(),
        }
    }

    fn packet_timeout(&self) -> Duration {
        let (min, max) = PACKET_TIMEOUT_RANGE_US;
        let us = self.packet_timeout_us;
        let us = if !us.is_finite() {
            warn!("packet timeout {us} us is not a number, using {}", default_packet_timeout_us());
            default_packet_timeout_us()
        } else if us < min || us > max {
            let clamped = us.clamp(min, max);
            warn!("packet timeout {us} us outside [{min}, {max}], using {clamped}");
            clamped
        } else {
            us
        };
        Duration::from_nanos((us * 1000.0).round() as u64)
    }

    fn f_xosc_hz(&self) -> u64 {
        let (min, max) = XOSC_RANGE_MHZ;
        let mhz = self.f_xosc_mhz;
        if !mhz.is_finite() || mhz < min || mhz > max {
            warn!("crystal frequency {mhz} MHz unusable, using {DEFAULT_XOSC_HZ} Hz");
            return DEFAULT_XOSC_HZ;
        }
        (mhz * 1_000_000.0).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_unchanged() {
        let resolved = Settings::default().resolve();
        assert_eq!(resolved.packet_timeout, Duration::from_micros(10));
        assert_eq!(resolved.f_xosc_hz, 26_000_000);
    }

    #[test]
    fn crystal_in_mhz_scales_to_hz() {
        let settings = Settings {
            f_xosc_mhz: 27.0,
            ..Default::default()
        };
        assert_eq!(settings.resolve().f_xosc_hz, 27_000_000);
        let fractional = Settings {
            f_xosc_mhz: 27.12,
            ..Default::default()
        };
        assert_eq!(fractional.resolve().f_xosc_hz, 27_120_000);
    }

    #[test]
    fn unusable_crystal_falls_back() {
        for mhz in [f64::NAN, f64::INFINITY, 0.0, 9.99, 50.5, -26.0] {
            let settings = Settings {
                f_xosc_mhz: mhz,
                ..Default::default()
            };
            assert_eq!(settings.resolve().f_xosc_hz, DEFAULT_XOSC_HZ, "{mhz}");
        }
    }

    #[test]
    fn timeout_is_clamped() {
        let low = Settings {
            packet_timeout_us: 0.0,
            ..Default::default()
        };
        assert_eq!(low.resolve().packet_timeout, Duration::from_nanos(100));
        let high = Settings {
            packet_timeout_us: 5000.0,
            ..Default::default()
        };
        assert_eq!(high.resolve().packet_timeout, Duration::from_millis(1));
        let nan = Settings {
            packet_timeout_us: f64::NAN,
            ..Default::default()
        };
        assert_eq!(nan.resolve().packet_timeout, Duration::from_micros(10));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"f_xosc_mhz": 27}"#).unwrap();
        assert_eq!(settings.f_xosc_mhz, 27.0);
        assert_eq!(settings.packet_timeout_us, 10.0);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/ccwave.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
