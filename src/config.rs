use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    pub gtfs_dir: PathBuf,
    pub feed_path: PathBuf,
    #[serde(default = "Config::default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub seats: SeatConfig,
}

impl Config {
    fn default_output_dir() -> PathBuf {
        PathBuf::from(".")
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub average_speed_kmh: f64,
    pub nearby_radius_km: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: 20.0,
            nearby_radius_km: 5.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct SeatConfig {
    pub seat_count: u32,
}

impl Default for SeatConfig {
    fn default() -> Self {
        Self { seat_count: 40 }
    }
}
