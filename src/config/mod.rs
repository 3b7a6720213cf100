//! Configuration for the daytime service.
//!
//! Settings live in a single TOML file, `daytime.toml`, looked up in
//! `$XDG_CONFIG_HOME/daytime/` unless `--config <dir>` points elsewhere:
//!
//! ```toml
//! latitude = 40.0        # Geographic latitude (-90 to +90)
//! longitude = -105.0     # Geographic longitude (-180 to +180)
//! offset = 60            # Minutes added to sunrise and taken from sunset (0-360)
//!
//! [mqtt]
//! host = "127.0.0.1"     # Broker host
//! port = 1883            # Broker port
//! user = "casa"          # Optional username
//! pass = "secret"        # Optional password, only used together with user
//! client_id = "daytime"  # Client identifier presented to the broker
//! ```
//!
//! Everything except the coordinates has a default. The file is validated as
//! a whole on load so the service never starts with a half-usable setup.

pub mod loading;
pub mod validation;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::Deserialize;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::geo::Location;

pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// Contents of `daytime.toml`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Safety margin in minutes.
    pub offset: Option<i64>,
    pub mqtt: Option<MqttConfig>,
}

/// The `[mqtt]` table as written in the file.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct MqttConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub client_id: Option<String>,
}

/// Broker settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub client_id: String,
}

impl Config {
    /// Load configuration using the module's load function
    pub fn load() -> Result<Self> {
        load()
    }

    /// Load from path using the module's load_from_path function
    pub fn load_from_path(path: &Path) -> Result<Self> {
        load_from_path(path)
    }

    /// Observer position. Fails only for a config that skipped validation.
    pub fn location(&self) -> Result<Location> {
        let latitude = self.latitude.context("latitude is not configured")?;
        let longitude = self.longitude.context("longitude is not configured")?;
        Ok(Location::new(latitude, longitude))
    }

    pub fn offset_minutes(&self) -> i64 {
        self.offset.unwrap_or(DEFAULT_OFFSET_MINUTES)
    }

    /// Safety margin applied to both boundaries.
    pub fn offset(&self) -> Duration {
        Duration::minutes(self.offset_minutes())
    }

    pub fn mqtt(&self) -> MqttSettings {
        let mqtt = self.mqtt.clone().unwrap_or_default();
        MqttSettings {
            host: mqtt.host.unwrap_or_else(|| DEFAULT_MQTT_HOST.to_string()),
            port: mqtt.port.unwrap_or(DEFAULT_MQTT_PORT),
            user: mqtt.user,
            pass: mqtt.pass,
            client_id: mqtt
                .client_id
                .unwrap_or_else(|| DEFAULT_MQTT_CLIENT_ID.to_string()),
        }
    }

    pub fn log_config(&self, source: &Path) {
        log_block_start!("Loaded configuration");
        log_indented!("File: {}", private_path(source));
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            let lat_dir = if lat >= 0.0 { "N" } else { "S" };
            let lon_dir = if lon >= 0.0 { "E" } else { "W" };
            log_indented!(
                "Location: {:.3}°{}, {:.3}°{}",
                lat.abs(),
                lat_dir,
                lon.abs(),
                lon_dir
            );
        }
        log_indented!("Offset: {} minutes", self.offset_minutes());

        let mqtt = self.mqtt();
        log_indented!("Broker: {}:{}", mqtt.host, mqtt.port);
        log_indented!("Client ID: {}", mqtt.client_id);
        if let Some(user) = &mqtt.user {
            log_indented!("User: {user}");
        }
    }
}

#[cfg(test)]
mod tests;
