//! Configuration validation.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;

/// Reject configurations the service cannot run with.
pub fn validate_config(config: &Config) -> Result<()> {
    let Some(lat) = config.latitude else {
        anyhow::bail!("latitude is required");
    };
    let Some(lon) = config.longitude else {
        anyhow::bail!("longitude is required");
    };

    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(offset) = config.offset
        && !(MINIMUM_OFFSET_MINUTES..=MAXIMUM_OFFSET_MINUTES).contains(&offset)
    {
        anyhow::bail!(
            "offset ({} minutes) must be between {} and {} minutes",
            offset,
            MINIMUM_OFFSET_MINUTES,
            MAXIMUM_OFFSET_MINUTES
        );
    }

    if let Some(mqtt) = &config.mqtt {
        if let Some(host) = &mqtt.host
            && host.trim().is_empty()
        {
            anyhow::bail!("mqtt.host must not be empty");
        }

        if mqtt.port == Some(0) {
            anyhow::bail!("mqtt.port must be between 1 and 65535");
        }

        if let Some(client_id) = &mqtt.client_id
            && client_id.trim().is_empty()
        {
            anyhow::bail!("mqtt.client_id must not be empty");
        }

        if mqtt.pass.is_some() && mqtt.user.is_none() {
            anyhow::bail!("mqtt.pass is set but mqtt.user is missing");
        }
    }

    Ok(())
}
