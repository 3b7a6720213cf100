//! Application-wide constants and defaults.

use std::time::Duration;

// # Topics
// All published messages are retained so late subscribers see the last value.

pub const TOPIC_STATUS: &str = "Service/Daytime/Status";
pub const TOPIC_NEXT_STATUS: &str = "Service/Daytime/Next/Status";
pub const TOPIC_NEXT_TIME: &str = "Service/Daytime/Next/Time";

/// Rendering of the next transition time (host local time).
pub const NEXT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

// # Offset

pub const DEFAULT_OFFSET_MINUTES: i64 = 60;
pub const MINIMUM_OFFSET_MINUTES: i64 = 0;
pub const MAXIMUM_OFFSET_MINUTES: i64 = 360;

// # MQTT

pub const DEFAULT_MQTT_HOST: &str = "127.0.0.1";
pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_MQTT_CLIENT_ID: &str = "daytime";
pub const MQTT_KEEP_ALIVE: Duration = Duration::from_secs(30);
pub const MQTT_REQUEST_CAPACITY: usize = 10;
/// How long startup waits for the broker to acknowledge the connection.
pub const MQTT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Pause between reconnection attempts after a transport error.
pub const MQTT_RECONNECT_DELAY: Duration = Duration::from_secs(1);
/// How long close() waits for the connection thread to wind down.
pub const MQTT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

// # Publish retries

pub const PUBLISH_ATTEMPTS: u32 = 3;
pub const PUBLISH_RETRY_BASE: Duration = Duration::from_millis(250);

// # Recalculation retries after a failed fire-time calculation

pub const RECALC_RETRY_BASE: Duration = Duration::from_secs(60);
pub const RECALC_RETRY_MAX: Duration = Duration::from_secs(3600);

// # Scheduler

/// Longest single wait before the worker re-reads the clock, so suspend and
/// wall-clock jumps are noticed.
pub const SCHEDULER_MAX_WAIT: Duration = Duration::from_secs(60);

// # Simulation

pub const DEFAULT_SIMULATION_MULTIPLIER: f64 = 3600.0;

// # Files

pub const CONFIG_FILE_NAME: &str = "daytime.toml";
pub const CONFIG_DIR_NAME: &str = "daytime";

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
