//! Application coordinator that manages the complete lifecycle of the service.
//!
//! Loads the configuration, connects the transport, installs the signal
//! handler, starts the scheduler and shuts everything down in order once a
//! signal arrives (or a simulation reaches its end time).
//!
//! The `Daytime` struct uses a builder pattern to support different startup contexts:
//! - Normal startup: `Daytime::new(debug_enabled).run()`
//! - Dry run: `Daytime::new(debug_enabled).dry_run().run()`
//! - Simulation: `Daytime::new(debug_enabled).without_headers().with_clock(clock).run()`

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::{
    config::{self, Config},
    geo::Calculator,
    io::signals::{SignalState, setup_signal_handler},
    scheduler::{Scheduler, SchedulerParams},
    time_source::{RealTimeSource, TimeSource},
    transport::{LogPublisher, MqttPublisher, Publisher},
};

/// Builder for configuring and running the daytime service.
///
/// # Examples
///
/// ```no_run
/// use daytime::Daytime;
///
/// # fn main() -> anyhow::Result<()> {
/// // Publish to the configured broker until SIGINT/SIGTERM
/// Daytime::new(false).run()?;
///
/// // Log the messages instead of publishing them
/// Daytime::new(true).dry_run().run()?;
/// # Ok(())
/// # }
/// ```
pub struct Daytime {
    debug_enabled: bool,
    dry_run: bool,
    show_headers: bool,
    clock: Option<Arc<dyn TimeSource>>,
    until: Option<DateTime<Local>>,
}

impl Daytime {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            dry_run: false,
            show_headers: true,
            clock: None,
            until: None,
        }
    }

    /// Log messages instead of publishing them
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Skip header display (the caller already printed one)
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Drive the scheduler from `clock`. A simulated clock implies a dry run.
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        if clock.is_simulated() {
            self.dry_run = true;
        }
        self.clock = Some(clock);
        self
    }

    /// Shut down once the clock reaches `end`
    pub fn until(mut self, end: DateTime<Local>) -> Self {
        self.until = Some(end);
        self
    }

    /// Execute the service with the configured settings.
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();

            if self.debug_enabled {
                log_pipe!();
                log_debug!("Debug mode enabled - showing detailed scheduler operations");
            }
        }

        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!(
                "Base directory: {}",
                crate::common::utils::private_path(&custom_dir)
            );
        }

        let config_path = config::get_config_path()?;
        let config = Config::load_from_path(&config_path)?;
        config.log_config(&config_path);

        let calculator = Calculator::with_sunrise_model(config.location()?, config.offset());
        let publisher = self.connect(&config)?;
        let signal_state = setup_signal_handler(self.debug_enabled)?;
        let clock = self
            .clock
            .clone()
            .unwrap_or_else(|| Arc::new(RealTimeSource));

        let params = SchedulerParams::new(calculator, Arc::clone(&publisher), Arc::clone(&clock))
            .with_debug(self.debug_enabled);
        let scheduler = match Scheduler::start(params) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                let _ = publisher.close();
                return Err(e).context("Failed to start the scheduler");
            }
        };

        self.wait(&signal_state, clock.as_ref());

        log_block_start!("Shutting down daytime...");
        scheduler.stop().context("Failed to close the transport")?;
        log_decorated!("Transport closed");
        log_end!();
        Ok(())
    }

    fn connect(&self, config: &Config) -> Result<Arc<dyn Publisher>> {
        if self.dry_run {
            log_block_start!("Dry run: messages are logged, not published");
            return Ok(Arc::new(LogPublisher));
        }

        let mqtt = config.mqtt();
        log_block_start!("Connecting to MQTT broker at {}:{}", mqtt.host, mqtt.port);
        let publisher = MqttPublisher::connect(&mqtt, self.debug_enabled)
            .context("Failed to connect to the MQTT broker")?;
        log_decorated!("Connected as '{}'", mqtt.client_id);
        Ok(Arc::new(publisher))
    }

    /// Block until a shutdown signal, or until the end of a simulation.
    /// While simulating, a cleared `running` flag also ends the wait.
    fn wait(&self, signal_state: &SignalState, clock: &dyn TimeSource) {
        let Some(until) = self.until else {
            signal_state.wait_for_shutdown();
            return;
        };

        loop {
            match signal_state
                .signal_receiver
                .recv_timeout(Duration::from_millis(100))
            {
                Ok(_) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if !signal_state.running.load(Ordering::SeqCst) {
                        break;
                    }
                    if clock.now() >= until {
                        log_block_start!("Simulation reached {}", until.format("%Y-%m-%d %H:%M:%S"));
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::signals::SignalMessage;
    use crate::time_source::{SimulatedTimeSource, parse_datetime};
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc;
    use std::time::Instant;

    fn signal_state(running: bool) -> SignalState {
        let (signal_sender, signal_receiver) = mpsc::channel();
        SignalState {
            running: Arc::new(AtomicBool::new(running)),
            signal_receiver,
            signal_sender,
        }
    }

    fn simulation(start: &str, end: &str) -> (Daytime, SimulatedTimeSource) {
        let clock = SimulatedTimeSource::new(parse_datetime(start).unwrap(), 3600.0);
        let app = Daytime::new(false).until(parse_datetime(end).unwrap());
        (app, clock)
    }

    #[test]
    fn test_wait_returns_once_running_is_cleared() {
        // The end is a simulated year away; only the flag can end the wait
        let (app, clock) = simulation("2024-01-15 00:00:00", "2025-01-15 00:00:00");
        let state = signal_state(false);

        let started = Instant::now();
        app.wait(&state, &clock);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_wait_returns_on_shutdown_message() {
        let (app, clock) = simulation("2024-01-15 00:00:00", "2025-01-15 00:00:00");
        let state = signal_state(true);
        state.signal_sender.send(SignalMessage::Shutdown).unwrap();

        let started = Instant::now();
        app.wait(&state, &clock);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_wait_returns_when_simulation_reaches_end() {
        // Ten simulated seconds at 3600x pass in a few milliseconds
        let (app, clock) = simulation("2024-01-15 00:00:00", "2024-01-15 00:00:10");
        let state = signal_state(true);

        app.wait(&state, &clock);
        assert!(clock.now() >= parse_datetime("2024-01-15 00:00:10").unwrap());
        assert!(state.running.load(Ordering::SeqCst));
    }
}
