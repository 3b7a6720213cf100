//! Unix signal handling.
//!
//! A dedicated thread turns SIGINT, SIGTERM and SIGHUP into a single
//! [`SignalMessage::Shutdown`] on a channel the main thread blocks on.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender},
    thread,
};

/// Messages delivered by the signal thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    /// Shutdown signal (SIGTERM, SIGINT, SIGHUP)
    Shutdown,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Cleared once a shutdown signal arrives
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Kept so other parts of the process can request a shutdown too
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// Block until a shutdown is requested.
    pub fn wait_for_shutdown(&self) {
        // A disconnected channel means the handler thread is gone; nothing
        // else can wake us, so treat it as a shutdown as well.
        let _ = self.signal_receiver.recv();
        self.running.store(false, Ordering::SeqCst);
    }
}

fn signal_name(sig: i32) -> &'static str {
    match sig {
        SIGINT => "interrupt signal",
        SIGTERM => "termination request",
        SIGHUP => "hangup signal",
        _ => "signal",
    }
}

/// Install the handler thread.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = std::sync::mpsc::channel::<SignalMessage>();

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running_clone = Arc::clone(&running);
    let signal_sender_clone = signal_sender.clone();

    thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                log_pipe!();
                if debug_enabled {
                    log_info!(
                        "Received {} ({}), initiating graceful shutdown...",
                        signal_name(sig),
                        sig
                    );
                } else {
                    log_info!(
                        "Received {}, initiating graceful shutdown...",
                        signal_name(sig)
                    );
                }

                running_clone.store(false, Ordering::SeqCst);
                if let Err(e) = signal_sender_clone.send(SignalMessage::Shutdown) {
                    log_warning!("Failed to send shutdown message: {e}");
                }
            }
        })
        .context("failed to spawn signal handler thread")?;

    Ok(SignalState {
        running,
        signal_receiver,
        signal_sender,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_via_sender_unblocks_wait() {
        let (signal_sender, signal_receiver) = std::sync::mpsc::channel();
        let state = SignalState {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        };

        state.signal_sender.send(SignalMessage::Shutdown).unwrap();
        state.wait_for_shutdown();
        assert!(!state.running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(SIGINT), "interrupt signal");
        assert_eq!(signal_name(SIGTERM), "termination request");
        assert_eq!(signal_name(SIGHUP), "hangup signal");
    }
}
