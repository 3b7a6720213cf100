//! Structured logging system with visual formatting.
//!
//! Output is drawn as one continuous tree of box drawing characters:
//!
//! ```text
//! ┏ daytime v0.3.0 ━━╸
//! ┃
//! ┣ Loaded configuration
//! ┃   Offset: 60 minutes
//! ┣[WARNING] Failed to publish Service/Daytime/Status
//! ╹
//! ```
//!
//! The logger can be switched off at runtime for one-shot commands and tests,
//! and rerouted to a file with `--log <file>`.
//!
//! ## Conventions
//!
//! - `log_block_start!` opens a new block (blank pipe line, then `┣ message`).
//!   Related lines follow with `log_decorated!` (`┣ message`) or
//!   `log_indented!` (`┃   message`) for details.
//! - `log_pipe!` inserts an empty `┃` line. Use it before a level macro that
//!   starts its own block, never right before `log_block_start!` or `log_end!`.
//! - `log_version!` prints the header once at startup, `log_end!` the final
//!   marker once at shutdown.
//! - `log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`
//!   add a colored `[LEVEL]` tag. `log_error_exit!` closes the tree with `┗`
//!   for errors that end the process.

use chrono::Timelike;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};
use std::sync::{Arc, OnceLock, RwLock};

use crate::time_source::TimeSource;

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Clock used for line timestamps while simulating
static SIMULATED_CLOCK: RwLock<Option<Arc<dyn TimeSource>>> = RwLock::new(None);

// Channel for routing output to file when --log is active
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Main logging interface. The macros are the usual entry points.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Prefix every line with the time of `clock` while it is simulated.
    /// Pass `None` to go back to plain output.
    pub fn set_simulated_clock(clock: Option<Arc<dyn TimeSource>>) {
        if let Ok(mut slot) = SIMULATED_CLOCK.write() {
            *slot = clock.filter(|clock| clock.is_simulated());
        }
    }

    /// Route all further output to `file_path`, ANSI colors stripped.
    ///
    /// Output goes through a writer thread; the returned guard flushes and
    /// joins it when dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let mut file = std::fs::File::create(&file_path)
            .map_err(|e| anyhow::anyhow!("Failed to create log file {file_path}: {e}"))?;
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            while let Ok(LogMessage::Formatted(text)) = rx.recv() {
                file.write_all(text.as_bytes())?;
            }
            file.flush()?;
            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// `[HH:MM:SS] ` of the simulated clock, empty outside simulation.
    pub fn get_timestamp_prefix() -> String {
        let Ok(slot) = SIMULATED_CLOCK.read() else {
            return String::new();
        };
        match slot.as_ref() {
            Some(clock) => {
                let now = clock.now();
                format!(
                    "[{:02}:{:02}:{:02}] ",
                    now.hour(),
                    now.minute(),
                    now.second()
                )
            }
            None => String::new(),
        }
    }
}

/// Guard for file logging that ensures clean shutdown.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        // LOG_CHANNEL stays set; the process is about to exit
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Write already formatted text to the active sink.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Format one log entry. `lead` is drawn before the first line only, and
/// every line of the entry gets the timestamp prefix.
pub fn emit(lead: &str, marker: &str, message: &str) {
    if !Log::is_enabled() {
        return;
    }
    let prefix = Log::get_timestamp_prefix();
    let mut formatted = String::new();
    if !lead.is_empty() {
        formatted.push_str(&prefix);
        formatted.push_str(lead);
        formatted.push('\n');
    }
    formatted.push_str(&prefix);
    formatted.push_str(marker);
    formatted.push_str(message);
    formatted.push('\n');
    write_output(&formatted);
}

// # Logging Macros

#[doc(hidden)]
#[macro_export]
macro_rules! __log_with {
    ($lead:expr, $marker:expr, $fmt:literal $($arg:tt)*) => {{
        if $crate::logger::Log::is_enabled() {
            $crate::logger::emit($lead, $marker, &format!($fmt $($arg)*));
        }
    }};
    ($lead:expr, $marker:expr, $expr:expr) => {{
        if $crate::logger::Log::is_enabled() {
            $crate::logger::emit($lead, $marker, &$expr.to_string());
        }
    }};
}

/// Log a decorated message inside the current block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_with!("", "┣ ", $($arg)+) };
}

/// Log an indented detail line.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_with!("", "┃   ", $($arg)+) };
}

/// Log an empty pipe line for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::logger::emit("", "┃", "")
    };
}

/// Open a new block.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_with!("┃", "┣ ", $($arg)+) };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::logger::emit(
            "",
            "┏ ",
            &format!("daytime v{} ━━╸", env!("CARGO_PKG_VERSION")),
        )
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::logger::emit("", "╹", "")
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_with!("", "┣[\x1b[33mWARNING\x1b[0m] ", $($arg)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_with!("", "┣[\x1b[31mERROR\x1b[0m] ", $($arg)+) };
}

/// Log an error that ends the process, closing the tree with a corner.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_with!("┃", "┗[\x1b[31mERROR\x1b[0m] ", $($arg)+) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_with!("", "┣[\x1b[32mINFO\x1b[0m] ", $($arg)+) };
}

/// Log a debug line. Callers gate these on `--debug`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log_with!("", "┣[\x1b[36mDEBUG\x1b[0m] ", $($arg)+) };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => { $crate::__log_with!("", "┣[\x1b[31mCRITICAL\x1b[0m] ", $($arg)+) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_codes() {
        assert_eq!(strip_ansi_codes("┣[\x1b[33mWARNING\x1b[0m] x"), "┣[WARNING] x");
        assert_eq!(strip_ansi_codes("plain"), "plain");
        assert_eq!(strip_ansi_codes("\x1bnot a sequence"), "\x1bnot a sequence");
    }
}
