//! Command-line command handlers for daytime.
//!
//! Each one-shot command lives in its own submodule next to its help text.

pub mod help;
pub mod next;
pub mod simulate;
