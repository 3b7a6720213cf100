//! Sunrise/sunset based transition calculation.
//!
//! ## Module Structure
//!
//! - [`solar`]: raw astronomical sunrise/sunset behind the [`SolarModel`] seam
//! - [`transition`]: offset adjustment and the next-transition ordering policy
//!
//! The calculator is pure: it reads no clock and keeps no state between calls,
//! so the scheduler decides when to ask and what "now" means.

pub mod solar;
pub mod transition;

pub use solar::{SolarModel, SunTimes, SunriseModel};
pub use transition::{Calculation, Calculator, DayBoundaries, Location, Status, Transition};
