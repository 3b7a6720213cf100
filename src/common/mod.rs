// Common constants and helpers shared across modules

pub mod constants;
pub mod utils;
