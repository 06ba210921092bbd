//! Calendar management, unit constants, and numeric conventions.

pub mod consts;
pub mod math;
pub mod time;
