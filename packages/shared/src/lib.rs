//! Utilities shared by the Tilecast packages: logging setup and the clock.

pub mod logger;
pub mod time;
