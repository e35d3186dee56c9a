//! Shared utilities for the Halcyon proof-of-work core.

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use time::format_duration;
