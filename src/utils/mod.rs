//! Utility functions

pub mod time;

pub use time::rfc3339_now;
