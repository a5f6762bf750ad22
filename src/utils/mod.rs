//! Shared helpers

pub mod logger;
pub mod timer;
