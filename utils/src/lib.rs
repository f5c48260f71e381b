//! Shared utilities for the VFT client.

pub mod logging;

pub use logging::{init_logging, LogFormat};
