//! Common utilities for gimic-usb-test
//!
//! This crate provides the pieces of the probe that do not touch libusb:
//! the shared error type, logging setup, and the hex dump printer used to
//! show device responses.

pub mod error;
pub mod hexdump;
pub mod logging;

pub use error::{Error, Result};
pub use hexdump::render;
pub use logging::setup_logging;
