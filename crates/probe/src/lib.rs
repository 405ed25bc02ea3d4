//! GIMIC bulk-transfer smoke test
//!
//! The `gimic-usb-test` binary is a thin CLI over these modules: `config`
//! loads settings, `usb` wraps libusb behind the `UsbBackend` seam and
//! `sequencer` runs the fixed command exchange and writes the report.

pub mod config;
pub mod probe;
pub mod sequencer;
pub mod usb;
