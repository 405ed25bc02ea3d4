//! USB subsystem
//!
//! Everything the probe does against libusb goes through here:
//! - `backend`: the `UsbBackend` seam and its rusb implementation
//! - `adapter`: session, target lookup, interface handling and bulk transfers
//! - `descriptor`: descriptor snapshots and the enumeration report
//!
//! The sequencer only ever talks to `Transport`, so tests swap the rusb
//! backend for the simulated one in `simulated`.

pub mod adapter;
pub mod backend;
pub mod descriptor;

#[cfg(test)]
pub mod simulated;

pub use adapter::Transport;
