//! Transport adapter
//!
//! Owns the USB session and exposes the operations the probe needs: device
//! listing, target lookup, kernel driver detachment, interface claim/release
//! and bulk transfers on the device's fixed endpoint pair.
//!
//! A transfer only counts as successful when the full requested length moved.

use crate::usb::backend::{RusbBackend, UsbBackend, UsbHandle};
use common::{Error, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interface carrying the bulk endpoints
pub const INTERFACE: u8 = 0;

/// Bulk OUT endpoint 2
pub const ENDPOINT_OUT: u8 = 0x02;

/// Bulk IN endpoint 5
pub const ENDPOINT_IN: u8 = 0x85;

/// Writes wait until the device accepts the data
const WRITE_TIMEOUT: Duration = Duration::ZERO;

/// What happened to the kernel driver bound to an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelDriver {
    /// No driver was bound, or the platform cannot tell
    Inactive,
    /// A driver was bound and has been detached
    Detached,
    /// A driver was bound and could not be detached
    DetachFailed,
}

/// USB session plus the transfer primitives used by the probe
pub struct Transport<B: UsbBackend> {
    backend: B,
}

impl Transport<RusbBackend> {
    /// Open a libusb session
    pub fn initialize(log_level: rusb::LogLevel) -> Result<Self> {
        let backend = RusbBackend::new(log_level).map_err(|e| Error::Init(e.to_string()))?;
        info!("USB session opened");
        Ok(Self::new(backend))
    }
}

impl<B: UsbBackend> Transport<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Snapshot of attached devices
    pub fn enumerate_devices(&self) -> Result<Vec<B::Device>> {
        let devices = self
            .backend
            .devices()
            .map_err(|e| Error::Enumeration(e.to_string()))?;

        debug!("Enumerated {} devices", devices.len());
        Ok(devices)
    }

    /// Open the first device matching `vendor_id:product_id`
    ///
    /// `Ok(None)` when no such device is attached. Devices whose descriptor
    /// cannot be read are skipped.
    pub fn open_target(&self, vendor_id: u16, product_id: u16) -> Result<Option<B::Handle>> {
        let devices = self.enumerate_devices()?;

        let Some(device) = devices.iter().find(|device| {
            self.backend
                .device_descriptor(device)
                .map(|desc| desc.matches(vendor_id, product_id))
                .unwrap_or(false)
        }) else {
            debug!("No device {:04x}:{:04x} attached", vendor_id, product_id);
            return Ok(None);
        };

        let handle = self.backend.open(device).map_err(|e| Error::Open {
            vendor_id,
            product_id,
            reason: e.to_string(),
        })?;

        info!("Opened device {:04x}:{:04x}", vendor_id, product_id);
        Ok(Some(handle))
    }

    /// Detach the kernel driver from `interface` if one is bound
    ///
    /// Failures are logged and otherwise ignored; claiming may still work.
    pub fn detach_kernel_driver(&self, handle: &mut B::Handle, interface: u8) -> KernelDriver {
        match handle.kernel_driver_active(interface) {
            Ok(true) => {
                debug!("Detaching kernel driver from interface {}", interface);
                match handle.detach_kernel_driver(interface) {
                    Ok(()) => KernelDriver::Detached,
                    Err(e) => {
                        warn!(
                            "Failed to detach kernel driver from interface {}: {}",
                            interface, e
                        );
                        KernelDriver::DetachFailed
                    }
                }
            }
            Ok(false) => {
                debug!("No kernel driver active on interface {}", interface);
                KernelDriver::Inactive
            }
            Err(e) => {
                debug!(
                    "Could not check kernel driver status for interface {}: {}",
                    interface, e
                );
                KernelDriver::Inactive
            }
        }
    }

    pub fn claim_interface(&self, handle: &mut B::Handle, interface: u8) -> Result<()> {
        handle.claim_interface(interface).map_err(|e| Error::Claim {
            interface,
            reason: e.to_string(),
        })?;

        debug!("Claimed interface {}", interface);
        Ok(())
    }

    /// Write the first `length` bytes of `buffer` to the OUT endpoint
    ///
    /// Blocks until the device takes the data.
    pub fn write(&self, handle: &B::Handle, buffer: &[u8], length: usize) -> Result<usize> {
        let data = buffer.get(..length).ok_or_else(|| Error::Write {
            requested: length,
            transferred: 0,
            reason: Some(format!("buffer holds only {} bytes", buffer.len())),
        })?;

        let written = handle
            .write_bulk(ENDPOINT_OUT, data, WRITE_TIMEOUT)
            .map_err(|e| Error::Write {
                requested: length,
                transferred: 0,
                reason: Some(e.to_string()),
            })?;

        debug!(
            "Bulk write: endpoint={:#x}, {} of {} bytes",
            ENDPOINT_OUT, written, length
        );

        if written != length {
            return Err(Error::Write {
                requested: length,
                transferred: written,
                reason: None,
            });
        }
        Ok(written)
    }

    /// Read `length` bytes from the IN endpoint into `buffer`
    ///
    /// Anything short of `length` within `timeout` is an error; the partial
    /// count travels with it.
    pub fn read(
        &self,
        handle: &B::Handle,
        buffer: &mut [u8],
        length: usize,
        timeout: Duration,
    ) -> Result<usize> {
        let available = buffer.len();
        let data = buffer.get_mut(..length).ok_or_else(|| Error::Read {
            requested: length,
            transferred: 0,
            reason: Some(format!("buffer holds only {} bytes", available)),
        })?;

        let read = handle
            .read_bulk(ENDPOINT_IN, data, timeout)
            .map_err(|e| Error::Read {
                requested: length,
                transferred: 0,
                reason: Some(e.to_string()),
            })?;

        debug!(
            "Bulk read: endpoint={:#x}, {} of {} bytes, timeout={}ms",
            ENDPOINT_IN,
            read,
            length,
            timeout.as_millis()
        );

        if read != length {
            return Err(Error::Read {
                requested: length,
                transferred: read,
                reason: None,
            });
        }
        Ok(read)
    }

    pub fn release_interface(&self, handle: &mut B::Handle, interface: u8) -> Result<()> {
        handle.release_interface(interface).map_err(|e| Error::Release {
            interface,
            reason: e.to_string(),
        })?;

        debug!("Released interface {}", interface);
        Ok(())
    }

    /// Close the device handle, if any, and end the session
    pub fn teardown(self, handle: Option<B::Handle>) {
        if let Some(handle) = handle {
            drop(handle);
            debug!("Closed device handle");
        }
        drop(self.backend);
        info!("USB session closed");
    }
}
