//! Descriptor snapshots and the enumeration report
//!
//! The backend copies what the report needs out of libusb's descriptors, so
//! the library-owned configuration descriptor is freed before printing starts.

use crate::usb::backend::UsbBackend;
use common::{Error, Result};
use std::io::Write;
use tracing::{debug, warn};

/// Fields of a device descriptor shown in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSummary {
    pub vendor_id: u16,
    pub product_id: u16,
    pub class_code: u8,
    pub num_configurations: u8,
}

impl DeviceSummary {
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

/// A configuration descriptor with its interfaces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSummary {
    /// bNumInterfaces as reported by the device
    pub num_interfaces: u8,
    pub interfaces: Vec<InterfaceSummary>,
}

/// One interface and its alternate settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSummary {
    pub alt_settings: Vec<AltSettingSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AltSettingSummary {
    pub interface_number: u8,
    pub endpoints: Vec<EndpointSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSummary {
    pub descriptor_type: u8,
    pub address: u8,
}

/// Print the descriptor summary of `device` if it is the target device
///
/// Returns `Ok(true)` when a report was printed and `Ok(false)` when the
/// device did not match. Unreadable descriptors are reported to `out` and
/// returned as `Error::DescriptorRead`.
pub fn report<B: UsbBackend, W: Write>(
    backend: &B,
    device: &B::Device,
    vendor_id: u16,
    product_id: u16,
    out: &mut W,
) -> Result<bool> {
    let desc = match backend.device_descriptor(device) {
        Ok(desc) => desc,
        Err(e) => {
            warn!("Failed to get device descriptor: {}", e);
            writeln!(out, "failed to get device descriptor")?;
            return Err(Error::DescriptorRead(e.to_string()));
        }
    };

    if !desc.matches(vendor_id, product_id) {
        debug!(
            "Skipping device {:04x}:{:04x}",
            desc.vendor_id, desc.product_id
        );
        return Ok(false);
    }

    writeln!(
        out,
        "Number of possible configurations: {}  Device Class: {}  VendorID: {}  ProductID: {}",
        desc.num_configurations, desc.class_code, desc.vendor_id, desc.product_id
    )?;

    let config = match backend.config_descriptor(device, 0) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to get config descriptor 0: {}", e);
            writeln!(out, "failed to get config descriptor")?;
            return Err(Error::DescriptorRead(e.to_string()));
        }
    };

    write_config(&config, out)?;
    Ok(true)
}

fn write_config<W: Write>(config: &ConfigSummary, out: &mut W) -> std::io::Result<()> {
    write!(out, "Interfaces: {} ||| ", config.num_interfaces)?;

    for interface in config.interfaces.iter().take(config.num_interfaces as usize) {
        write!(
            out,
            "Number of alternate settings: {} | ",
            interface.alt_settings.len()
        )?;
        for alt in &interface.alt_settings {
            write!(out, "Interface Number: {} | ", alt.interface_number)?;
            write!(out, "Number of endpoints: {} | ", alt.endpoints.len())?;
            for ep in &alt.endpoints {
                write!(out, "Descriptor Type: {} | ", ep.descriptor_type)?;
                write!(out, "EP Address: {} | ", ep.address)?;
            }
        }
    }

    write!(out, "\n\n\n")
}
