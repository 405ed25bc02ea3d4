//! USB backend abstraction
//!
//! `UsbBackend` and `UsbHandle` cover the handful of libusb calls the probe
//! makes. `RusbBackend` is the real implementation; tests use a simulated one.

use crate::usb::descriptor::{
    AltSettingSummary, ConfigSummary, DeviceSummary, EndpointSummary, InterfaceSummary,
};
use rusb::{Context, Device, DeviceHandle, LogLevel, UsbContext};
use std::time::Duration;
use tracing::debug;

/// bDescriptorType of every endpoint descriptor (USB 2.0, table 9-5)
const ENDPOINT_DESCRIPTOR_TYPE: u8 = 0x05;

/// A USB access session
pub trait UsbBackend {
    /// A device seen during enumeration
    type Device;
    /// An open device
    type Handle: UsbHandle;

    /// Snapshot of the attached devices
    fn devices(&self) -> rusb::Result<Vec<Self::Device>>;

    /// Read the device descriptor of an enumerated device
    fn device_descriptor(&self, device: &Self::Device) -> rusb::Result<DeviceSummary>;

    /// Read configuration descriptor `index` of an enumerated device
    fn config_descriptor(&self, device: &Self::Device, index: u8) -> rusb::Result<ConfigSummary>;

    /// Open an enumerated device
    fn open(&self, device: &Self::Device) -> rusb::Result<Self::Handle>;
}

/// Operations on an open device
pub trait UsbHandle {
    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool>;

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()>;

    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()>;

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()>;

    /// Bulk OUT transfer. A zero timeout waits forever.
    fn write_bulk(&self, endpoint: u8, data: &[u8], timeout: Duration) -> rusb::Result<usize>;

    /// Bulk IN transfer. A zero timeout waits forever.
    fn read_bulk(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize>;
}

/// libusb through rusb
pub struct RusbBackend {
    context: Context,
}

impl RusbBackend {
    /// Create a new libusb context with the given debug verbosity
    pub fn new(log_level: LogLevel) -> rusb::Result<Self> {
        let mut context = Context::new()?;
        context.set_log_level(log_level);
        debug!("libusb context created");

        Ok(Self { context })
    }
}

impl UsbBackend for RusbBackend {
    type Device = Device<Context>;
    type Handle = DeviceHandle<Context>;

    fn devices(&self) -> rusb::Result<Vec<Self::Device>> {
        // The libusb list is freed when `list` drops; each Device keeps its own reference
        let list = self.context.devices()?;
        Ok(list.iter().collect())
    }

    fn device_descriptor(&self, device: &Self::Device) -> rusb::Result<DeviceSummary> {
        let desc = device.device_descriptor()?;

        Ok(DeviceSummary {
            vendor_id: desc.vendor_id(),
            product_id: desc.product_id(),
            class_code: desc.class_code(),
            num_configurations: desc.num_configurations(),
        })
    }

    fn config_descriptor(&self, device: &Self::Device, index: u8) -> rusb::Result<ConfigSummary> {
        let config = device.config_descriptor(index)?;

        let interfaces = config
            .interfaces()
            .map(|interface| InterfaceSummary {
                alt_settings: interface
                    .descriptors()
                    .map(|alt| AltSettingSummary {
                        interface_number: alt.interface_number(),
                        endpoints: alt
                            .endpoint_descriptors()
                            .map(|ep| EndpointSummary {
                                descriptor_type: ENDPOINT_DESCRIPTOR_TYPE,
                                address: ep.address(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Ok(ConfigSummary {
            num_interfaces: config.num_interfaces(),
            interfaces,
        })
    }

    fn open(&self, device: &Self::Device) -> rusb::Result<Self::Handle> {
        device.open()
    }
}

impl UsbHandle for DeviceHandle<Context> {
    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool> {
        DeviceHandle::kernel_driver_active(self, interface)
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::detach_kernel_driver(self, interface)
    }

    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::claim_interface(self, interface)
    }

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::release_interface(self, interface)
    }

    fn write_bulk(&self, endpoint: u8, data: &[u8], timeout: Duration) -> rusb::Result<usize> {
        DeviceHandle::write_bulk(self, endpoint, data, timeout)
    }

    fn read_bulk(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize> {
        DeviceHandle::read_bulk(self, endpoint, buf, timeout)
    }
}

/// Map a config-file level name onto libusb's debug verbosity
pub fn parse_libusb_level(level: &str) -> Option<LogLevel> {
    match level {
        "none" => Some(LogLevel::None),
        "error" => Some(LogLevel::Error),
        "warning" => Some(LogLevel::Warning),
        "info" => Some(LogLevel::Info),
        "debug" => Some(LogLevel::Debug),
        _ => None,
    }
}
