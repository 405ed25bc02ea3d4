//! Simulated USB backend for tests
//!
//! Devices and handles behave according to plain data set up by the test.
//! Everything a handle does is recorded in a shared `Activity` log so tests
//! can inspect it after the handle has been consumed by teardown.

use crate::usb::backend::{UsbBackend, UsbHandle};
use crate::usb::descriptor::{
    AltSettingSummary, ConfigSummary, DeviceSummary, EndpointSummary, InterfaceSummary,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Configuration descriptor of the GIMIC: one interface, bulk OUT 0x02 and IN 0x85
pub fn gimic_config() -> ConfigSummary {
    ConfigSummary {
        num_interfaces: 1,
        interfaces: vec![InterfaceSummary {
            alt_settings: vec![AltSettingSummary {
                interface_number: 0,
                endpoints: vec![
                    EndpointSummary {
                        descriptor_type: 5,
                        address: 0x02,
                    },
                    EndpointSummary {
                        descriptor_type: 5,
                        address: 0x85,
                    },
                ],
            }],
        }],
    }
}

/// How an opened handle responds
#[derive(Debug, Clone, Default)]
pub struct HandleBehavior {
    pub kernel_driver_active: bool,
    pub kernel_driver_query_error: Option<rusb::Error>,
    pub detach_error: Option<rusb::Error>,
    pub claim_error: Option<rusb::Error>,
    pub release_error: Option<rusb::Error>,
    /// Cap on bytes accepted per write
    pub write_limit: Option<usize>,
    pub write_error: Option<rusb::Error>,
    pub read_error: Option<rusb::Error>,
    /// Bytes returned by every read, truncated to the buffer
    pub response: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    pub summary: DeviceSummary,
    pub descriptor_error: Option<rusb::Error>,
    pub config: Option<ConfigSummary>,
    pub open_error: Option<rusb::Error>,
    pub handle: HandleBehavior,
}

impl SimulatedDevice {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            summary: DeviceSummary {
                vendor_id,
                product_id,
                class_code: 0,
                num_configurations: 1,
            },
            descriptor_error: None,
            config: Some(ConfigSummary::default()),
            open_error: None,
            handle: HandleBehavior::default(),
        }
    }

    /// A GIMIC that answers every read with 64 bytes of 0x5A
    pub fn gimic() -> Self {
        let mut device = Self::new(0x16C0, 0x05E5);
        device.config = Some(gimic_config());
        device.handle.response = vec![0x5A; 64];
        device
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub endpoint: u8,
    pub data: Vec<u8>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRecord {
    pub endpoint: u8,
    pub requested: usize,
    pub timeout: Duration,
}

/// Everything handles opened from one backend did
#[derive(Debug, Default)]
pub struct Activity {
    pub opened: usize,
    pub closed: usize,
    pub detached: Vec<u8>,
    pub claimed: Vec<u8>,
    pub released: Vec<u8>,
    pub writes: Vec<WriteRecord>,
    pub reads: Vec<ReadRecord>,
}

pub struct SimulatedBackend {
    pub devices: Vec<SimulatedDevice>,
    pub list_error: Option<rusb::Error>,
    /// Number of listings that succeed before `list_error` kicks in
    pub list_successes: usize,
    list_calls: Cell<usize>,
    pub activity: Rc<RefCell<Activity>>,
}

impl SimulatedBackend {
    pub fn with_devices(devices: Vec<SimulatedDevice>) -> Self {
        Self {
            devices,
            list_error: None,
            list_successes: 0,
            list_calls: Cell::new(0),
            activity: Rc::new(RefCell::new(Activity::default())),
        }
    }
}

impl UsbBackend for SimulatedBackend {
    type Device = SimulatedDevice;
    type Handle = SimulatedHandle;

    fn devices(&self) -> rusb::Result<Vec<Self::Device>> {
        let call = self.list_calls.get();
        self.list_calls.set(call + 1);

        match self.list_error {
            Some(e) if call >= self.list_successes => Err(e),
            _ => Ok(self.devices.clone()),
        }
    }

    fn device_descriptor(&self, device: &Self::Device) -> rusb::Result<DeviceSummary> {
        match device.descriptor_error {
            Some(e) => Err(e),
            None => Ok(device.summary),
        }
    }

    fn config_descriptor(&self, device: &Self::Device, index: u8) -> rusb::Result<ConfigSummary> {
        if index != 0 {
            return Err(rusb::Error::NotFound);
        }
        device.config.clone().ok_or(rusb::Error::NotFound)
    }

    fn open(&self, device: &Self::Device) -> rusb::Result<Self::Handle> {
        if let Some(e) = device.open_error {
            return Err(e);
        }
        self.activity.borrow_mut().opened += 1;

        Ok(SimulatedHandle {
            behavior: device.handle.clone(),
            activity: Rc::clone(&self.activity),
        })
    }
}

#[derive(Debug)]
pub struct SimulatedHandle {
    behavior: HandleBehavior,
    activity: Rc<RefCell<Activity>>,
}

impl UsbHandle for SimulatedHandle {
    fn kernel_driver_active(&self, _interface: u8) -> rusb::Result<bool> {
        match self.behavior.kernel_driver_query_error {
            Some(e) => Err(e),
            None => Ok(self.behavior.kernel_driver_active),
        }
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        if let Some(e) = self.behavior.detach_error {
            return Err(e);
        }
        self.activity.borrow_mut().detached.push(interface);
        Ok(())
    }

    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()> {
        if let Some(e) = self.behavior.claim_error {
            return Err(e);
        }
        self.activity.borrow_mut().claimed.push(interface);
        Ok(())
    }

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()> {
        if let Some(e) = self.behavior.release_error {
            return Err(e);
        }
        self.activity.borrow_mut().released.push(interface);
        Ok(())
    }

    fn write_bulk(&self, endpoint: u8, data: &[u8], timeout: Duration) -> rusb::Result<usize> {
        self.activity.borrow_mut().writes.push(WriteRecord {
            endpoint,
            data: data.to_vec(),
            timeout,
        });
        if let Some(e) = self.behavior.write_error {
            return Err(e);
        }
        Ok(self
            .behavior
            .write_limit
            .map_or(data.len(), |limit| limit.min(data.len())))
    }

    fn read_bulk(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize> {
        self.activity.borrow_mut().reads.push(ReadRecord {
            endpoint,
            requested: buf.len(),
            timeout,
        });
        if let Some(e) = self.behavior.read_error {
            return Err(e);
        }
        let len = self.behavior.response.len().min(buf.len());
        buf[..len].copy_from_slice(&self.behavior.response[..len]);
        Ok(len)
    }
}

impl Drop for SimulatedHandle {
    fn drop(&mut self) {
        self.activity.borrow_mut().closed += 1;
    }
}
