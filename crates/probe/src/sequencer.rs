//! Probe sequencer
//!
//! Drives one test run from session start to teardown and writes the
//! human-readable report. The run moves through `ProbeState` in order and
//! never goes back.
//!
//! Session init, enumeration, claim and release failures end the run with an
//! error. Everything else is reported and the run carries on. Teardown always
//! happens once a session exists.

use crate::probe::{
    PROBE_SEQUENCE, ProbeStep, RESPONSE_TIMEOUT, STATUS_QUERY, TRANSFER_BUFFER_SIZE,
};
use crate::usb::adapter::{INTERFACE, KernelDriver, Transport};
use crate::usb::backend::UsbBackend;
use crate::usb::descriptor;
use common::{Error, Result};
use std::io::Write;
use std::thread;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProbeState {
    Uninitialized,
    SessionOpen,
    DevicesEnumerated,
    DeviceOpened,
    InterfaceClaimed,
    ProbeSequenceRunning,
    InterfaceReleased,
    Closed,
}

/// Which device to probe and how far to go
#[derive(Debug, Clone, Copy)]
pub struct ProbeOptions {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Stop after the enumeration report
    pub list_only: bool,
}

pub struct Sequencer<W: Write> {
    options: ProbeOptions,
    out: W,
    state: ProbeState,
}

impl<W: Write> Sequencer<W> {
    pub fn new(options: ProbeOptions, out: W) -> Self {
        Self {
            options,
            out,
            state: ProbeState::Uninitialized,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ProbeState {
        self.state
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the probe on the session produced by `Transport::initialize`
    ///
    /// Returns the error that aborted the run, if any.
    pub fn run<B: UsbBackend>(&mut self, session: Result<Transport<B>>) -> Result<()> {
        let transport = match session {
            Ok(transport) => transport,
            Err(e) => {
                error!("Failed to open USB session: {}", e);
                writeln!(self.out, "Init Error {}", init_reason(&e))?;
                return Err(e);
            }
        };
        self.advance(ProbeState::SessionOpen);

        let mut handle = None;
        let result = self.drive(&transport, &mut handle);

        transport.teardown(handle);
        self.advance(ProbeState::Closed);
        self.out.flush()?;

        match &result {
            Ok(()) => info!("Probe finished"),
            Err(e) => error!("Probe aborted: {}", e),
        }
        result
    }

    fn drive<B: UsbBackend>(
        &mut self,
        transport: &Transport<B>,
        slot: &mut Option<B::Handle>,
    ) -> Result<()> {
        self.enumerate(transport)?;
        if self.options.list_only {
            return Ok(());
        }

        let ProbeOptions {
            vendor_id,
            product_id,
            ..
        } = self.options;

        let handle = match transport.open_target(vendor_id, product_id) {
            Ok(Some(handle)) => slot.insert(handle),
            Ok(None) => {
                warn!("Device {:04x}:{:04x} not found", vendor_id, product_id);
                writeln!(self.out, "Cannot open device")?;
                return Ok(());
            }
            Err(e) if e.is_fatal() => {
                writeln!(self.out, "Get Device Error")?;
                return Err(e);
            }
            Err(e) => {
                warn!("{}", e);
                writeln!(self.out, "Cannot open device")?;
                return Ok(());
            }
        };
        writeln!(self.out, "Device Opened")?;
        self.advance(ProbeState::DeviceOpened);

        match transport.detach_kernel_driver(handle, INTERFACE) {
            KernelDriver::Detached => {
                writeln!(self.out, "Kernel Driver Active")?;
                writeln!(self.out, "Kernel Driver Detached!")?;
            }
            KernelDriver::DetachFailed => writeln!(self.out, "Kernel Driver Active")?,
            KernelDriver::Inactive => {}
        }

        if let Err(e) = transport.claim_interface(handle, INTERFACE) {
            writeln!(self.out, "Cannot Claim Interface")?;
            return Err(e);
        }
        writeln!(self.out, "Claimed Interface")?;
        self.advance(ProbeState::InterfaceClaimed);

        self.advance(ProbeState::ProbeSequenceRunning);
        let mut buffer = [0u8; TRANSFER_BUFFER_SIZE];
        for step in PROBE_SEQUENCE {
            match step {
                ProbeStep::Command(bytes) => self.command(transport, handle, &mut buffer, bytes)?,
                ProbeStep::Pause(duration) => thread::sleep(duration),
                ProbeStep::StatusQuery => {
                    self.command(transport, handle, &mut buffer, &STATUS_QUERY)?;
                    self.response(transport, handle, &mut buffer)?;
                }
            }
        }

        if let Err(e) = transport.release_interface(handle, INTERFACE) {
            writeln!(self.out, "Cannot Release Interface")?;
            return Err(e);
        }
        writeln!(self.out, "Released Interface")?;
        self.advance(ProbeState::InterfaceReleased);

        Ok(())
    }

    /// List attached devices and report the target's descriptors
    fn enumerate<B: UsbBackend>(&mut self, transport: &Transport<B>) -> Result<()> {
        let devices = match transport.enumerate_devices() {
            Ok(devices) => devices,
            Err(e) => {
                writeln!(self.out, "Get Device Error")?;
                return Err(e);
            }
        };
        writeln!(self.out, "{} Devices in list.", devices.len())?;

        for device in &devices {
            match descriptor::report(
                transport.backend(),
                device,
                self.options.vendor_id,
                self.options.product_id,
                &mut self.out,
            ) {
                Ok(_) | Err(Error::DescriptorRead(_)) => {}
                Err(e) => return Err(e),
            }
        }

        self.advance(ProbeState::DevicesEnumerated);
        Ok(())
    }

    /// Copy `bytes` into the transfer buffer and write them
    fn command<B: UsbBackend>(
        &mut self,
        transport: &Transport<B>,
        handle: &B::Handle,
        buffer: &mut [u8; TRANSFER_BUFFER_SIZE],
        bytes: &[u8],
    ) -> Result<()> {
        buffer[..bytes.len()].copy_from_slice(bytes);

        match transport.write(handle, buffer, bytes.len()) {
            Ok(_) => writeln!(self.out, "Writing Successful!")?,
            Err(e) => {
                warn!("{}", e);
                writeln!(self.out, "Write Error")?;
            }
        }
        Ok(())
    }

    /// Read a status response and dump whatever arrived
    fn response<B: UsbBackend>(
        &mut self,
        transport: &Transport<B>,
        handle: &B::Handle,
        buffer: &mut [u8; TRANSFER_BUFFER_SIZE],
    ) -> Result<()> {
        let received = match transport.read(handle, buffer, TRANSFER_BUFFER_SIZE, RESPONSE_TIMEOUT)
        {
            Ok(read) => {
                writeln!(self.out, "Reading Successful!")?;
                read
            }
            Err(e) => {
                warn!("{}", e);
                writeln!(self.out, "Read Error")?;
                e.transferred()
            }
        };

        let dump = common::render(buffer, received);
        self.out.write_all(dump.as_bytes())?;
        if !dump.is_empty() && !dump.ends_with('\n') {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn advance(&mut self, next: ProbeState) {
        debug!("Probe state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn init_reason(e: &Error) -> &str {
    match e {
        Error::Init(reason) => reason,
        _ => "unknown",
    }
}
