//! GIMIC probe test vectors
//!
//! The byte sequences are what the device firmware expects and are sent
//! as-is. Nothing here decodes them.

use std::time::Duration;

/// GIMIC USB vendor id
pub const GIMIC_VENDOR_ID: u16 = 0x16C0;

/// GIMIC USB product id
pub const GIMIC_PRODUCT_ID: u16 = 0x05E5;

/// Size of the buffer shared by every write and read
pub const TRANSFER_BUFFER_SIZE: usize = 64;

/// Hard reset
pub const HARD_RESET: [u8; 3] = [0xFD, 0x81, 0xFF];

/// Status query, answered with up to 64 bytes
pub const STATUS_QUERY: [u8; 5] = [0xFD, 0xB0, 0x00, 0x00, 0xFF];

/// Command sent between the two status queries
pub const SECOND_COMMAND: [u8; 3] = [0x00, 0xCC, 0xFF];

/// How long a status response may take
pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(10);

/// Pause after the hard reset
pub const RESET_SETTLE: Duration = Duration::from_millis(1);

/// Pause after the second command
pub const COMMAND_SETTLE: Duration = Duration::from_millis(50);

/// One step of the probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    /// Write a command, no response expected
    Command(&'static [u8]),
    /// Sleep
    Pause(Duration),
    /// Write `STATUS_QUERY`, read the response and dump it
    StatusQuery,
}

/// The full probe, in order
pub const PROBE_SEQUENCE: [ProbeStep; 6] = [
    ProbeStep::Command(&HARD_RESET),
    ProbeStep::Pause(RESET_SETTLE),
    ProbeStep::StatusQuery,
    ProbeStep::Command(&SECOND_COMMAND),
    ProbeStep::Pause(COMMAND_SETTLE),
    ProbeStep::StatusQuery,
];
