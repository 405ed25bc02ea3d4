//! Common error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("USB init error: {0}")]
    Init(String),

    #[error("Failed to list USB devices: {0}")]
    Enumeration(String),

    #[error("Cannot open device {vendor_id:04x}:{product_id:04x}: {reason}")]
    Open {
        vendor_id: u16,
        product_id: u16,
        reason: String,
    },

    #[error("Cannot claim interface {interface}: {reason}")]
    Claim { interface: u8, reason: String },

    #[error("Write error: {transferred} of {requested} bytes written{}", fmt_reason(.reason))]
    Write {
        requested: usize,
        transferred: usize,
        reason: Option<String>,
    },

    #[error("Read error: {transferred} of {requested} bytes read{}", fmt_reason(.reason))]
    Read {
        requested: usize,
        transferred: usize,
        reason: Option<String>,
    },

    #[error("Cannot release interface {interface}: {reason}")]
    Release { interface: u8, reason: String },

    #[error("Failed to read descriptor: {0}")]
    DescriptorRead(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_reason(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" ({})", r))
        .unwrap_or_default()
}

impl Error {
    /// Whether this error ends the probe run with a non-zero exit code
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Init(_) | Error::Enumeration(_) | Error::Claim { .. } | Error::Release { .. }
        )
    }

    /// Bytes that made it across before a transfer failed
    ///
    /// Zero for anything that is not a write or read error.
    pub fn transferred(&self) -> usize {
        match self {
            Error::Write { transferred, .. } | Error::Read { transferred, .. } => *transferred,
            _ => 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Init("no memory".into()).is_fatal());
        assert!(Error::Enumeration("io".into()).is_fatal());
        assert!(
            Error::Claim {
                interface: 0,
                reason: "busy".into()
            }
            .is_fatal()
        );
        assert!(
            Error::Release {
                interface: 0,
                reason: "no device".into()
            }
            .is_fatal()
        );

        assert!(
            !Error::Open {
                vendor_id: 0x16c0,
                product_id: 0x05e5,
                reason: "access".into()
            }
            .is_fatal()
        );
        assert!(
            !Error::Write {
                requested: 3,
                transferred: 1,
                reason: None
            }
            .is_fatal()
        );
        assert!(
            !Error::Read {
                requested: 64,
                transferred: 0,
                reason: Some("timeout".into())
            }
            .is_fatal()
        );
        assert!(!Error::DescriptorRead("pipe".into()).is_fatal());
    }

    #[test]
    fn test_transferred_counts() {
        let err = Error::Read {
            requested: 64,
            transferred: 12,
            reason: None,
        };
        assert_eq!(err.transferred(), 12);

        let err = Error::Write {
            requested: 5,
            transferred: 0,
            reason: Some("Operation timed out".into()),
        };
        assert_eq!(err.transferred(), 0);

        assert_eq!(Error::Init("x".into()).transferred(), 0);
    }

    #[test]
    fn test_display_includes_counts() {
        let err = Error::Write {
            requested: 3,
            transferred: 2,
            reason: None,
        };
        assert_eq!(err.to_string(), "Write error: 2 of 3 bytes written");

        let err = Error::Read {
            requested: 64,
            transferred: 0,
            reason: Some("Operation timed out".into()),
        };
        assert_eq!(
            err.to_string(),
            "Read error: 0 of 64 bytes read (Operation timed out)"
        );
    }
}
