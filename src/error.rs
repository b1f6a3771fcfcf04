//! Unified error type for blelink.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.
//!
//! None of these errors ever leave the controller: every handler logs
//! what went wrong and recovers locally.

use core::fmt;

use crate::ble::StatusCode;

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The radio stack failed to come up. Terminal for the session.
    Initialization(InitError),

    /// A connect attempt completed with a non-success status.
    ConnectionFailed(StatusCode),

    /// An advertisement element declared more bytes than the payload holds.
    MalformedAdvertisement,

    /// An event arrived in a state that does not expect it.
    UnexpectedEvent {
        event: EventKind,
        state: StateKind,
    },

    /// The radio stack refused a command synchronously.
    Radio(BleError),
}

/// Raw error code reported by the radio stack when initialization fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitError(pub u32);

/// Subset of radio-stack errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// Raw error code from the radio stack.
    Raw(u32),
    /// The command queue towards the radio is full.
    Busy,
    /// Scan could not start.
    ScanFailed,
    /// Connection request could not be issued.
    ConnectFailed,
}

/// Which radio event a handler was processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    InitComplete,
    AdvertisingReport,
    ConnectionComplete,
    DisconnectionComplete,
}

/// Fieldless mirror of `ConnectionState`, for error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StateKind {
    Initializing,
    Scanning,
    Connecting,
    Connected,
    Disconnected,
    Failed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Radio(e)
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Error::Initialization(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Initialization(e) => write!(f, "radio initialization failed (error {})", e.0),
            Error::ConnectionFailed(status) => write!(f, "connection failed (status {})", status),
            Error::MalformedAdvertisement => f.write_str("malformed advertisement"),
            Error::UnexpectedEvent { event, state } => {
                write!(f, "unexpected {:?} while {:?}", event, state)
            }
            Error::Radio(e) => write!(f, "radio command rejected ({})", e),
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl fmt::Display for BleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BleError::Raw(code) => write!(f, "raw error {:#x}", code),
            BleError::Busy => f.write_str("radio busy"),
            BleError::ScanFailed => f.write_str("scan failed"),
            BleError::ConnectFailed => f.write_str("connect failed"),
        }
    }
}
