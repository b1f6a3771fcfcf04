//! Bluetooth Low Energy subsystem.
//!
//! This module drives the radio in **Central** role:
//!
//! 1. **Parser** - walks advertising payloads looking for the Complete
//!    Local Name.
//! 2. **Matcher** - compares that name against the configured target and
//!    requests a connection on a hit.
//! 3. **Central** - owns the connection state machine and restarts
//!    scanning whenever the link goes away.
//!
//! The radio stack itself sits behind [`RadioStack`]; its events come back
//! through [`GapEventHandler`], one at a time, from the dispatch loop.

pub mod address;
pub mod adv_parser;
pub mod central;
pub mod event;
pub mod matcher;

use core::fmt;

pub use address::DeviceAddress;

use crate::error::{BleError, InitError};

/// GAP peer address type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressType {
    Public,
    RandomStatic,
    RandomPrivateResolvable,
    RandomPrivateNonResolvable,
    Anonymous,
}

impl AddressType {
    /// Decode the GAP address type code.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(AddressType::Public),
            0x01 => Some(AddressType::RandomStatic),
            0x02 => Some(AddressType::RandomPrivateResolvable),
            0x03 => Some(AddressType::RandomPrivateNonResolvable),
            0x7F => Some(AddressType::Anonymous),
            _ => None,
        }
    }

    pub const fn raw(self) -> u8 {
        match self {
            AddressType::Public => 0x00,
            AddressType::RandomStatic => 0x01,
            AddressType::RandomPrivateResolvable => 0x02,
            AddressType::RandomPrivateNonResolvable => 0x03,
            AddressType::Anonymous => 0x7F,
        }
    }
}

/// Everything the radio needs to address a connect request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerAddress {
    pub address_type: AddressType,
    pub address: DeviceAddress,
}

impl PeerAddress {
    pub const fn new(address_type: AddressType, address: DeviceAddress) -> Self {
        Self {
            address_type,
            address,
        }
    }
}

/// Opaque per-connection identifier assigned by the radio stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionHandle(pub u16);

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HCI status code of a connection attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusCode(pub u8);

impl StatusCode {
    pub const SUCCESS: Self = Self(0x00);
    pub const CONNECTION_TIMEOUT: Self = Self(0x08);
    pub const CONNECTION_LIMIT_EXCEEDED: Self = Self(0x09);
    pub const UNSPECIFIED: Self = Self(0x1F);
    pub const CONNECTION_FAILED_TO_BE_ESTABLISHED: Self = Self(0x3E);

    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// HCI reason code attached to a disconnection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisconnectReason(pub u8);

impl DisconnectReason {
    pub const CONNECTION_TIMEOUT: Self = Self(0x08);
    pub const REMOTE_USER_TERMINATED: Self = Self(0x13);
    pub const LOCAL_HOST_TERMINATED: Self = Self(0x16);
    pub const UNSPECIFIED: Self = Self(0x1F);
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// One advertisement seen while scanning. The payload is only borrowed
/// for the duration of the handler call.
#[derive(Clone, Copy, Debug)]
pub struct AdvertisingReport<'a> {
    pub peer: PeerAddress,
    /// Received Signal Strength Indicator (dBm).
    pub rssi: i8,
    pub payload: &'a [u8],
}

/// Outcome of a connect request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionComplete {
    pub status: StatusCode,
    /// Only meaningful when `status` is success.
    pub handle: ConnectionHandle,
    pub peer: PeerAddress,
}

impl ConnectionComplete {
    pub const fn succeeded(peer: PeerAddress, handle: ConnectionHandle) -> Self {
        Self {
            status: StatusCode::SUCCESS,
            handle,
            peer,
        }
    }

    pub const fn failed(peer: PeerAddress, status: StatusCode) -> Self {
        Self {
            status,
            handle: ConnectionHandle(0),
            peer,
        }
    }
}

/// The link identified by `handle` is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisconnectionComplete {
    pub handle: ConnectionHandle,
    pub reason: DisconnectReason,
}

/// Commands the controller can issue to the radio.
///
/// Both are fire-and-forget: `Err` only means the request was refused on
/// the spot. The outcome of an accepted request arrives later as a
/// separate event.
pub trait RadioStack {
    /// Start (or restart) scanning with default parameters.
    fn start_scan(&mut self) -> Result<(), BleError>;

    /// Request a connection to `peer` with default connection parameters.
    fn connect(&mut self, peer: &PeerAddress) -> Result<(), BleError>;
}

impl<R: RadioStack + ?Sized> RadioStack for &mut R {
    fn start_scan(&mut self) -> Result<(), BleError> {
        (**self).start_scan()
    }

    fn connect(&mut self, peer: &PeerAddress) -> Result<(), BleError> {
        (**self).connect(peer)
    }
}

/// Receiver of radio-stack events. Every call runs to completion on the
/// dispatch loop before the next one starts.
pub trait GapEventHandler {
    fn on_init_complete(&mut self, result: Result<(), InitError>);
    fn on_advertising_report(&mut self, report: &AdvertisingReport<'_>);
    fn on_connection_complete(&mut self, event: &ConnectionComplete);
    fn on_disconnection_complete(&mut self, event: &DisconnectionComplete);
}
