//! Owned radio events, as they sit in the dispatch queue.

use heapless::Vec;

use crate::ble::{
    AdvertisingReport, ConnectionComplete, DisconnectionComplete, GapEventHandler, PeerAddress,
};
use crate::config::ADV_PAYLOAD_MAX;
use crate::error::{EventKind, InitError};

/// Advertisement report with its payload copied out of the radio's buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueuedReport {
    pub peer: PeerAddress,
    pub rssi: i8,
    pub payload: Vec<u8, ADV_PAYLOAD_MAX>,
}

impl QueuedReport {
    /// Copy `payload`, keeping at most `ADV_PAYLOAD_MAX` bytes.
    ///
    /// A cut-off element is caught by the parser's bounds check, so an
    /// oversized payload reads as nameless rather than as a wrong name.
    pub fn new(peer: PeerAddress, rssi: i8, payload: &[u8]) -> Self {
        let kept = &payload[..payload.len().min(ADV_PAYLOAD_MAX)];
        let mut buf = Vec::new();
        // Cannot fail: `kept` fits by construction.
        let _ = buf.extend_from_slice(kept);
        Self {
            peer,
            rssi,
            payload: buf,
        }
    }

    pub fn as_report(&self) -> AdvertisingReport<'_> {
        AdvertisingReport {
            peer: self.peer,
            rssi: self.rssi,
            payload: &self.payload,
        }
    }
}

/// A radio event waiting to be dispatched.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GapEvent {
    InitComplete(Result<(), InitError>),
    AdvertisingReport(QueuedReport),
    ConnectionComplete(ConnectionComplete),
    DisconnectionComplete(DisconnectionComplete),
}

impl GapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GapEvent::InitComplete(_) => EventKind::InitComplete,
            GapEvent::AdvertisingReport(_) => EventKind::AdvertisingReport,
            GapEvent::ConnectionComplete(_) => EventKind::ConnectionComplete,
            GapEvent::DisconnectionComplete(_) => EventKind::DisconnectionComplete,
        }
    }

    /// Hand the event to the matching handler callback.
    pub fn deliver<H: GapEventHandler + ?Sized>(&self, handler: &mut H) {
        match self {
            GapEvent::InitComplete(result) => handler.on_init_complete(*result),
            GapEvent::AdvertisingReport(report) => {
                handler.on_advertising_report(&report.as_report())
            }
            GapEvent::ConnectionComplete(event) => handler.on_connection_complete(event),
            GapEvent::DisconnectionComplete(event) => handler.on_disconnection_complete(event),
        }
    }
}
