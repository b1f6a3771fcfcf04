//! Connection lifecycle controller.
//!
//! `Central` owns the one connection this device manages and reacts to
//! radio events:
//!
//! ```text
//!  Initializing ──init ok──▶ Scanning ──name match──▶ Connecting
//!       │                     ▲   ▲                      │    │
//!    init err                 │   └──── connect failed ───┘    │
//!       ▼                     │                          connected
//!     Failed                  └──── disconnected ◀── Connected ◀┘
//! ```
//!
//! Events that do not fit the current state are logged and dropped.

use core::fmt;

use crate::ble::matcher::{initiate_on_match, MatchOutcome, NameFilter};
use crate::ble::{
    AdvertisingReport, ConnectionComplete, ConnectionHandle, DisconnectionComplete,
    GapEventHandler, PeerAddress, RadioStack,
};
use crate::error::{Error, EventKind, InitError, StateKind};

/// Where the single managed connection currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// Waiting for the radio stack to report initialization.
    Initializing,
    Scanning,
    /// One connect request is outstanding.
    Connecting { peer: PeerAddress },
    /// The handle lives here, so it cannot outlive the link.
    Connected {
        handle: ConnectionHandle,
        peer: PeerAddress,
    },
    /// Link lost and the scan restart was refused; see
    /// [`Central::resume_scanning`].
    Disconnected,
    /// Radio stack never came up. Terminal.
    Failed { error: InitError },
}

impl ConnectionState {
    pub fn kind(&self) -> StateKind {
        match self {
            ConnectionState::Initializing => StateKind::Initializing,
            ConnectionState::Scanning => StateKind::Scanning,
            ConnectionState::Connecting { .. } => StateKind::Connecting,
            ConnectionState::Connected { .. } => StateKind::Connected,
            ConnectionState::Disconnected => StateKind::Disconnected,
            ConnectionState::Failed { .. } => StateKind::Failed,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ConnectionState::Initializing => "initializing",
            ConnectionState::Scanning => "scanning",
            ConnectionState::Connecting { .. } => "connecting",
            ConnectionState::Connected { .. } => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

/// Running counters, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CentralStats {
    pub adverts_seen: u32,
    pub malformed_adverts: u32,
    pub scan_starts: u32,
    pub connect_requests: u32,
    pub connect_failures: u32,
    pub disconnections: u32,
    pub unexpected_events: u32,
}

/// The connection context: radio handle, target filter and state.
pub struct Central<'n, R> {
    radio: R,
    filter: NameFilter<'n>,
    state: ConnectionState,
    stats: CentralStats,
    last_error: Option<Error>,
}

impl<'n, R: RadioStack> Central<'n, R> {
    pub fn new(radio: R, target_name: &'n str) -> Self {
        Self {
            radio,
            filter: NameFilter::new(target_name),
            state: ConnectionState::Initializing,
            stats: CentralStats::default(),
            last_error: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Handle of the live connection, `None` unless connected.
    pub fn connection_handle(&self) -> Option<ConnectionHandle> {
        match self.state {
            ConnectionState::Connected { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn target_name(&self) -> &'n str {
        self.filter.target()
    }

    pub fn stats(&self) -> &CentralStats {
        &self.stats
    }

    /// Most recent error any handler recovered from.
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Retry the scan start after the radio refused it. Does nothing in
    /// any state other than `Disconnected`. Advertising reports retry on
    /// their own; the firmware loop also calls this on an idle timer.
    pub fn resume_scanning(&mut self) -> Result<(), Error> {
        if self.state != ConnectionState::Disconnected {
            return Ok(());
        }
        self.start_scanning()
    }

    fn start_scanning(&mut self) -> Result<(), Error> {
        match self.radio.start_scan() {
            Ok(()) => {
                self.stats.scan_starts = self.stats.scan_starts.wrapping_add(1);
                self.state = ConnectionState::Scanning;
                info!("scanning for \"{}\"", self.filter.target());
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                Err(e.into())
            }
        }
    }

    fn unexpected(&mut self, event: EventKind) -> Error {
        self.stats.unexpected_events = self.stats.unexpected_events.wrapping_add(1);
        Error::UnexpectedEvent {
            event,
            state: self.state.kind(),
        }
    }

    fn handle_init(&mut self, result: Result<(), InitError>) -> Result<(), Error> {
        if self.state != ConnectionState::Initializing {
            return Err(self.unexpected(EventKind::InitComplete));
        }
        if let Err(error) = result {
            self.state = ConnectionState::Failed { error };
            return Err(error.into());
        }
        info!("radio initialized");
        self.start_scanning()
    }

    fn handle_report(&mut self, report: &AdvertisingReport<'_>) -> Result<(), Error> {
        self.stats.adverts_seen = self.stats.adverts_seen.wrapping_add(1);
        if self.state == ConnectionState::Disconnected {
            self.start_scanning()?;
        }
        if let Ok(addr) = report.peer.address.to_hex_string() {
            trace!("advertisement from {}, RSSI {} dBm", addr.as_str(), report.rssi);
        }

        match initiate_on_match(&mut self.state, &mut self.radio, &self.filter, report) {
            MatchOutcome::ConnectRequested => {
                self.stats.connect_requests = self.stats.connect_requests.wrapping_add(1);
                Ok(())
            }
            MatchOutcome::Malformed => {
                self.stats.malformed_adverts = self.stats.malformed_adverts.wrapping_add(1);
                Err(Error::MalformedAdvertisement)
            }
            MatchOutcome::Unnamed
            | MatchOutcome::Mismatch
            | MatchOutcome::Busy
            | MatchOutcome::ConnectRejected => Ok(()),
        }
    }

    fn handle_connection(&mut self, event: &ConnectionComplete) -> Result<(), Error> {
        let ConnectionState::Connecting { peer } = self.state else {
            return Err(self.unexpected(EventKind::ConnectionComplete));
        };

        if event.status.is_success() {
            self.state = ConnectionState::Connected {
                handle: event.handle,
                peer,
            };
            info!("connected to {} (handle {})", peer.address, event.handle);
            return Ok(());
        }

        self.stats.connect_failures = self.stats.connect_failures.wrapping_add(1);
        // The radio may have stopped scanning for the attempt; restart it
        // explicitly either way. The status code stays the reported error.
        if let Err(e) = self.start_scanning() {
            error!("rescan after failed connect: {}", e);
        }
        Err(Error::ConnectionFailed(event.status))
    }

    fn handle_disconnection(&mut self, event: &DisconnectionComplete) -> Result<(), Error> {
        let ConnectionState::Connected { handle, peer } = self.state else {
            return Err(self.unexpected(EventKind::DisconnectionComplete));
        };
        if event.handle != handle {
            return Err(self.unexpected(EventKind::DisconnectionComplete));
        }

        self.stats.disconnections = self.stats.disconnections.wrapping_add(1);
        info!("disconnected from {}, reason {}", peer.address, event.reason);
        self.state = ConnectionState::Disconnected;
        self.start_scanning()
    }

    fn recover(&mut self, result: Result<(), Error>) {
        let Err(e) = result else {
            return;
        };
        match e {
            Error::Initialization(_) | Error::Radio(_) => error!("{}", e),
            Error::ConnectionFailed(_) | Error::UnexpectedEvent { .. } => warn!("{}", e),
            Error::MalformedAdvertisement => debug!("{}", e),
        }
        self.last_error = Some(e);
    }
}

impl<'n, R: RadioStack> GapEventHandler for Central<'n, R> {
    fn on_init_complete(&mut self, result: Result<(), InitError>) {
        let r = self.handle_init(result);
        self.recover(r);
    }

    fn on_advertising_report(&mut self, report: &AdvertisingReport<'_>) {
        let r = self.handle_report(report);
        self.recover(r);
    }

    fn on_connection_complete(&mut self, event: &ConnectionComplete) {
        let r = self.handle_connection(event);
        self.recover(r);
    }

    fn on_disconnection_complete(&mut self, event: &DisconnectionComplete) {
        let r = self.handle_disconnection(event);
        self.recover(r);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════
