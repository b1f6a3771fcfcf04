//! Name filter and connection initiator.
//!
//! Every advertisement report is checked against the configured target
//! name. A hit while scanning issues exactly one connect request and moves
//! the controller to `Connecting`; anything else leaves the state alone
//! and scanning simply carries on.

use crate::ble::adv_parser::{find_complete_local_name, NameLookup};
use crate::ble::central::ConnectionState;
use crate::ble::{AdvertisingReport, RadioStack};

/// Exact, case-sensitive match on the Complete Local Name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameFilter<'n> {
    target: &'n str,
}

impl<'n> NameFilter<'n> {
    pub const fn new(target: &'n str) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &'n str {
        self.target
    }

    pub fn matches(&self, name: &[u8]) -> bool {
        name == self.target.as_bytes()
    }
}

/// What the matcher did with one report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MatchOutcome {
    /// No Complete Local Name element.
    Unnamed,
    /// Payload walk stopped on a truncated element before any name.
    Malformed,
    /// Named, but not our target.
    Mismatch,
    /// Target seen while a connection is pending or up; ignored.
    Busy,
    /// Connect request issued; state is now `Connecting`.
    ConnectRequested,
    /// Radio refused the connect request; still `Scanning`.
    ConnectRejected,
}

/// Run the filter on `report` and, on a hit while scanning, request a
/// connection to the advertiser.
pub fn initiate_on_match<R: RadioStack>(
    state: &mut ConnectionState,
    radio: &mut R,
    filter: &NameFilter<'_>,
    report: &AdvertisingReport<'_>,
) -> MatchOutcome {
    let name = match find_complete_local_name(report.payload) {
        NameLookup::Found(name) => name,
        NameLookup::Absent => return MatchOutcome::Unnamed,
        NameLookup::Truncated => return MatchOutcome::Malformed,
    };

    if !filter.matches(name) {
        return MatchOutcome::Mismatch;
    }

    if !matches!(state, ConnectionState::Scanning) {
        debug!("target seen again while {}, ignoring", state.kind_name());
        return MatchOutcome::Busy;
    }

    info!("found {}, connecting to {}", filter.target(), report.peer.address);
    match radio.connect(&report.peer) {
        Ok(()) => {
            *state = ConnectionState::Connecting { peer: report.peer };
            MatchOutcome::ConnectRequested
        }
        Err(e) => {
            warn!("connect request rejected: {}", e);
            MatchOutcome::ConnectRejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::{AddressType, DeviceAddress, PeerAddress};
    use crate::error::BleError;

    #[derive(Default)]
    struct CountingRadio {
        connects: usize,
        refuse: bool,
    }

    impl RadioStack for CountingRadio {
        fn start_scan(&mut self) -> Result<(), BleError> {
            Ok(())
        }

        fn connect(&mut self, _peer: &PeerAddress) -> Result<(), BleError> {
            if self.refuse {
                return Err(BleError::Busy);
            }
            self.connects += 1;
            Ok(())
        }
    }

    const PHONE: [u8; 12] = [
        0x0B, 0x09, b'k', b't', b'\'', b's', b' ', b'p', b'h', b'o', b'n', b'e',
    ];

    fn report(payload: &[u8]) -> AdvertisingReport<'_> {
        AdvertisingReport {
            peer: PeerAddress::new(
                AddressType::RandomStatic,
                DeviceAddress::new([0x11, 0x22, 0x33, 0x44, 0x55, 0xC6]),
            ),
            rssi: -48,
            payload,
        }
    }

    #[test]
    fn filter_is_exact_and_case_sensitive() {
        let filter = NameFilter::new("kt's phone");
        assert!(filter.matches(b"kt's phone"));
        assert!(!filter.matches(b"KT's phone"));
        assert!(!filter.matches(b"kt's phone 2"));
        assert!(!filter.matches(b"kt's"));
        assert!(!filter.matches(b""));
    }

    #[test]
    fn match_while_scanning_connects_once() {
        let mut state = ConnectionState::Scanning;
        let mut radio = CountingRadio::default();
        let filter = NameFilter::new("kt's phone");
        let r = report(&PHONE);

        let outcome = initiate_on_match(&mut state, &mut radio, &filter, &r);

        assert_eq!(outcome, MatchOutcome::ConnectRequested);
        assert_eq!(radio.connects, 1);
        assert_eq!(state, ConnectionState::Connecting { peer: r.peer });
    }

    #[test]
    fn second_match_while_connecting_is_ignored() {
        let mut state = ConnectionState::Scanning;
        let mut radio = CountingRadio::default();
        let filter = NameFilter::new("kt's phone");

        initiate_on_match(&mut state, &mut radio, &filter, &report(&PHONE));
        let outcome = initiate_on_match(&mut state, &mut radio, &filter, &report(&PHONE));

        assert_eq!(outcome, MatchOutcome::Busy);
        assert_eq!(radio.connects, 1);
    }

    #[test]
    fn mismatch_leaves_state_alone() {
        let mut state = ConnectionState::Scanning;
        let mut radio = CountingRadio::default();
        let filter = NameFilter::new("someone else");

        let outcome = initiate_on_match(&mut state, &mut radio, &filter, &report(&PHONE));

        assert_eq!(outcome, MatchOutcome::Mismatch);
        assert_eq!(state, ConnectionState::Scanning);
        assert_eq!(radio.connects, 0);
    }

    #[test]
    fn unnamed_and_malformed_reports() {
        let mut state = ConnectionState::Scanning;
        let mut radio = CountingRadio::default();
        let filter = NameFilter::new("kt's phone");

        let flags_only = [0x02, 0x01, 0x06];
        assert_eq!(
            initiate_on_match(&mut state, &mut radio, &filter, &report(&flags_only)),
            MatchOutcome::Unnamed
        );

        let truncated = [0xFF, 0x09, b'a', b'b'];
        assert_eq!(
            initiate_on_match(&mut state, &mut radio, &filter, &report(&truncated)),
            MatchOutcome::Malformed
        );
        assert_eq!(state, ConnectionState::Scanning);
    }

    #[test]
    fn rejected_connect_stays_scanning() {
        let mut state = ConnectionState::Scanning;
        let mut radio = CountingRadio {
            refuse: true,
            ..Default::default()
        };
        let filter = NameFilter::new("kt's phone");

        let outcome = initiate_on_match(&mut state, &mut radio, &filter, &report(&PHONE));

        assert_eq!(outcome, MatchOutcome::ConnectRejected);
        assert_eq!(state, ConnectionState::Scanning);
    }
}
