//! Integration tests for the blelink scan → connect → rescan cycle,
//! driven through the dispatch loop with a fake radio.

use blelink::ble::event::QueuedReport;
use blelink::ble::{
    AddressType, ConnectionComplete, ConnectionHandle, DeviceAddress, DisconnectReason,
    DisconnectionComplete, PeerAddress, RadioStack, StatusCode,
};
use blelink::error::{BleError, InitError};
use blelink::{Central, ConnectionState, Dispatcher, EventQueue, GapEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    StartScan,
    Connect(PeerAddress),
}

#[derive(Default)]
struct FakeRadio {
    calls: Vec<Call>,
    refuse_scan: bool,
}

impl FakeRadio {
    fn scans(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::StartScan).count()
    }

    fn connects(&self) -> Vec<PeerAddress> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Connect(p) => Some(*p),
                Call::StartScan => None,
            })
            .collect()
    }
}

impl RadioStack for FakeRadio {
    fn start_scan(&mut self) -> Result<(), BleError> {
        if self.refuse_scan {
            return Err(BleError::Busy);
        }
        self.calls.push(Call::StartScan);
        Ok(())
    }

    fn connect(&mut self, peer: &PeerAddress) -> Result<(), BleError> {
        self.calls.push(Call::Connect(*peer));
        Ok(())
    }
}

const TARGET: &str = "kt's phone";

fn phone() -> PeerAddress {
    PeerAddress::new(
        AddressType::RandomStatic,
        DeviceAddress::new([0x10, 0x32, 0x54, 0x76, 0x98, 0xDA]),
    )
}

fn stranger() -> PeerAddress {
    PeerAddress::new(AddressType::Public, DeviceAddress::new([1, 1, 1, 1, 1, 1]))
}

fn named_advert(peer: PeerAddress, name: &str) -> GapEvent {
    let mut payload = vec![0x02, 0x01, 0x06, name.len() as u8 + 1, 0x09];
    payload.extend_from_slice(name.as_bytes());
    GapEvent::AdvertisingReport(QueuedReport::new(peer, -61, &payload))
}

fn dispatcher() -> Dispatcher<Central<'static, FakeRadio>> {
    Dispatcher::new(Central::new(FakeRadio::default(), TARGET))
}

fn run(d: &mut Dispatcher<Central<'static, FakeRadio>>, events: Vec<GapEvent>) {
    let mut q: EventQueue<GapEvent, 16> = EventQueue::new();
    for e in events {
        q.post(e).expect("queue sized for test");
    }
    d.run_until_stopped(&mut q);
}

#[test]
fn scan_to_connect_end_to_end() {
    let mut d = dispatcher();
    run(
        &mut d,
        vec![
            GapEvent::InitComplete(Ok(())),
            named_advert(stranger(), "Bob's earbuds"),
            named_advert(phone(), TARGET),
        ],
    );

    let central = d.handler();
    assert_eq!(central.state(), ConnectionState::Connecting { peer: phone() });
    assert_eq!(central.radio().connects(), vec![phone()]);
    assert_eq!(central.radio().calls.first(), Some(&Call::StartScan));
}

#[test]
fn full_cycle_recovers_after_remote_disconnect() {
    let mut d = dispatcher();
    run(
        &mut d,
        vec![
            GapEvent::InitComplete(Ok(())),
            named_advert(phone(), TARGET),
            GapEvent::ConnectionComplete(ConnectionComplete::succeeded(
                phone(),
                ConnectionHandle(0x0010),
            )),
        ],
    );
    assert_eq!(d.handler().connection_handle(), Some(ConnectionHandle(0x0010)));
    let scans_while_connected = d.handler().radio().scans();

    run(
        &mut d,
        vec![GapEvent::DisconnectionComplete(DisconnectionComplete {
            handle: ConnectionHandle(0x0010),
            reason: DisconnectReason(0x13),
        })],
    );

    let central = d.handler();
    assert_eq!(central.state(), ConnectionState::Scanning);
    assert_eq!(central.connection_handle(), None);
    assert_eq!(central.radio().scans(), scans_while_connected + 1);

    // And the next sighting reconnects.
    run(&mut d, vec![named_advert(phone(), TARGET)]);
    assert_eq!(d.handler().radio().connects().len(), 2);
}

#[test]
fn burst_of_matches_yields_single_connect() {
    let mut d = dispatcher();
    let mut events = vec![GapEvent::InitComplete(Ok(()))];
    events.extend((0..10).map(|_| named_advert(phone(), TARGET)));
    run(&mut d, events);

    assert_eq!(d.handler().radio().connects().len(), 1);
    assert_eq!(d.dispatched(), 11);
}

#[test]
fn failed_connect_rescans_and_retries() {
    let mut d = dispatcher();
    run(
        &mut d,
        vec![
            GapEvent::InitComplete(Ok(())),
            named_advert(phone(), TARGET),
            GapEvent::ConnectionComplete(ConnectionComplete::failed(
                phone(),
                StatusCode::CONNECTION_FAILED_TO_BE_ESTABLISHED,
            )),
            named_advert(phone(), TARGET),
        ],
    );

    let radio = d.handler().radio();
    assert_eq!(
        radio.calls,
        vec![
            Call::StartScan,
            Call::Connect(phone()),
            Call::StartScan,
            Call::Connect(phone()),
        ]
    );
}

#[test]
fn init_failure_never_scans() {
    let mut d = dispatcher();
    run(
        &mut d,
        vec![
            GapEvent::InitComplete(Err(InitError(0x0000_0008))),
            named_advert(phone(), TARGET),
        ],
    );

    assert!(d.handler().radio().calls.is_empty());
    assert!(matches!(d.handler().state(), ConnectionState::Failed { .. }));
}

#[test]
fn name_match_is_case_sensitive() {
    let mut d = dispatcher();
    run(
        &mut d,
        vec![
            GapEvent::InitComplete(Ok(())),
            named_advert(phone(), "KT'S PHONE"),
            named_advert(phone(), "kt's phone "),
        ],
    );
    assert!(d.handler().radio().connects().is_empty());
    assert_eq!(d.handler().state(), ConnectionState::Scanning);
}

#[test]
fn oversized_payload_reads_as_nameless() {
    let mut d = dispatcher();
    // Name element pushed past the 31-byte capture by a long manufacturer blob.
    let mut payload = vec![0x1C, 0xFF];
    payload.extend_from_slice(&[0xAB; 27]);
    payload.extend_from_slice(&[0x0B, 0x09]);
    payload.extend_from_slice(TARGET.as_bytes());
    run(
        &mut d,
        vec![
            GapEvent::InitComplete(Ok(())),
            GapEvent::AdvertisingReport(QueuedReport::new(phone(), -70, &payload)),
        ],
    );

    assert!(d.handler().radio().connects().is_empty());
    assert_eq!(d.handler().stats().malformed_adverts, 1);
}

#[test]
fn refused_rescan_recovers_once_radio_frees_up() {
    let mut d = dispatcher();
    run(
        &mut d,
        vec![
            GapEvent::InitComplete(Ok(())),
            named_advert(phone(), TARGET),
            GapEvent::ConnectionComplete(ConnectionComplete::succeeded(
                phone(),
                ConnectionHandle(3),
            )),
        ],
    );

    d.handler_mut().radio_mut().refuse_scan = true;
    run(
        &mut d,
        vec![GapEvent::DisconnectionComplete(DisconnectionComplete {
            handle: ConnectionHandle(3),
            reason: DisconnectReason::REMOTE_USER_TERMINATED,
        })],
    );
    assert_eq!(d.handler().state(), ConnectionState::Disconnected);

    // Idle retry while the radio is still busy changes nothing.
    assert!(d.handler_mut().resume_scanning().is_err());
    assert_eq!(d.handler().state(), ConnectionState::Disconnected);

    d.handler_mut().radio_mut().refuse_scan = false;
    d.handler_mut().resume_scanning().unwrap();
    assert_eq!(d.handler().state(), ConnectionState::Scanning);
    assert_eq!(d.handler().radio().scans(), 2);

    run(&mut d, vec![named_advert(phone(), TARGET)]);
    assert_eq!(d.handler().radio().connects().len(), 2);
}

#[test]
fn adverts_alone_lift_a_parked_central() {
    let mut d = dispatcher();
    d.handler_mut().radio_mut().refuse_scan = true;
    run(&mut d, vec![GapEvent::InitComplete(Ok(()))]);
    assert_eq!(d.handler().state(), ConnectionState::Disconnected);

    d.handler_mut().radio_mut().refuse_scan = false;
    run(
        &mut d,
        vec![
            named_advert(stranger(), "Bob's earbuds"),
            named_advert(phone(), TARGET),
        ],
    );

    let central = d.handler();
    assert_eq!(central.state(), ConnectionState::Connecting { peer: phone() });
    assert_eq!(
        central.radio().calls,
        vec![Call::StartScan, Call::Connect(phone())]
    );
}
