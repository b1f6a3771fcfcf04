//! SoftDevice S140 binding of the radio stack.
//!
//! The controller talks to the radio through [`SoftdeviceRadio`], which
//! only queues commands. [`run`] executes them against the SoftDevice
//! Central-role API and turns the results into [`GapEvent`]s for the
//! dispatch loop:
//!
//! - `StartScan` scans until the next command arrives, pushing every
//!   advertisement report into the event channel;
//! - `Connect` cancels the scan, connects to the whitelisted peer and
//!   then holds the link until it drops.

use core::slice;

use blelink::ble::event::QueuedReport;
use blelink::ble::{
    AddressType, ConnectionComplete, ConnectionHandle, DeviceAddress, DisconnectReason,
    DisconnectionComplete, PeerAddress, RadioStack, StatusCode,
};
use blelink::config::{
    EVENT_QUEUE_DEPTH, LINK_POLL_MS, RADIO_COMMAND_DEPTH, SCAN_ACTIVE, SCAN_RETRY_MS,
};
use blelink::error::{BleError, InitError};
use blelink::GapEvent;
use defmt::{info, warn, Format};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Receiver, Sender, TrySendError};
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::{self, central, Address};
use nrf_softdevice::{raw, Softdevice};

pub type EventSender = Sender<'static, CriticalSectionRawMutex, GapEvent, EVENT_QUEUE_DEPTH>;
pub type CommandSender = Sender<'static, CriticalSectionRawMutex, RadioCommand, RADIO_COMMAND_DEPTH>;
pub type CommandReceiver =
    Receiver<'static, CriticalSectionRawMutex, RadioCommand, RADIO_COMMAND_DEPTH>;

/// Requests from the controller to the radio task.
#[derive(Clone, Copy, Format)]
pub enum RadioCommand {
    StartScan,
    Connect(PeerAddress),
}

/// Controller-side handle: never blocks, refuses when the command queue
/// is full.
pub struct SoftdeviceRadio {
    commands: CommandSender,
}

impl SoftdeviceRadio {
    pub fn new(commands: CommandSender) -> Self {
        Self { commands }
    }
}

impl RadioStack for SoftdeviceRadio {
    fn start_scan(&mut self) -> Result<(), BleError> {
        self.commands
            .try_send(RadioCommand::StartScan)
            .map_err(|_| BleError::Busy)
    }

    fn connect(&mut self, peer: &PeerAddress) -> Result<(), BleError> {
        self.commands
            .try_send(RadioCommand::Connect(*peer))
            .map_err(|_| BleError::Busy)
    }
}

/// Confirm the BLE stack answers now that the SoftDevice is enabled.
pub fn check_stack() -> Result<(), InitError> {
    // SAFETY: plain-old-data struct filled in by the SoftDevice.
    let mut version: raw::ble_version_t = unsafe { core::mem::zeroed() };
    // SAFETY: `version` is a valid, exclusively borrowed out-pointer.
    let ret = unsafe { raw::sd_ble_version_get(&mut version) };
    if ret != raw::NRF_SUCCESS {
        return Err(InitError(ret));
    }
    info!(
        "SoftDevice BLE version {} (company {:x}, sub {:x})",
        version.version_number, version.company_id, version.subversion_number
    );
    Ok(())
}

/// Radio task body. Never returns.
pub async fn run(sd: &'static Softdevice, commands: CommandReceiver, events: EventSender) -> ! {
    let mut next = commands.receive().await;
    loop {
        next = match next {
            RadioCommand::StartScan => scan_until_command(sd, &commands, &events).await,
            RadioCommand::Connect(peer) => {
                connect_and_hold(sd, peer, &events).await;
                commands.receive().await
            }
        };
    }
}

/// Scan, forwarding reports, until a command shows up.
///
/// When the event channel is full the report that did not fit stops the
/// scan; we wait for room, queue it, and scan again. Reports are never
/// dropped.
async fn scan_until_command(
    sd: &Softdevice,
    commands: &CommandReceiver,
    events: &EventSender,
) -> RadioCommand {
    let config = central::ScanConfig {
        active: SCAN_ACTIVE,
        ..Default::default()
    };

    loop {
        let scan = central::scan(sd, &config, |params| {
            // SAFETY: the SoftDevice guarantees `p_data` points at `len`
            // bytes for the duration of this callback.
            let data = unsafe { slice::from_raw_parts(params.data.p_data, params.data.len as usize) };
            let peer = peer_from_raw(&params.peer_addr);
            let event = GapEvent::AdvertisingReport(QueuedReport::new(peer, params.rssi, data));

            match events.try_send(event) {
                Ok(()) => None,
                Err(TrySendError::Full(event)) => Some(event),
            }
        });

        match select(commands.receive(), scan).await {
            Either::First(cmd) => return cmd,
            Either::Second(Ok(pending)) => events.send(pending).await,
            Either::Second(Err(_)) => {
                warn!("BLE scan ended with error, retrying");
                Timer::after(Duration::from_millis(SCAN_RETRY_MS)).await;
            }
        }
    }
}

async fn connect_and_hold(sd: &Softdevice, peer: PeerAddress, events: &EventSender) {
    let address = Address::new(address_type_to_sd(peer.address_type), peer.address.bytes());
    let whitelist = [&address];
    let conn_cfg = central::ConnectConfig {
        scan_config: central::ScanConfig {
            whitelist: Some(&whitelist),
            ..Default::default()
        },
        ..Default::default()
    };

    let conn = match central::connect(sd, &conn_cfg).await {
        Ok(conn) => conn,
        Err(e) => {
            let status = connect_status(&e);
            events
                .send(GapEvent::ConnectionComplete(ConnectionComplete::failed(peer, status)))
                .await;
            return;
        }
    };

    let Some(raw_handle) = conn.handle() else {
        // Link dropped before we could look at it.
        events
            .send(GapEvent::ConnectionComplete(ConnectionComplete::failed(
                peer,
                StatusCode::CONNECTION_FAILED_TO_BE_ESTABLISHED,
            )))
            .await;
        return;
    };
    let handle = ConnectionHandle(raw_handle);
    events
        .send(GapEvent::ConnectionComplete(ConnectionComplete::succeeded(peer, handle)))
        .await;

    while conn.handle().is_some() {
        Timer::after(Duration::from_millis(LINK_POLL_MS)).await;
    }

    // The SoftDevice binding does not surface the HCI reason here.
    events
        .send(GapEvent::DisconnectionComplete(DisconnectionComplete {
            handle,
            reason: DisconnectReason::UNSPECIFIED,
        }))
        .await;
}

fn connect_status(err: &central::ConnectError) -> StatusCode {
    match err {
        central::ConnectError::Timeout => StatusCode::CONNECTION_TIMEOUT,
        central::ConnectError::NoFreeConn => StatusCode::CONNECTION_LIMIT_EXCEEDED,
        _ => StatusCode::UNSPECIFIED,
    }
}

fn peer_from_raw(addr: &raw::ble_gap_addr_t) -> PeerAddress {
    let address = Address::from_raw(*addr);
    PeerAddress::new(
        address_type_from_sd(address.address_type()),
        DeviceAddress::new(address.bytes()),
    )
}

fn address_type_from_sd(t: ble::AddressType) -> AddressType {
    match t {
        ble::AddressType::Public => AddressType::Public,
        ble::AddressType::RandomStatic => AddressType::RandomStatic,
        ble::AddressType::RandomPrivateResolvable => AddressType::RandomPrivateResolvable,
        ble::AddressType::RandomPrivateNonResolvable => AddressType::RandomPrivateNonResolvable,
        ble::AddressType::Anonymous => AddressType::Anonymous,
    }
}

fn address_type_to_sd(t: AddressType) -> ble::AddressType {
    match t {
        AddressType::Public => ble::AddressType::Public,
        AddressType::RandomStatic => ble::AddressType::RandomStatic,
        AddressType::RandomPrivateResolvable => ble::AddressType::RandomPrivateResolvable,
        AddressType::RandomPrivateNonResolvable => ble::AddressType::RandomPrivateNonResolvable,
        AddressType::Anonymous => ble::AddressType::Anonymous,
    }
}
