//! blelink firmware - nRF52840 + SoftDevice S140.
//!
//! Scans for the configured target name, connects, and rescans whenever
//! the link drops. Diagnostics go out over RTT via defmt.
//!
//! Tasks:
//! - `softdevice_task`: SoftDevice event pump.
//! - `radio_task`: executes scan/connect commands, produces radio events.
//! - `main`: the dispatch loop, feeding events to the controller one at
//!   a time, forever, and retrying a refused scan start when idle.

#![no_std]
#![no_main]

mod sd_radio;

use blelink::config::{self, EVENT_QUEUE_DEPTH, RADIO_COMMAND_DEPTH, SCAN_RETRY_MS};
use blelink::{Central, Dispatcher, GapEvent};
use defmt::{info, unwrap, warn};
use embassy_futures::select::{select, Either};
use embassy_executor::Spawner;
use embassy_nrf::interrupt::Priority;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use nrf_softdevice::{raw, Softdevice};
use sd_radio::{RadioCommand, SoftdeviceRadio};
use {defmt_rtt as _, panic_probe as _};

/// Radio events waiting for the dispatch loop. A full channel blocks the
/// producer.
static EVENTS: Channel<CriticalSectionRawMutex, GapEvent, EVENT_QUEUE_DEPTH> = Channel::new();

/// Scan/connect requests from the controller to the radio task.
static RADIO_COMMANDS: Channel<CriticalSectionRawMutex, RadioCommand, RADIO_COMMAND_DEPTH> =
    Channel::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn radio_task(sd: &'static Softdevice) -> ! {
    sd_radio::run(sd, RADIO_COMMANDS.receiver(), EVENTS.sender()).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("blelink starting, target \"{}\"", config::TARGET_DEVICE_NAME);

    // The SoftDevice reserves interrupt priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let _p = embassy_nrf::init(nrf_config);

    let sd: &'static Softdevice = Softdevice::enable(&softdevice_config());
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(radio_task(sd)));

    let central = Central::new(
        SoftdeviceRadio::new(RADIO_COMMANDS.sender()),
        config::TARGET_DEVICE_NAME,
    );
    let mut dispatcher = Dispatcher::new(central);

    EVENTS.send(GapEvent::InitComplete(sd_radio::check_stack())).await;

    // A quiet channel doubles as the retry tick for a refused scan start.
    loop {
        let idle = Timer::after(Duration::from_millis(SCAN_RETRY_MS));
        match select(EVENTS.receive(), idle).await {
            Either::First(event) => dispatcher.dispatch(event),
            Either::Second(()) => {
                if let Err(e) = dispatcher.handler_mut().resume_scanning() {
                    warn!("scan restart refused: {}", e);
                }
            }
        }
    }
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 0,
            central_role_count: 1,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        ..Default::default()
    }
}
