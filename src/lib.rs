//! BLE central core for blelink.
//!
//! Scans for a peer advertising a configured Complete Local Name,
//! connects to it, and goes back to scanning whenever the link drops.
//!
//! Everything here is `no_std` and hardware-free: the radio sits behind
//! [`ble::RadioStack`], so the whole scan → connect → rescan cycle can be
//! driven on the host with a fake radio.
//!
//! Usage: `cargo test` on the host, `cargo build --release --features
//! embedded --target thumbv7em-none-eabihf` for the firmware.
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and binds this library to the SoftDevice.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod ble;
pub mod config;
pub mod error;
pub mod event_loop;

pub use ble::central::{Central, ConnectionState};
pub use ble::event::GapEvent;
pub use error::Error;
pub use event_loop::{Dispatcher, EventQueue, EventSource};
