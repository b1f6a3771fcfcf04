//! Application-wide constants and compile-time configuration.
//!
//! Radio, queue and timing parameters live here so they can be tuned in
//! one place.

// Target

/// Advertised Complete Local Name of the peer we connect to.
///
/// Override at build time:
///
/// ```text
/// BLELINK_TARGET_NAME="my watch" cargo build --release --features embedded
/// ```
pub const TARGET_DEVICE_NAME: &str = match option_env!("BLELINK_TARGET_NAME") {
    Some(name) => name,
    None => "kt's phone",
};

// Event dispatch

/// Number of radio events the dispatch queue can hold before the
/// producer has to wait.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Depth of the command channel from the controller to the radio task.
pub const RADIO_COMMAND_DEPTH: usize = 4;

// BLE

/// Legacy advertising data size. Queued advertisement payloads are
/// copied into a buffer of this capacity.
pub const ADV_PAYLOAD_MAX: usize = 31;

/// Request scan responses so peers that only put their name in the
/// scan response are still matched.
pub const SCAN_ACTIVE: bool = true;

/// Delay before retrying a scan the SoftDevice refused to start (ms).
pub const SCAN_RETRY_MS: u64 = 500;

/// Link liveness poll interval while connected (ms).
pub const LINK_POLL_MS: u64 = 250;
