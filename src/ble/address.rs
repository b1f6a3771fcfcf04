//! BLE device address and its display form.

use core::fmt::{self, Write};

use heapless::String;

/// Length of a formatted address: six hex pairs and five colons.
pub const ADDRESS_STRING_LEN: usize = 17;

/// 6-byte BLE device address, little-endian as delivered by the radio stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceAddress([u8; 6]);

impl DeviceAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Raw little-endian bytes.
    pub const fn bytes(&self) -> [u8; 6] {
        self.0
    }

    /// Format as `XX:XX:XX:XX:XX:XX`, most significant byte first.
    ///
    /// Callers that only want a log line should skip it on `Err` rather
    /// than fail.
    pub fn to_hex_string(&self) -> Result<String<ADDRESS_STRING_LEN>, fmt::Error> {
        let mut s = String::new();
        write!(&mut s, "{}", self)?;
        Ok(s)
    }
}

impl From<[u8; 6]> for DeviceAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceAddress {
    fn format(&self, f: defmt::Formatter) {
        let b = &self.0;
        defmt::write!(
            f,
            "{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}",
            b[5],
            b[4],
            b[3],
            b[2],
            b[1],
            b[0]
        )
    }
}
