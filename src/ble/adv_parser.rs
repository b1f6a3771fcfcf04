//! Advertising data (AD) structure walker.
//!
//! Advertising payloads are a sequence of `[len][type][value; len - 1]`
//! elements. The walk stops at a zero length byte or at the first element
//! whose declared length would run past the end of the buffer, so
//! malformed payloads degrade to "no name" instead of a fault.

/// AD type: Complete Local Name.
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// One element of an advertising payload, borrowed from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdElement<'a> {
    /// Declared length byte: type plus value.
    pub len: u8,
    pub ad_type: u8,
    pub value: &'a [u8],
}

/// Iterator over the AD elements of a payload.
pub struct AdStructures<'a> {
    data: &'a [u8],
    index: usize,
    truncated: bool,
}

impl<'a> AdStructures<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            index: 0,
            truncated: false,
        }
    }

    /// `true` once the walk has stopped on an element that ran past the
    /// end of the buffer.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Iterator for AdStructures<'a> {
    type Item = AdElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.index;
        let len = *self.data.get(i)?;
        if len == 0 {
            self.index = self.data.len();
            return None;
        }
        if i + len as usize >= self.data.len() {
            self.index = self.data.len();
            self.truncated = true;
            return None;
        }

        let ad_type = self.data[i + 1];
        let value = &self.data[i + 2..i + 1 + len as usize];
        self.index = i + len as usize + 1;
        Some(AdElement {
            len,
            ad_type,
            value,
        })
    }
}

/// Result of looking for the Complete Local Name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameLookup<'a> {
    Found(&'a [u8]),
    /// Walk finished cleanly without a name element.
    Absent,
    /// Walk hit an element running past the buffer before any name.
    Truncated,
}

/// Look for the first Complete Local Name element.
pub fn find_complete_local_name(data: &[u8]) -> NameLookup<'_> {
    let mut elements = AdStructures::new(data);
    for element in elements.by_ref() {
        if element.ad_type == AD_TYPE_COMPLETE_LOCAL_NAME {
            return NameLookup::Found(element.value);
        }
    }
    if elements.truncated() {
        NameLookup::Truncated
    } else {
        NameLookup::Absent
    }
}

/// Extract the Complete Local Name, or an empty slice when the payload
/// has none (or is malformed before reaching one).
pub fn extract_complete_local_name(data: &[u8]) -> &[u8] {
    match find_complete_local_name(data) {
        NameLookup::Found(name) => name,
        NameLookup::Absent | NameLookup::Truncated => &[],
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════
