//! Peer identity on the ESP-NOW link (station MAC address).

use core::fmt;

/// MAC address of a paired node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeerAddress([u8; 6]);

/// Error parsing a textual MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressParseError {
    /// Not exactly six colon-separated groups.
    GroupCount,
    /// A group is not two hex digits.
    InvalidHex,
}

impl PeerAddress {
    /// Broadcast address, never a valid paired peer.
    pub const BROADCAST: Self = Self([0xFF; 6]);

    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Parse `AA:BB:CC:DD:EE:FF` (case-insensitive, surrounding whitespace ignored).
    pub fn parse(text: &str) -> Result<Self, AddressParseError> {
        let mut octets = [0u8; 6];
        let mut groups = text.trim().split(':');

        for octet in octets.iter_mut() {
            let group = groups.next().ok_or(AddressParseError::GroupCount)?;
            if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(AddressParseError::InvalidHex);
            }
            *octet = u8::from_str_radix(group, 16).map_err(|_| AddressParseError::InvalidHex)?;
        }

        if groups.next().is_some() {
            return Err(AddressParseError::GroupCount);
        }
        Ok(Self(octets))
    }
}

impl From<[u8; 6]> for PeerAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroupCount => write!(f, "expected six colon-separated groups"),
            Self::InvalidHex => write!(f, "each group must be two hex digits"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let addr = PeerAddress::parse("fc:f5:C4:67:a8:E4").unwrap();
        assert_eq!(addr.octets(), [0xFC, 0xF5, 0xC4, 0x67, 0xA8, 0xE4]);
        assert_eq!(format!("{}", addr), "FC:F5:C4:67:A8:E4");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(PeerAddress::parse("FC:F5:C4:67:A8"), Err(AddressParseError::GroupCount));
        assert_eq!(PeerAddress::parse("FC:F5:C4:67:A8:E4:00"), Err(AddressParseError::GroupCount));
        assert_eq!(PeerAddress::parse("FC:F5:C4:67:A8:G4"), Err(AddressParseError::InvalidHex));
        assert_eq!(PeerAddress::parse("FC:F5:C4:67:A8:E"), Err(AddressParseError::InvalidHex));
    }
}
