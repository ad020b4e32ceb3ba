//! Bluetooth device addressing
//!
//! This module defines the 48-bit device address together with the
//! address-type tagging used on the LE transport.

use std::fmt;

/// 48-bit Bluetooth device address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address {
    pub bytes: [u8; 6],
}

impl Address {
    /// The all-zero address, used as the broadcast destination
    pub const EMPTY: Address = Address { bytes: [0; 6] };

    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= 6 {
            let mut bytes = [0u8; 6];
            bytes.copy_from_slice(&slice[0..6]);
            Some(Self { bytes })
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

/// Address type carried in LE advertising and connection packets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    Public = 0x00,
    Random = 0x01,
    PublicIdentity = 0x02,
    RandomIdentity = 0x03,
}

impl From<u8> for AddressType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => AddressType::Random,
            0x02 => AddressType::PublicIdentity,
            0x03 => AddressType::RandomIdentity,
            _ => AddressType::Public,
        }
    }
}

impl From<AddressType> for u8 {
    fn from(value: AddressType) -> Self {
        value as u8
    }
}

/// A device address together with its address type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressWithType {
    pub address: Address,
    pub address_type: AddressType,
}

impl AddressWithType {
    /// An empty public address, used before a real address is known
    pub const EMPTY: AddressWithType = AddressWithType {
        address: Address::EMPTY,
        address_type: AddressType::Public,
    };

    pub fn new(address: Address, address_type: AddressType) -> Self {
        Self { address, address_type }
    }
}

impl fmt::Display for AddressWithType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.address, self.address_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        let addr = Address::new([0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(addr.to_string(), "01:02:03:04:05:06");
    }

    #[test]
    fn test_address_from_slice() {
        assert!(Address::from_slice(&[1, 2, 3]).is_none());

        let addr = Address::from_slice(&[1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(addr.bytes, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_empty_address() {
        assert!(Address::EMPTY.is_empty());
        assert!(!Address::new([0, 0, 0, 0, 0, 1]).is_empty());
    }

    #[test]
    fn test_address_type_conversion() {
        assert_eq!(AddressType::from(0x00), AddressType::Public);
        assert_eq!(AddressType::from(0x01), AddressType::Random);
        assert_eq!(AddressType::from(0x02), AddressType::PublicIdentity);
        assert_eq!(AddressType::from(0x03), AddressType::RandomIdentity);
        // Unknown values fall back to public
        assert_eq!(AddressType::from(0x7F), AddressType::Public);

        assert_eq!(u8::from(AddressType::RandomIdentity), 0x03);
    }
}
