//! HCI ACL data packets
//!
//! The host exchanges ACL payloads with the controller in the standard HCI
//! wire form: a 16-bit field packing the handle and flags, a 16-bit length,
//! and the payload.

use crate::error::{PacketError, PacketResult};
use crate::hci::constants::*;
use crate::hci::types::{BroadcastFlag, Handle, PacketBoundaryFlag};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// An ACL data packet as exchanged over the HCI transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclDataPacket {
    pub handle: Handle,
    pub packet_boundary_flag: PacketBoundaryFlag,
    pub broadcast_flag: BroadcastFlag,
    pub payload: Vec<u8>,
}

impl AclDataPacket {
    pub fn new(
        handle: Handle,
        packet_boundary_flag: PacketBoundaryFlag,
        broadcast_flag: BroadcastFlag,
        payload: Vec<u8>,
    ) -> Self {
        Self { handle, packet_boundary_flag, broadcast_flag, payload }
    }

    /// Serialize to the HCI wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let first_two = (self.handle & ACL_HANDLE_MASK)
            | ((self.packet_boundary_flag as u16) << ACL_PB_FLAG_SHIFT)
            | ((self.broadcast_flag as u16) << ACL_BC_FLAG_SHIFT);

        let mut bytes = Vec::with_capacity(4 + self.payload.len());
        bytes.write_u16::<LittleEndian>(first_two).unwrap();
        bytes.write_u16::<LittleEndian>(self.payload.len() as u16).unwrap();
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parse from the HCI wire form
    pub fn parse(data: &[u8]) -> PacketResult<Self> {
        if data.len() < 4 {
            return Err(PacketError::Truncated(4, data.len()));
        }

        let mut cursor = Cursor::new(data);
        let first_two = cursor.read_u16::<LittleEndian>().unwrap();
        let length = cursor.read_u16::<LittleEndian>().unwrap() as usize;

        if data.len() < 4 + length {
            return Err(PacketError::LengthMismatch(length, data.len() - 4));
        }

        Ok(Self {
            handle: first_two & ACL_HANDLE_MASK,
            packet_boundary_flag: PacketBoundaryFlag::from_u8(
                ((first_two >> ACL_PB_FLAG_SHIFT) & ACL_PB_FLAG_MASK) as u8,
            ),
            broadcast_flag: BroadcastFlag::from_u8(
                ((first_two >> ACL_BC_FLAG_SHIFT) & ACL_BC_FLAG_MASK) as u8,
            ),
            payload: data[4..4 + length].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_round_trip() {
        let packet = AclDataPacket::new(
            0x0123,
            PacketBoundaryFlag::FirstNonAutomaticallyFlushable,
            BroadcastFlag::PointToPoint,
            vec![0xDE, 0xAD, 0xBE, 0xEF],
        );

        let bytes = packet.to_bytes();
        let parsed = AclDataPacket::parse(&bytes).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn test_acl_flag_packing() {
        let packet = AclDataPacket::new(
            0x0ABC,
            PacketBoundaryFlag::FirstAutomaticallyFlushable,
            BroadcastFlag::ActiveSlaveBroadcast,
            vec![1, 2, 3],
        );

        let bytes = packet.to_bytes();
        // handle 0xABC | pb 0b10 << 12 | bc 0b01 << 14
        assert_eq!(bytes[0], 0xBC);
        assert_eq!(bytes[1], 0x6A);
        assert_eq!(bytes[2], 0x03);
        assert_eq!(bytes[3], 0x00);
    }

    #[test]
    fn test_acl_truncated() {
        assert!(AclDataPacket::parse(&[0x00, 0x00]).is_err());
        // Header says 5 bytes, buffer has 2
        assert!(AclDataPacket::parse(&[0x00, 0x00, 0x05, 0x00, 0xAA, 0xBB]).is_err());
    }
}
