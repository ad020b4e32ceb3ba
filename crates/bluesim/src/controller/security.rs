//! Security manager for link keys and simple pairing
//!
//! Tracks stored link keys per peer, the single active authentication, and
//! the IO capabilities exchanged during simple pairing.

use crate::address::Address;
use crate::hci::types::{Handle, IoCapability, RESERVED_HANDLE};
use std::collections::HashMap;

/// User interaction selected by the IO-capability exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingType {
    /// Confirmation happens without user input
    AutoConfirmation,
    /// The user answers yes/no on both devices
    ConfirmYN,
    /// This device displays a PIN the peer enters
    DisplayPin,
    /// Both devices display a value and the user confirms the match
    DisplayAndConfirm,
    /// The user enters a PIN on this device
    InputPin,
    /// Capabilities are missing or unusable
    Invalid,
}

#[derive(Debug, Clone, Copy)]
struct IoCapabilityRecord {
    peer: Address,
    io_capability: u8,
    oob_data_present: u8,
    authentication_requirements: u8,
}

/// Per-peer security state
#[derive(Debug, Default)]
pub struct SecurityManager {
    keys: HashMap<Address, [u8; 16]>,
    authentication_address: Option<Address>,
    authentication_handle: Handle,
    local_io: Option<IoCapabilityRecord>,
    peer_io: Option<IoCapabilityRecord>,
}

impl SecurityManager {
    pub fn new() -> Self {
        Self { authentication_handle: RESERVED_HANDLE, ..Self::default() }
    }

    pub fn write_key(&mut self, peer: Address, key: [u8; 16]) {
        self.keys.insert(peer, key);
    }

    /// Number of keys stored for `peer` (zero or one)
    pub fn read_key(&self, peer: Address) -> u16 {
        u16::from(self.keys.contains_key(&peer))
    }

    pub fn get_key(&self, peer: Address) -> Option<[u8; 16]> {
        self.keys.get(&peer).copied()
    }

    pub fn delete_key(&mut self, peer: Address) {
        self.keys.remove(&peer);
    }

    /// Bind the single authentication slot to `peer`
    pub fn authentication_request(&mut self, peer: Address, handle: Handle) {
        self.authentication_address = Some(peer);
        self.authentication_handle = handle;
    }

    /// Drop pairing state derived during the exchange; the authentication
    /// binding survives until the next request overwrites it
    pub fn authentication_request_finished(&mut self) {
        self.invalidate_io_capabilities();
    }

    pub fn get_authentication_address(&self) -> Option<Address> {
        self.authentication_address
    }

    pub fn get_authentication_handle(&self) -> Handle {
        self.authentication_handle
    }

    pub fn set_local_io_capability(
        &mut self,
        peer: Address,
        io_capability: u8,
        oob_data_present: u8,
        authentication_requirements: u8,
    ) {
        self.local_io = Some(IoCapabilityRecord {
            peer,
            io_capability,
            oob_data_present,
            authentication_requirements,
        });
    }

    pub fn set_peer_io_capability(
        &mut self,
        peer: Address,
        io_capability: u8,
        oob_data_present: u8,
        authentication_requirements: u8,
    ) {
        self.peer_io = Some(IoCapabilityRecord {
            peer,
            io_capability,
            oob_data_present,
            authentication_requirements,
        });
    }

    pub fn invalidate_io_capabilities(&mut self) {
        self.local_io = None;
        self.peer_io = None;
    }

    /// Derive the pairing interaction from the exchanged IO capabilities.
    /// Returns [`PairingType::Invalid`] until both sides are known.
    pub fn get_simple_pairing_type(&self) -> PairingType {
        let (Some(local), Some(peer)) = (self.local_io, self.peer_io) else {
            return PairingType::Invalid;
        };
        if local.peer != peer.peer {
            return PairingType::Invalid;
        }

        let Some(local_io) = IoCapability::from_u8(local.io_capability) else {
            return PairingType::Invalid;
        };
        let Some(peer_io) = IoCapability::from_u8(peer.io_capability) else {
            return PairingType::Invalid;
        };

        // Out-of-band data and the no-MITM case both skip user interaction
        if local.oob_data_present != 0 || peer.oob_data_present != 0 {
            return PairingType::AutoConfirmation;
        }
        let mitm_required = local.authentication_requirements % 2 == 1
            || peer.authentication_requirements % 2 == 1;
        if !mitm_required {
            return PairingType::AutoConfirmation;
        }

        use IoCapability::*;
        match (peer_io, local_io) {
            (NoInputNoOutput, _) | (_, NoInputNoOutput) => PairingType::AutoConfirmation,
            (DisplayOnly, DisplayOnly) => PairingType::AutoConfirmation,
            (DisplayOnly, DisplayYesNo) => PairingType::AutoConfirmation,
            (DisplayOnly, KeyboardOnly) => PairingType::InputPin,
            (DisplayYesNo, DisplayOnly) => PairingType::AutoConfirmation,
            (DisplayYesNo, DisplayYesNo) => PairingType::DisplayAndConfirm,
            (DisplayYesNo, KeyboardOnly) => PairingType::InputPin,
            (KeyboardOnly, DisplayOnly) => PairingType::DisplayPin,
            (KeyboardOnly, DisplayYesNo) => PairingType::DisplayPin,
            (KeyboardOnly, KeyboardOnly) => PairingType::InputPin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Address {
        Address::new([last, 0, 0, 0, 0, 0])
    }

    #[test]
    fn test_key_store() {
        let mut sm = SecurityManager::new();
        let peer = addr(1);
        assert_eq!(sm.read_key(peer), 0);
        assert_eq!(sm.get_key(peer), None);

        let key = [7u8; 16];
        sm.write_key(peer, key);
        assert_eq!(sm.read_key(peer), 1);
        assert_eq!(sm.get_key(peer), Some(key));

        sm.delete_key(peer);
        assert_eq!(sm.read_key(peer), 0);
    }

    #[test]
    fn test_authentication_slot() {
        let mut sm = SecurityManager::new();
        assert_eq!(sm.get_authentication_address(), None);
        assert_eq!(sm.get_authentication_handle(), RESERVED_HANDLE);

        sm.authentication_request(addr(1), 0x17);
        assert_eq!(sm.get_authentication_address(), Some(addr(1)));
        assert_eq!(sm.get_authentication_handle(), 0x17);
    }

    #[test]
    fn test_pairing_type_requires_both_sides() {
        let mut sm = SecurityManager::new();
        assert_eq!(sm.get_simple_pairing_type(), PairingType::Invalid);

        sm.set_local_io_capability(addr(1), IoCapability::DisplayYesNo.to_u8(), 0, 1);
        assert_eq!(sm.get_simple_pairing_type(), PairingType::Invalid);

        sm.set_peer_io_capability(addr(1), IoCapability::DisplayYesNo.to_u8(), 0, 1);
        assert_eq!(sm.get_simple_pairing_type(), PairingType::DisplayAndConfirm);

        sm.invalidate_io_capabilities();
        assert_eq!(sm.get_simple_pairing_type(), PairingType::Invalid);
    }

    #[test]
    fn test_pairing_type_table() {
        use IoCapability::*;
        let cases = [
            (NoInputNoOutput, DisplayYesNo, PairingType::AutoConfirmation),
            (DisplayOnly, NoInputNoOutput, PairingType::AutoConfirmation),
            (DisplayOnly, KeyboardOnly, PairingType::InputPin),
            (KeyboardOnly, DisplayOnly, PairingType::DisplayPin),
            (KeyboardOnly, KeyboardOnly, PairingType::InputPin),
            (DisplayYesNo, DisplayOnly, PairingType::AutoConfirmation),
        ];
        for (peer_io, local_io, expected) in cases {
            let mut sm = SecurityManager::new();
            sm.set_peer_io_capability(addr(1), peer_io.to_u8(), 0, 1);
            sm.set_local_io_capability(addr(1), local_io.to_u8(), 0, 1);
            assert_eq!(sm.get_simple_pairing_type(), expected, "{peer_io:?} x {local_io:?}");
        }
    }

    #[test]
    fn test_pairing_type_without_mitm_is_automatic() {
        let mut sm = SecurityManager::new();
        sm.set_peer_io_capability(addr(1), IoCapability::KeyboardOnly.to_u8(), 0, 0);
        sm.set_local_io_capability(addr(1), IoCapability::KeyboardOnly.to_u8(), 0, 0);
        assert_eq!(sm.get_simple_pairing_type(), PairingType::AutoConfirmation);
    }

    #[test]
    fn test_pairing_type_with_oob_is_automatic() {
        let mut sm = SecurityManager::new();
        sm.set_peer_io_capability(addr(1), IoCapability::DisplayYesNo.to_u8(), 1, 1);
        sm.set_local_io_capability(addr(1), IoCapability::DisplayYesNo.to_u8(), 0, 1);
        assert_eq!(sm.get_simple_pairing_type(), PairingType::AutoConfirmation);
    }

    #[test]
    fn test_pairing_type_invalid_capability_value() {
        let mut sm = SecurityManager::new();
        sm.set_peer_io_capability(addr(1), 0x09, 0, 1);
        sm.set_local_io_capability(addr(1), IoCapability::DisplayOnly.to_u8(), 0, 1);
        assert_eq!(sm.get_simple_pairing_type(), PairingType::Invalid);
    }

    #[test]
    fn test_finished_clears_derived_state_only() {
        let mut sm = SecurityManager::new();
        sm.authentication_request(addr(1), 0x21);
        sm.set_local_io_capability(addr(1), IoCapability::DisplayYesNo.to_u8(), 0, 0);
        sm.set_peer_io_capability(addr(1), IoCapability::DisplayYesNo.to_u8(), 0, 0);

        sm.authentication_request_finished();
        assert_eq!(sm.get_simple_pairing_type(), PairingType::Invalid);
        // The binding survives for the stage-2 completion event
        assert_eq!(sm.get_authentication_address(), Some(addr(1)));
        assert_eq!(sm.get_authentication_handle(), 0x21);
    }
}
