//! Connection handle table
//!
//! Tracks pending and established connections for both transports and owns
//! handle allocation. Handles live in the 12-bit space below
//! [`RESERVED_HANDLE`] and are never reused while live.

use crate::address::{Address, AddressType, AddressWithType};
use crate::hci::types::{Handle, Phy, RESERVED_HANDLE};
use std::collections::HashMap;

/// Most connections a single simulated controller will carry
const MAX_CONNECTIONS: usize = 10;

#[derive(Debug, Clone)]
struct AclConnection {
    address: AddressWithType,
    own_address: AddressWithType,
    phy: Phy,
    encrypted: bool,
}

/// Table of pending and live connections
#[derive(Debug, Default)]
pub struct AclConnections {
    connections: HashMap<Handle, AclConnection>,
    /// Pending classic connections, value = authenticate on completion
    pending: HashMap<Address, bool>,
    pending_le: Option<AddressWithType>,
    last_handle: Handle,
}

impl AclConnections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an in-flight classic connection to `addr`. Fails if one is
    /// already pending for the peer or the table is full.
    pub fn create_pending(&mut self, addr: Address, authenticate_on_completion: bool) -> bool {
        if self.pending.contains_key(&addr) || self.at_capacity() {
            return false;
        }
        self.pending.insert(addr, authenticate_on_completion);
        true
    }

    pub fn has_pending(&self, addr: Address) -> bool {
        self.pending.contains_key(&addr)
    }

    pub fn cancel_pending(&mut self, addr: Address) -> bool {
        self.pending.remove(&addr).is_some()
    }

    /// Consume the authenticate-on-completion flag of the pending
    /// connection about to be promoted. At most one classic page is in
    /// flight at a time, so the flag is unambiguous.
    pub fn authenticate_pending_connection(&mut self) -> bool {
        for flag in self.pending.values_mut() {
            if *flag {
                *flag = false;
                return true;
            }
        }
        false
    }

    /// Promote a pending classic connection to a live handle
    pub fn create_connection(&mut self, peer: Address, own: Address) -> Handle {
        if self.pending.remove(&peer).is_none() {
            return RESERVED_HANDLE;
        }
        let Some(handle) = self.next_handle() else {
            return RESERVED_HANDLE;
        };
        self.connections.insert(
            handle,
            AclConnection {
                address: AddressWithType::new(peer, AddressType::Public),
                own_address: AddressWithType::new(own, AddressType::Public),
                phy: Phy::BrEdr,
                encrypted: false,
            },
        );
        handle
    }

    /// Record an in-flight LE connection; only one may be pending
    pub fn create_pending_le(&mut self, peer: AddressWithType) -> bool {
        if self.pending_le.is_some() || self.at_capacity() {
            return false;
        }
        self.pending_le = Some(peer);
        true
    }

    /// Promote the pending LE connection to a live handle
    pub fn create_le_connection(
        &mut self,
        peer: AddressWithType,
        own: AddressWithType,
    ) -> Handle {
        if self.pending_le != Some(peer) {
            return RESERVED_HANDLE;
        }
        let Some(handle) = self.next_handle() else {
            return RESERVED_HANDLE;
        };
        self.pending_le = None;
        self.connections.insert(
            handle,
            AclConnection {
                address: peer,
                own_address: own,
                phy: Phy::LowEnergy,
                encrypted: false,
            },
        );
        handle
    }

    pub fn has_handle(&self, handle: Handle) -> bool {
        self.connections.contains_key(&handle)
    }

    pub fn get_address(&self, handle: Handle) -> Option<AddressWithType> {
        self.connections.get(&handle).map(|c| c.address)
    }

    pub fn get_own_address(&self, handle: Handle) -> Option<AddressWithType> {
        self.connections.get(&handle).map(|c| c.own_address)
    }

    pub fn get_phy(&self, handle: Handle) -> Option<Phy> {
        self.connections.get(&handle).map(|c| c.phy)
    }

    /// Look up a handle by peer address alone, any address type
    pub fn get_handle_only_address(&self, addr: Address) -> Handle {
        self.connections
            .iter()
            .find(|(_, c)| c.address.address == addr)
            .map(|(handle, _)| *handle)
            .unwrap_or(RESERVED_HANDLE)
    }

    /// Look up a handle by full typed peer address
    pub fn get_handle(&self, addr: AddressWithType) -> Handle {
        self.connections
            .iter()
            .find(|(_, c)| c.address == addr)
            .map(|(handle, _)| *handle)
            .unwrap_or(RESERVED_HANDLE)
    }

    pub fn disconnect(&mut self, handle: Handle) -> bool {
        self.connections.remove(&handle).is_some()
    }

    pub fn is_encrypted(&self, handle: Handle) -> bool {
        self.connections.get(&handle).map(|c| c.encrypted).unwrap_or(false)
    }

    pub fn encrypt(&mut self, handle: Handle) {
        if let Some(connection) = self.connections.get_mut(&handle) {
            connection.encrypted = true;
        }
    }

    fn at_capacity(&self) -> bool {
        self.connections.len() + self.pending.len() >= MAX_CONNECTIONS
    }

    fn next_handle(&mut self) -> Option<Handle> {
        if self.connections.len() >= MAX_CONNECTIONS {
            return None;
        }
        let mut handle = self.last_handle;
        loop {
            handle = (handle + 1) % RESERVED_HANDLE;
            if !self.connections.contains_key(&handle) {
                break;
            }
        }
        self.last_handle = handle;
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Address {
        Address::new([last, 0, 0, 0, 0, 0])
    }

    #[test]
    fn test_pending_then_connected() {
        let mut connections = AclConnections::new();
        assert!(connections.create_pending(addr(1), false));
        // Duplicate pending is refused
        assert!(!connections.create_pending(addr(1), true));

        let handle = connections.create_connection(addr(1), addr(9));
        assert_ne!(handle, RESERVED_HANDLE);
        assert!(connections.has_handle(handle));
        assert_eq!(connections.get_address(handle).unwrap().address, addr(1));
        assert_eq!(connections.get_own_address(handle).unwrap().address, addr(9));
        assert_eq!(connections.get_phy(handle), Some(Phy::BrEdr));
    }

    #[test]
    fn test_create_connection_without_pending() {
        let mut connections = AclConnections::new();
        assert_eq!(connections.create_connection(addr(1), addr(9)), RESERVED_HANDLE);
    }

    #[test]
    fn test_cancel_pending() {
        let mut connections = AclConnections::new();
        assert!(connections.create_pending(addr(1), false));
        assert!(connections.cancel_pending(addr(1)));
        assert!(!connections.cancel_pending(addr(1)));
        assert_eq!(connections.create_connection(addr(1), addr(9)), RESERVED_HANDLE);
    }

    #[test]
    fn test_authenticate_flag_consumed() {
        let mut connections = AclConnections::new();
        assert!(connections.create_pending(addr(1), true));
        assert!(connections.authenticate_pending_connection());
        assert!(!connections.authenticate_pending_connection());
    }

    #[test]
    fn test_handles_unique_while_live() {
        let mut connections = AclConnections::new();
        let mut handles = Vec::new();
        for i in 0..4 {
            assert!(connections.create_pending(addr(i), false));
            let handle = connections.create_connection(addr(i), addr(100));
            assert_ne!(handle, RESERVED_HANDLE);
            assert!(!handles.contains(&handle));
            handles.push(handle);
        }
    }

    #[test]
    fn test_handle_not_reused_after_disconnect() {
        let mut connections = AclConnections::new();
        assert!(connections.create_pending(addr(1), false));
        let first = connections.create_connection(addr(1), addr(100));
        assert!(connections.disconnect(first));
        assert!(!connections.has_handle(first));
        assert!(!connections.disconnect(first));

        assert!(connections.create_pending(addr(2), false));
        let second = connections.create_connection(addr(2), addr(100));
        assert_ne!(first, second);
    }

    #[test]
    fn test_lookup_by_address() {
        let mut connections = AclConnections::new();
        assert_eq!(connections.get_handle_only_address(addr(1)), RESERVED_HANDLE);

        assert!(connections.create_pending(addr(1), false));
        let handle = connections.create_connection(addr(1), addr(100));
        assert_eq!(connections.get_handle_only_address(addr(1)), handle);
        assert_eq!(
            connections.get_handle(AddressWithType::new(addr(1), AddressType::Public)),
            handle
        );
        assert_eq!(
            connections.get_handle(AddressWithType::new(addr(1), AddressType::Random)),
            RESERVED_HANDLE
        );
    }

    #[test]
    fn test_le_connection() {
        let mut connections = AclConnections::new();
        let peer = AddressWithType::new(addr(5), AddressType::Random);
        let own = AddressWithType::new(addr(6), AddressType::Public);

        // No pending record yet
        assert_eq!(connections.create_le_connection(peer, own), RESERVED_HANDLE);

        assert!(connections.create_pending_le(peer));
        assert!(!connections.create_pending_le(peer));

        let handle = connections.create_le_connection(peer, own);
        assert_ne!(handle, RESERVED_HANDLE);
        assert_eq!(connections.get_phy(handle), Some(Phy::LowEnergy));
        assert_eq!(connections.get_address(handle), Some(peer));
    }

    #[test]
    fn test_encryption_idempotent() {
        let mut connections = AclConnections::new();
        assert!(connections.create_pending(addr(1), false));
        let handle = connections.create_connection(addr(1), addr(100));

        assert!(!connections.is_encrypted(handle));
        connections.encrypt(handle);
        assert!(connections.is_encrypted(handle));
        connections.encrypt(handle);
        assert!(connections.is_encrypted(handle));
    }

    #[test]
    fn test_capacity() {
        let mut connections = AclConnections::new();
        for i in 0..MAX_CONNECTIONS as u8 {
            assert!(connections.create_pending(addr(i), false));
            assert_ne!(connections.create_connection(addr(i), addr(200)), RESERVED_HANDLE);
        }
        assert!(!connections.create_pending(addr(99), false));
    }
}
