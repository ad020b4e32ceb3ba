//! LE advertising sets
//!
//! Each advertiser owns the parameters of one advertising set and decides
//! when a beacon or scan response is due. Time is virtual: the controller
//! passes its clock in, so emission is deterministic.

use crate::address::{Address, AddressType, AddressWithType};
use crate::hci::types::LeScanningFilterPolicy;
use crate::link::{AdvertisementType, LinkLayerPacket, LinkPayload};
use std::time::Duration;

/// One LE advertising set
#[derive(Debug, Clone)]
pub struct LeAdvertiser {
    enabled: bool,
    address: AddressWithType,
    peer_address: AddressWithType,
    filter_policy: LeScanningFilterPolicy,
    advertisement_type: AdvertisementType,
    advertisement: Vec<u8>,
    scan_response: Vec<u8>,
    interval: Duration,
    last_advertisement: Option<Duration>,
    ends_at: Option<Duration>,
}

impl Default for LeAdvertiser {
    fn default() -> Self {
        Self {
            enabled: false,
            address: AddressWithType::EMPTY,
            peer_address: AddressWithType::EMPTY,
            filter_policy: LeScanningFilterPolicy::AcceptAll,
            advertisement_type: AdvertisementType::AdvInd,
            advertisement: Vec::new(),
            scan_response: Vec::new(),
            interval: Duration::from_millis(1280),
            last_advertisement: None,
            ends_at: None,
        }
    }
}

impl LeAdvertiser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the set from legacy advertising parameters
    pub fn initialize(
        &mut self,
        address: AddressWithType,
        peer_address: AddressWithType,
        filter_policy: LeScanningFilterPolicy,
        advertisement_type: AdvertisementType,
        advertisement: Vec<u8>,
        scan_response: Vec<u8>,
        interval: Duration,
    ) {
        self.address = address;
        self.peer_address = peer_address;
        self.filter_policy = filter_policy;
        self.advertisement_type = advertisement_type;
        self.advertisement = advertisement;
        self.scan_response = scan_response;
        self.interval = interval;
    }

    /// Configure the set from extended advertising parameters; the address
    /// itself and the payloads arrive through separate commands
    pub fn initialize_extended(
        &mut self,
        address_type: AddressType,
        peer_address: AddressWithType,
        filter_policy: LeScanningFilterPolicy,
        advertisement_type: AdvertisementType,
        interval: Duration,
    ) {
        self.address = AddressWithType::new(self.address.address, address_type);
        self.peer_address = peer_address;
        self.filter_policy = filter_policy;
        self.advertisement_type = advertisement_type;
        self.interval = interval;
    }

    pub fn set_address(&mut self, address: Address) {
        self.address = AddressWithType::new(address, self.address.address_type);
    }

    pub fn get_address(&self) -> AddressWithType {
        self.address
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.advertisement = data;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        self.last_advertisement = None;
        self.ends_at = None;
    }

    /// Enable with an optional duration after which the set self-disables
    pub fn enable_extended(&mut self, now: Duration, duration: Duration) {
        self.enabled = true;
        self.last_advertisement = None;
        self.ends_at = if duration.is_zero() { None } else { Some(now + duration) };
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Reset the set to its cleared state
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Produce the next beacon if the interval has elapsed
    pub fn get_advertisement(&mut self, now: Duration) -> Option<LinkLayerPacket> {
        if !self.enabled {
            return None;
        }
        if let Some(ends_at) = self.ends_at {
            if now >= ends_at {
                self.disable();
                return None;
            }
        }
        if let Some(last) = self.last_advertisement {
            if now.saturating_sub(last) < self.interval {
                return None;
            }
        }
        self.last_advertisement = Some(now);
        Some(LinkLayerPacket::new(
            self.address.address,
            self.peer_address.address,
            LinkPayload::LeAdvertisement {
                address_type: self.address.address_type,
                advertisement_type: self.advertisement_type,
                data: self.advertisement.clone(),
            },
        ))
    }

    /// Produce a scan response for a scan aimed at this set
    pub fn get_scan_response(
        &self,
        scanned: Address,
        scanner: Address,
    ) -> Option<LinkLayerPacket> {
        if !self.enabled || scanned != self.address.address {
            return None;
        }
        if !self.filter_policy_admits_scanner(scanner) {
            return None;
        }
        Some(LinkLayerPacket::new(
            self.address.address,
            scanner,
            LinkPayload::LeScanResponse {
                address_type: self.address.address_type,
                advertisement_type: AdvertisementType::ScanResponse,
                data: self.scan_response.clone(),
            },
        ))
    }

    // The advertiser has no view of the connect list, so list-gated
    // policies admit only the configured peer.
    fn filter_policy_admits_scanner(&self, scanner: Address) -> bool {
        match self.filter_policy {
            LeScanningFilterPolicy::AcceptAll
            | LeScanningFilterPolicy::CheckInitiatorsIdentity => true,
            LeScanningFilterPolicy::ConnectListOnly
            | LeScanningFilterPolicy::ConnectListAndInitiatorsIdentity => {
                scanner == self.peer_address.address
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn advertiser() -> LeAdvertiser {
        let mut advertiser = LeAdvertiser::new();
        advertiser.initialize(
            AddressWithType::new(Address::new([1, 0, 0, 0, 0, 0]), AddressType::Public),
            AddressWithType::EMPTY,
            LeScanningFilterPolicy::AcceptAll,
            AdvertisementType::AdvInd,
            vec![0x02, 0x01, 0x06],
            vec![0x05, 0x09, b't', b'e', b's', b't'],
            ms(100),
        );
        advertiser
    }

    #[test]
    fn test_disabled_set_is_silent() {
        let mut advertiser = advertiser();
        assert!(advertiser.get_advertisement(ms(0)).is_none());
        assert!(advertiser
            .get_scan_response(Address::new([1, 0, 0, 0, 0, 0]), Address::new([2, 0, 0, 0, 0, 0]))
            .is_none());
    }

    #[test]
    fn test_beacon_cadence() {
        let mut advertiser = advertiser();
        advertiser.enable();

        let first = advertiser.get_advertisement(ms(0)).unwrap();
        assert_eq!(first.source, Address::new([1, 0, 0, 0, 0, 0]));
        assert_eq!(first.destination, Address::EMPTY);
        assert!(matches!(
            first.payload,
            LinkPayload::LeAdvertisement { advertisement_type: AdvertisementType::AdvInd, .. }
        ));

        // Too soon
        assert!(advertiser.get_advertisement(ms(50)).is_none());
        assert!(advertiser.get_advertisement(ms(100)).is_some());
    }

    #[test]
    fn test_extended_duration_expires() {
        let mut advertiser = advertiser();
        advertiser.enable_extended(ms(0), ms(150));

        assert!(advertiser.get_advertisement(ms(0)).is_some());
        assert!(advertiser.get_advertisement(ms(100)).is_some());
        assert!(advertiser.get_advertisement(ms(200)).is_none());
        assert!(!advertiser.is_enabled());
    }

    #[test]
    fn test_scan_response_address_match() {
        let mut advertiser = advertiser();
        advertiser.enable();

        let scanner = Address::new([2, 0, 0, 0, 0, 0]);
        let response = advertiser
            .get_scan_response(Address::new([1, 0, 0, 0, 0, 0]), scanner)
            .unwrap();
        assert_eq!(response.destination, scanner);
        assert!(matches!(
            response.payload,
            LinkPayload::LeScanResponse {
                advertisement_type: AdvertisementType::ScanResponse,
                ..
            }
        ));

        // Scans aimed at someone else are ignored
        assert!(advertiser
            .get_scan_response(Address::new([9, 0, 0, 0, 0, 0]), scanner)
            .is_none());
    }

    #[test]
    fn test_scan_filter_policy() {
        let mut advertiser = LeAdvertiser::new();
        let peer = Address::new([5, 0, 0, 0, 0, 0]);
        advertiser.initialize(
            AddressWithType::new(Address::new([1, 0, 0, 0, 0, 0]), AddressType::Public),
            AddressWithType::new(peer, AddressType::Public),
            LeScanningFilterPolicy::ConnectListOnly,
            AdvertisementType::AdvScanInd,
            vec![],
            vec![],
            ms(100),
        );
        advertiser.enable();

        let scanned = Address::new([1, 0, 0, 0, 0, 0]);
        assert!(advertiser.get_scan_response(scanned, peer).is_some());
        assert!(advertiser
            .get_scan_response(scanned, Address::new([6, 0, 0, 0, 0, 0]))
            .is_none());
    }

    #[test]
    fn test_clear_resets() {
        let mut advertiser = advertiser();
        advertiser.enable();
        advertiser.clear();
        assert!(!advertiser.is_enabled());
        assert!(advertiser.get_advertisement(ms(500)).is_none());
    }
}
