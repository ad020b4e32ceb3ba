//! Device properties consumed by the controller
//!
//! Plain owned state; loading and persistence are outside the core.

use crate::address::{Address, AddressType};
use crate::hci::types::{ClassOfDevice, LeScanningFilterPolicy, PageScanRepetitionMode};
use crate::link::AdvertisementType;

/// Static identity and capability values of a simulated device
#[derive(Debug, Clone)]
pub struct DeviceProperties {
    pub address: Address,
    pub le_address: Address,
    pub name: Vec<u8>,
    pub class_of_device: ClassOfDevice,
    pub clock_offset: u16,
    pub page_scan_repetition_mode: PageScanRepetitionMode,
    pub supported_features: u64,
    /// Extended feature pages; page 0 mirrors `supported_features`
    pub extended_features: Vec<u64>,
    pub extended_inquiry_data: Vec<u8>,
    pub lmp_version: u8,
    pub manufacturer_name: u16,
    pub lmp_subversion: u16,
    pub acl_data_packet_size: u16,
    pub authentication_enable: bool,
    pub le_advertising_interval_min: u16,
    pub le_advertising_interval_max: u16,
    pub le_advertising_own_address_type: AddressType,
    pub le_advertising_peer_address: Address,
    pub le_advertising_peer_address_type: AddressType,
    pub le_advertising_filter_policy: LeScanningFilterPolicy,
    pub le_advertisement_type: AdvertisementType,
    pub le_advertisement: Vec<u8>,
    pub le_scan_response: Vec<u8>,
    pub le_connect_list_size: usize,
    pub le_resolving_list_size: usize,
    pub le_advertising_sets: usize,
}

impl DeviceProperties {
    pub fn extended_features_page(&self, page: u8) -> u64 {
        self.extended_features.get(page as usize).copied().unwrap_or(0)
    }

    pub fn extended_features_max_page(&self) -> u8 {
        self.extended_features.len().saturating_sub(1) as u8
    }
}

impl Default for DeviceProperties {
    fn default() -> Self {
        Self {
            address: Address::EMPTY,
            le_address: Address::EMPTY,
            name: b"bluesim".to_vec(),
            class_of_device: [0x0C, 0x01, 0x1C],
            clock_offset: 0,
            page_scan_repetition_mode: PageScanRepetitionMode::R1,
            supported_features: 0x8779_FF9B_FE8F_FFFF,
            extended_features: vec![0x8779_FF9B_FE8F_FFFF, 0x0000_0000_0000_0007, 0],
            extended_inquiry_data: Vec::new(),
            lmp_version: 0x0B,
            manufacturer_name: 0x00E0,
            lmp_subversion: 0x0000,
            acl_data_packet_size: 1024,
            authentication_enable: false,
            le_advertising_interval_min: 0x0800,
            le_advertising_interval_max: 0x0800,
            le_advertising_own_address_type: AddressType::Public,
            le_advertising_peer_address: Address::EMPTY,
            le_advertising_peer_address_type: AddressType::Public,
            le_advertising_filter_policy: LeScanningFilterPolicy::AcceptAll,
            le_advertisement_type: AdvertisementType::AdvInd,
            le_advertisement: Vec::new(),
            le_scan_response: Vec::new(),
            le_connect_list_size: 15,
            le_resolving_list_size: 15,
            le_advertising_sets: 3,
        }
    }
}
