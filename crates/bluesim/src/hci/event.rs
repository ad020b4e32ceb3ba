//! HCI events emitted toward the host
//!
//! Events are modeled as typed values; framing them into event packets is
//! the responsibility of the HCI transport layer, not the controller.

use crate::address::{Address, AddressType};
use crate::hci::types::{
    ClassOfDevice, ErrorCode, Handle, KeyType, LinkType, PageScanRepetitionMode, Role,
};

/// LE meta-event sub-events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeMetaEvent {
    AdvertisingReport {
        event_type: u8,
        address_type: AddressType,
        address: Address,
        data: Vec<u8>,
        rssi: u8,
    },
    ExtendedAdvertisingReport {
        event_type: u8,
        address_type: AddressType,
        address: Address,
        data: Vec<u8>,
        rssi: u8,
    },
    ConnectionComplete {
        status: ErrorCode,
        handle: Handle,
        role: Role,
        peer_address_type: AddressType,
        peer_address: Address,
        connection_interval: u16,
        connection_latency: u16,
        supervision_timeout: u16,
    },
    LongTermKeyRequest {
        handle: Handle,
        rand: [u8; 8],
        ediv: u16,
    },
    ConnectionUpdateComplete {
        status: ErrorCode,
        handle: Handle,
        connection_interval: u16,
        connection_latency: u16,
        supervision_timeout: u16,
    },
}

/// Events the controller can deliver to its host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HciEvent {
    ConnectionRequest {
        address: Address,
        class_of_device: ClassOfDevice,
        link_type: LinkType,
    },
    ConnectionComplete {
        status: ErrorCode,
        handle: Handle,
        address: Address,
        link_type: LinkType,
        encryption_enabled: bool,
    },
    DisconnectionComplete {
        status: ErrorCode,
        handle: Handle,
        reason: ErrorCode,
    },
    AuthenticationComplete {
        status: ErrorCode,
        handle: Handle,
    },
    EncryptionChange {
        status: ErrorCode,
        handle: Handle,
        enabled: bool,
    },
    EncryptionKeyRefreshComplete {
        status: ErrorCode,
        handle: Handle,
    },
    InquiryResult {
        address: Address,
        page_scan_repetition_mode: PageScanRepetitionMode,
        class_of_device: ClassOfDevice,
        clock_offset: u16,
    },
    InquiryResultWithRssi {
        address: Address,
        page_scan_repetition_mode: PageScanRepetitionMode,
        class_of_device: ClassOfDevice,
        clock_offset: u16,
        rssi: u8,
    },
    ExtendedInquiryResult {
        address: Address,
        page_scan_repetition_mode: PageScanRepetitionMode,
        class_of_device: ClassOfDevice,
        clock_offset: u16,
        rssi: u8,
        extended_inquiry_response: Vec<u8>,
    },
    InquiryComplete {
        status: ErrorCode,
    },
    RemoteNameRequestComplete {
        status: ErrorCode,
        address: Address,
        remote_name: Vec<u8>,
    },
    ReadRemoteSupportedFeaturesComplete {
        status: ErrorCode,
        handle: Handle,
        features: u64,
    },
    ReadRemoteExtendedFeaturesComplete {
        status: ErrorCode,
        handle: Handle,
        page_number: u8,
        max_page_number: u8,
        features: u64,
    },
    ReadRemoteVersionInformationComplete {
        status: ErrorCode,
        handle: Handle,
        version: u8,
        manufacturer_name: u16,
        subversion: u16,
    },
    RemoteHostSupportedFeaturesNotification {
        address: Address,
        features: u64,
    },
    ReadClockOffsetComplete {
        status: ErrorCode,
        handle: Handle,
        offset: u16,
    },
    NumberOfCompletedPackets {
        handle: Handle,
        completed_packets: u16,
    },
    ConnectionPacketTypeChanged {
        status: ErrorCode,
        handle: Handle,
        packet_types: u16,
    },
    IoCapabilityRequest {
        address: Address,
    },
    IoCapabilityResponse {
        address: Address,
        io_capability: u8,
        oob_data_present: u8,
        authentication_requirements: u8,
    },
    UserConfirmationRequest {
        address: Address,
        numeric_value: u32,
    },
    UserPasskeyRequest {
        address: Address,
    },
    SimplePairingComplete {
        status: ErrorCode,
        address: Address,
    },
    LinkKeyRequest {
        address: Address,
    },
    LinkKeyNotification {
        address: Address,
        key: [u8; 16],
        key_type: KeyType,
    },
    LeMeta(LeMetaEvent),
}
