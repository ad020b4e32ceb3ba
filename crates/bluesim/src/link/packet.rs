//! Link-layer packet model
//!
//! Packets exchanged between simulated controllers carry a source address,
//! a destination address (the empty address signals broadcast), and a typed
//! payload. Byte-level framing is the radio's concern; only the ACL payload
//! embeds wire bytes, because it transports an HCI ACL packet verbatim.

use crate::address::{Address, AddressType};
use crate::hci::types::{ClassOfDevice, ErrorCode, PageScanRepetitionMode};

/// Inquiry flavor requested by the inquiring side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryType {
    Standard = 0x00,
    Rssi = 0x01,
    Extended = 0x02,
}

impl InquiryType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x01 => InquiryType::Rssi,
            0x02 => InquiryType::Extended,
            _ => InquiryType::Standard,
        }
    }
}

/// LE advertising PDU type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisementType {
    AdvInd = 0x00,
    AdvDirectInd = 0x01,
    AdvScanInd = 0x02,
    AdvNonconnInd = 0x03,
    ScanResponse = 0x04,
}

impl AdvertisementType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x01 => AdvertisementType::AdvDirectInd,
            0x02 => AdvertisementType::AdvScanInd,
            0x03 => AdvertisementType::AdvNonconnInd,
            0x04 => AdvertisementType::ScanResponse,
            _ => AdvertisementType::AdvInd,
        }
    }
}

/// Typed payload of a link-layer packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPayload {
    /// An HCI ACL data packet in wire form, forwarded between controllers
    Acl { data: Vec<u8> },
    Disconnect { reason: ErrorCode },
    EncryptConnection { key: [u8; 16] },
    EncryptConnectionResponse { key: [u8; 16] },
    Inquiry { inquiry_type: InquiryType },
    InquiryResponse {
        page_scan_repetition_mode: PageScanRepetitionMode,
        class_of_device: ClassOfDevice,
        clock_offset: u16,
    },
    InquiryResponseWithRssi {
        page_scan_repetition_mode: PageScanRepetitionMode,
        class_of_device: ClassOfDevice,
        clock_offset: u16,
        rssi: u8,
    },
    ExtendedInquiryResponse {
        page_scan_repetition_mode: PageScanRepetitionMode,
        class_of_device: ClassOfDevice,
        clock_offset: u16,
        rssi: u8,
        extended_data: Vec<u8>,
    },
    IoCapabilityRequest {
        io_capability: u8,
        oob_data_present: u8,
        authentication_requirements: u8,
    },
    IoCapabilityResponse {
        io_capability: u8,
        oob_data_present: u8,
        authentication_requirements: u8,
    },
    IoCapabilityNegativeResponse { reason: ErrorCode },
    LeAdvertisement {
        address_type: AddressType,
        advertisement_type: AdvertisementType,
        data: Vec<u8>,
    },
    LeConnect {
        interval_min: u16,
        interval_max: u16,
        latency: u16,
        supervision_timeout: u16,
        address_type: AddressType,
    },
    LeConnectComplete {
        interval: u16,
        latency: u16,
        supervision_timeout: u16,
        address_type: AddressType,
    },
    LeEncryptConnection {
        rand: [u8; 8],
        ediv: u16,
        ltk: [u8; 16],
    },
    LeEncryptConnectionResponse {
        rand: [u8; 8],
        ediv: u16,
        ltk: [u8; 16],
    },
    LeScan,
    LeScanResponse {
        address_type: AddressType,
        advertisement_type: AdvertisementType,
        data: Vec<u8>,
    },
    Page {
        class_of_device: ClassOfDevice,
        allow_role_switch: bool,
    },
    PageResponse { try_role_switch: bool },
    PageReject { reason: ErrorCode },
    RemoteNameRequest,
    RemoteNameRequestResponse { name: Vec<u8> },
    ReadRemoteSupportedFeatures,
    ReadRemoteSupportedFeaturesResponse { features: u64 },
    ReadRemoteLmpFeatures,
    ReadRemoteLmpFeaturesResponse { features: u64 },
    ReadRemoteExtendedFeatures { page_number: u8 },
    ReadRemoteExtendedFeaturesResponse {
        status: ErrorCode,
        page_number: u8,
        max_page_number: u8,
        features: u64,
    },
    ReadRemoteVersionInformation,
    ReadRemoteVersionInformationResponse {
        lmp_version: u8,
        manufacturer_name: u16,
        lmp_subversion: u16,
    },
    ReadClockOffset,
    ReadClockOffsetResponse { offset: u16 },
}

impl LinkPayload {
    /// Short name of the payload type, for log messages
    pub fn name(&self) -> &'static str {
        match self {
            LinkPayload::Acl { .. } => "ACL",
            LinkPayload::Disconnect { .. } => "DISCONNECT",
            LinkPayload::EncryptConnection { .. } => "ENCRYPT_CONNECTION",
            LinkPayload::EncryptConnectionResponse { .. } => "ENCRYPT_CONNECTION_RESPONSE",
            LinkPayload::Inquiry { .. } => "INQUIRY",
            LinkPayload::InquiryResponse { .. } => "INQUIRY_RESPONSE",
            LinkPayload::InquiryResponseWithRssi { .. } => "INQUIRY_RESPONSE_WITH_RSSI",
            LinkPayload::ExtendedInquiryResponse { .. } => "EXTENDED_INQUIRY_RESPONSE",
            LinkPayload::IoCapabilityRequest { .. } => "IO_CAPABILITY_REQUEST",
            LinkPayload::IoCapabilityResponse { .. } => "IO_CAPABILITY_RESPONSE",
            LinkPayload::IoCapabilityNegativeResponse { .. } => "IO_CAPABILITY_NEGATIVE_RESPONSE",
            LinkPayload::LeAdvertisement { .. } => "LE_ADVERTISEMENT",
            LinkPayload::LeConnect { .. } => "LE_CONNECT",
            LinkPayload::LeConnectComplete { .. } => "LE_CONNECT_COMPLETE",
            LinkPayload::LeEncryptConnection { .. } => "LE_ENCRYPT_CONNECTION",
            LinkPayload::LeEncryptConnectionResponse { .. } => "LE_ENCRYPT_CONNECTION_RESPONSE",
            LinkPayload::LeScan => "LE_SCAN",
            LinkPayload::LeScanResponse { .. } => "LE_SCAN_RESPONSE",
            LinkPayload::Page { .. } => "PAGE",
            LinkPayload::PageResponse { .. } => "PAGE_RESPONSE",
            LinkPayload::PageReject { .. } => "PAGE_REJECT",
            LinkPayload::RemoteNameRequest => "REMOTE_NAME_REQUEST",
            LinkPayload::RemoteNameRequestResponse { .. } => "REMOTE_NAME_REQUEST_RESPONSE",
            LinkPayload::ReadRemoteSupportedFeatures => "READ_REMOTE_SUPPORTED_FEATURES",
            LinkPayload::ReadRemoteSupportedFeaturesResponse { .. } => {
                "READ_REMOTE_SUPPORTED_FEATURES_RESPONSE"
            }
            LinkPayload::ReadRemoteLmpFeatures => "READ_REMOTE_LMP_FEATURES",
            LinkPayload::ReadRemoteLmpFeaturesResponse { .. } => {
                "READ_REMOTE_LMP_FEATURES_RESPONSE"
            }
            LinkPayload::ReadRemoteExtendedFeatures { .. } => "READ_REMOTE_EXTENDED_FEATURES",
            LinkPayload::ReadRemoteExtendedFeaturesResponse { .. } => {
                "READ_REMOTE_EXTENDED_FEATURES_RESPONSE"
            }
            LinkPayload::ReadRemoteVersionInformation => "READ_REMOTE_VERSION_INFORMATION",
            LinkPayload::ReadRemoteVersionInformationResponse { .. } => {
                "READ_REMOTE_VERSION_INFORMATION_RESPONSE"
            }
            LinkPayload::ReadClockOffset => "READ_CLOCK_OFFSET",
            LinkPayload::ReadClockOffsetResponse { .. } => "READ_CLOCK_OFFSET_RESPONSE",
        }
    }
}

/// A packet on the simulated radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLayerPacket {
    pub source: Address,
    pub destination: Address,
    pub payload: LinkPayload,
}

impl LinkLayerPacket {
    pub fn new(source: Address, destination: Address, payload: LinkPayload) -> Self {
        Self { source, destination, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inquiry_type_from_u8() {
        assert_eq!(InquiryType::from_u8(0), InquiryType::Standard);
        assert_eq!(InquiryType::from_u8(1), InquiryType::Rssi);
        assert_eq!(InquiryType::from_u8(2), InquiryType::Extended);
        assert_eq!(InquiryType::from_u8(9), InquiryType::Standard);
    }

    #[test]
    fn test_payload_names() {
        let payload = LinkPayload::Page { class_of_device: [0; 3], allow_role_switch: true };
        assert_eq!(payload.name(), "PAGE");
        assert_eq!(LinkPayload::LeScan.name(), "LE_SCAN");
    }
}
