//! Incoming link-layer packet dispatch
//!
//! Every packet from the radio passes the address filter, then the mode
//! gates for scan and advertisement types, and is finally demultiplexed to
//! the handler for its payload type.

use super::scheduler::Task;
use super::security::PairingType;
use super::{LeScanEnable, LinkLayerController};
use crate::address::{Address, AddressType, AddressWithType};
use crate::hci::acl::AclDataPacket;
use crate::hci::constants::*;
use crate::hci::event::{HciEvent, LeMetaEvent};
use crate::hci::types::{ErrorCode, LinkType, PacketBoundaryFlag, Role, RESERVED_HANDLE};
use crate::link::{AdvertisementType, InquiryType, LinkLayerPacket, LinkPayload};
use log::{debug, error, info, warn};
use std::time::Duration;

impl LinkLayerController {
    /// Entry point for packets delivered by the radio
    pub fn incoming_packet(&mut self, incoming: LinkLayerPacket) {
        let destination = incoming.destination;

        // Broadcasts, the device addresses, and enabled advertiser
        // addresses are all "me"
        let mut address_matches = destination == Address::EMPTY
            || destination == self.properties.address
            || destination == self.properties.le_address;
        for advertiser in &self.advertisers {
            if advertiser.is_enabled() && advertiser.get_address().address == destination {
                address_matches = true;
            }
        }
        if !address_matches {
            return;
        }

        match &incoming.payload {
            LinkPayload::Acl { .. } => self.incoming_acl(incoming),
            LinkPayload::Disconnect { .. } => self.incoming_disconnect(incoming),
            LinkPayload::EncryptConnection { .. } => self.incoming_encrypt_connection(incoming),
            LinkPayload::EncryptConnectionResponse { .. } => {
                self.incoming_encrypt_connection_response(incoming)
            }
            LinkPayload::Inquiry { .. } => {
                if self.inquiry_scans_enabled {
                    self.incoming_inquiry(incoming);
                }
            }
            LinkPayload::InquiryResponse { .. }
            | LinkPayload::InquiryResponseWithRssi { .. }
            | LinkPayload::ExtendedInquiryResponse { .. } => {
                self.incoming_inquiry_response(incoming)
            }
            LinkPayload::IoCapabilityRequest { .. } => {
                self.incoming_io_capability_request(incoming)
            }
            LinkPayload::IoCapabilityResponse { .. } => {
                self.incoming_io_capability_response(incoming)
            }
            LinkPayload::IoCapabilityNegativeResponse { .. } => {
                self.incoming_io_capability_negative_response(incoming)
            }
            LinkPayload::LeAdvertisement { .. } => {
                if self.le_scan_enable != LeScanEnable::None || self.le_connect {
                    self.incoming_le_advertisement(incoming);
                }
            }
            LinkPayload::LeConnect { .. } => self.incoming_le_connect(incoming),
            LinkPayload::LeConnectComplete { .. } => self.incoming_le_connect_complete(incoming),
            LinkPayload::LeEncryptConnection { .. } => {
                self.incoming_le_encrypt_connection(incoming)
            }
            LinkPayload::LeEncryptConnectionResponse { .. } => {
                self.incoming_le_encrypt_connection_response(incoming)
            }
            LinkPayload::LeScan => self.incoming_le_scan(incoming),
            LinkPayload::LeScanResponse { .. } => {
                if self.le_scan_enable != LeScanEnable::None && self.le_scan_type == 1 {
                    self.incoming_le_scan_response(incoming);
                }
            }
            LinkPayload::Page { .. } => {
                if self.page_scans_enabled {
                    self.incoming_page(incoming);
                }
            }
            LinkPayload::PageResponse { .. } => self.incoming_page_response(incoming),
            LinkPayload::PageReject { .. } => self.incoming_page_reject(incoming),
            LinkPayload::RemoteNameRequest => self.incoming_remote_name_request(incoming),
            LinkPayload::RemoteNameRequestResponse { .. } => {
                self.incoming_remote_name_request_response(incoming)
            }
            LinkPayload::ReadRemoteSupportedFeatures => {
                self.incoming_read_remote_supported_features(incoming)
            }
            LinkPayload::ReadRemoteSupportedFeaturesResponse { .. } => {
                self.incoming_read_remote_supported_features_response(incoming)
            }
            LinkPayload::ReadRemoteLmpFeatures => {
                self.incoming_read_remote_lmp_features(incoming)
            }
            LinkPayload::ReadRemoteLmpFeaturesResponse { .. } => {
                self.incoming_read_remote_lmp_features_response(incoming)
            }
            LinkPayload::ReadRemoteExtendedFeatures { .. } => {
                self.incoming_read_remote_extended_features(incoming)
            }
            LinkPayload::ReadRemoteExtendedFeaturesResponse { .. } => {
                self.incoming_read_remote_extended_features_response(incoming)
            }
            LinkPayload::ReadRemoteVersionInformation => {
                self.incoming_read_remote_version(incoming)
            }
            LinkPayload::ReadRemoteVersionInformationResponse { .. } => {
                self.incoming_read_remote_version_response(incoming)
            }
            LinkPayload::ReadClockOffset => self.incoming_read_clock_offset(incoming),
            LinkPayload::ReadClockOffsetResponse { .. } => {
                self.incoming_read_clock_offset_response(incoming)
            }
        }
    }

    // -------------------------------------------------------------------
    // ACL forwarding

    fn incoming_acl(&mut self, incoming: LinkLayerPacket) {
        debug!("acl packet {} -> {}", incoming.source, incoming.destination);
        let LinkPayload::Acl { data } = incoming.payload else {
            return;
        };

        let acl = match AclDataPacket::parse(&data) {
            Ok(acl) => acl,
            Err(e) => {
                warn!("dropping malformed acl packet from {}: {}", incoming.source, e);
                return;
            }
        };

        let local_handle = self.connections.get_handle_only_address(incoming.source);
        if local_handle == RESERVED_HANDLE {
            self.log_unknown_peer(incoming.source);
            return;
        }

        // Refragment for the local buffer size; the first fragment keeps
        // the inbound boundary flag except that non-flushable starts are
        // reported flushable
        let mut boundary_flag = acl.packet_boundary_flag;
        if boundary_flag == PacketBoundaryFlag::FirstNonAutomaticallyFlushable {
            boundary_flag = PacketBoundaryFlag::FirstAutomaticallyFlushable;
        }
        let fragment_size = self.properties.acl_data_packet_size as usize;
        for fragment in acl.payload.chunks(fragment_size.max(1)) {
            self.send_acl(AclDataPacket::new(
                local_handle,
                boundary_flag,
                acl.broadcast_flag,
                fragment.to_vec(),
            ));
            boundary_flag = PacketBoundaryFlag::ContinuingFragment;
        }
    }

    // -------------------------------------------------------------------
    // Disconnect

    fn incoming_disconnect(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::Disconnect { reason } = incoming.payload else {
            return;
        };
        let peer = incoming.source;
        let handle = self.connections.get_handle_only_address(peer);
        if handle == RESERVED_HANDLE {
            self.log_unknown_peer(peer);
            return;
        }
        assert!(self.connections.disconnect(handle), "disconnecting {handle:#x}");
        self.schedule_task(Duration::from_millis(20), Task::DisconnectCleanup { handle, reason });
    }

    // -------------------------------------------------------------------
    // BR/EDR encryption

    fn incoming_encrypt_connection(&mut self, incoming: LinkLayerPacket) {
        let peer = incoming.source;
        let handle = self.connections.get_handle_only_address(peer);
        if handle == RESERVED_HANDLE {
            self.log_unknown_peer(peer);
            return;
        }
        self.connections.encrypt(handle);
        self.send_event(HciEvent::EncryptionChange {
            status: ErrorCode::Success,
            handle,
            enabled: true,
        });

        let Some(key) = self.security_manager.get_key(peer) else {
            error!("no key stored for {}", peer);
            return;
        };
        let response = LinkLayerPacket::new(
            self.properties.address,
            peer,
            LinkPayload::EncryptConnectionResponse { key },
        );
        self.send_link_layer_packet(response);
    }

    fn incoming_encrypt_connection_response(&mut self, incoming: LinkLayerPacket) {
        let handle = self.connections.get_handle_only_address(incoming.source);
        if handle == RESERVED_HANDLE {
            self.log_unknown_peer(incoming.source);
            return;
        }
        self.connections.encrypt(handle);
        self.send_event(HciEvent::EncryptionChange {
            status: ErrorCode::Success,
            handle,
            enabled: true,
        });
    }

    // -------------------------------------------------------------------
    // Inquiry

    fn incoming_inquiry(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::Inquiry { inquiry_type } = incoming.payload else {
            return;
        };
        let peer = incoming.source;
        let own = self.properties.address;
        let page_scan_repetition_mode = self.properties.page_scan_repetition_mode;
        let class_of_device = self.properties.class_of_device;
        let clock_offset = self.properties.clock_offset;

        let payload = match inquiry_type {
            InquiryType::Standard => LinkPayload::InquiryResponse {
                page_scan_repetition_mode,
                class_of_device,
                clock_offset,
            },
            InquiryType::Rssi => LinkPayload::InquiryResponseWithRssi {
                page_scan_repetition_mode,
                class_of_device,
                clock_offset,
                rssi: self.next_rssi(),
            },
            InquiryType::Extended => LinkPayload::ExtendedInquiryResponse {
                page_scan_repetition_mode,
                class_of_device,
                clock_offset,
                rssi: self.next_rssi(),
                extended_data: self.properties.extended_inquiry_data.clone(),
            },
        };
        self.send_link_layer_packet(LinkLayerPacket::new(own, peer, payload));
    }

    fn incoming_inquiry_response(&mut self, incoming: LinkLayerPacket) {
        let address = incoming.source;
        let event = match incoming.payload {
            LinkPayload::InquiryResponse {
                page_scan_repetition_mode,
                class_of_device,
                clock_offset,
            } => HciEvent::InquiryResult {
                address,
                page_scan_repetition_mode,
                class_of_device,
                clock_offset,
            },
            LinkPayload::InquiryResponseWithRssi {
                page_scan_repetition_mode,
                class_of_device,
                clock_offset,
                rssi,
            } => HciEvent::InquiryResultWithRssi {
                address,
                page_scan_repetition_mode,
                class_of_device,
                clock_offset,
                rssi,
            },
            LinkPayload::ExtendedInquiryResponse {
                page_scan_repetition_mode,
                class_of_device,
                clock_offset,
                rssi,
                extended_data,
            } => HciEvent::ExtendedInquiryResult {
                address,
                page_scan_repetition_mode,
                class_of_device,
                clock_offset,
                rssi,
                extended_inquiry_response: extended_data,
            },
            _ => return,
        };
        self.send_event(event);
    }

    // -------------------------------------------------------------------
    // Simple pairing

    fn incoming_io_capability_request(&mut self, incoming: LinkLayerPacket) {
        debug!("io capability request from {}", incoming.source);
        if !self.simple_pairing_mode_enabled {
            warn!("only simple pairing mode is implemented");
            return;
        }
        let LinkPayload::IoCapabilityRequest {
            io_capability,
            oob_data_present,
            authentication_requirements,
        } = incoming.payload
        else {
            return;
        };
        let peer = incoming.source;

        let handle = self
            .connections
            .get_handle(AddressWithType::new(peer, AddressType::Public));
        if handle == RESERVED_HANDLE {
            info!("device not connected {}", peer);
            return;
        }

        self.security_manager.authentication_request(peer, handle);
        self.security_manager.set_peer_io_capability(
            peer,
            io_capability,
            oob_data_present,
            authentication_requirements,
        );

        self.send_event(HciEvent::IoCapabilityResponse {
            address: peer,
            io_capability,
            oob_data_present,
            authentication_requirements,
        });

        self.start_simple_pairing(peer);
    }

    fn incoming_io_capability_response(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::IoCapabilityResponse {
            io_capability,
            oob_data_present,
            authentication_requirements,
        } = incoming.payload
        else {
            return;
        };
        let peer = incoming.source;

        self.security_manager.set_peer_io_capability(
            peer,
            io_capability,
            oob_data_present,
            authentication_requirements,
        );

        self.send_event(HciEvent::IoCapabilityResponse {
            address: peer,
            io_capability,
            oob_data_present,
            authentication_requirements,
        });

        let pairing_type = self.security_manager.get_simple_pairing_type();
        if pairing_type != PairingType::Invalid {
            self.schedule_task(
                Duration::from_millis(5),
                Task::PairingStage1 { peer, pairing_type },
            );
        } else {
            info!("security manager returned INVALID");
        }
    }

    fn incoming_io_capability_negative_response(&mut self, incoming: LinkLayerPacket) {
        let peer = incoming.source;
        if self.security_manager.get_authentication_address() != Some(peer) {
            warn!("negative response from {} without an active authentication", peer);
            return;
        }
        self.security_manager.invalidate_io_capabilities();
    }

    // -------------------------------------------------------------------
    // LE advertising and connection establishment

    fn incoming_le_advertisement(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::LeAdvertisement { address_type, advertisement_type, data } =
            incoming.payload.clone()
        else {
            return;
        };
        let address = incoming.source;

        if self.le_scan_enable == LeScanEnable::Legacy {
            let rssi = self.next_rssi();
            self.send_event(HciEvent::LeMeta(LeMetaEvent::AdvertisingReport {
                event_type: advertisement_type as u8,
                address_type,
                address,
                data: data.clone(),
                rssi,
            }));
        }

        if self.le_scan_enable == LeScanEnable::Extended {
            let event_type = match advertisement_type {
                AdvertisementType::AdvInd => Some(EXT_ADV_EVENT_TYPE_ADV_IND),
                AdvertisementType::AdvDirectInd => Some(EXT_ADV_EVENT_TYPE_ADV_DIRECT_IND),
                AdvertisementType::AdvScanInd => Some(EXT_ADV_EVENT_TYPE_ADV_SCAN_IND),
                AdvertisementType::AdvNonconnInd => Some(EXT_ADV_EVENT_TYPE_ADV_NONCONN_IND),
                AdvertisementType::ScanResponse => None,
            };
            if let Some(event_type) = event_type {
                let rssi = self.next_rssi();
                self.send_event(HciEvent::LeMeta(LeMetaEvent::ExtendedAdvertisingReport {
                    event_type,
                    address_type,
                    address,
                    data: data.clone(),
                    rssi,
                }));
            }
        }

        // Active scanning
        if self.le_scan_enable != LeScanEnable::None && self.le_scan_type == 1 {
            let scan = LinkLayerPacket::new(
                self.properties.le_address,
                address,
                LinkPayload::LeScan,
            );
            self.send_le_link_layer_packet(scan);
        }

        // Connect when this advertisement matches the armed peer or the
        // connect list
        let connectable = advertisement_type == AdvertisementType::AdvInd
            || advertisement_type == AdvertisementType::AdvDirectInd;
        let armed_match = self.le_connect
            && self.le_peer_address == address
            && self.le_peer_address_type == address_type
            && connectable;
        if armed_match || self.le_connect_list_contains(address, address_type) {
            let peer = AddressWithType::new(address, address_type);
            if !self.connections.create_pending_le(peer) {
                warn!("failed to create a pending connection to {}", peer);
            }
            let own_address = self.le_own_address();
            info!(
                "connecting to {} own_address {} (type {:?})",
                peer, own_address, self.le_address_type
            );
            self.le_connect = false;
            self.le_scan_enable = LeScanEnable::None;

            let connect = LinkLayerPacket::new(
                own_address,
                address,
                LinkPayload::LeConnect {
                    interval_min: self.le_connection_interval_min,
                    interval_max: self.le_connection_interval_max,
                    latency: self.le_connection_latency,
                    supervision_timeout: self.le_connection_supervision_timeout,
                    address_type: self.le_address_type,
                },
            );
            self.send_le_link_layer_packet(connect);
        }
    }

    fn incoming_le_connect(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::LeConnect {
            interval_min,
            interval_max,
            latency,
            supervision_timeout,
            address_type,
        } = incoming.payload
        else {
            return;
        };
        let connection_interval = (interval_min + interval_max) / 2;
        let peer = AddressWithType::new(incoming.source, address_type);
        if !self.connections.create_pending_le(peer) {
            warn!("failed to create a pending connection from {}", peer);
            return;
        }

        let mut my_address = None;
        for advertiser in &self.advertisers {
            let advertiser_address = advertiser.get_address();
            if incoming.destination == advertiser_address.address {
                my_address = Some(advertiser_address);
            }
        }
        let Some(my_address) = my_address else {
            info!("dropping unmatched connection request to {}", incoming.source);
            return;
        };

        self.handle_le_connection(
            peer,
            my_address,
            Role::Slave,
            connection_interval,
            latency,
            supervision_timeout,
        );

        let complete = LinkLayerPacket::new(
            incoming.destination,
            incoming.source,
            LinkPayload::LeConnectComplete {
                interval: connection_interval,
                latency,
                supervision_timeout,
                address_type: my_address.address_type,
            },
        );
        self.send_le_link_layer_packet(complete);
    }

    fn incoming_le_connect_complete(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::LeConnectComplete {
            interval,
            latency,
            supervision_timeout,
            address_type,
        } = incoming.payload
        else {
            return;
        };
        self.handle_le_connection(
            AddressWithType::new(incoming.source, address_type),
            AddressWithType::new(incoming.destination, self.le_address_type),
            Role::Master,
            interval,
            latency,
            supervision_timeout,
        );
    }

    // -------------------------------------------------------------------
    // LE encryption

    fn incoming_le_encrypt_connection(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::LeEncryptConnection { rand, ediv, .. } = incoming.payload else {
            return;
        };
        let peer = incoming.source;
        let handle = self.connections.get_handle_only_address(peer);
        if handle == RESERVED_HANDLE {
            self.log_unknown_peer(peer);
            return;
        }
        self.send_event(HciEvent::LeMeta(LeMetaEvent::LongTermKeyRequest {
            handle,
            rand,
            ediv,
        }));
    }

    fn incoming_le_encrypt_connection_response(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::LeEncryptConnectionResponse { ltk, .. } = incoming.payload else {
            return;
        };
        let handle = self.connections.get_handle_only_address(incoming.source);
        if handle == RESERVED_HANDLE {
            self.log_unknown_peer(incoming.source);
            return;
        }

        // An all-zero key is a rejection
        let status = if ltk == [0u8; 16] {
            ErrorCode::AuthenticationFailure
        } else {
            ErrorCode::Success
        };

        if self.connections.is_encrypted(handle) {
            self.send_event(HciEvent::EncryptionKeyRefreshComplete { status, handle });
        } else {
            self.connections.encrypt(handle);
            self.send_event(HciEvent::EncryptionChange { status, handle, enabled: true });
        }
    }

    // -------------------------------------------------------------------
    // LE scanning

    fn incoming_le_scan(&mut self, incoming: LinkLayerPacket) {
        let mut responses = Vec::new();
        for advertiser in &self.advertisers {
            if let Some(response) =
                advertiser.get_scan_response(incoming.destination, incoming.source)
            {
                responses.push(response);
            }
        }
        for response in responses {
            self.send_le_link_layer_packet(response);
        }
    }

    fn incoming_le_scan_response(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::LeScanResponse { address_type, advertisement_type, data } =
            incoming.payload.clone()
        else {
            return;
        };

        if self.le_scan_enable == LeScanEnable::Legacy {
            if advertisement_type != AdvertisementType::ScanResponse {
                return;
            }
            let rssi = self.next_rssi();
            self.send_event(HciEvent::LeMeta(LeMetaEvent::AdvertisingReport {
                event_type: ADV_EVENT_TYPE_SCAN_RESPONSE,
                address_type,
                address: incoming.source,
                data: data.clone(),
                rssi,
            }));
        }

        if self.le_scan_enable == LeScanEnable::Extended {
            let rssi = self.next_rssi();
            self.send_event(HciEvent::LeMeta(LeMetaEvent::ExtendedAdvertisingReport {
                event_type: EXT_ADV_EVENT_TYPE_SCAN_RESPONSE,
                address_type,
                address: incoming.source,
                data,
                rssi,
            }));
        }
    }

    // -------------------------------------------------------------------
    // Page procedure

    fn incoming_page(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::Page { class_of_device, .. } = incoming.payload else {
            return;
        };
        info!("page from {}", incoming.source);

        if !self
            .connections
            .create_pending(incoming.source, self.properties.authentication_enable)
        {
            warn!("failed to create a pending connection for {}", incoming.source);
        }

        self.send_event(HciEvent::ConnectionRequest {
            address: incoming.source,
            class_of_device,
            link_type: LinkType::Acl,
        });
    }

    fn incoming_page_reject(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::PageReject { reason } = incoming.payload else {
            return;
        };
        info!("page rejected by {}", incoming.source);
        self.send_event(HciEvent::ConnectionComplete {
            status: reason,
            handle: REJECT_HANDLE,
            address: incoming.source,
            link_type: LinkType::Acl,
            encryption_enabled: false,
        });
    }

    fn incoming_page_response(&mut self, incoming: LinkLayerPacket) {
        let peer = incoming.source;
        info!("page response from {}", peer);
        let awaiting_authentication = self.connections.authenticate_pending_connection();
        let handle = self.connections.create_connection(peer, incoming.destination);
        if handle == RESERVED_HANDLE {
            warn!("no free handles");
            return;
        }
        self.send_event(HciEvent::ConnectionComplete {
            status: ErrorCode::Success,
            handle,
            address: peer,
            link_type: LinkType::Acl,
            encryption_enabled: false,
        });

        if awaiting_authentication {
            self.schedule_task(
                Duration::from_millis(5),
                Task::AuthenticationRequest { peer, handle },
            );
        }
    }

    // -------------------------------------------------------------------
    // Remote name, features, version, clock offset

    fn incoming_remote_name_request(&mut self, incoming: LinkLayerPacket) {
        let response = LinkLayerPacket::new(
            incoming.destination,
            incoming.source,
            LinkPayload::RemoteNameRequestResponse { name: self.properties.name.clone() },
        );
        self.send_link_layer_packet(response);
    }

    fn incoming_remote_name_request_response(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::RemoteNameRequestResponse { name } = incoming.payload else {
            return;
        };
        self.send_event(HciEvent::RemoteNameRequestComplete {
            status: ErrorCode::Success,
            address: incoming.source,
            remote_name: name,
        });
    }

    fn incoming_read_remote_lmp_features(&mut self, incoming: LinkLayerPacket) {
        // LMP features are the first extended feature page
        let response = LinkLayerPacket::new(
            incoming.destination,
            incoming.source,
            LinkPayload::ReadRemoteLmpFeaturesResponse {
                features: self.properties.extended_features_page(1),
            },
        );
        self.send_link_layer_packet(response);
    }

    fn incoming_read_remote_lmp_features_response(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::ReadRemoteLmpFeaturesResponse { features } = incoming.payload else {
            return;
        };
        self.send_event(HciEvent::RemoteHostSupportedFeaturesNotification {
            address: incoming.source,
            features,
        });
    }

    fn incoming_read_remote_supported_features(&mut self, incoming: LinkLayerPacket) {
        let response = LinkLayerPacket::new(
            incoming.destination,
            incoming.source,
            LinkPayload::ReadRemoteSupportedFeaturesResponse {
                features: self.properties.supported_features,
            },
        );
        self.send_link_layer_packet(response);
    }

    fn incoming_read_remote_supported_features_response(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::ReadRemoteSupportedFeaturesResponse { features } = incoming.payload
        else {
            return;
        };
        let handle = self.connections.get_handle_only_address(incoming.source);
        if handle == RESERVED_HANDLE {
            self.log_unknown_peer(incoming.source);
            return;
        }
        self.send_event(HciEvent::ReadRemoteSupportedFeaturesComplete {
            status: ErrorCode::Success,
            handle,
            features,
        });
    }

    fn incoming_read_remote_extended_features(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::ReadRemoteExtendedFeatures { page_number } = incoming.payload else {
            return;
        };
        let max_page_number = self.properties.extended_features_max_page();
        let status = if page_number > max_page_number {
            ErrorCode::InvalidLmpOrLlParameters
        } else {
            ErrorCode::Success
        };
        let response = LinkLayerPacket::new(
            incoming.destination,
            incoming.source,
            LinkPayload::ReadRemoteExtendedFeaturesResponse {
                status,
                page_number,
                max_page_number,
                features: self.properties.extended_features_page(page_number),
            },
        );
        self.send_link_layer_packet(response);
    }

    fn incoming_read_remote_extended_features_response(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::ReadRemoteExtendedFeaturesResponse {
            status,
            page_number,
            max_page_number,
            features,
        } = incoming.payload
        else {
            return;
        };
        let handle = self.connections.get_handle_only_address(incoming.source);
        if handle == RESERVED_HANDLE {
            self.log_unknown_peer(incoming.source);
            return;
        }
        self.send_event(HciEvent::ReadRemoteExtendedFeaturesComplete {
            status,
            handle,
            page_number,
            max_page_number,
            features,
        });
    }

    fn incoming_read_remote_version(&mut self, incoming: LinkLayerPacket) {
        let response = LinkLayerPacket::new(
            incoming.destination,
            incoming.source,
            LinkPayload::ReadRemoteVersionInformationResponse {
                lmp_version: self.properties.lmp_version,
                manufacturer_name: self.properties.manufacturer_name,
                lmp_subversion: self.properties.lmp_subversion,
            },
        );
        self.send_link_layer_packet(response);
    }

    fn incoming_read_remote_version_response(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::ReadRemoteVersionInformationResponse {
            lmp_version,
            manufacturer_name,
            lmp_subversion,
        } = incoming.payload
        else {
            return;
        };
        let handle = self.connections.get_handle_only_address(incoming.source);
        if handle == RESERVED_HANDLE {
            self.log_unknown_peer(incoming.source);
            return;
        }
        self.send_event(HciEvent::ReadRemoteVersionInformationComplete {
            status: ErrorCode::Success,
            handle,
            version: lmp_version,
            manufacturer_name,
            subversion: lmp_subversion,
        });
    }

    fn incoming_read_clock_offset(&mut self, incoming: LinkLayerPacket) {
        let response = LinkLayerPacket::new(
            incoming.destination,
            incoming.source,
            LinkPayload::ReadClockOffsetResponse { offset: self.properties.clock_offset },
        );
        self.send_link_layer_packet(response);
    }

    fn incoming_read_clock_offset_response(&mut self, incoming: LinkLayerPacket) {
        let LinkPayload::ReadClockOffsetResponse { offset } = incoming.payload else {
            return;
        };
        let handle = self.connections.get_handle_only_address(incoming.source);
        if handle == RESERVED_HANDLE {
            self.log_unknown_peer(incoming.source);
            return;
        }
        self.send_event(HciEvent::ReadClockOffsetComplete {
            status: ErrorCode::Success,
            handle,
            offset,
        });
    }
}
