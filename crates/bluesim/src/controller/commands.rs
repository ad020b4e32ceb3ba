//! HCI-facing command surface
//!
//! One entry point per tracked HCI command. Every command returns an
//! [`ErrorCode`]; parameter-domain violations report
//! `InvalidHciCommandParameters`, unknown handles `UnknownConnection`, and
//! the unimplemented mode commands a benign `CommandDisallowed`.

use super::security::PairingType;
use super::scheduler::Task;
use super::{LinkLayerController, ResolvingListEntry};
use crate::address::{Address, AddressType, AddressWithType};
use crate::hci::acl::AclDataPacket;
use crate::hci::constants::REJECT_HANDLE;
use crate::hci::event::{HciEvent, LeMetaEvent};
use crate::hci::types::{
    AdvertisingFilterPolicy, ErrorCode, Handle, LegacyAdvertisingProperties,
    LeScanningFilterPolicy, LinkType, OwnAddressType, PeerAddressType, Phy, RESERVED_HANDLE,
};
use crate::link::{AdvertisementType, LinkLayerPacket, LinkPayload};
use log::{error, info, warn};
use std::time::Duration;

/// LE address reserved as "never configured"
const UNSET_LE_ADDRESS: Address = Address { bytes: [0x1E, 0xD0, 0xBA, 0xBB, 0xBB, 0xBB] };

/// Fixed numeric value shown to the user for confirmation pairing
const CONFIRMATION_VALUE: u32 = 123_456;

/// Placeholder link key written when a pairing confirms
const PLACEHOLDER_KEY: [u8; 16] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];

/// Commands relayed to a remote controller over the link layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    RemoteNameRequest,
    ReadRemoteSupportedFeatures,
    ReadRemoteExtendedFeatures { page_number: u8 },
    ReadRemoteVersionInformation,
    ReadClockOffset,
}

/// One set enabled or disabled by Set LE Extended Advertising Enable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledSet {
    pub advertising_handle: u8,
    /// Advertising duration in 10 ms units; zero means unlimited
    pub duration: u16,
}

impl LinkLayerController {
    // -------------------------------------------------------------------
    // Remote queries

    pub fn send_command_to_remote_by_address(
        &mut self,
        command: RemoteCommand,
        remote: Address,
    ) -> ErrorCode {
        let local_address = self.properties.address;
        match command {
            RemoteCommand::RemoteNameRequest => {
                // LMP features get requested alongside remote names
                self.send_link_layer_packet(LinkLayerPacket::new(
                    local_address,
                    remote,
                    LinkPayload::ReadRemoteLmpFeatures,
                ));
                self.send_link_layer_packet(LinkLayerPacket::new(
                    local_address,
                    remote,
                    LinkPayload::RemoteNameRequest,
                ));
            }
            RemoteCommand::ReadRemoteSupportedFeatures => {
                self.send_link_layer_packet(LinkLayerPacket::new(
                    local_address,
                    remote,
                    LinkPayload::ReadRemoteSupportedFeatures,
                ));
            }
            RemoteCommand::ReadRemoteExtendedFeatures { page_number } => {
                self.send_link_layer_packet(LinkLayerPacket::new(
                    local_address,
                    remote,
                    LinkPayload::ReadRemoteExtendedFeatures { page_number },
                ));
            }
            RemoteCommand::ReadRemoteVersionInformation => {
                self.send_link_layer_packet(LinkLayerPacket::new(
                    local_address,
                    remote,
                    LinkPayload::ReadRemoteVersionInformation,
                ));
            }
            RemoteCommand::ReadClockOffset => {
                self.send_link_layer_packet(LinkLayerPacket::new(
                    local_address,
                    remote,
                    LinkPayload::ReadClockOffset,
                ));
            }
        }
        ErrorCode::Success
    }

    pub fn send_command_to_remote_by_handle(
        &mut self,
        command: RemoteCommand,
        handle: Handle,
    ) -> ErrorCode {
        let Some(remote) = self.connections.get_address(handle) else {
            return ErrorCode::UnknownConnection;
        };
        self.send_command_to_remote_by_address(command, remote.address)
    }

    // -------------------------------------------------------------------
    // ACL forwarding

    pub fn send_acl_to_remote(&mut self, acl: AclDataPacket) -> ErrorCode {
        let handle = acl.handle;
        let (Some(my_address), Some(destination), Some(phy)) = (
            self.connections.get_own_address(handle),
            self.connections.get_address(handle),
            self.connections.get_phy(handle),
        ) else {
            return ErrorCode::UnknownConnection;
        };

        self.schedule_task(Duration::from_millis(1), Task::NotifyCompletedPackets { handle });

        let packet = LinkLayerPacket::new(
            my_address.address,
            destination.address,
            LinkPayload::Acl { data: acl.to_bytes() },
        );
        match phy {
            Phy::BrEdr => self.send_link_layer_packet(packet),
            Phy::LowEnergy => self.send_le_link_layer_packet(packet),
        }
        ErrorCode::Success
    }

    // -------------------------------------------------------------------
    // Authentication and simple pairing

    pub fn authentication_requested(&mut self, handle: Handle) -> ErrorCode {
        let Some(remote) = self.connections.get_address(handle) else {
            info!("authentication requested for unknown handle {:04x}", handle);
            return ErrorCode::UnknownConnection;
        };
        self.schedule_task(
            Duration::from_millis(5),
            Task::AuthenticationRequest { peer: remote.address, handle },
        );
        ErrorCode::Success
    }

    pub(super) fn handle_authentication_request(&mut self, peer: Address, handle: Handle) {
        if self.simple_pairing_mode_enabled {
            self.security_manager.authentication_request(peer, handle);
            self.send_event(HciEvent::LinkKeyRequest { address: peer });
        } else {
            self.send_event(HciEvent::AuthenticationComplete {
                status: ErrorCode::AuthenticationFailure,
                handle,
            });
        }
    }

    pub(super) fn start_simple_pairing(&mut self, peer: Address) {
        // IO capability exchange comes first; key generation and the
        // authentication stages follow from the host replies
        self.send_event(HciEvent::IoCapabilityRequest { address: peer });
    }

    pub(super) fn authenticate_remote_stage1(&mut self, peer: Address, pairing_type: PairingType) {
        if self.security_manager.get_authentication_address() != Some(peer) {
            warn!("stage 1 for {} without an active authentication", peer);
            return;
        }
        match pairing_type {
            PairingType::AutoConfirmation
            | PairingType::ConfirmYN
            | PairingType::DisplayPin
            | PairingType::DisplayAndConfirm => {
                self.send_event(HciEvent::UserConfirmationRequest {
                    address: peer,
                    numeric_value: CONFIRMATION_VALUE,
                });
            }
            PairingType::InputPin => {
                self.send_event(HciEvent::UserPasskeyRequest { address: peer });
            }
            PairingType::Invalid => warn!("invalid pairing type for {}", peer),
        }
    }

    pub(super) fn authenticate_remote_stage2(&mut self, peer: Address) {
        if self.security_manager.get_authentication_address() != Some(peer) {
            warn!("stage 2 for {} without an active authentication", peer);
            return;
        }
        let handle = self.security_manager.get_authentication_handle();
        self.send_event(HciEvent::AuthenticationComplete {
            status: ErrorCode::Success,
            handle,
        });
    }

    pub fn link_key_request_reply(&mut self, peer: Address, key: [u8; 16]) -> ErrorCode {
        self.security_manager.write_key(peer, key);
        self.security_manager.authentication_request_finished();
        self.schedule_task(Duration::from_millis(5), Task::PairingStage2 { peer });
        ErrorCode::Success
    }

    pub fn link_key_request_negative_reply(&mut self, peer: Address) -> ErrorCode {
        self.security_manager.delete_key(peer);
        // No stored key, so run simple pairing to make one
        let handle = self.connections.get_handle_only_address(peer);
        if handle == RESERVED_HANDLE {
            info!("device not connected {}", peer);
            return ErrorCode::UnknownConnection;
        }
        self.security_manager.authentication_request(peer, handle);
        self.schedule_task(Duration::from_millis(5), Task::StartSimplePairing { peer });
        ErrorCode::Success
    }

    pub fn io_capability_request_reply(
        &mut self,
        peer: Address,
        io_capability: u8,
        oob_data_present: u8,
        authentication_requirements: u8,
    ) -> ErrorCode {
        self.security_manager.set_local_io_capability(
            peer,
            io_capability,
            oob_data_present,
            authentication_requirements,
        );

        let pairing_type = self.security_manager.get_simple_pairing_type();
        if pairing_type != PairingType::Invalid {
            self.schedule_task(
                Duration::from_millis(5),
                Task::PairingStage1 { peer, pairing_type },
            );
            self.send_link_layer_packet(LinkLayerPacket::new(
                self.properties.address,
                peer,
                LinkPayload::IoCapabilityResponse {
                    io_capability,
                    oob_data_present,
                    authentication_requirements,
                },
            ));
        } else {
            info!("requesting remote capability");
            self.send_link_layer_packet(LinkLayerPacket::new(
                self.properties.address,
                peer,
                LinkPayload::IoCapabilityRequest {
                    io_capability,
                    oob_data_present,
                    authentication_requirements,
                },
            ));
        }
        ErrorCode::Success
    }

    pub fn io_capability_request_negative_reply(
        &mut self,
        peer: Address,
        reason: ErrorCode,
    ) -> ErrorCode {
        if self.security_manager.get_authentication_address() != Some(peer) {
            return ErrorCode::AuthenticationFailure;
        }
        self.security_manager.invalidate_io_capabilities();
        self.send_link_layer_packet(LinkLayerPacket::new(
            self.properties.address,
            peer,
            LinkPayload::IoCapabilityNegativeResponse { reason },
        ));
        ErrorCode::Success
    }

    pub fn user_confirmation_request_reply(&mut self, peer: Address) -> ErrorCode {
        if self.security_manager.get_authentication_address() != Some(peer) {
            return ErrorCode::AuthenticationFailure;
        }
        self.security_manager.write_key(peer, PLACEHOLDER_KEY);
        self.security_manager.authentication_request_finished();

        self.schedule_task(
            Duration::from_millis(5),
            Task::SimplePairingComplete { peer, status: ErrorCode::Success },
        );
        self.schedule_task(
            Duration::from_millis(5),
            Task::LinkKeyNotification { peer, key: PLACEHOLDER_KEY },
        );
        self.schedule_task(Duration::from_millis(15), Task::PairingStage2 { peer });
        ErrorCode::Success
    }

    pub fn user_confirmation_request_negative_reply(&mut self, peer: Address) -> ErrorCode {
        if self.security_manager.get_authentication_address() != Some(peer) {
            return ErrorCode::AuthenticationFailure;
        }
        self.schedule_task(
            Duration::from_millis(5),
            Task::SimplePairingComplete { peer, status: ErrorCode::AuthenticationFailure },
        );
        ErrorCode::Success
    }

    pub fn user_passkey_request_reply(&mut self, peer: Address, numeric_value: u32) -> ErrorCode {
        if self.security_manager.get_authentication_address() != Some(peer) {
            return ErrorCode::AuthenticationFailure;
        }
        info!("passkey {:06} accepted for {}", numeric_value, peer);
        ErrorCode::Success
    }

    pub fn user_passkey_request_negative_reply(&mut self, peer: Address) -> ErrorCode {
        if self.security_manager.get_authentication_address() != Some(peer) {
            return ErrorCode::AuthenticationFailure;
        }
        ErrorCode::Success
    }

    pub fn remote_oob_data_request_reply(
        &mut self,
        peer: Address,
        _c: [u8; 16],
        _r: [u8; 16],
    ) -> ErrorCode {
        if self.security_manager.get_authentication_address() != Some(peer) {
            return ErrorCode::AuthenticationFailure;
        }
        ErrorCode::Success
    }

    pub fn remote_oob_data_request_negative_reply(&mut self, peer: Address) -> ErrorCode {
        if self.security_manager.get_authentication_address() != Some(peer) {
            return ErrorCode::AuthenticationFailure;
        }
        ErrorCode::Success
    }

    // -------------------------------------------------------------------
    // BR/EDR encryption

    pub fn set_connection_encryption(
        &mut self,
        handle: Handle,
        encryption_enable: u8,
    ) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            info!("set connection encryption for unknown handle {:04x}", handle);
            return ErrorCode::UnknownConnection;
        }
        if self.connections.is_encrypted(handle) && encryption_enable == 0 {
            return ErrorCode::EncryptionModeNotAcceptable;
        }
        let Some(remote) = self.connections.get_address(handle) else {
            return ErrorCode::UnknownConnection;
        };
        if self.security_manager.read_key(remote.address) == 0 {
            return ErrorCode::PinOrKeyMissing;
        }

        self.schedule_task(
            Duration::from_millis(5),
            Task::SetConnectionEncryption {
                peer: remote.address,
                handle,
                encryption_enable,
            },
        );
        ErrorCode::Success
    }

    pub(super) fn handle_set_connection_encryption(
        &mut self,
        peer: Address,
        handle: Handle,
        encryption_enable: u8,
    ) {
        if self.connections.is_encrypted(handle) && encryption_enable != 0 {
            self.send_event(HciEvent::EncryptionChange {
                status: ErrorCode::Success,
                handle,
                enabled: encryption_enable != 0,
            });
            return;
        }
        let Some(key) = self.security_manager.get_key(peer) else {
            error!("no key stored for {}", peer);
            return;
        };
        self.send_link_layer_packet(LinkLayerPacket::new(
            self.properties.address,
            peer,
            LinkPayload::EncryptConnection { key },
        ));
    }

    // -------------------------------------------------------------------
    // BR/EDR connection establishment

    pub fn accept_connection_request(
        &mut self,
        addr: Address,
        try_role_switch: bool,
    ) -> ErrorCode {
        if !self.connections.has_pending(addr) {
            info!("no pending connection for {}", addr);
            return ErrorCode::UnknownConnection;
        }
        self.schedule_task(
            Duration::from_millis(200),
            Task::CompletePageAccept { peer: addr, try_role_switch },
        );
        ErrorCode::Success
    }

    pub(super) fn make_slave_connection(&mut self, addr: Address, try_role_switch: bool) {
        info!("sending page response to {}", addr);
        self.send_link_layer_packet(LinkLayerPacket::new(
            self.properties.address,
            addr,
            LinkPayload::PageResponse { try_role_switch },
        ));

        let handle = self.connections.create_connection(addr, self.properties.address);
        if handle == RESERVED_HANDLE {
            info!("failed to create a connection for {}", addr);
            return;
        }
        self.send_event(HciEvent::ConnectionComplete {
            status: ErrorCode::Success,
            handle,
            address: addr,
            link_type: LinkType::Acl,
            encryption_enabled: false,
        });
    }

    pub fn reject_connection_request(&mut self, addr: Address, reason: ErrorCode) -> ErrorCode {
        if !self.connections.has_pending(addr) {
            info!("no pending connection for {}", addr);
            return ErrorCode::UnknownConnection;
        }
        self.schedule_task(
            Duration::from_millis(200),
            Task::CompletePageReject { peer: addr, reason },
        );
        ErrorCode::Success
    }

    pub(super) fn reject_slave_connection(&mut self, addr: Address, reason: ErrorCode) {
        info!("sending page reject to {} (reason {})", addr, reason);
        self.connections.cancel_pending(addr);
        self.send_link_layer_packet(LinkLayerPacket::new(
            self.properties.address,
            addr,
            LinkPayload::PageReject { reason },
        ));
        self.send_event(HciEvent::ConnectionComplete {
            status: reason,
            handle: REJECT_HANDLE,
            address: addr,
            link_type: LinkType::Acl,
            encryption_enabled: false,
        });
    }

    pub fn create_connection(&mut self, addr: Address, allow_role_switch: bool) -> ErrorCode {
        if !self
            .connections
            .create_pending(addr, self.properties.authentication_enable)
        {
            return ErrorCode::ControllerBusy;
        }
        self.send_link_layer_packet(LinkLayerPacket::new(
            self.properties.address,
            addr,
            LinkPayload::Page {
                class_of_device: self.properties.class_of_device,
                allow_role_switch,
            },
        ));
        ErrorCode::Success
    }

    pub fn create_connection_cancel(&mut self, addr: Address) -> ErrorCode {
        if !self.connections.cancel_pending(addr) {
            return ErrorCode::UnknownConnection;
        }
        ErrorCode::Success
    }

    pub fn disconnect(&mut self, handle: Handle, reason: ErrorCode) -> ErrorCode {
        let Some(remote) = self.connections.get_address(handle) else {
            return ErrorCode::UnknownConnection;
        };
        let phy = self.connections.get_phy(handle).unwrap_or(Phy::BrEdr);
        let packet = LinkLayerPacket::new(
            self.properties.address,
            remote.address,
            LinkPayload::Disconnect { reason },
        );
        match phy {
            Phy::BrEdr => self.send_link_layer_packet(packet),
            Phy::LowEnergy => self.send_le_link_layer_packet(packet),
        }
        assert!(self.connections.disconnect(handle), "disconnecting {handle:#x}");

        self.schedule_task(
            Duration::from_millis(20),
            Task::DisconnectCleanup {
                handle,
                reason: ErrorCode::ConnectionTerminatedByLocalHost,
            },
        );
        ErrorCode::Success
    }

    pub fn change_connection_packet_type(
        &mut self,
        handle: Handle,
        packet_types: u16,
    ) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            return ErrorCode::UnknownConnection;
        }
        self.schedule_task(
            Duration::from_millis(20),
            Task::PacketTypeChanged { handle, packet_types },
        );
        ErrorCode::Success
    }

    // -------------------------------------------------------------------
    // Link policy and the unimplemented mode commands

    pub fn change_connection_link_key(&mut self, handle: Handle) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            return ErrorCode::UnknownConnection;
        }
        ErrorCode::CommandDisallowed
    }

    pub fn master_link_key(&mut self, _key_flag: u8) -> ErrorCode {
        ErrorCode::CommandDisallowed
    }

    pub fn hold_mode(
        &mut self,
        handle: Handle,
        hold_mode_max_interval: u16,
        hold_mode_min_interval: u16,
    ) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            return ErrorCode::UnknownConnection;
        }
        if hold_mode_max_interval < hold_mode_min_interval {
            return ErrorCode::InvalidHciCommandParameters;
        }
        ErrorCode::CommandDisallowed
    }

    pub fn sniff_mode(
        &mut self,
        handle: Handle,
        sniff_max_interval: u16,
        sniff_min_interval: u16,
        sniff_attempt: u16,
        sniff_timeout: u16,
    ) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            return ErrorCode::UnknownConnection;
        }
        if sniff_max_interval < sniff_min_interval
            || sniff_attempt < 0x0001
            || sniff_attempt > 0x7FFF
            || sniff_timeout > 0x7FFF
        {
            return ErrorCode::InvalidHciCommandParameters;
        }
        ErrorCode::CommandDisallowed
    }

    pub fn exit_sniff_mode(&mut self, handle: Handle) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            return ErrorCode::UnknownConnection;
        }
        ErrorCode::CommandDisallowed
    }

    pub fn qos_setup(&mut self, handle: Handle, service_type: u8) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            return ErrorCode::UnknownConnection;
        }
        if service_type > 0x02 {
            return ErrorCode::InvalidHciCommandParameters;
        }
        ErrorCode::CommandDisallowed
    }

    pub fn switch_role(&mut self, _bd_addr: Address, _role: u8) -> ErrorCode {
        ErrorCode::CommandDisallowed
    }

    pub fn flow_specification(
        &mut self,
        handle: Handle,
        flow_direction: u8,
        service_type: u8,
    ) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            return ErrorCode::UnknownConnection;
        }
        if flow_direction > 0x01 || service_type > 0x02 {
            return ErrorCode::InvalidHciCommandParameters;
        }
        ErrorCode::CommandDisallowed
    }

    pub fn write_link_policy_settings(&mut self, handle: Handle, _settings: u16) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            return ErrorCode::UnknownConnection;
        }
        ErrorCode::Success
    }

    pub fn write_default_link_policy_settings(&mut self, settings: u16) -> ErrorCode {
        // Sniff + hold + role switch
        if settings > 7 {
            return ErrorCode::InvalidHciCommandParameters;
        }
        self.default_link_policy_settings = settings;
        ErrorCode::Success
    }

    pub fn read_default_link_policy_settings(&self) -> u16 {
        self.default_link_policy_settings
    }

    pub fn write_link_supervision_timeout(
        &mut self,
        handle: Handle,
        _timeout: u16,
    ) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            return ErrorCode::UnknownConnection;
        }
        ErrorCode::Success
    }

    // -------------------------------------------------------------------
    // LE advertising

    pub fn set_le_advertising_enable(&mut self, le_advertising_enable: u8) -> ErrorCode {
        if self.advertisers.is_empty() {
            return ErrorCode::CommandDisallowed;
        }
        if le_advertising_enable == 0 {
            self.advertisers[0].disable();
            return ErrorCode::Success;
        }

        let mut own_address = self.properties.address;
        let own_address_type = self.properties.le_advertising_own_address_type;
        if own_address_type == AddressType::Random
            || own_address_type == AddressType::RandomIdentity
        {
            if self.properties.le_address == UNSET_LE_ADDRESS
                || self.properties.le_address == Address::EMPTY
            {
                return ErrorCode::InvalidHciCommandParameters;
            }
            own_address = self.properties.le_address;
        }

        let interval = advertising_interval(
            self.properties.le_advertising_interval_min,
            self.properties.le_advertising_interval_max,
        );
        if interval < Duration::from_millis(20) {
            return ErrorCode::InvalidHciCommandParameters;
        }

        let peer = AddressWithType::new(
            self.properties.le_advertising_peer_address,
            self.properties.le_advertising_peer_address_type,
        );
        self.advertisers[0].initialize(
            AddressWithType::new(own_address, own_address_type),
            peer,
            self.properties.le_advertising_filter_policy,
            self.properties.le_advertisement_type,
            self.properties.le_advertisement.clone(),
            self.properties.le_scan_response.clone(),
            interval,
        );
        self.advertisers[0].enable();
        ErrorCode::Success
    }

    pub fn set_le_extended_address(&mut self, set: u8, address: Address) -> ErrorCode {
        let Some(advertiser) = self.advertisers.get_mut(set as usize) else {
            return ErrorCode::InvalidHciCommandParameters;
        };
        advertiser.set_address(address);
        ErrorCode::Success
    }

    pub fn set_le_extended_advertising_data(&mut self, set: u8, data: Vec<u8>) -> ErrorCode {
        let Some(advertiser) = self.advertisers.get_mut(set as usize) else {
            return ErrorCode::InvalidHciCommandParameters;
        };
        advertiser.set_data(data);
        ErrorCode::Success
    }

    /// Extended advertising parameters, mapped onto the legacy PDU model
    pub fn set_le_extended_advertising_parameters(
        &mut self,
        set: u8,
        interval_min: u16,
        interval_max: u16,
        advertising_type: LegacyAdvertisingProperties,
        own_address_type: OwnAddressType,
        peer_address_type: PeerAddressType,
        mut peer: Address,
        filter_policy: AdvertisingFilterPolicy,
    ) -> ErrorCode {
        if self.advertisers.get(set as usize).is_none() {
            return ErrorCode::InvalidHciCommandParameters;
        }

        let ad_type = match advertising_type {
            LegacyAdvertisingProperties::AdvInd => {
                peer = Address::EMPTY;
                AdvertisementType::AdvInd
            }
            LegacyAdvertisingProperties::AdvNonconnInd => {
                peer = Address::EMPTY;
                AdvertisementType::AdvNonconnInd
            }
            LegacyAdvertisingProperties::AdvScanInd => {
                peer = Address::EMPTY;
                AdvertisementType::AdvScanInd
            }
            LegacyAdvertisingProperties::AdvDirectIndHigh
            | LegacyAdvertisingProperties::AdvDirectIndLow => AdvertisementType::AdvDirectInd,
        };

        let peer_address = match peer_address_type {
            PeerAddressType::PublicDeviceOrIdentity => {
                AddressWithType::new(peer, AddressType::Public)
            }
            PeerAddressType::RandomDeviceOrIdentity => {
                AddressWithType::new(peer, AddressType::Random)
            }
        };

        // Resolvable variants map to the identity address types
        let own_address_address_type = match own_address_type {
            OwnAddressType::Public => AddressType::Public,
            OwnAddressType::Random => AddressType::Random,
            OwnAddressType::ResolvableOrPublic => AddressType::PublicIdentity,
            OwnAddressType::ResolvableOrRandom => AddressType::RandomIdentity,
        };

        let scanning_filter_policy = match filter_policy {
            AdvertisingFilterPolicy::AllDevices => LeScanningFilterPolicy::AcceptAll,
            AdvertisingFilterPolicy::ListedScan => LeScanningFilterPolicy::ConnectListOnly,
            AdvertisingFilterPolicy::ListedConnect => {
                LeScanningFilterPolicy::CheckInitiatorsIdentity
            }
            AdvertisingFilterPolicy::ListedScanAndConnect => {
                LeScanningFilterPolicy::ConnectListAndInitiatorsIdentity
            }
        };

        self.advertisers[set as usize].initialize_extended(
            own_address_address_type,
            peer_address,
            scanning_filter_policy,
            ad_type,
            advertising_interval(interval_min, interval_max),
        );
        ErrorCode::Success
    }

    pub fn set_le_extended_advertising_enable(
        &mut self,
        enable: bool,
        enabled_sets: &[EnabledSet],
    ) -> ErrorCode {
        for set in enabled_sets {
            if set.advertising_handle as usize >= self.advertisers.len() {
                return ErrorCode::InvalidHciCommandParameters;
            }
        }
        let now = self.now;
        for set in enabled_sets {
            let advertiser = &mut self.advertisers[set.advertising_handle as usize];
            if enable {
                advertiser
                    .enable_extended(now, Duration::from_millis(10 * u64::from(set.duration)));
            } else {
                advertiser.disable();
            }
        }
        ErrorCode::Success
    }

    pub fn le_remove_advertising_set(&mut self, set: u8) -> ErrorCode {
        let Some(advertiser) = self.advertisers.get_mut(set as usize) else {
            return ErrorCode::InvalidHciCommandParameters;
        };
        advertiser.disable();
        ErrorCode::Success
    }

    pub fn le_clear_advertising_sets(&mut self) -> ErrorCode {
        if self.advertisers.iter().any(|advertiser| advertiser.is_enabled()) {
            return ErrorCode::CommandDisallowed;
        }
        for advertiser in &mut self.advertisers {
            advertiser.clear();
        }
        ErrorCode::Success
    }

    // -------------------------------------------------------------------
    // LE encryption

    pub fn le_enable_encryption(
        &mut self,
        handle: Handle,
        rand: [u8; 8],
        ediv: u16,
        ltk: [u8; 16],
    ) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            info!("unknown handle {:04x}", handle);
            return ErrorCode::UnknownConnection;
        }
        self.schedule_task(
            Duration::from_millis(5),
            Task::LeEnableEncryption { handle, rand, ediv, ltk },
        );
        ErrorCode::Success
    }

    pub(super) fn handle_le_enable_encryption(
        &mut self,
        handle: Handle,
        rand: [u8; 8],
        ediv: u16,
        ltk: [u8; 16],
    ) {
        let (Some(own), Some(remote)) = (
            self.connections.get_own_address(handle),
            self.connections.get_address(handle),
        ) else {
            return;
        };
        self.send_le_link_layer_packet(LinkLayerPacket::new(
            own.address,
            remote.address,
            LinkPayload::LeEncryptConnection { rand, ediv, ltk },
        ));
    }

    pub fn le_long_term_key_request_reply(
        &mut self,
        handle: Handle,
        ltk: [u8; 16],
    ) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            info!("unknown handle {:04x}", handle);
            return ErrorCode::UnknownConnection;
        }

        if self.connections.is_encrypted(handle) {
            self.send_event(HciEvent::EncryptionKeyRefreshComplete {
                status: ErrorCode::Success,
                handle,
            });
        } else {
            self.connections.encrypt(handle);
            self.send_event(HciEvent::EncryptionChange {
                status: ErrorCode::Success,
                handle,
                enabled: true,
            });
        }
        self.send_le_encrypt_connection_response(handle, ltk);
        ErrorCode::Success
    }

    pub fn le_long_term_key_request_negative_reply(&mut self, handle: Handle) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            info!("unknown handle {:04x}", handle);
            return ErrorCode::UnknownConnection;
        }
        // A zero key signals the rejection to the peer
        self.send_le_encrypt_connection_response(handle, [0u8; 16]);
        ErrorCode::Success
    }

    fn send_le_encrypt_connection_response(&mut self, handle: Handle, ltk: [u8; 16]) {
        let (Some(own), Some(remote)) = (
            self.connections.get_own_address(handle),
            self.connections.get_address(handle),
        ) else {
            return;
        };
        self.send_le_link_layer_packet(LinkLayerPacket::new(
            own.address,
            remote.address,
            LinkPayload::LeEncryptConnectionResponse { rand: [0u8; 8], ediv: 0, ltk },
        ));
    }

    // -------------------------------------------------------------------
    // LE connection update

    pub fn le_connection_update(
        &mut self,
        handle: Handle,
        interval_min: u16,
        interval_max: u16,
        latency: u16,
        supervision_timeout: u16,
    ) -> ErrorCode {
        if !self.connections.has_handle(handle) {
            return ErrorCode::UnknownConnection;
        }
        // This could negotiate with the remote device in the future
        self.schedule_task(
            Duration::from_millis(25),
            Task::LeConnectionUpdateComplete {
                handle,
                interval_min,
                interval_max,
                latency,
                supervision_timeout,
            },
        );
        ErrorCode::Success
    }

    pub(super) fn le_connection_update_complete(
        &mut self,
        handle: Handle,
        interval_min: u16,
        interval_max: u16,
        latency: u16,
        supervision_timeout: u16,
    ) {
        let mut status = ErrorCode::Success;
        if !self.connections.has_handle(handle) {
            status = ErrorCode::UnknownConnection;
        }
        // The supervision timeout in milliseconds (*10) must exceed
        // (1 + latency) * interval_max (*1.25) * 2
        if interval_min < 6
            || interval_max > 0xC80
            || interval_min > interval_max
            || latency > 0x1F3
            || supervision_timeout < 0xA
            || supervision_timeout > 0xC80
            || u32::from(supervision_timeout)
                <= (1 + u32::from(latency)) * u32::from(interval_max) / 4
        {
            status = ErrorCode::InvalidHciCommandParameters;
        }
        let interval = (interval_min + interval_max) / 2;
        self.send_event(HciEvent::LeMeta(LeMetaEvent::ConnectionUpdateComplete {
            status,
            handle,
            connection_interval: interval,
            connection_latency: latency,
            supervision_timeout,
        }));
    }

    // -------------------------------------------------------------------
    // LE connect and resolving lists

    pub fn le_connect_list_clear(&mut self) {
        self.le_connect_list.clear();
    }

    pub fn le_connect_list_add_device(&mut self, addr: Address, addr_type: AddressType) {
        if !self.le_connect_list.contains(&(addr, addr_type)) {
            self.le_connect_list.push((addr, addr_type));
        }
    }

    pub fn le_connect_list_remove_device(&mut self, addr: Address, addr_type: AddressType) {
        self.le_connect_list.retain(|entry| *entry != (addr, addr_type));
    }

    pub fn le_connect_list_full(&self) -> bool {
        self.le_connect_list.len() >= self.properties.le_connect_list_size
    }

    pub fn le_resolving_list_clear(&mut self) {
        self.le_resolving_list.clear();
    }

    pub fn le_resolving_list_add_device(
        &mut self,
        addr: Address,
        addr_type: AddressType,
        peer_irk: [u8; 16],
        local_irk: [u8; 16],
    ) {
        let entry = ResolvingListEntry { address: addr, address_type: addr_type, peer_irk, local_irk };
        for existing in &mut self.le_resolving_list {
            if existing.address == addr && existing.address_type == addr_type {
                *existing = entry;
                return;
            }
        }
        self.le_resolving_list.push(entry);
    }

    pub fn le_resolving_list_remove_device(&mut self, addr: Address, addr_type: AddressType) {
        self.le_resolving_list
            .retain(|entry| !(entry.address == addr && entry.address_type == addr_type));
    }

    pub fn le_resolving_list_contains_device(
        &self,
        addr: Address,
        addr_type: AddressType,
    ) -> bool {
        self.le_resolving_list
            .iter()
            .any(|entry| entry.address == addr && entry.address_type == addr_type)
    }

    pub fn le_resolving_list_full(&self) -> bool {
        self.le_resolving_list.len() >= self.properties.le_resolving_list_size
    }

    /// Privacy mode is tracked nowhere; the command only acknowledges
    pub fn le_set_privacy_mode(&mut self, address_type: AddressType, addr: Address, mode: u8) {
        info!("privacy mode {} for {} (type {:?})", mode, addr, address_type);
    }
}

/// Advertising interval from min/max slot counts (0.625 ms units)
fn advertising_interval(interval_min: u16, interval_max: u16) -> Duration {
    Duration::from_micros((u64::from(interval_min) + u64::from(interval_max)) * 625 / 2)
}
