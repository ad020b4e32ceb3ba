//! Simulated link-layer controller
//!
//! The controller terminates host-side commands and exchanges link-layer
//! packets with peer controllers over a virtual radio. It is a single
//! logical actor: inbound packets, host commands, and timer callbacks are
//! serialized by the owning event loop, and all deferred work travels
//! through the task scheduler as data.

pub mod advertiser;
mod commands;
pub mod connections;
mod incoming;
pub mod properties;
pub mod scheduler;
pub mod security;


pub use commands::{EnabledSet, RemoteCommand};

use crate::address::{Address, AddressType, AddressWithType};
use crate::hci::event::HciEvent;
use crate::hci::types::{ErrorCode, Phy};
use crate::link::{InquiryType, LinkLayerPacket, LinkPayload};
use advertiser::LeAdvertiser;
use connections::AclConnections;
use log::{info, warn};
use properties::DeviceProperties;
use scheduler::{Task, TaskId, TaskScheduler};
use security::SecurityManager;
use std::time::Duration;

/// Delay before a link-layer packet reaches the radio
const TRANSMIT_DELAY: Duration = Duration::from_millis(50);
/// Minimum spacing between inquiry emissions
const INQUIRY_PERIOD: Duration = Duration::from_millis(2000);

/// Outbound channels of the controller: events and data toward the host,
/// link-layer packets toward the radio.
pub trait OutboundChannel {
    fn send_event(&mut self, event: HciEvent);
    fn send_acl(&mut self, packet: crate::hci::AclDataPacket);
    fn send_sco(&mut self, packet: Vec<u8>);
    fn send_iso(&mut self, packet: Vec<u8>);
    fn send_to_remote(&mut self, packet: LinkLayerPacket, phy: Phy);
}

/// Which scan-enable command armed LE scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeScanEnable {
    None,
    Legacy,
    Extended,
}

/// One entry of the LE resolving list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvingListEntry {
    pub address: Address,
    pub address_type: AddressType,
    pub peer_irk: [u8; 16],
    pub local_irk: [u8; 16],
}

/// The protocol state machine of one simulated controller
pub struct LinkLayerController {
    properties: DeviceProperties,
    connections: AclConnections,
    security_manager: SecurityManager,
    advertisers: Vec<LeAdvertiser>,
    le_connect_list: Vec<(Address, AddressType)>,
    le_resolving_list: Vec<ResolvingListEntry>,
    outbound: Box<dyn OutboundChannel>,
    scheduler: Option<Box<dyn TaskScheduler>>,

    inquiry_scans_enabled: bool,
    page_scans_enabled: bool,
    simple_pairing_mode_enabled: bool,
    inquiry_mode: InquiryType,
    inquiry_timer_task_id: TaskId,
    last_inquiry: Option<Duration>,

    le_scan_enable: LeScanEnable,
    le_scan_type: u8,
    le_connect: bool,
    le_peer_address: Address,
    le_peer_address_type: AddressType,
    le_address_type: AddressType,
    le_connection_interval_min: u16,
    le_connection_interval_max: u16,
    le_connection_latency: u16,
    le_connection_supervision_timeout: u16,

    default_link_policy_settings: u16,
    rssi: u8,
    now: Duration,
}

impl LinkLayerController {
    pub fn new(properties: DeviceProperties, outbound: Box<dyn OutboundChannel>) -> Self {
        let advertisers = vec![LeAdvertiser::new(); properties.le_advertising_sets];
        Self {
            properties,
            connections: AclConnections::new(),
            security_manager: SecurityManager::new(),
            advertisers,
            le_connect_list: Vec::new(),
            le_resolving_list: Vec::new(),
            outbound,
            scheduler: None,
            inquiry_scans_enabled: false,
            page_scans_enabled: false,
            simple_pairing_mode_enabled: false,
            inquiry_mode: InquiryType::Standard,
            inquiry_timer_task_id: TaskId::INVALID,
            last_inquiry: None,
            le_scan_enable: LeScanEnable::None,
            le_scan_type: 0,
            le_connect: false,
            le_peer_address: Address::EMPTY,
            le_peer_address_type: AddressType::Public,
            le_address_type: AddressType::Public,
            le_connection_interval_min: 0,
            le_connection_interval_max: 0,
            le_connection_latency: 0,
            le_connection_supervision_timeout: 0,
            default_link_policy_settings: 0,
            rssi: 0,
            now: Duration::ZERO,
        }
    }

    pub fn register_task_scheduler(&mut self, scheduler: Box<dyn TaskScheduler>) {
        self.scheduler = Some(scheduler);
    }

    pub fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut DeviceProperties {
        &mut self.properties
    }

    // -------------------------------------------------------------------
    // Outbound plumbing

    pub(crate) fn send_event(&mut self, event: HciEvent) {
        self.outbound.send_event(event);
    }

    pub(crate) fn send_acl(&mut self, packet: crate::hci::AclDataPacket) {
        self.outbound.send_acl(packet);
    }

    /// Queue a packet for the BR/EDR radio
    pub(crate) fn send_link_layer_packet(&mut self, packet: LinkLayerPacket) {
        self.schedule_task(TRANSMIT_DELAY, Task::Transmit { packet, phy: Phy::BrEdr });
    }

    /// Queue a packet for the LE radio
    pub(crate) fn send_le_link_layer_packet(&mut self, packet: LinkLayerPacket) {
        self.schedule_task(TRANSMIT_DELAY, Task::Transmit { packet, phy: Phy::LowEnergy });
    }

    // -------------------------------------------------------------------
    // Deferred work

    /// Schedule a task, or run it inline when no scheduler is registered
    pub(crate) fn schedule_task(&mut self, delay: Duration, task: Task) -> TaskId {
        match self.scheduler.as_mut() {
            Some(scheduler) => scheduler.schedule(delay, task),
            None => {
                self.run_task(task);
                TaskId::INVALID
            }
        }
    }

    pub(crate) fn cancel_scheduled_task(&mut self, id: TaskId) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.cancel(id);
        }
    }

    /// Execute a task popped from the scheduler. Tasks re-enter the
    /// controller exactly as any other event would.
    pub fn run_task(&mut self, task: Task) {
        match task {
            Task::Transmit { packet, phy } => self.outbound.send_to_remote(packet, phy),
            Task::NotifyCompletedPackets { handle } => {
                self.send_event(HciEvent::NumberOfCompletedPackets {
                    handle,
                    completed_packets: 1,
                });
            }
            Task::DisconnectCleanup { handle, reason } => {
                self.disconnect_cleanup(handle, reason)
            }
            Task::AuthenticationRequest { peer, handle } => {
                self.handle_authentication_request(peer, handle)
            }
            Task::StartSimplePairing { peer } => self.start_simple_pairing(peer),
            Task::PairingStage1 { peer, pairing_type } => {
                self.authenticate_remote_stage1(peer, pairing_type)
            }
            Task::PairingStage2 { peer } => self.authenticate_remote_stage2(peer),
            Task::SimplePairingComplete { peer, status } => {
                self.send_event(HciEvent::SimplePairingComplete { status, address: peer });
            }
            Task::LinkKeyNotification { peer, key } => {
                self.send_event(HciEvent::LinkKeyNotification {
                    address: peer,
                    key,
                    key_type: crate::hci::types::KeyType::AuthenticatedP256,
                });
            }
            Task::SetConnectionEncryption { peer, handle, encryption_enable } => {
                self.handle_set_connection_encryption(peer, handle, encryption_enable)
            }
            Task::LeEnableEncryption { handle, rand, ediv, ltk } => {
                self.handle_le_enable_encryption(handle, rand, ediv, ltk)
            }
            Task::CompletePageAccept { peer, try_role_switch } => {
                self.make_slave_connection(peer, try_role_switch)
            }
            Task::CompletePageReject { peer, reason } => {
                self.reject_slave_connection(peer, reason)
            }
            Task::InquiryTimeout => self.inquiry_timeout(),
            Task::PacketTypeChanged { handle, packet_types } => {
                self.send_event(HciEvent::ConnectionPacketTypeChanged {
                    status: ErrorCode::Success,
                    handle,
                    packet_types,
                });
            }
            Task::LeConnectionUpdateComplete {
                handle,
                interval_min,
                interval_max,
                latency,
                supervision_timeout,
            } => self.le_connection_update_complete(
                handle,
                interval_min,
                interval_max,
                latency,
                supervision_timeout,
            ),
        }
    }

    // -------------------------------------------------------------------
    // Timers

    /// Periodic housekeeping; `now` is the virtual clock of the owner
    pub fn timer_tick(&mut self, now: Duration) {
        self.now = now;
        if self.inquiry_timer_task_id != TaskId::INVALID {
            self.inquiry(now);
        }
        self.le_advertising(now);
    }

    fn le_advertising(&mut self, now: Duration) {
        let mut due = Vec::new();
        for advertiser in &mut self.advertisers {
            if let Some(packet) = advertiser.get_advertisement(now) {
                due.push(packet);
            }
        }
        for packet in due {
            self.send_le_link_layer_packet(packet);
        }
    }

    fn inquiry(&mut self, now: Duration) {
        if let Some(last) = self.last_inquiry {
            if now.saturating_sub(last) < INQUIRY_PERIOD {
                return;
            }
        }
        let packet = LinkLayerPacket::new(
            self.properties.address,
            Address::EMPTY,
            LinkPayload::Inquiry { inquiry_type: self.inquiry_mode },
        );
        self.send_link_layer_packet(packet);
        self.last_inquiry = Some(now);
    }

    // -------------------------------------------------------------------
    // Inquiry procedure

    pub fn start_inquiry(&mut self, timeout: Duration) {
        self.inquiry_timer_task_id = self.schedule_task(timeout, Task::InquiryTimeout);
    }

    pub fn inquiry_cancel(&mut self) {
        assert_ne!(self.inquiry_timer_task_id, TaskId::INVALID);
        let id = self.inquiry_timer_task_id;
        self.cancel_scheduled_task(id);
        self.inquiry_timer_task_id = TaskId::INVALID;
    }

    fn inquiry_timeout(&mut self) {
        if self.inquiry_timer_task_id != TaskId::INVALID {
            self.inquiry_timer_task_id = TaskId::INVALID;
            self.send_event(HciEvent::InquiryComplete { status: ErrorCode::Success });
        }
    }

    pub fn set_inquiry_mode(&mut self, mode: InquiryType) {
        self.inquiry_mode = mode;
    }

    pub fn set_inquiry_scan_enable(&mut self, enable: bool) {
        self.inquiry_scans_enabled = enable;
    }

    pub fn set_page_scan_enable(&mut self, enable: bool) {
        self.page_scans_enabled = enable;
    }

    pub fn write_simple_pairing_mode(&mut self, enabled: bool) {
        assert!(enabled, "simple pairing mode cannot be disabled");
        self.simple_pairing_mode_enabled = enabled;
    }

    // -------------------------------------------------------------------
    // LE scan / connect arming

    pub fn set_le_scan_enable(&mut self, enable: LeScanEnable) {
        self.le_scan_enable = enable;
    }

    pub fn set_le_scan_type(&mut self, scan_type: u8) {
        self.le_scan_type = scan_type;
    }

    pub fn set_le_connect(&mut self, connect: bool) {
        self.le_connect = connect;
    }

    pub fn set_le_peer_address(&mut self, address: Address, address_type: AddressType) {
        self.le_peer_address = address;
        self.le_peer_address_type = address_type;
    }

    pub fn set_le_address_type(&mut self, address_type: AddressType) {
        self.le_address_type = address_type;
    }

    pub fn set_le_connection_parameters(
        &mut self,
        interval_min: u16,
        interval_max: u16,
        latency: u16,
        supervision_timeout: u16,
    ) {
        self.le_connection_interval_min = interval_min;
        self.le_connection_interval_max = interval_max;
        self.le_connection_latency = latency;
        self.le_connection_supervision_timeout = supervision_timeout;
    }

    // -------------------------------------------------------------------
    // Shared helpers

    /// Pseudo-RSSI stub: a stepping counter returned as a negated byte
    pub(crate) fn next_rssi(&mut self) -> u8 {
        self.rssi += 5;
        if self.rssi > 128 {
            self.rssi %= 7;
        }
        (self.rssi as i8).wrapping_neg() as u8
    }

    /// The address this controller connects from, per the LE own-address
    /// type selected by the host
    pub(crate) fn le_own_address(&self) -> Address {
        match self.le_address_type {
            AddressType::Public | AddressType::PublicIdentity => self.properties.address,
            AddressType::Random | AddressType::RandomIdentity => self.properties.le_address,
        }
    }

    pub(crate) fn le_connect_list_contains(
        &self,
        address: Address,
        address_type: AddressType,
    ) -> bool {
        self.le_connect_list.contains(&(address, address_type))
    }

    pub(crate) fn disconnect_cleanup(&mut self, handle: crate::hci::Handle, reason: ErrorCode) {
        self.send_event(HciEvent::DisconnectionComplete {
            status: ErrorCode::Success,
            handle,
            reason,
        });
    }

    /// Promote a pending LE connection and report it to the host
    pub(crate) fn handle_le_connection(
        &mut self,
        address: AddressWithType,
        own_address: AddressWithType,
        role: crate::hci::types::Role,
        connection_interval: u16,
        connection_latency: u16,
        supervision_timeout: u16,
    ) {
        let handle = self.connections.create_le_connection(address, own_address);
        if handle == crate::hci::RESERVED_HANDLE {
            warn!("no pending connection for connection from {}", address);
            return;
        }
        self.send_event(HciEvent::LeMeta(crate::hci::LeMetaEvent::ConnectionComplete {
            status: ErrorCode::Success,
            handle,
            role,
            peer_address_type: address.address_type,
            peer_address: address.address,
            connection_interval,
            connection_latency,
            supervision_timeout,
        }));
    }

    // -------------------------------------------------------------------
    // Reset

    /// Return scan, inquiry, advertising, and connect state to idle
    pub fn reset(&mut self) {
        if self.inquiry_timer_task_id != TaskId::INVALID {
            let id = self.inquiry_timer_task_id;
            self.cancel_scheduled_task(id);
            self.inquiry_timer_task_id = TaskId::INVALID;
        }
        self.last_inquiry = None;
        self.le_scan_enable = LeScanEnable::None;
        self.le_disable_advertising_sets();
        self.le_connect = false;
    }

    pub fn le_disable_advertising_sets(&mut self) {
        for advertiser in &mut self.advertisers {
            advertiser.disable();
        }
    }

    pub fn le_read_number_of_supported_advertising_sets(&self) -> u8 {
        self.advertisers.len() as u8
    }

    pub fn has_handle(&self, handle: crate::hci::Handle) -> bool {
        self.connections.has_handle(handle)
    }

    pub fn is_encrypted(&self, handle: crate::hci::Handle) -> bool {
        self.connections.is_encrypted(handle)
    }

    pub(crate) fn log_unknown_peer(&self, source: Address) {
        info!("discarding packet from a disconnected device {}", source);
    }
}
