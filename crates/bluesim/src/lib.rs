//! Bluesim - a simulated Bluetooth link-layer controller
//!
//! This library implements the protocol state machine of a virtual
//! Bluetooth controller: it terminates host-side HCI commands and
//! exchanges typed link-layer packets with peer simulated controllers
//! over a virtual radio. It covers page and inquiry, LE advertising,
//! scanning and connection establishment, simple pairing, link
//! encryption, ACL forwarding with refragmentation, and the remote
//! feature/version/clock-offset queries.
//!
//! The controller is single-threaded and event-driven: the owning event
//! loop delivers inbound packets and host commands, pops due tasks from
//! the registered scheduler, and forwards them to
//! [`LinkLayerController::run_task`].

pub mod address;
pub mod controller;
pub mod error;
pub mod hci;
pub mod link;

// Re-export common types for convenience
pub use address::{Address, AddressType, AddressWithType};
pub use controller::properties::DeviceProperties;
pub use controller::scheduler::{Task, TaskId, TaskQueue, TaskScheduler};
pub use controller::{
    EnabledSet, LeScanEnable, LinkLayerController, OutboundChannel, RemoteCommand,
};
pub use error::PacketError;
pub use hci::{AclDataPacket, ErrorCode, Handle, HciEvent, LeMetaEvent, Phy, RESERVED_HANDLE};
pub use link::{AdvertisementType, InquiryType, LinkLayerPacket, LinkPayload};
