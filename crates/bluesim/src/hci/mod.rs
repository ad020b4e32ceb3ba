//! Host Controller Interface surface
//!
//! This module defines the typed events, status codes, and ACL data packets
//! exchanged between the controller core and its host.

pub mod acl;
pub mod constants;
pub mod event;
pub mod types;

pub use acl::AclDataPacket;
pub use event::{HciEvent, LeMetaEvent};
pub use types::{ErrorCode, Handle, Phy, RESERVED_HANDLE};
