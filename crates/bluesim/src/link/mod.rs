//! Link-layer packet substrate shared by all simulated controllers

pub mod packet;

pub use packet::{AdvertisementType, InquiryType, LinkLayerPacket, LinkPayload};
