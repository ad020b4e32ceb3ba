//! Numeric constants for the HCI surface

// ACL data packet header layout
pub const ACL_HANDLE_MASK: u16 = 0x0FFF;
pub const ACL_PB_FLAG_SHIFT: u16 = 12;
pub const ACL_PB_FLAG_MASK: u16 = 0x03;
pub const ACL_BC_FLAG_SHIFT: u16 = 14;
pub const ACL_BC_FLAG_MASK: u16 = 0x03;

// Extended advertising report event-type field, one value per legacy PDU
pub const EXT_ADV_EVENT_TYPE_ADV_IND: u8 = 0x13;
pub const EXT_ADV_EVENT_TYPE_ADV_DIRECT_IND: u8 = 0x15;
pub const EXT_ADV_EVENT_TYPE_ADV_SCAN_IND: u8 = 0x12;
pub const EXT_ADV_EVENT_TYPE_ADV_NONCONN_IND: u8 = 0x10;
pub const EXT_ADV_EVENT_TYPE_SCAN_RESPONSE: u8 = 0x1A;

// Legacy advertising report event type for a scan response
pub const ADV_EVENT_TYPE_SCAN_RESPONSE: u8 = 0x04;

// Connection handle reported alongside a rejected page
pub const REJECT_HANDLE: u16 = 0x0EFF;
