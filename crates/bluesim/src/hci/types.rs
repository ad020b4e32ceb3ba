//! Type definitions shared across the HCI surface

use std::fmt;

/// HCI connection handle, a 12-bit identifier
pub type Handle = u16;

/// Sentinel handle value meaning "no connection"
pub const RESERVED_HANDLE: Handle = 0x0F00;

/// Class-of-device field, three octets
pub type ClassOfDevice = [u8; 3];

/// HCI status codes returned by command entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0x00,
    UnknownHciCommand = 0x01,
    UnknownConnection = 0x02,
    AuthenticationFailure = 0x05,
    PinOrKeyMissing = 0x06,
    CommandDisallowed = 0x0C,
    ConnectionRejectedLimitedResources = 0x0D,
    ConnectionRejectedSecurityReasons = 0x0E,
    ConnectionRejectedUnacceptableBdAddr = 0x0F,
    InvalidHciCommandParameters = 0x12,
    RemoteUserTerminatedConnection = 0x13,
    ConnectionTerminatedByLocalHost = 0x16,
    InvalidLmpOrLlParameters = 0x1E,
    EncryptionModeNotAcceptable = 0x25,
    ControllerBusy = 0x3A,
}

impl ErrorCode {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(ErrorCode::Success),
            0x01 => Some(ErrorCode::UnknownHciCommand),
            0x02 => Some(ErrorCode::UnknownConnection),
            0x05 => Some(ErrorCode::AuthenticationFailure),
            0x06 => Some(ErrorCode::PinOrKeyMissing),
            0x0C => Some(ErrorCode::CommandDisallowed),
            0x0D => Some(ErrorCode::ConnectionRejectedLimitedResources),
            0x0E => Some(ErrorCode::ConnectionRejectedSecurityReasons),
            0x0F => Some(ErrorCode::ConnectionRejectedUnacceptableBdAddr),
            0x12 => Some(ErrorCode::InvalidHciCommandParameters),
            0x13 => Some(ErrorCode::RemoteUserTerminatedConnection),
            0x16 => Some(ErrorCode::ConnectionTerminatedByLocalHost),
            0x1E => Some(ErrorCode::InvalidLmpOrLlParameters),
            0x25 => Some(ErrorCode::EncryptionModeNotAcceptable),
            0x3A => Some(ErrorCode::ControllerBusy),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:02X})", self, *self as u8)
    }
}

/// Physical transport of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phy {
    BrEdr,
    LowEnergy,
}

/// Connection role reported in LE connection-complete events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master = 0x00,
    Slave = 0x01,
}

/// Link type reported in connection events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Sco = 0x00,
    Acl = 0x01,
}

/// IO capability exchanged during simple pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoCapability {
    DisplayOnly = 0x00,
    DisplayYesNo = 0x01,
    KeyboardOnly = 0x02,
    NoInputNoOutput = 0x03,
}

impl IoCapability {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(IoCapability::DisplayOnly),
            0x01 => Some(IoCapability::DisplayYesNo),
            0x02 => Some(IoCapability::KeyboardOnly),
            0x03 => Some(IoCapability::NoInputNoOutput),
            _ => None,
        }
    }
}

impl fmt::Display for IoCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoCapability::DisplayOnly => write!(f, "Display Only"),
            IoCapability::DisplayYesNo => write!(f, "Display Yes/No"),
            IoCapability::KeyboardOnly => write!(f, "Keyboard Only"),
            IoCapability::NoInputNoOutput => write!(f, "No Input No Output"),
        }
    }
}

/// Link key type reported in link-key notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Combination = 0x00,
    UnauthenticatedP192 = 0x04,
    AuthenticatedP192 = 0x05,
    UnauthenticatedP256 = 0x07,
    AuthenticatedP256 = 0x08,
}

/// Packet boundary flag of an ACL data packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketBoundaryFlag {
    FirstNonAutomaticallyFlushable = 0x00,
    ContinuingFragment = 0x01,
    FirstAutomaticallyFlushable = 0x02,
    CompleteLePdu = 0x03,
}

impl PacketBoundaryFlag {
    pub fn from_u8(value: u8) -> Self {
        match value & 0x03 {
            0x00 => PacketBoundaryFlag::FirstNonAutomaticallyFlushable,
            0x01 => PacketBoundaryFlag::ContinuingFragment,
            0x02 => PacketBoundaryFlag::FirstAutomaticallyFlushable,
            _ => PacketBoundaryFlag::CompleteLePdu,
        }
    }
}

/// Broadcast flag of an ACL data packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastFlag {
    PointToPoint = 0x00,
    ActiveSlaveBroadcast = 0x01,
    ParkedSlaveBroadcast = 0x02,
}

impl BroadcastFlag {
    pub fn from_u8(value: u8) -> Self {
        match value & 0x03 {
            0x01 => BroadcastFlag::ActiveSlaveBroadcast,
            0x02 => BroadcastFlag::ParkedSlaveBroadcast,
            _ => BroadcastFlag::PointToPoint,
        }
    }
}

/// Page scan repetition mode advertised in inquiry responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageScanRepetitionMode {
    R0 = 0x00,
    R1 = 0x01,
    R2 = 0x02,
}

impl PageScanRepetitionMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x01 => PageScanRepetitionMode::R1,
            0x02 => PageScanRepetitionMode::R2,
            _ => PageScanRepetitionMode::R0,
        }
    }
}

/// LE scanning filter policy, shared with advertising filter handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeScanningFilterPolicy {
    AcceptAll = 0x00,
    ConnectListOnly = 0x01,
    CheckInitiatorsIdentity = 0x02,
    ConnectListAndInitiatorsIdentity = 0x03,
}

impl LeScanningFilterPolicy {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x01 => LeScanningFilterPolicy::ConnectListOnly,
            0x02 => LeScanningFilterPolicy::CheckInitiatorsIdentity,
            0x03 => LeScanningFilterPolicy::ConnectListAndInitiatorsIdentity,
            _ => LeScanningFilterPolicy::AcceptAll,
        }
    }
}

/// Advertising filter policy of the extended advertising parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingFilterPolicy {
    AllDevices = 0x00,
    ListedScan = 0x01,
    ListedConnect = 0x02,
    ListedScanAndConnect = 0x03,
}

/// Own-address type of the extended advertising parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnAddressType {
    Public = 0x00,
    Random = 0x01,
    ResolvableOrPublic = 0x02,
    ResolvableOrRandom = 0x03,
}

/// Peer-address type of the extended advertising parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerAddressType {
    PublicDeviceOrIdentity = 0x00,
    RandomDeviceOrIdentity = 0x01,
}

/// Legacy PDU selection of the extended advertising parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyAdvertisingProperties {
    AdvInd,
    AdvNonconnInd,
    AdvScanInd,
    AdvDirectIndHigh,
    AdvDirectIndLow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_round_trip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::UnknownConnection,
            ErrorCode::AuthenticationFailure,
            ErrorCode::CommandDisallowed,
            ErrorCode::InvalidHciCommandParameters,
            ErrorCode::ConnectionTerminatedByLocalHost,
            ErrorCode::ControllerBusy,
        ] {
            assert_eq!(ErrorCode::from_u8(code.to_u8()), Some(code));
        }
        assert_eq!(ErrorCode::from_u8(0xFF), None);
    }

    #[test]
    fn test_io_capability_conversion() {
        assert_eq!(IoCapability::from_u8(0x01), Some(IoCapability::DisplayYesNo));
        assert_eq!(IoCapability::from_u8(0x04), None);
        assert_eq!(IoCapability::KeyboardOnly.to_u8(), 0x02);
    }

    #[test]
    fn test_boundary_flag_parsing() {
        assert_eq!(
            PacketBoundaryFlag::from_u8(0x02),
            PacketBoundaryFlag::FirstAutomaticallyFlushable
        );
        assert_eq!(
            PacketBoundaryFlag::from_u8(0x01),
            PacketBoundaryFlag::ContinuingFragment
        );
    }
}
