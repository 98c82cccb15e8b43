//! Definitions for a USB PD message header.
//!
//! See [6.2.1.1].
use byteorder::{ByteOrder, LittleEndian};
use proc_bitfield::bitfield;

use super::ParseError;
use crate::counters::Counter;
use crate::{DataRole, PowerRole, SpecificationRevision};

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    /// Definition of the message header. Every message shall start with it.
    pub struct Header(pub u16): Debug, FromStorage, IntoStorage {
        /// Set for extended messages, which this port manager does not support.
        pub extended: bool @ 15,
        /// The number of 32 bit data objects that follow the header.
        pub num_objects: u8 [get usize] @ 12..=14,
        /// A rolling counter, maintained by the originator of the message.
        pub message_id: u8 @ 9..=11,
        /// The port's present power role (0 -> sink, 1 -> source).
        pub port_power_role: bool [get PowerRole, set PowerRole] @ 8,
        /// The specification revision.
        ///
        /// 00b - Revision 1.0 (deprecated)
        /// 01b - Revision 2.0
        /// 10b - Revision 3.x
        /// 11b - Reserved, shall not be used
        pub spec_revision: u8 [try_get SpecificationRevision, set SpecificationRevision] @ 6..=7,
        /// The port's data role (0 -> UFP, 1 -> DFP).
        pub port_data_role: bool [get DataRole, set DataRole] @ 5,
        /// The type of message being sent. See [6.2.1.1.8] for details
        pub message_type_raw: u8 @ 0..=4,
    }
}

impl Header {
    /// Create a header template with the roles and revision that a port currently uses.
    pub fn new_template(
        port_data_role: DataRole,
        port_power_role: PowerRole,
        spec_revision: SpecificationRevision,
    ) -> Self {
        Self(0)
            .with_port_data_role(port_data_role)
            .with_port_power_role(port_power_role)
            .with_spec_revision(spec_revision)
    }

    /// Create a new control message header.
    pub fn new_control(template: Self, message_id: Counter, message_type: ControlMessageType) -> Self {
        template
            .with_message_id(message_id.value())
            .with_message_type_raw(message_type.into())
            .with_num_objects(0)
    }

    /// Create a new data message header.
    pub fn new_data(template: Self, message_id: Counter, message_type: DataMessageType, num_objects: u8) -> Self {
        template
            .with_message_id(message_id.value())
            .with_message_type_raw(message_type.into())
            .with_num_objects(num_objects)
    }

    /// Parse a header from its binary representation.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() < 2 {
            return Err(ParseError::InvalidLength {
                expected: 2,
                found: buf.len(),
            });
        }

        let header = Header(LittleEndian::read_u16(&buf[..2]));
        header
            .spec_revision()
            .map_err(ParseError::UnsupportedSpecificationRevision)?;
        Ok(header)
    }

    /// Serialize the header to its binary representation.
    pub fn to_bytes(self, buf: &mut [u8]) -> usize {
        LittleEndian::write_u16(buf, self.0);
        2
    }

    /// Extract the message type that the header encodes.
    pub fn message_type(&self) -> MessageType {
        if self.extended() {
            MessageType::Extended(self.message_type_raw())
        } else if self.num_objects() == 0 {
            MessageType::Control(self.message_type_raw().into())
        } else {
            MessageType::Data(self.message_type_raw().into())
        }
    }
}

/// The type of message that a header encodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageType {
    /// A control message, as defined in [6.3].
    Control(ControlMessageType),
    /// A data message, as defined in [6.4].
    Data(DataMessageType),
    /// An extended message, as defined in [6.5], with its raw type.
    Extended(u8),
}

/// Types of control messages.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMessageType {
    GoodCRC,
    GotoMin,
    Accept,
    Reject,
    Ping,
    PsRdy,
    GetSourceCap,
    GetSinkCap,
    DrSwap,
    PrSwap,
    VconnSwap,
    Wait,
    SoftReset,
    NotSupported,
    GetSourceCapExtended,
    GetStatus,
    FrSwap,
    GetPpsStatus,
    GetCountryCodes,
    /// Any other, or reserved, control message type.
    Other(u8),
}

impl From<u8> for ControlMessageType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::GoodCRC,
            0x02 => Self::GotoMin,
            0x03 => Self::Accept,
            0x04 => Self::Reject,
            0x05 => Self::Ping,
            0x06 => Self::PsRdy,
            0x07 => Self::GetSourceCap,
            0x08 => Self::GetSinkCap,
            0x09 => Self::DrSwap,
            0x0A => Self::PrSwap,
            0x0B => Self::VconnSwap,
            0x0C => Self::Wait,
            0x0D => Self::SoftReset,
            0x10 => Self::NotSupported,
            0x11 => Self::GetSourceCapExtended,
            0x12 => Self::GetStatus,
            0x13 => Self::FrSwap,
            0x14 => Self::GetPpsStatus,
            0x15 => Self::GetCountryCodes,
            x => Self::Other(x),
        }
    }
}

impl From<ControlMessageType> for u8 {
    fn from(value: ControlMessageType) -> Self {
        match value {
            ControlMessageType::GoodCRC => 0x01,
            ControlMessageType::GotoMin => 0x02,
            ControlMessageType::Accept => 0x03,
            ControlMessageType::Reject => 0x04,
            ControlMessageType::Ping => 0x05,
            ControlMessageType::PsRdy => 0x06,
            ControlMessageType::GetSourceCap => 0x07,
            ControlMessageType::GetSinkCap => 0x08,
            ControlMessageType::DrSwap => 0x09,
            ControlMessageType::PrSwap => 0x0A,
            ControlMessageType::VconnSwap => 0x0B,
            ControlMessageType::Wait => 0x0C,
            ControlMessageType::SoftReset => 0x0D,
            ControlMessageType::NotSupported => 0x10,
            ControlMessageType::GetSourceCapExtended => 0x11,
            ControlMessageType::GetStatus => 0x12,
            ControlMessageType::FrSwap => 0x13,
            ControlMessageType::GetPpsStatus => 0x14,
            ControlMessageType::GetCountryCodes => 0x15,
            ControlMessageType::Other(x) => x & 0x1F,
        }
    }
}

/// Types of data messages.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataMessageType {
    SourceCapabilities,
    Request,
    Bist,
    SinkCapabilities,
    BatteryStatus,
    Alert,
    GetCountryInfo,
    VendorDefined,
    /// Any other, or reserved, data message type.
    Other(u8),
}

impl From<u8> for DataMessageType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::SourceCapabilities,
            0x02 => Self::Request,
            0x03 => Self::Bist,
            0x04 => Self::SinkCapabilities,
            0x05 => Self::BatteryStatus,
            0x06 => Self::Alert,
            0x07 => Self::GetCountryInfo,
            0x0F => Self::VendorDefined,
            x => Self::Other(x),
        }
    }
}

impl From<DataMessageType> for u8 {
    fn from(value: DataMessageType) -> Self {
        match value {
            DataMessageType::SourceCapabilities => 0x01,
            DataMessageType::Request => 0x02,
            DataMessageType::Bist => 0x03,
            DataMessageType::SinkCapabilities => 0x04,
            DataMessageType::BatteryStatus => 0x05,
            DataMessageType::Alert => 0x06,
            DataMessageType::GetCountryInfo => 0x07,
            DataMessageType::VendorDefined => 0x0F,
            DataMessageType::Other(x) => x & 0x1F,
        }
    }
}
