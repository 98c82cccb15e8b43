//! Definitions of message content.
pub mod header;
pub mod pdo;
pub mod request;

use byteorder::{ByteOrder, LittleEndian};
use header::{DataMessageType, Header, MessageType};
use heapless::Vec;
pub use pdo::{PDO_MAX_OBJECTS, PdoError, PdoList};

/// Errors that can occur during message/header parsing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// The input buffer has an invalid length.
    #[error("invalid input buffer length (expected {expected:?}, found {found:?})")]
    InvalidLength {
        /// The expected length.
        expected: usize,
        /// The actual length found.
        found: usize,
    },
    /// The specification revision field is not supported.
    #[error("unsupported specification revision `{0}`")]
    UnsupportedSpecificationRevision(u8),
}

/// Payload of a data message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Data {
    /// Source capabilities, not yet validated.
    SourceCapabilities(PdoList),
    /// Sink capabilities, not yet validated.
    SinkCapabilities(PdoList),
    /// A raw request data object.
    Request(u32),
    /// Any other data message, kept as raw objects.
    Other(Vec<u32, PDO_MAX_OBJECTS>),
}

impl Data {
    fn to_bytes(&self, buf: &mut [u8]) -> usize {
        match self {
            Data::SourceCapabilities(pdos) | Data::SinkCapabilities(pdos) => pdos.to_bytes(buf),
            Data::Request(rdo) => {
                LittleEndian::write_u32(buf, *rdo);
                4
            }
            Data::Other(objects) => {
                for (object, chunk) in objects.iter().zip(buf.chunks_exact_mut(4)) {
                    LittleEndian::write_u32(chunk, *object);
                }
                objects.len() * 4
            }
        }
    }
}

/// A USB PD message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// The message header.
    pub header: Header,
    /// Data objects of data messages.
    pub data: Option<Data>,
}

impl Message {
    /// Create a new message from a message header.
    pub fn new(header: Header) -> Self {
        Self { header, data: None }
    }

    /// Create a new message from a message header and payload data.
    pub fn new_with_data(header: Header, data: Data) -> Self {
        Self {
            header,
            data: Some(data),
        }
    }

    /// Serialize a message to a slice, returning the number of written bytes.
    pub fn to_bytes(&self, buf: &mut [u8]) -> usize {
        self.header.to_bytes(buf)
            + match self.data.as_ref() {
                Some(data) => data.to_bytes(&mut buf[2..]),
                None => 0,
            }
    }

    /// Parse a message from a slice of bytes.
    ///
    /// Extended messages are returned with their header only.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ParseError> {
        let header = Header::from_bytes(buf)?;
        let message = Self::new(header);

        let MessageType::Data(message_type) = header.message_type() else {
            return Ok(message);
        };

        let expected = 2 + 4 * header.num_objects();
        if buf.len() < expected {
            return Err(ParseError::InvalidLength {
                expected,
                found: buf.len(),
            });
        }

        let mut objects: Vec<u32, PDO_MAX_OBJECTS> = Vec::new();
        for chunk in buf[2..expected].chunks_exact(4) {
            // The header field limits the count to seven.
            let _ = objects.push(LittleEndian::read_u32(chunk));
        }

        let data = match message_type {
            DataMessageType::SourceCapabilities => Data::SourceCapabilities(pdo_list(&objects)),
            DataMessageType::SinkCapabilities => Data::SinkCapabilities(pdo_list(&objects)),
            DataMessageType::Request => Data::Request(objects.first().copied().unwrap_or_default()),
            _ => Data::Other(objects),
        };

        Ok(Message::new_with_data(header, data))
    }
}

fn pdo_list(objects: &[u32]) -> PdoList {
    PdoList::from_raw(objects).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::header::ControlMessageType;
    use crate::message::pdo::{Kind, PowerDataObject};

    #[test]
    fn test_parse_source_capabilities() {
        let buf = [0xA1, 0x21, 0x2C, 0x91, 0x01, 0x08, 0x2C, 0xD1, 0x02, 0x00];
        let message = Message::from_bytes(&buf).unwrap();

        let Some(Data::SourceCapabilities(pdos)) = &message.data else {
            panic!("expected source capabilities");
        };
        assert_eq!(pdos.len(), 2);
        assert_eq!(pdos.pdos()[1].kind(), Kind::FixedSupply);
        assert_eq!(pdos.validate(), Ok(()));

        let mut out = [0u8; 30];
        assert_eq!(message.to_bytes(&mut out), buf.len());
        assert_eq!(&out[..buf.len()], &buf);
    }

    #[test]
    fn test_parse_request() {
        let message = Message::from_bytes(&[0x82, 0x10, 0x96, 0x58, 0x02, 0x13]).unwrap();

        assert_eq!(message.data, Some(Data::Request(0x1302_5896)));
    }

    #[test]
    fn test_parse_control() {
        let message = Message::from_bytes(&[0x63, 0x03]).unwrap();

        assert_eq!(
            message.header.message_type(),
            MessageType::Control(ControlMessageType::Accept)
        );
        assert!(message.data.is_none());
    }

    #[test]
    fn test_truncated_data_rejected() {
        assert_eq!(
            Message::from_bytes(&[0xA1, 0x21, 0x2C, 0x91, 0x01, 0x08]),
            Err(ParseError::InvalidLength { expected: 10, found: 6 })
        );
    }

    #[test]
    fn test_invalid_capabilities_are_kept_for_validation() {
        // 12 V first, then 5 V.
        let buf = [0xA1, 0x21, 0x2C, 0xC1, 0x03, 0x00, 0x2C, 0x91, 0x01, 0x00];
        let message = Message::from_bytes(&buf).unwrap();

        let Some(Data::SourceCapabilities(pdos)) = message.data else {
            panic!("expected source capabilities");
        };
        assert!(matches!(pdos.pdos()[0], PowerDataObject::FixedSupply(_)));
        assert_eq!(pdos.validate(), Err(PdoError::Vsafe5vNotFirst));
    }
}
