//! Type-C port controller traits.
//!
//! Provides the driver trait through which the port manager talks to a Type-C port controller (TCPC),
//! together with the plain types that cross that boundary.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

/// Maximum size of a PD message on the wire: a 2 byte header and up to seven 4 byte data objects.
pub const MAX_MESSAGE_SIZE: usize = 30;

/// Status of a single CC line, as seen from this port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CcState {
    /// Nothing attached.
    #[default]
    Open,
    /// Ra, usually a powered cable (VCONN consumer).
    Ra,
    /// Rd, the partner is a sink.
    Rd,
    /// Rp advertising default USB current.
    RpDefault,
    /// Rp advertising 1.5 A.
    Rp1_5,
    /// Rp advertising 3.0 A.
    Rp3_0,
}

impl CcState {
    /// The partner presents Rp, so that this port acts as a sink.
    pub fn is_rp(self) -> bool {
        matches!(self, Self::RpDefault | Self::Rp1_5 | Self::Rp3_0)
    }

    /// The partner presents Rd, so that this port acts as a source.
    pub fn is_rd(self) -> bool {
        self == Self::Rd
    }

    /// Nothing is attached to the line.
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

/// The CC line that carries PD communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// CC1 is active, normal plug orientation.
    #[default]
    Cc1,
    /// CC2 is active, reversed plug orientation.
    Cc2,
}

/// Power role capability of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortType {
    /// Source-only port.
    Source,
    /// Sink-only port.
    Sink,
    /// Dual-role power port.
    DualRole,
}

/// Power role of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerRole {
    /// Provides power on VBUS.
    Source,
    /// Consumes power from VBUS.
    Sink,
}

impl From<bool> for PowerRole {
    fn from(value: bool) -> Self {
        match value {
            false => Self::Sink,
            true => Self::Source,
        }
    }
}

impl From<PowerRole> for bool {
    fn from(role: PowerRole) -> bool {
        match role {
            PowerRole::Sink => false,
            PowerRole::Source => true,
        }
    }
}

/// Data role of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRole {
    /// Upstream facing port (device).
    Ufp,
    /// Downstream facing port (host).
    Dfp,
}

impl From<bool> for DataRole {
    fn from(value: bool) -> Self {
        match value {
            false => Self::Ufp,
            true => Self::Dfp,
        }
    }
}

impl From<DataRole> for bool {
    fn from(role: DataRole) -> bool {
        match role {
            DataRole::Ufp => false,
            DataRole::Dfp => true,
        }
    }
}

/// USB PD specification revisions, as encoded in the message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(non_camel_case_types)]
pub enum SpecificationRevision {
    /// Version 1.0.
    R1_0,
    /// Version 2.0.
    R2_0,
    /// Version 3.x.
    R3_0,
}

impl SpecificationRevision {
    /// The revision one step below this one, if any.
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::R1_0 => None,
            Self::R2_0 => Some(Self::R1_0),
            Self::R3_0 => Some(Self::R2_0),
        }
    }
}

impl TryFrom<u8> for SpecificationRevision {
    /// The reserved raw value.
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b00 => Ok(Self::R1_0),
            0b01 => Ok(Self::R2_0),
            0b10 => Ok(Self::R3_0),
            x => Err(x),
        }
    }
}

impl From<SpecificationRevision> for u8 {
    fn from(value: SpecificationRevision) -> Self {
        match value {
            SpecificationRevision::R1_0 => 0b00,
            SpecificationRevision::R2_0 => 0b01,
            SpecificationRevision::R3_0 => 0b10,
        }
    }
}

/// Kinds of transmissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitType {
    /// A message to the port partner (SOP).
    Sop,
    /// Hard reset signaling.
    HardReset,
}

/// Outcome of a transmission, as reported by the port controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitStatus {
    /// The partner acknowledged the message with GoodCRC.
    Success,
    /// The transmission was discarded, e.g. due to a concurrent reception.
    Discarded,
    /// No GoodCRC was received after all retries.
    Failed,
}

/// Driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum DriverError {
    /// The operation is not supported by this port controller.
    Unsupported,
    /// Communication with the port controller failed.
    Io,
    /// The port controller rejected the requested setting.
    InvalidArgument,
}

/// A raw PD message, as received by the port controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawMessage {
    len: u8,
    data: [u8; MAX_MESSAGE_SIZE],
}

impl RawMessage {
    /// Copy received bytes into a raw message.
    ///
    /// Returns `None` if the data does not fit into a PD message.
    pub fn new(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > MAX_MESSAGE_SIZE {
            return None;
        }

        let mut data = [0u8; MAX_MESSAGE_SIZE];
        data[..bytes.len()].copy_from_slice(bytes);

        Some(Self {
            len: bytes.len() as u8,
            data,
        })
    }

    /// The received bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

/// Low-level events that a port controller reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverEvent {
    /// The CC line status changed. Read it with [`Driver::get_cc`].
    CcChange,
    /// The VBUS status changed. Read it with [`Driver::get_vbus`].
    VbusChange,
    /// A message was received.
    MessageReceived(RawMessage),
    /// The partner signaled a hard reset.
    HardResetReceived,
    /// A transmission that was started with [`Driver::pd_transmit`] completed.
    TransmitComplete(TransmitStatus),
}

/// Static configuration of a connector, as provided by the board description.
#[derive(Debug, Clone, Copy)]
pub struct ConnectorConfig<'a> {
    /// Power role capability.
    pub port_type: PortType,
    /// Preferred power role of a dual-role port.
    pub try_power_role: Option<PowerRole>,
    /// Raw source power data objects.
    pub source_pdos: &'a [u32],
    /// Raw sink power data objects.
    pub sink_pdos: &'a [u32],
    /// Power that the sink needs for operation, in microwatts.
    pub operating_sink_microwatt: u32,
    /// The port is powered from a source other than VBUS.
    pub self_powered: bool,
}

/// Driver trait, through which the port manager talks to the port controller.
///
/// All calls are made from a single context. Operations that are not supported by a port controller
/// have default implementations.
pub trait Driver {
    /// The static connector configuration of this port.
    fn connector_config(&self) -> ConnectorConfig<'_>;

    /// Read the status of both CC lines.
    fn get_cc(&mut self) -> Result<(CcState, CcState), DriverError>;

    /// Whether VBUS is present.
    fn get_vbus(&mut self) -> bool;

    /// Set the CC termination that this port presents.
    fn set_cc(&mut self, cc: CcState) -> Result<(), DriverError>;

    /// Select the CC line that carries PD communication.
    fn set_polarity(&mut self, polarity: Polarity) -> Result<(), DriverError>;

    /// Switch VCONN.
    fn set_vconn(&mut self, enable: bool) -> Result<(), DriverError>;

    /// Switch sourcing of VBUS, and sinking (charging) from VBUS.
    fn set_vbus(&mut self, enable: bool, charge: bool) -> Result<(), DriverError>;

    /// Set the roles that the port controller uses in GoodCRC headers, and the attach status.
    fn set_roles(&mut self, attached: bool, power_role: PowerRole, data_role: DataRole) -> Result<(), DriverError>;

    /// Enable or disable reception of PD messages.
    fn set_pd_rx(&mut self, enable: bool) -> Result<(), DriverError>;

    /// Start a transmission.
    ///
    /// Completion is reported asynchronously via [`DriverEvent::TransmitComplete`].
    fn pd_transmit(
        &mut self,
        transmit_type: TransmitType,
        message: Option<&[u8]>,
        revision: SpecificationRevision,
    ) -> Result<(), DriverError>;

    /// Let the port controller autonomously toggle the CC lines, looking for an attach.
    ///
    /// Returns `true` if toggling was started.
    fn start_toggling(&mut self, _port_type: PortType, _cc: CcState) -> bool {
        false
    }

    /// Fetch the next pending low-level event, if any.
    ///
    /// Transmissions only complete through a [`DriverEvent::TransmitComplete`] that is returned here.
    fn poll_event(&mut self) -> Option<DriverEvent>;

    /// Put the port controller into its low-power mode.
    fn enter_low_power_mode(&mut self, _attached: bool, _pd_capable: bool) -> Result<(), DriverError> {
        Err(DriverError::Unsupported)
    }
}
