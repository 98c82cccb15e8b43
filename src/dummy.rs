//! Implements a dummy driver and timer for testing.
use std::cell::Cell;
use std::collections::VecDeque;
use std::vec::Vec;

use crate::message::Message;
use crate::timers::Timer;
use crate::{
    CcState, ConnectorConfig, DataRole, Driver, DriverError, DriverEvent, Polarity, PortType, PowerRole,
    SpecificationRevision, TransmitStatus, TransmitType,
};

/// 5 V, 3 A fixed supply.
pub const FIXED_5V_3A: u32 = 0x0001_912C;
/// 9 V, 3 A fixed supply.
pub const FIXED_9V_3A: u32 = 0x0002_D12C;

thread_local! {
    static NOW_MICROS: Cell<u64> = const { Cell::new(0) };
}

/// A fake clock, which only advances when told to.
///
/// Each test thread has its own clock.
pub struct DummyTimer {}

impl DummyTimer {
    /// Let time pass.
    pub fn advance_millis(milliseconds: u64) {
        NOW_MICROS.with(|now| now.set(now.get() + milliseconds * 1000));
    }
}

impl Timer for DummyTimer {
    fn now_micros() -> u64 {
        NOW_MICROS.with(Cell::get)
    }

    fn delay_micros(microseconds: u32) {
        NOW_MICROS.with(|now| now.set(now.get() + u64::from(microseconds)));
    }
}

/// A driver call that changes the port controller's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    SetCc(CcState),
    SetPolarity(Polarity),
    SetVconn(bool),
    SetVbus(bool, bool),
    SetRoles(bool, PowerRole, DataRole),
    SetPdRx(bool),
}

/// A dummy driver for testing.
///
/// CC and VBUS readings are scripted by the test. Every transmission completes with the next scripted
/// outcome, or with success, if none is left.
pub struct DummyDriver {
    pub port_type: PortType,
    pub try_power_role: Option<PowerRole>,
    pub source_pdos: Vec<u32>,
    pub sink_pdos: Vec<u32>,
    pub operating_sink_microwatt: u32,
    pub self_powered: bool,

    pub cc: (CcState, CcState),
    pub vbus: bool,
    pub events: VecDeque<DriverEvent>,
    pub transmit_outcomes: VecDeque<TransmitStatus>,
    pub transmitted: Vec<(TransmitType, Vec<u8>)>,
    pub calls: Vec<Call>,
    pub toggling: bool,
    pub fail_pd_rx: bool,
    pub low_power: Option<(bool, bool)>,
}

impl DummyDriver {
    /// Create a new dummy driver, with nothing attached.
    pub fn new(port_type: PortType) -> Self {
        Self {
            port_type,
            try_power_role: None,
            source_pdos: Vec::new(),
            sink_pdos: Vec::new(),
            operating_sink_microwatt: 0,
            self_powered: false,
            cc: (CcState::Open, CcState::Open),
            vbus: false,
            events: VecDeque::new(),
            transmit_outcomes: VecDeque::new(),
            transmitted: Vec::new(),
            calls: Vec::new(),
            toggling: false,
            fail_pd_rx: false,
            low_power: None,
        }
    }

    /// A sink that accepts 5 V and 9 V at 3 A, and needs 10 W.
    pub fn sink() -> Self {
        let mut driver = Self::new(PortType::Sink);
        driver.sink_pdos = std::vec![FIXED_5V_3A, FIXED_9V_3A];
        driver.operating_sink_microwatt = 10_000_000;
        driver
    }

    /// A source that offers 5 V at 3 A.
    pub fn source() -> Self {
        let mut driver = Self::new(PortType::Source);
        driver.source_pdos = std::vec![FIXED_5V_3A];
        driver
    }

    /// Messages that were transmitted to the partner, in order.
    pub fn sent_messages(&self) -> Vec<Message> {
        self.transmitted
            .iter()
            .filter(|(transmit_type, _)| *transmit_type == TransmitType::Sop)
            .map(|(_, data)| Message::from_bytes(data).unwrap())
            .collect()
    }

    /// Number of hard resets that were signaled.
    pub fn hard_resets(&self) -> usize {
        self.transmitted
            .iter()
            .filter(|(transmit_type, _)| *transmit_type == TransmitType::HardReset)
            .count()
    }
}

impl Driver for DummyDriver {
    fn connector_config(&self) -> ConnectorConfig<'_> {
        ConnectorConfig {
            port_type: self.port_type,
            try_power_role: self.try_power_role,
            source_pdos: &self.source_pdos,
            sink_pdos: &self.sink_pdos,
            operating_sink_microwatt: self.operating_sink_microwatt,
            self_powered: self.self_powered,
        }
    }

    fn get_cc(&mut self) -> Result<(CcState, CcState), DriverError> {
        Ok(self.cc)
    }

    fn get_vbus(&mut self) -> bool {
        self.vbus
    }

    fn set_cc(&mut self, cc: CcState) -> Result<(), DriverError> {
        self.calls.push(Call::SetCc(cc));
        Ok(())
    }

    fn set_polarity(&mut self, polarity: Polarity) -> Result<(), DriverError> {
        self.calls.push(Call::SetPolarity(polarity));
        Ok(())
    }

    fn set_vconn(&mut self, enable: bool) -> Result<(), DriverError> {
        self.calls.push(Call::SetVconn(enable));
        Ok(())
    }

    fn set_vbus(&mut self, enable: bool, charge: bool) -> Result<(), DriverError> {
        self.calls.push(Call::SetVbus(enable, charge));
        Ok(())
    }

    fn set_roles(&mut self, attached: bool, power_role: PowerRole, data_role: DataRole) -> Result<(), DriverError> {
        self.calls.push(Call::SetRoles(attached, power_role, data_role));
        Ok(())
    }

    fn set_pd_rx(&mut self, enable: bool) -> Result<(), DriverError> {
        if self.fail_pd_rx {
            return Err(DriverError::Io);
        }
        self.calls.push(Call::SetPdRx(enable));
        Ok(())
    }

    fn pd_transmit(
        &mut self,
        transmit_type: TransmitType,
        message: Option<&[u8]>,
        _revision: SpecificationRevision,
    ) -> Result<(), DriverError> {
        self.transmitted
            .push((transmit_type, message.map(<[u8]>::to_vec).unwrap_or_default()));

        let status = self.transmit_outcomes.pop_front().unwrap_or(TransmitStatus::Success);
        self.events.push_back(DriverEvent::TransmitComplete(status));
        Ok(())
    }

    fn start_toggling(&mut self, _port_type: PortType, _cc: CcState) -> bool {
        self.toggling
    }

    fn poll_event(&mut self) -> Option<DriverEvent> {
        self.events.pop_front()
    }

    fn enter_low_power_mode(&mut self, attached: bool, pd_capable: bool) -> Result<(), DriverError> {
        self.low_power = Some((attached, pd_capable));
        Ok(())
    }
}
