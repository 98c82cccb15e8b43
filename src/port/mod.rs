//! The port manager of a single Type-C connector.
//!
//! A [`Port`] owns the port controller driver and runs the Type-C and USB PD state machine on top of it.
//! It never blocks while waiting for the partner. Instead, events are injected through the entry points
//! ([`Port::cc_change`], [`Port::vbus_change`], [`Port::pd_receive`], [`Port::pd_hard_reset`],
//! [`Port::pd_transmit_complete`]), and timeouts are delayed state changes that fire from
//! [`Port::run_delayed_work`].
use core::marker::PhantomData;

use heapless::Deque;
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::millivolt;

use crate::config::{Config, ConfigError};
use crate::counters::{Counter, CounterType};
use crate::message::pdo::{PdoList, PowerDataObject, VSAFE_5V_MILLIVOLTS};
use crate::negotiator::NegotiationError;
use crate::timers::{Deadline, Timer};
use crate::units::{ElectricCurrent, ElectricPotential};
use crate::{
    CcState, DataRole, Driver, DriverError, DriverEvent, Polarity, PortType, PowerRole, SpecificationRevision,
    TransmitStatus,
};

mod engine;
mod rx;
mod state;
mod tx;


pub use state::State;

/// Number of polling cycles that [`Port::poll_until_settled`] runs at most, over the lifetime of a port.
pub const POLL_EVENT_TIMEOUT: u32 = 2000;

/// Interval between two polling cycles.
const POLL_INTERVAL_MICROS: u32 = 500;

/// Number of driver events that can be held back while a transmission is in progress.
const DEFERRED_EVENT_CAPACITY: usize = 8;

/// Errors of a blocking transmission.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitError {
    /// The port controller discarded the message.
    #[error("transmission discarded")]
    Discarded,
    /// No GoodCRC was received.
    #[error("transmission failed")]
    Failed,
    /// The port controller did not report completion in time.
    #[error("transmission timed out")]
    Timeout,
    /// The port controller refused the transmission.
    #[error("driver error {0:?}")]
    Driver(DriverError),
}

impl From<DriverError> for TransmitError {
    fn from(error: DriverError) -> Self {
        TransmitError::Driver(error)
    }
}

/// Errors of sending a request.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No request could be built.
    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),
    /// The request could not be sent.
    #[error("transmission failed: {0}")]
    Transmit(#[from] TransmitError),
}

/// Cable orientation, as derived from the CC polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    /// Nothing is attached.
    None,
    /// CC1 is active.
    Normal,
    /// CC2 is active.
    Reverse,
}

/// A message that is sent from within the state machine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum QueuedMessage {
    Wait,
    Reject,
    NotSupported,
    SourceCapabilities,
    SinkCapabilities,
}

/// A state change that becomes due at a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DelayedState {
    state: State,
    deadline: Deadline,
}

/// The port manager of a single Type-C connector.
pub struct Port<DRIVER: Driver, TIMER: Timer> {
    driver: DRIVER,
    config: Config,

    state: State,
    prev_state: State,
    enter_state: State,
    delayed: Option<DelayedState>,
    state_machine_running: bool,

    power_role: PowerRole,
    data_role: DataRole,
    vconn_role: PowerRole,
    negotiated_rev: SpecificationRevision,

    cc_req: CcState,
    cc1: CcState,
    cc2: CcState,
    polarity: Polarity,

    attached: bool,
    connected: bool,
    pd_capable: bool,
    explicit_contract: bool,
    vbus_present: bool,
    vbus_never_low: bool,
    vbus_source: bool,
    vbus_charge: bool,
    try_src_attempted: bool,
    wait_dr_swap_message: bool,

    message_id: Counter,
    rx_msgid: Option<u8>,
    caps_count: Counter,
    hard_reset_count: Counter,
    queued_message: Option<QueuedMessage>,
    tx_status: Option<TransmitStatus>,
    deferred_events: Deque<DriverEvent, DEFERRED_EVENT_CAPACITY>,
    poll_event_count: u32,

    source_caps: PdoList,
    sink_caps: PdoList,
    sink_request: u32,

    current_limit: ElectricCurrent,
    supply_voltage: ElectricPotential,
    req_current_limit: ElectricCurrent,
    req_supply_voltage: ElectricPotential,

    _timer: PhantomData<TIMER>,
}

impl<DRIVER: Driver, TIMER: Timer> Port<DRIVER, TIMER> {
    /// Create a port from a driver and a configuration.
    ///
    /// Fails if the configuration does not validate. The port is idle until [`Port::init`] is called.
    pub fn new(driver: DRIVER, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let power_role = match (config.port_type, config.try_power_role) {
            (PortType::Source, _) | (PortType::DualRole, Some(PowerRole::Source)) => PowerRole::Source,
            _ => PowerRole::Sink,
        };
        let data_role = match power_role {
            PowerRole::Source => DataRole::Dfp,
            PowerRole::Sink => DataRole::Ufp,
        };

        Ok(Self {
            driver,
            config,
            state: State::SnkUnattached,
            prev_state: State::SnkUnattached,
            enter_state: State::SnkUnattached,
            delayed: None,
            state_machine_running: false,
            power_role,
            data_role,
            vconn_role: PowerRole::Sink,
            negotiated_rev: SpecificationRevision::R3_0,
            cc_req: CcState::Open,
            cc1: CcState::Open,
            cc2: CcState::Open,
            polarity: Polarity::Cc1,
            attached: false,
            connected: false,
            pd_capable: false,
            explicit_contract: false,
            vbus_present: false,
            vbus_never_low: false,
            vbus_source: false,
            vbus_charge: false,
            try_src_attempted: false,
            wait_dr_swap_message: false,
            message_id: Counter::new(CounterType::MessageId),
            rx_msgid: None,
            caps_count: Counter::new(CounterType::Caps),
            hard_reset_count: Counter::new(CounterType::HardReset),
            queued_message: None,
            tx_status: None,
            deferred_events: Deque::new(),
            poll_event_count: 0,
            source_caps: PdoList::new(),
            sink_caps: PdoList::new(),
            sink_request: 0,
            current_limit: ElectricCurrent::new::<milliampere>(0),
            supply_voltage: ElectricPotential::new::<millivolt>(0),
            req_current_limit: ElectricCurrent::new::<milliampere>(0),
            req_supply_voltage: ElectricPotential::new::<millivolt>(0),
            _timer: PhantomData,
        })
    }

    /// Load the configuration from the driver, initialize the port, and poll until it settles.
    pub fn probe(driver: DRIVER) -> Result<Self, ConfigError> {
        let config = Config::from_connector(&driver.connector_config())?;
        info!("probing {:?} port", config.port_type);

        let mut port = Self::new(driver, config)?;
        port.init();
        port.poll_until_settled();

        Ok(port)
    }

    /// Enter the default state and apply the current CC and VBUS status.
    pub fn init(&mut self) {
        self.vbus_present = self.driver.get_vbus();
        if self.vbus_present {
            self.vbus_never_low = true;
        }

        self.set_state(self.default_state(), 0);

        match self.driver.get_cc() {
            Ok((cc1, cc2)) => self.cc_change(cc1, cc2),
            Err(error) => warn!("failed to read CC status: {:?}", error),
        }
    }

    /// Service the port until it is ready, or the polling budget is spent.
    ///
    /// Afterwards, the port controller is asked to enter its low-power mode.
    pub fn poll_until_settled(&mut self) {
        while self.poll_event_count < POLL_EVENT_TIMEOUT {
            if self.state.is_ready() && self.connected && !self.wait_dr_swap_message {
                break;
            }

            self.process_events();
            self.poll_event_count += 1;
            TIMER::delay_micros(POLL_INTERVAL_MICROS);
            self.run_delayed_work();
        }

        if !self.state.is_ready() {
            warn!("exit in state {}", self.state);
        }

        match self.driver.enter_low_power_mode(self.attached, self.pd_capable) {
            Ok(()) => info!("port controller entered low power mode"),
            Err(error) => error!("failed to enter low power mode: {:?}", error),
        }
    }

    /// Handle all events that the driver has pending.
    pub fn process_events(&mut self) {
        while let Some(event) = self.driver.poll_event() {
            self.handle_event(event);
        }
    }

    /// Handle a single driver event.
    pub fn handle_event(&mut self, event: DriverEvent) {
        match event {
            DriverEvent::CcChange => match self.driver.get_cc() {
                Ok((cc1, cc2)) => self.cc_change(cc1, cc2),
                Err(error) => warn!("failed to read CC status: {:?}", error),
            },
            DriverEvent::VbusChange => {
                let present = self.driver.get_vbus();
                self.vbus_change(present);
            }
            DriverEvent::MessageReceived(message) => self.pd_receive(message.as_bytes()),
            DriverEvent::HardResetReceived => self.pd_hard_reset(),
            DriverEvent::TransmitComplete(status) => self.pd_transmit_complete(status),
        }
    }

    /// Record the outcome of a transmission.
    pub fn pd_transmit_complete(&mut self, status: TransmitStatus) {
        trace!("transmit complete: {:?}", status);
        self.tx_status = Some(status);
    }

    /// Handle events that arrived while a transmission was in progress.
    fn drain_deferred_events(&mut self) {
        if self.state_machine_running {
            return;
        }

        while let Some(event) = self.deferred_events.pop_front() {
            self.handle_event(event);
        }
    }

    /// The port configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The driver of the port controller.
    pub fn driver(&mut self) -> &mut DRIVER {
        &mut self.driver
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The name of the current state.
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// The supply voltage of the contract in effect.
    pub fn voltage(&self) -> ElectricPotential {
        self.supply_voltage
    }

    /// The current limit of the contract in effect.
    pub fn current(&self) -> ElectricCurrent {
        self.current_limit
    }

    /// The voltage that was last requested from the partner.
    pub fn requested_voltage(&self) -> ElectricPotential {
        self.req_supply_voltage
    }

    /// The current that was last requested from the partner.
    pub fn requested_current(&self) -> ElectricCurrent {
        self.req_current_limit
    }

    /// The cable orientation.
    pub fn orientation(&self) -> Orientation {
        match (self.attached, self.polarity) {
            (false, _) => Orientation::None,
            (true, Polarity::Cc1) => Orientation::Normal,
            (true, Polarity::Cc2) => Orientation::Reverse,
        }
    }

    /// The negotiated PD specification revision.
    pub fn pd_revision(&self) -> SpecificationRevision {
        self.negotiated_rev
    }

    /// The current power role.
    pub fn power_role(&self) -> PowerRole {
        self.power_role
    }

    /// The current data role.
    pub fn data_role(&self) -> DataRole {
        self.data_role
    }

    /// Whether a partner is connected and the port reached a ready state.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether the partner ever answered with PD communication.
    pub fn is_pd_capable(&self) -> bool {
        self.pd_capable
    }

    /// Whether an explicit contract is in effect.
    pub fn has_explicit_contract(&self) -> bool {
        self.explicit_contract
    }

    /// The source capabilities that the partner advertised last.
    pub fn partner_source_caps(&self) -> &PdoList {
        &self.source_caps
    }

    /// The sink capabilities that the partner advertised last.
    pub fn partner_sink_caps(&self) -> &PdoList {
        &self.sink_caps
    }

    // CC line predicates.

    /// Exactly one CC line reads Rd.
    fn port_is_source(&self) -> bool {
        self.cc1.is_rd() != self.cc2.is_rd()
    }

    /// Exactly one CC line reads Rp.
    fn port_is_sink(&self) -> bool {
        self.cc1.is_rp() != self.cc2.is_rp()
    }

    fn port_is_disconnected(&self) -> bool {
        if self.attached {
            match self.polarity {
                Polarity::Cc1 => self.cc1.is_open(),
                Polarity::Cc2 => self.cc2.is_open(),
            }
        } else {
            self.cc1.is_open() && self.cc2.is_open()
        }
    }

    // Role dependent target states.

    fn default_state(&self) -> State {
        match (self.config.port_type, self.config.try_power_role) {
            (PortType::DualRole, Some(PowerRole::Sink)) => State::SnkUnattached,
            (PortType::DualRole, Some(PowerRole::Source)) => State::SrcUnattached,
            (PortType::Sink, _) => State::SnkUnattached,
            _ => State::SrcUnattached,
        }
    }

    fn unattached_state(&self) -> State {
        match self.config.port_type {
            PortType::DualRole => match self.power_role {
                PowerRole::Source => State::SrcUnattached,
                PowerRole::Sink => State::SnkUnattached,
            },
            PortType::Source => State::SrcUnattached,
            PortType::Sink => State::SnkUnattached,
        }
    }

    fn ready_state(&self) -> State {
        match self.power_role {
            PowerRole::Source => State::SrcReady,
            PowerRole::Sink => State::SnkReady,
        }
    }

    /// Where to go when a hard reset is due.
    fn hard_reset_state(&self) -> State {
        if !self.hard_reset_count.is_exhausted() {
            State::HardResetSend
        } else if self.pd_capable {
            State::ErrorRecovery
        } else if self.power_role == PowerRole::Source {
            State::SrcUnattached
        } else if self.state == State::SnkWaitCapabilities {
            State::SnkReady
        } else {
            State::SnkUnattached
        }
    }

    /// Where a debounced sink attach leads, without recording a Try.SRC attempt.
    fn sink_attach_target(&self) -> State {
        if self.config.port_type == PortType::DualRole
            && self.config.try_power_role == Some(PowerRole::Source)
            && !self.try_src_attempted
        {
            State::SrcUnattached
        } else {
            State::SnkAttached
        }
    }

    /// Resolve a debounced sink attach, recording a Try.SRC attempt.
    fn take_sink_attach_target(&mut self) -> State {
        let target = self.sink_attach_target();
        if target == State::SrcUnattached {
            info!("sink attach, trying source role first");
            self.try_src_attempted = true;
        }

        target
    }

    /// The Rp termination that advertises the current of the vSafe5V source PDO.
    fn rp_cc(&self) -> CcState {
        let current = self.config.source_pdos.pdos().iter().find_map(|pdo| match pdo {
            PowerDataObject::FixedSupply(supply)
                if supply.voltage() == ElectricPotential::new::<millivolt>(VSAFE_5V_MILLIVOLTS) =>
            {
                Some(supply.max_current().get::<milliampere>())
            }
            _ => None,
        });

        match current {
            Some(ma) if ma >= 3000 => CcState::Rp3_0,
            Some(ma) if ma >= 1500 => CcState::Rp1_5,
            _ => CcState::RpDefault,
        }
    }

    /// The Type-C current that the partner's Rp advertises.
    fn type_c_current_limit(&self) -> ElectricCurrent {
        let cc = match self.polarity {
            Polarity::Cc1 => self.cc1,
            Polarity::Cc2 => self.cc2,
        };

        let ma = match cc {
            CcState::Rp1_5 => 1500,
            CcState::Rp3_0 => 3000,
            _ => 0,
        };

        ElectricCurrent::new::<milliampere>(ma)
    }

    // Driver wrappers that keep track of the resulting port status.

    fn set_cc(&mut self, cc: CcState) -> Result<(), DriverError> {
        debug!("cc:={:?}", cc);
        self.cc_req = cc;
        self.driver.set_cc(cc)
    }

    fn set_polarity(&mut self, polarity: Polarity) -> Result<(), DriverError> {
        self.driver.set_polarity(polarity)?;
        self.polarity = polarity;
        Ok(())
    }

    fn set_vconn(&mut self, enable: bool) -> Result<(), DriverError> {
        debug!("vconn:={}", enable as u8);
        self.driver.set_vconn(enable)?;
        self.vconn_role = PowerRole::from(enable);
        Ok(())
    }

    fn set_vbus(&mut self, enable: bool) -> Result<(), DriverError> {
        debug!("vbus:={} charge={}", enable as u8, self.vbus_charge as u8);
        if enable && self.vbus_charge {
            return Err(DriverError::InvalidArgument);
        }

        self.driver.set_vbus(enable, self.vbus_charge)?;
        self.vbus_source = enable;
        Ok(())
    }

    fn set_charge(&mut self, charge: bool) -> Result<(), DriverError> {
        if charge && self.vbus_source {
            return Err(DriverError::InvalidArgument);
        }

        if charge != self.vbus_charge {
            debug!("vbus={} charge:={}", self.vbus_source as u8, charge as u8);
            self.driver.set_vbus(self.vbus_source, charge)?;
        }

        self.vbus_charge = charge;
        Ok(())
    }

    fn set_roles(&mut self, attached: bool, power_role: PowerRole, data_role: DataRole) -> Result<(), DriverError> {
        self.driver.set_roles(attached, power_role, data_role)?;
        self.power_role = power_role;
        self.data_role = data_role;
        Ok(())
    }

    fn set_attached_state(&mut self, attached: bool) -> Result<(), DriverError> {
        self.set_roles(attached, self.power_role, self.data_role)
    }

    fn set_current_limit(&mut self, current: ElectricCurrent, voltage: ElectricPotential) {
        debug!(
            "setting voltage/current limit {} mV {} mA",
            voltage.get::<millivolt>(),
            current.get::<milliampere>()
        );
        self.current_limit = current;
        self.supply_voltage = voltage;
    }

    fn start_toggling(&mut self, cc: CcState) -> bool {
        self.driver.start_toggling(self.config.port_type, cc)
    }

    // Attach and detach.

    fn src_attach(&mut self) -> Result<(), DriverError> {
        if self.attached {
            return Ok(());
        }

        let polarity = if self.cc2.is_rd() { Polarity::Cc2 } else { Polarity::Cc1 };
        self.set_polarity(polarity)?;
        self.set_roles(true, PowerRole::Source, DataRole::Dfp)?;
        self.driver.set_pd_rx(true)?;

        let other = match polarity {
            Polarity::Cc1 => self.cc2,
            Polarity::Cc2 => self.cc1,
        };
        if other == CcState::Ra {
            if let Err(error) = self.set_vconn(true) {
                if let Err(error) = self.driver.set_pd_rx(false) {
                    warn!("failed to disable PD reception: {:?}", error);
                }
                return Err(error);
            }
        }

        if let Err(error) = self.set_vbus(true) {
            if let Err(error) = self.set_vconn(false) {
                warn!("failed to disable VCONN: {:?}", error);
            }
            if let Err(error) = self.driver.set_pd_rx(false) {
                warn!("failed to disable PD reception: {:?}", error);
            }
            return Err(error);
        }

        self.pd_capable = false;
        self.attached = true;
        self.try_src_attempted = false;
        Ok(())
    }

    fn snk_attach(&mut self) -> Result<(), DriverError> {
        if self.attached {
            return Ok(());
        }

        let polarity = if self.cc2.is_open() { Polarity::Cc1 } else { Polarity::Cc2 };
        self.set_polarity(polarity)?;
        self.set_roles(true, PowerRole::Sink, DataRole::Ufp)?;

        self.pd_capable = false;
        self.attached = true;
        self.try_src_attempted = false;
        Ok(())
    }

    fn reset_port(&mut self) {
        debug!("reset port");
        self.attached = false;
        self.pd_capable = false;
        self.rx_msgid = None;

        if let Err(error) = self.driver.set_pd_rx(false) {
            warn!("failed to disable PD reception: {:?}", error);
        }
        if let Err(error) = self.driver.set_vbus(false, false) {
            warn!("failed to disable VBUS: {:?}", error);
        }
        self.vbus_source = false;
        self.vbus_charge = false;
        if let Err(error) = self.set_vconn(false) {
            warn!("failed to disable VCONN: {:?}", error);
        }
        self.set_current_limit(
            ElectricCurrent::new::<milliampere>(0),
            ElectricPotential::new::<millivolt>(0),
        );
        if let Err(error) = self.set_polarity(Polarity::Cc1) {
            warn!("failed to reset polarity: {:?}", error);
        }
        if let Err(error) = self.set_attached_state(false) {
            warn!("failed to reset roles: {:?}", error);
        }

        self.sink_caps = PdoList::new();
        self.connected = false;
    }

    fn detach(&mut self) {
        if self.port_is_disconnected() {
            self.hard_reset_count.reset();
        }

        if self.attached {
            self.reset_port();
        }
    }

    fn reset_message_ids(&mut self) {
        self.message_id.reset();
        self.rx_msgid = None;
    }

    // Event entry points.

    /// Handle new CC line readings.
    pub fn cc_change(&mut self, cc1: CcState, cc2: CcState) {
        let (old_cc1, old_cc2) = (self.cc1, self.cc2);
        self.cc1 = cc1;
        self.cc2 = cc2;
        let changed = cc1 != old_cc1 || cc2 != old_cc2;

        debug!(
            "CC1: {:?} -> {:?}, CC2: {:?} -> {:?} [state {}, polarity {:?}, {}]",
            old_cc1,
            cc1,
            old_cc2,
            cc2,
            self.state,
            self.polarity,
            if self.port_is_disconnected() { "disconnected" } else { "connected" }
        );

        match self.state {
            State::Toggling => {
                if self.port_is_source() && self.config.can_source() {
                    self.set_state(State::SrcAttachWait, 0);
                } else if self.port_is_sink() && self.config.can_sink() {
                    self.set_state(State::SnkAttachWait, 0);
                }
            }
            State::SrcUnattached => {
                if self.port_is_source() {
                    self.set_state(State::SrcAttachWait, 0);
                }
            }
            State::SrcAttachWait => {
                if self.port_is_disconnected() {
                    self.set_state(State::SrcUnattached, 0);
                } else if changed {
                    self.set_state(State::SrcAttachWait, 0);
                }
            }
            State::SrcAttached | State::SrcSendCapabilities | State::SrcReady => {
                if self.port_is_disconnected() || !self.port_is_source() {
                    self.set_state(State::SrcUnattached, 0);
                }
            }
            State::SnkUnattached => {
                if self.port_is_sink() {
                    self.set_state(State::SnkAttachWait, 0);
                }
            }
            State::SnkAttachWait => {
                let next = if cc1.is_open() != cc2.is_open() {
                    State::SnkDebounced
                } else if self.port_is_disconnected() {
                    State::SnkUnattached
                } else {
                    return;
                };

                if Some(next) != self.delayed_state() {
                    self.set_state(State::SnkAttachWait, 0);
                }
            }
            State::SnkDebounced => {
                let next = if self.port_is_disconnected() {
                    State::SnkUnattached
                } else if self.vbus_present {
                    self.sink_attach_target()
                } else {
                    State::SnkUnattached
                };

                if Some(next) != self.delayed_state() {
                    self.set_state(State::SnkDebounced, 0);
                }
            }
            State::SnkReady => {
                if self.port_is_disconnected() {
                    self.set_state(self.unattached_state(), 0);
                } else if !self.pd_capable && changed {
                    self.set_current_limit(
                        self.type_c_current_limit(),
                        ElectricPotential::new::<millivolt>(VSAFE_5V_MILLIVOLTS),
                    );
                }
            }
            State::SnkDiscovery => {
                if self.port_is_disconnected() {
                    self.set_state(State::SnkDiscoveryDebounce, 0);
                }
            }
            State::SnkDiscoveryDebounce | State::PortReset | State::PortResetWaitOff => (),
            _ => {
                if self.port_is_disconnected() {
                    self.set_state(self.unattached_state(), 0);
                }
            }
        }
    }

    /// Handle a change of VBUS presence.
    pub fn vbus_change(&mut self, present: bool) {
        debug!("VBUS {} [state {}]", if present { "on" } else { "off" }, self.state);
        self.vbus_present = present;

        if present {
            match self.state {
                State::SnkTransitionSinkVbus => {
                    self.set_current_limit(self.req_current_limit, self.req_supply_voltage);
                    self.explicit_contract = true;
                    self.set_state(State::SnkReady, 0);
                }
                State::SnkDiscovery => self.set_state(State::SnkDiscovery, 0),
                State::SnkDebounced => {
                    let target = self.take_sink_attach_target();
                    self.set_state(target, 0);
                }
                State::SnkHardResetWaitVbus => self.set_state(State::SnkHardResetSinkOn, 0),
                State::SrcAttached | State::SrcHardResetVbusOn => self.set_state(State::SrcStartup, 0),
                _ => (),
            }
        } else {
            self.vbus_never_low = false;

            match self.state {
                State::SnkHardResetSinkOff => self.set_state(State::SnkHardResetWaitVbus, 0),
                State::PortResetWaitOff => self.set_state(self.default_state(), 0),
                State::HardResetSend
                | State::SnkAttachWait
                | State::SnkDebounced
                | State::SnkNegotiateCapabilities
                | State::PortReset => (),
                _ => {
                    if self.power_role == PowerRole::Sink && self.attached {
                        self.set_state(State::SnkUnattached, 0);
                    }
                }
            }
        }
    }

    /// Handle hard reset signaling from the partner.
    pub fn pd_hard_reset(&mut self) {
        debug!("received hard reset [state {}]", self.state);

        if matches!(self.state, State::PortReset | State::PortResetWaitOff) {
            return;
        }

        if self.hard_reset_count.is_exhausted() {
            self.set_state(State::ErrorRecovery, 0);
        } else {
            self.set_state(State::HardResetStart, 0);
        }
    }
}
