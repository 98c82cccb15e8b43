//! The state machine engine: transitions, the run loop, and the per-state entry actions.
use uom::si::electric_potential::millivolt;

use super::{DelayedState, Port, State};
use crate::message::header::ControlMessageType;
use crate::message::pdo::VSAFE_5V_MILLIVOLTS;
use crate::negotiator;
use crate::timers::{Deadline, Timer, TimerType};
use crate::units::ElectricPotential;
use crate::{CcState, DataRole, Driver, PortType, PowerRole, SpecificationRevision};

/// Number of queued messages that are sent in one go, before assuming a runaway loop.
const QUEUED_SEND_LIMIT: u32 = 100;

/// The outcome of a state's entry action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Transition {
    /// Remain in the current state.
    Stay,
    /// Move to a state immediately.
    Now(State),
    /// Move to a state after a delay.
    After(State, u32),
    /// Move to a state after a delay, unless the state changed in the meantime.
    AfterIfUnchanged(State, u32),
}

impl Transition {
    fn after(state: State, timer_type: TimerType) -> Self {
        Transition::After(state, timer_type.millis())
    }

    fn after_if_unchanged(state: State, timer_type: TimerType) -> Self {
        Transition::AfterIfUnchanged(state, timer_type.millis())
    }
}

impl<DRIVER: Driver, TIMER: Timer> Port<DRIVER, TIMER> {
    /// Move to a state, either now or after `delay_ms`.
    ///
    /// An immediate transition runs the state machine, unless it is already running. Any pending delayed
    /// transition is replaced.
    pub(super) fn set_state(&mut self, next: State, delay_ms: u32) {
        if delay_ms > 0 {
            debug!("pending state change {} -> {} @ {} ms", self.state, next, delay_ms);
            self.delayed = Some(DelayedState {
                state: next,
                deadline: Deadline::after_millis::<TIMER>(delay_ms),
            });
        } else {
            debug!("state change {} -> {}", self.state, next);
            self.delayed = None;
            self.prev_state = self.state;
            self.state = next;

            if !self.state_machine_running {
                self.run_state_machine();
            }
        }
    }

    /// Like [`Port::set_state`], but only if the state did not change since the current entry action began.
    pub(super) fn set_state_if_unchanged(&mut self, next: State, delay_ms: u32) {
        if self.enter_state == self.state {
            self.set_state(next, delay_ms);
        } else {
            debug!("skipped state change {} -> {} [{} ms]", self.state, next, delay_ms);
        }
    }

    /// The target of the pending delayed transition.
    pub(super) fn delayed_state(&self) -> Option<State> {
        self.delayed.map(|delayed| delayed.state)
    }

    /// The state before the last transition.
    pub fn previous_state(&self) -> State {
        self.prev_state
    }

    /// Fire the pending delayed transition, if its deadline passed.
    pub fn run_delayed_work(&mut self) {
        let Some(delayed) = self.delayed else {
            return;
        };

        if !delayed.deadline.is_elapsed::<TIMER>() {
            return;
        }

        debug!(
            "state change {} -> {} [delayed {} ms]",
            self.state,
            delayed.state,
            delayed.deadline.delay_ms()
        );
        self.delayed = None;
        self.prev_state = self.state;
        self.state = delayed.state;

        if !self.state_machine_running {
            self.run_state_machine();
        }
    }

    /// Run entry actions for as long as the state changes immediately.
    pub(super) fn run_state_machine(&mut self) {
        self.state_machine_running = true;
        self.send_queued_messages();

        loop {
            let prev = self.state;
            self.enter_state = self.state;

            let transition = self.run_state();
            self.apply(transition);
            self.send_queued_messages();

            if self.state == prev || self.delayed.is_some() {
                break;
            }
        }

        self.state_machine_running = false;
        self.drain_deferred_events();
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Stay => (),
            Transition::Now(state) => self.set_state(state, 0),
            Transition::After(state, delay_ms) => self.set_state(state, delay_ms),
            Transition::AfterIfUnchanged(state, delay_ms) => self.set_state_if_unchanged(state, delay_ms),
        }
    }

    /// Send the queued message, and any message that sending it queued in turn.
    pub(super) fn send_queued_messages(&mut self) {
        let mut count = 0;

        while let Some(message) = self.queued_message.take() {
            count += 1;
            if count > QUEUED_SEND_LIMIT {
                error!("recursion?");
                break;
            }

            if let Err(error) = self.send_queued_message(message) {
                warn!("failed to send queued {:?}: {}", message, error);
            }
        }
    }

    /// Execute the entry action of the current state.
    fn run_state(&mut self) -> Transition {
        match self.state {
            State::Toggling | State::SrcWaitNewCapabilities => Transition::Stay,

            State::SrcUnattached => self.unattached(PowerRole::Source),
            State::SrcAttachWait => {
                if self.port_is_source() {
                    Transition::after(State::SrcAttached, TimerType::CcDebounce)
                } else {
                    Transition::Stay
                }
            }
            State::SrcAttached => match self.src_attach() {
                Ok(()) => Transition::after(State::SrcUnattached, TimerType::PsSourceOn),
                Err(error) => {
                    warn!("source attach failed: {:?}", error);
                    Transition::Now(State::SrcUnattached)
                }
            },
            State::SrcStartup => {
                self.caps_count.reset();
                self.negotiated_rev = SpecificationRevision::R3_0;
                self.reset_message_ids();
                self.explicit_contract = false;
                Transition::Now(State::SrcSendCapabilities)
            }
            State::SrcSendCapabilities => self.src_send_capabilities(),
            State::SrcSendCapabilitiesTimeout => self.src_send_capabilities_timeout(),
            State::SrcNegotiateCapabilities => self.src_negotiate_capabilities(),
            State::SrcTransitionSupply => {
                if let Err(error) = self.send_control(ControlMessageType::PsRdy) {
                    warn!("failed to send PS_RDY: {}", error);
                }
                self.explicit_contract = true;
                self.set_current_limit(self.req_current_limit, self.req_supply_voltage);
                Transition::AfterIfUnchanged(State::SrcReady, 0)
            }
            State::SrcReady | State::SnkReady => {
                self.hard_reset_count.reset();
                self.connected = true;
                Transition::Stay
            }

            State::SnkUnattached => self.unattached(PowerRole::Sink),
            State::SnkAttachWait => {
                if self.cc1.is_open() != self.cc2.is_open() {
                    Transition::after(State::SnkDebounced, TimerType::CcDebounce)
                } else if self.port_is_disconnected() {
                    Transition::after(State::SnkUnattached, TimerType::PdDebounce)
                } else {
                    Transition::Stay
                }
            }
            State::SnkDebounced => {
                if self.port_is_disconnected() {
                    Transition::after(State::SnkUnattached, TimerType::PdDebounce)
                } else if self.vbus_present {
                    Transition::Now(self.take_sink_attach_target())
                } else {
                    Transition::after(State::PortReset, TimerType::PsSourceOn)
                }
            }
            State::SnkAttached => match self.snk_attach() {
                Ok(()) => Transition::Now(State::SnkStartup),
                Err(error) => {
                    warn!("sink attach failed: {:?}", error);
                    Transition::Now(State::SnkUnattached)
                }
            },
            State::SnkStartup => {
                self.negotiated_rev = SpecificationRevision::R3_0;
                self.reset_message_ids();
                self.explicit_contract = false;
                Transition::Now(State::SnkDiscovery)
            }
            State::SnkDiscovery => {
                if self.vbus_present {
                    self.set_current_limit(
                        self.type_c_current_limit(),
                        ElectricPotential::new::<millivolt>(VSAFE_5V_MILLIVOLTS),
                    );
                    if let Err(error) = self.set_charge(true) {
                        warn!("failed to enable charging: {:?}", error);
                    }
                    Transition::Now(State::SnkWaitCapabilities)
                } else if self.config.port_type == PortType::DualRole {
                    Transition::after(self.hard_reset_state(), TimerType::DbDetect)
                } else {
                    Transition::after(self.hard_reset_state(), TimerType::NoResponse)
                }
            }
            State::SnkDiscoveryDebounce => {
                Transition::after(State::SnkDiscoveryDebounceDone, TimerType::CcDebounce)
            }
            State::SnkDiscoveryDebounceDone => Transition::Now(self.unattached_state()),
            State::SnkWaitCapabilities => {
                if let Err(error) = self.driver.set_pd_rx(true) {
                    warn!("failed to enable PD reception: {:?}", error);
                    return Transition::Now(State::SnkReady);
                }

                // A contract may have survived from before boot. Try a soft reset once.
                if self.vbus_never_low {
                    self.vbus_never_low = false;
                    Transition::after(State::SoftResetSend, TimerType::SinkWaitCap)
                } else {
                    Transition::after(self.hard_reset_state(), TimerType::SinkWaitCap)
                }
            }
            State::SnkNegotiateCapabilities => {
                self.pd_capable = true;
                self.hard_reset_count.reset();

                match self.send_request() {
                    Ok(()) => Transition::after_if_unchanged(self.hard_reset_state(), TimerType::SenderResponse),
                    Err(error) => {
                        warn!("failed to send request: {}", error);
                        Transition::Now(State::SnkWaitCapabilities)
                    }
                }
            }
            State::SnkTransitionSink | State::SnkTransitionSinkVbus => {
                Transition::after_if_unchanged(self.hard_reset_state(), TimerType::PsTransition)
            }

            State::HardResetSend => {
                if let Err(error) = self.transmit_hard_reset() {
                    warn!("failed to send hard reset: {}", error);
                }
                Transition::Now(State::HardResetStart)
            }
            State::HardResetStart => {
                if let Err(error) = self.hard_reset_count.increment() {
                    warn!("hard reset count {:?} at {}", error, self.hard_reset_count.value());
                }
                if let Err(error) = self.driver.set_pd_rx(false) {
                    warn!("failed to disable PD reception: {:?}", error);
                }
                self.sink_caps = Default::default();

                match self.power_role {
                    PowerRole::Source => Transition::after(State::SrcHardResetVbusOff, TimerType::PsHardReset),
                    PowerRole::Sink => Transition::Now(State::SnkHardResetSinkOff),
                }
            }
            State::SrcHardResetVbusOff => {
                let result = self
                    .set_vconn(true)
                    .and_then(|_| self.set_vbus(false))
                    .and_then(|_| self.set_roles(false, PowerRole::Source, DataRole::Dfp));
                if let Err(error) = result {
                    warn!("hard reset, failed to turn off VBUS: {:?}", error);
                }
                Transition::after(State::SrcHardResetVbusOn, TimerType::SrcRecover)
            }
            State::SrcHardResetVbusOn => {
                let result = self
                    .set_vconn(true)
                    .and_then(|_| self.set_vbus(true))
                    .and_then(|_| self.driver.set_pd_rx(true))
                    .and_then(|_| self.set_attached_state(true));
                if let Err(error) = result {
                    warn!("hard reset, failed to turn on VBUS: {:?}", error);
                }
                Transition::after(State::SrcUnattached, TimerType::PsSourceOn)
            }
            State::SnkHardResetSinkOff => {
                let mut result = self.set_vconn(false);
                if self.pd_capable {
                    result = result.and_then(|_| self.set_charge(false));
                }
                if let Err(error) = result.and_then(|_| self.set_roles(false, PowerRole::Sink, DataRole::Ufp)) {
                    warn!("hard reset, failed to stop sinking: {:?}", error);
                }
                Transition::after(State::SnkHardResetSinkOn, TimerType::Safe0V)
            }
            State::SnkHardResetWaitVbus => Transition::After(
                State::SnkUnattached,
                TimerType::SrcRecoverMax.millis() + TimerType::SrcTurnOn.millis(),
            ),
            State::SnkHardResetSinkOn => {
                let mut result = Ok(());
                if self.pd_capable {
                    self.set_current_limit(
                        self.type_c_current_limit(),
                        ElectricPotential::new::<millivolt>(VSAFE_5V_MILLIVOLTS),
                    );
                    result = self.set_charge(true);
                }
                if let Err(error) = result.and_then(|_| self.set_attached_state(true)) {
                    warn!("hard reset, failed to restart sinking: {:?}", error);
                }
                Transition::Now(State::SnkStartup)
            }

            State::SoftReset => {
                self.reset_message_ids();
                if let Err(error) = self.send_control(ControlMessageType::Accept) {
                    warn!("failed to accept soft reset: {}", error);
                }

                match self.power_role {
                    PowerRole::Source => Transition::Now(State::SrcSendCapabilities),
                    PowerRole::Sink => Transition::Now(State::SnkWaitCapabilities),
                }
            }
            State::SoftResetSend => {
                self.reset_message_ids();

                match self.send_control(ControlMessageType::SoftReset) {
                    Ok(()) => Transition::after_if_unchanged(self.hard_reset_state(), TimerType::SenderResponse),
                    Err(error) => {
                        warn!("failed to send soft reset: {}", error);
                        Transition::Now(self.hard_reset_state())
                    }
                }
            }

            State::DrSwapAccept => {
                if let Err(error) = self.send_control(ControlMessageType::Accept) {
                    warn!("failed to accept data role swap: {}", error);
                }
                Transition::AfterIfUnchanged(State::DrSwapChangeDr, 0)
            }
            State::DrSwapChangeDr => {
                let data_role = match self.data_role {
                    DataRole::Dfp => DataRole::Ufp,
                    DataRole::Ufp => DataRole::Dfp,
                };
                if let Err(error) = self.set_roles(true, self.power_role, data_role) {
                    warn!("failed to swap data role: {:?}", error);
                }
                self.wait_dr_swap_message = false;
                Transition::Now(self.ready_state())
            }

            State::ErrorRecovery => Transition::Now(State::PortReset),
            State::PortReset => {
                self.reset_port();

                let cc = if self.config.self_powered {
                    CcState::Open
                } else if self.default_state() == State::SnkUnattached {
                    CcState::Rd
                } else {
                    self.rp_cc()
                };
                if let Err(error) = self.set_cc(cc) {
                    warn!("failed to set CC: {:?}", error);
                }

                if self.vbus_present {
                    Transition::after(State::PortResetWaitOff, TimerType::PsSourceOff)
                } else {
                    Transition::after(State::PortResetWaitOff, TimerType::ErrorRecovery)
                }
            }
            State::PortResetWaitOff => {
                if self.vbus_present {
                    Transition::after(self.default_state(), TimerType::PsSourceOn)
                } else {
                    Transition::Now(self.default_state())
                }
            }
        }
    }

    /// Entry action of both unattached states.
    fn unattached(&mut self, role: PowerRole) -> Transition {
        self.detach();

        let cc = match role {
            PowerRole::Source => self.rp_cc(),
            PowerRole::Sink => CcState::Rd,
        };

        if self.start_toggling(cc) {
            return Transition::Now(State::Toggling);
        }

        if let Err(error) = self.set_cc(cc) {
            warn!("failed to set CC: {:?}", error);
        }

        if self.config.port_type != PortType::DualRole {
            return Transition::Stay;
        }

        match role {
            PowerRole::Source => Transition::after(State::SnkUnattached, TimerType::DrpSrc),
            PowerRole::Sink => Transition::after(State::SrcUnattached, TimerType::DrpSnk),
        }
    }

    fn src_send_capabilities(&mut self) -> Transition {
        if self.caps_count.increment().is_err() {
            self.caps_count.reset();
            return Transition::Now(State::SrcSendCapabilitiesTimeout);
        }

        match self.send_source_caps() {
            Ok(()) => {
                self.caps_count.reset();
                self.pd_capable = true;
                Transition::after_if_unchanged(State::SrcSendCapabilitiesTimeout, TimerType::SendSourceCap)
            }
            Err(error) => {
                debug!("source capabilities not sent ({}), attempt {}", error, self.caps_count.value());
                Transition::after(State::SrcSendCapabilities, TimerType::SendSourceCap)
            }
        }
    }

    fn src_send_capabilities_timeout(&mut self) -> Transition {
        if !self.hard_reset_count.is_exhausted() {
            return Transition::Now(State::HardResetSend);
        }

        if self.negotiated_rev > SpecificationRevision::R2_0 {
            if let Some(revision) = self.negotiated_rev.previous() {
                info!("no response to source capabilities, lowering revision to {:?}", revision);
                self.negotiated_rev = revision;
            }
            self.hard_reset_count.reset();
            return Transition::Now(State::SrcSendCapabilities);
        }

        if self.pd_capable {
            Transition::Now(self.hard_reset_state())
        } else {
            Transition::Now(State::SrcReady)
        }
    }

    fn src_negotiate_capabilities(&mut self) -> Transition {
        match negotiator::check_request(self.sink_request, &self.config.source_pdos) {
            Ok(request) => {
                self.req_current_limit = request.current;
                self.req_supply_voltage = request.voltage;

                if let Err(error) = self.send_control(ControlMessageType::Accept) {
                    warn!("failed to accept request: {}", error);
                }
                Transition::after(State::SrcTransitionSupply, TimerType::SrcTransition)
            }
            Err(error) => {
                warn!("invalid request 0x{:x}: {}", self.sink_request, error);

                if let Err(error) = self.send_control(ControlMessageType::Reject) {
                    warn!("failed to reject request: {}", error);
                }

                if self.explicit_contract {
                    Transition::Now(State::SrcReady)
                } else {
                    Transition::Now(State::SrcWaitNewCapabilities)
                }
            }
        }
    }
}
