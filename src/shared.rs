//! A port that can be shared between contexts.
//!
//! Every entry point locks the port for a full state machine run, so that events from different contexts
//! (e.g. an interrupt handler and a polling loop) are serialized instead of interleaved.
use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::port::{Orientation, Port, State};
use crate::timers::Timer;
use crate::units::{ElectricCurrent, ElectricPotential};
use crate::{CcState, DataRole, Driver, DriverEvent, PowerRole, TransmitStatus};

/// A mutex-guarded port.
pub struct SharedPort<M: RawMutex, DRIVER: Driver, TIMER: Timer> {
    port: Mutex<M, RefCell<Port<DRIVER, TIMER>>>,
}

impl<M: RawMutex, DRIVER: Driver, TIMER: Timer> SharedPort<M, DRIVER, TIMER> {
    /// Wrap a port.
    pub fn new(port: Port<DRIVER, TIMER>) -> Self {
        Self {
            port: Mutex::new(RefCell::new(port)),
        }
    }

    /// Run a closure with exclusive access to the port.
    pub fn lock<R>(&self, f: impl FnOnce(&mut Port<DRIVER, TIMER>) -> R) -> R {
        self.port.lock(|port| f(&mut *port.borrow_mut()))
    }

    /// See [`Port::cc_change`].
    pub fn cc_change(&self, cc1: CcState, cc2: CcState) {
        self.lock(|port| port.cc_change(cc1, cc2));
    }

    /// See [`Port::vbus_change`].
    pub fn vbus_change(&self, present: bool) {
        self.lock(|port| port.vbus_change(present));
    }

    /// See [`Port::pd_receive`].
    pub fn pd_receive(&self, bytes: &[u8]) {
        self.lock(|port| port.pd_receive(bytes));
    }

    /// See [`Port::pd_hard_reset`].
    pub fn pd_hard_reset(&self) {
        self.lock(|port| port.pd_hard_reset());
    }

    /// See [`Port::pd_transmit_complete`].
    pub fn pd_transmit_complete(&self, status: TransmitStatus) {
        self.lock(|port| port.pd_transmit_complete(status));
    }

    /// See [`Port::handle_event`].
    pub fn handle_event(&self, event: DriverEvent) {
        self.lock(|port| port.handle_event(event));
    }

    /// See [`Port::process_events`].
    pub fn process_events(&self) {
        self.lock(|port| port.process_events());
    }

    /// See [`Port::run_delayed_work`].
    pub fn run_delayed_work(&self) {
        self.lock(|port| port.run_delayed_work());
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.lock(|port| port.state())
    }

    /// The supply voltage of the contract in effect.
    pub fn voltage(&self) -> ElectricPotential {
        self.lock(|port| port.voltage())
    }

    /// The current limit of the contract in effect.
    pub fn current(&self) -> ElectricCurrent {
        self.lock(|port| port.current())
    }

    /// The cable orientation.
    pub fn orientation(&self) -> Orientation {
        self.lock(|port| port.orientation())
    }

    /// The current power role.
    pub fn power_role(&self) -> PowerRole {
        self.lock(|port| port.power_role())
    }

    /// The current data role.
    pub fn data_role(&self) -> DataRole {
        self.lock(|port| port.data_role())
    }

    /// Whether a partner is connected.
    pub fn is_connected(&self) -> bool {
        self.lock(|port| port.is_connected())
    }

    /// Unwrap the port.
    pub fn into_inner(self) -> Port<DRIVER, TIMER> {
        self.port.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use uom::si::electric_current::milliampere;

    use super::*;
    use crate::config::Config;
    use crate::dummy::{DummyDriver, DummyTimer};

    #[test]
    fn test_shared_attach() {
        let driver = DummyDriver::source();
        let config = Config::from_connector(&driver.connector_config()).unwrap();
        let port = Port::new(driver, config).unwrap();
        let shared: SharedPort<NoopRawMutex, _, DummyTimer> = SharedPort::new(port);

        shared.lock(|port| port.init());
        assert_eq!(shared.state(), State::SrcUnattached);
        assert_eq!(shared.orientation(), Orientation::None);

        shared.cc_change(CcState::Open, CcState::Rd);
        assert_eq!(shared.state(), State::SrcAttachWait);

        DummyTimer::advance_millis(200);
        shared.run_delayed_work();
        assert_eq!(shared.state(), State::SrcAttached);
        assert_eq!(shared.orientation(), Orientation::Reverse);
        assert_eq!(shared.power_role(), PowerRole::Source);

        let port = shared.into_inner();
        assert_eq!(port.current().get::<milliampere>(), 0);
    }
}
