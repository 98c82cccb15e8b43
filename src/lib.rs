//! USB Type-C port manager with USB Power Delivery negotiation.
//!
//! The port manager sits on top of a Type-C port controller, which is accessed through the
//! [`Driver`] trait. It detects attach and detach on the CC lines, negotiates power contracts
//! as a source or a sink, swaps data roles, and recovers from protocol errors with soft and hard resets.
//!
//! The [`port::Port`] is purely reactive: events that the port controller reports are injected into it,
//! and protocol timeouts are expressed as delayed state transitions that the caller fires by
//! periodically calling [`port::Port::run_delayed_work`].
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[macro_use]
extern crate uom;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod counters;
pub mod message;
pub mod negotiator;
pub mod port;
pub mod shared;
pub mod timers;

#[cfg(test)]
mod dummy;

pub use tcpm_traits::{
    CcState, ConnectorConfig, DataRole, Driver, DriverError, DriverEvent, Polarity, PortType, PowerRole, RawMessage,
    SpecificationRevision, TransmitStatus, TransmitType,
};

/// Units used in USB PD.
///
/// Potentials are stored in millivolts, currents in milliamperes and power in microwatts.
#[allow(missing_docs)]
pub mod units {
    ISQ!(
        uom::si,
        u32,
        (millimeter, kilogram, second, milliampere, kelvin, mole, candela)
    );
}

mod _50millivolts_mod {
    unit! {
        system: uom::si;
        quantity: uom::si::electric_potential;

        @_50millivolts: 0.05; "_50mV", "_50millivolts", "_50millivolts";
    }
}

mod _50milliamperes_mod {
    unit! {
        system: uom::si;
        quantity: uom::si::electric_current;

        @_50milliamperes: 0.05; "_50mA", "_50milliamperes", "_50milliamperes";
    }
}

mod _250milliwatts_mod {
    unit! {
        system: uom::si;
        quantity: uom::si::power;

        @_250milliwatts: 0.25; "_250mW", "_250milliwatts", "_250milliwatts";
    }
}
