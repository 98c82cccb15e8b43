//! Request data objects (RDOs), sent by a sink to select one of the source's PDOs.
use proc_bitfield::bitfield;
use uom::si::electric_current::centiampere;

use crate::_250milliwatts_mod::_250milliwatts;
use crate::units::{ElectricCurrent, Power};

bitfield! {
    /// The fields that all request data objects share.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RawRequest(pub u32): Debug, FromStorage, IntoStorage {
        /// Valid range 1..=7
        pub object_position: u8 @ 28..=31,
        /// Capability mismatch
        pub capability_mismatch: bool @ 26,
        /// USB communications capable
        pub usb_communications_capable: bool @ 25,
        /// No USB Suspend
        pub no_usb_suspend: bool @ 24,
    }
}

bitfield! {
    /// Request for a fixed or variable supply.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FixedVariableSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Valid range 1..=7
        pub object_position: u8 @ 28..=31,
        /// GiveBack flag
        pub giveback_flag: bool @ 27,
        /// Capability mismatch
        pub capability_mismatch: bool @ 26,
        /// USB communications capable
        pub usb_communications_capable: bool @ 25,
        /// No USB Suspend
        pub no_usb_suspend: bool @ 24,
        /// Operating current in 10 mA units
        pub raw_operating_current: u16 @ 10..=19,
        /// Maximum operating current in 10 mA units
        pub raw_max_operating_current: u16 @ 0..=9,
    }
}

impl FixedVariableSupply {
    /// The operating current.
    pub fn operating_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_operating_current().into())
    }

    /// The maximum operating current.
    pub fn max_operating_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_operating_current().into())
    }

    /// Set the operating current, truncated to 10 mA.
    pub fn with_operating_current(self, current: ElectricCurrent) -> Self {
        self.with_raw_operating_current(current.get::<centiampere>() as u16)
    }

    /// Set the maximum operating current, truncated to 10 mA.
    pub fn with_max_operating_current(self, current: ElectricCurrent) -> Self {
        self.with_raw_max_operating_current(current.get::<centiampere>() as u16)
    }
}

bitfield! {
    /// Request for a battery supply.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Battery(pub u32): Debug, FromStorage, IntoStorage {
        /// Valid range 1..=7
        pub object_position: u8 @ 28..=31,
        /// GiveBack flag
        pub giveback_flag: bool @ 27,
        /// Capability mismatch
        pub capability_mismatch: bool @ 26,
        /// USB communications capable
        pub usb_communications_capable: bool @ 25,
        /// No USB Suspend
        pub no_usb_suspend: bool @ 24,
        /// Operating power in 250mW units
        pub raw_operating_power: u16 @ 10..=19,
        /// Maximum operating power in 250mW units
        pub raw_max_operating_power: u16 @ 0..=9,
    }
}

impl Battery {
    /// The operating power.
    pub fn operating_power(&self) -> Power {
        Power::new::<_250milliwatts>(self.raw_operating_power().into())
    }

    /// The maximum operating power.
    pub fn max_operating_power(&self) -> Power {
        Power::new::<_250milliwatts>(self.raw_max_operating_power().into())
    }

    /// Set the operating power, truncated to 250 mW.
    pub fn with_operating_power(self, power: Power) -> Self {
        self.with_raw_operating_power(power.get::<_250milliwatts>() as u16)
    }

    /// Set the maximum operating power, truncated to 250 mW.
    pub fn with_max_operating_power(self, power: Power) -> Self {
        self.with_raw_max_operating_power(power.get::<_250milliwatts>() as u16)
    }
}

#[cfg(test)]
mod tests {
    use uom::si::electric_current::milliampere;
    use uom::si::power::milliwatt;

    use super::*;

    #[test]
    fn test_fixed_request_layout() {
        let rdo = FixedVariableSupply(0)
            .with_object_position(1)
            .with_usb_communications_capable(true)
            .with_no_usb_suspend(true)
            .with_operating_current(ElectricCurrent::new::<milliampere>(1500))
            .with_max_operating_current(ElectricCurrent::new::<milliampere>(1500));

        assert_eq!(rdo.0, 0x1302_5896);
        assert_eq!(RawRequest(rdo.0).object_position(), 1);
        assert_eq!(rdo.operating_current(), ElectricCurrent::new::<milliampere>(1500));
    }

    #[test]
    fn test_battery_request_power() {
        let rdo = Battery(0)
            .with_object_position(3)
            .with_operating_power(Power::new::<milliwatt>(15000))
            .with_max_operating_power(Power::new::<milliwatt>(20000));

        assert_eq!(rdo.raw_operating_power(), 60);
        assert_eq!(rdo.raw_max_operating_power(), 80);
        assert_eq!(rdo.max_operating_power(), Power::new::<milliwatt>(20000));
    }
}
