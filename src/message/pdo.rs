//! Power data objects (PDOs) and the rules that lists of them must follow.
//!
//! Source and sink capabilities share the voltage, current and power fields, so a single set of
//! types describes both. The flag bits of fixed supplies are only meaningful for source PDOs.
use byteorder::{ByteOrder, LittleEndian};
use heapless::Vec;
use proc_bitfield::bitfield;
use uom::si::electric_current::centiampere;
use uom::si::electric_potential::{decivolt, millivolt};

use crate::_50milliamperes_mod::_50milliamperes;
use crate::_50millivolts_mod::_50millivolts;
use crate::_250milliwatts_mod::_250milliwatts;
use crate::units::{ElectricCurrent, ElectricPotential, Power};

/// The maximum number of data objects in a message.
pub const PDO_MAX_OBJECTS: usize = 7;

/// The voltage of the mandatory first PDO, in millivolts.
pub const VSAFE_5V_MILLIVOLTS: u32 = 5000;

/// Capability list validation errors.
///
/// Variants are checked in declaration order; the first violated rule is reported.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PdoError {
    /// The list is empty.
    #[error("source/sink caps should at least have vSafe5V")]
    NoVsafe5v,
    /// The first entry is not a fixed 5 V supply.
    #[error("vSafe5V fixed supply object shall always be the first object")]
    Vsafe5vNotFirst,
    /// An entry has a lower type rank than its predecessor.
    #[error("PDOs should be in the following order: fixed; battery/variable; programmable")]
    TypeNotInOrder,
    /// Fixed supplies are not strictly increasing in voltage.
    #[error("fixed supply PDOs should be in strictly increasing order of their fixed voltage")]
    FixedNotSorted,
    /// Battery or variable supplies are not sorted by minimum voltage.
    #[error("variable/battery supply PDOs should be in increasing order of their minimum voltage")]
    VariableBatteryNotSorted,
    /// Two battery or variable supplies share minimum and maximum voltage.
    #[error("variable/battery supply PDOs cannot have the same min/max voltage")]
    DuplicatePdo,
    /// Programmable supplies are not sorted by maximum voltage.
    #[error("programmable power supply APDOs should be in increasing order of their maximum voltage")]
    PpsNotSorted,
    /// Two programmable supplies share voltage range and maximum current.
    #[error("programmable power supply APDOs cannot have the same min/max voltage and max current")]
    DuplicatePps,
    /// More entries than a message can carry.
    #[error("more than {PDO_MAX_OBJECTS} PDOs")]
    TooManyObjects,
}

/// Kinds of power data objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Kind {
    /// Fixed voltage supply.
    FixedSupply,
    /// Battery supply.
    Battery,
    /// Variable voltage supply.
    VariableSupply,
    /// Programmable power supply.
    Pps,
    /// Any other augmented PDO.
    Augmented,
}

impl Kind {
    /// Ordering rank of the kind within a capability list.
    ///
    /// Battery and variable supplies share a rank.
    pub fn rank(self) -> u8 {
        match self {
            Kind::FixedSupply => 0,
            Kind::Battery | Kind::VariableSupply => 1,
            Kind::Pps | Kind::Augmented => 2,
        }
    }
}

/// A power data object holds information about one type of power capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerDataObject {
    /// Fixed voltage supply.
    FixedSupply(FixedSupply),
    /// Battery supply.
    Battery(Battery),
    /// Variable voltage supply.
    VariableSupply(VariableSupply),
    /// SPR programmable power supply.
    Pps(SprProgrammablePowerSupply),
    /// Any other augmented PDO, kept raw.
    Augmented(u32),
}

bitfield! {
    /// A raw power data object.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct RawPowerDataObject(pub u32): Debug, FromStorage, IntoStorage {
        /// The kind of power data object.
        pub kind: u8 @ 30..=31,
        /// The kind of augmented power data object.
        pub augmented_kind: u8 @ 28..=29,
    }
}

impl From<u32> for PowerDataObject {
    fn from(raw: u32) -> Self {
        let pdo = RawPowerDataObject(raw);
        match (pdo.kind(), pdo.augmented_kind()) {
            (0b00, _) => Self::FixedSupply(FixedSupply(raw)),
            (0b01, _) => Self::Battery(Battery(raw)),
            (0b10, _) => Self::VariableSupply(VariableSupply(raw)),
            (_, 0b00) => Self::Pps(SprProgrammablePowerSupply(raw)),
            _ => Self::Augmented(raw),
        }
    }
}

impl From<PowerDataObject> for u32 {
    fn from(pdo: PowerDataObject) -> Self {
        match pdo {
            PowerDataObject::FixedSupply(x) => x.0,
            PowerDataObject::Battery(x) => x.0,
            PowerDataObject::VariableSupply(x) => x.0,
            PowerDataObject::Pps(x) => x.0,
            PowerDataObject::Augmented(x) => x,
        }
    }
}

impl PowerDataObject {
    /// The kind of this object.
    pub fn kind(&self) -> Kind {
        match self {
            Self::FixedSupply(_) => Kind::FixedSupply,
            Self::Battery(_) => Kind::Battery,
            Self::VariableSupply(_) => Kind::VariableSupply,
            Self::Pps(_) => Kind::Pps,
            Self::Augmented(_) => Kind::Augmented,
        }
    }

    /// Minimum and maximum voltage of non-augmented supplies.
    pub fn voltage_range(&self) -> Option<(ElectricPotential, ElectricPotential)> {
        match self {
            Self::FixedSupply(x) => Some((x.voltage(), x.voltage())),
            Self::Battery(x) => Some((x.min_voltage(), x.max_voltage())),
            Self::VariableSupply(x) => Some((x.min_voltage(), x.max_voltage())),
            Self::Pps(_) | Self::Augmented(_) => None,
        }
    }

    /// Maximum current of fixed and variable supplies.
    pub fn max_current(&self) -> Option<ElectricCurrent> {
        match self {
            Self::FixedSupply(x) => Some(x.max_current()),
            Self::VariableSupply(x) => Some(x.max_current()),
            _ => None,
        }
    }

    /// Maximum power of battery supplies.
    pub fn max_power(&self) -> Option<Power> {
        match self {
            Self::Battery(x) => Some(x.max_power()),
            _ => None,
        }
    }

    fn is_vsafe_5v(&self) -> bool {
        matches!(self, Self::FixedSupply(x) if x.voltage() == ElectricPotential::new::<millivolt>(VSAFE_5V_MILLIVOLTS))
    }
}

bitfield! {
    /// A fixed voltage supply PDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FixedSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Fixed supply
        pub kind: u8 @ 30..=31,
        /// Dual-role power
        pub dual_role_power: bool @ 29,
        /// USB suspend supported
        pub usb_suspend_supported: bool @ 28,
        /// Unconstrained power
        pub unconstrained_power: bool @ 27,
        /// USB communications capable
        pub usb_communications_capable: bool @ 26,
        /// Dual-role data
        pub dual_role_data: bool @ 25,
        /// Voltage in 50 mV units
        pub raw_voltage: u16 @ 10..=19,
        /// Maximum (source) or operational (sink) current in 10 mA units
        pub raw_max_current: u16 @ 0..=9,
    }
}

impl FixedSupply {
    /// A fixed supply with the given voltage and current.
    pub fn new(voltage: ElectricPotential, max_current: ElectricCurrent) -> Self {
        Self(0)
            .with_raw_voltage(voltage.get::<_50millivolts>() as u16)
            .with_raw_max_current(max_current.get::<centiampere>() as u16)
    }

    /// The fixed voltage.
    pub fn voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_voltage().into())
    }

    /// The maximum current.
    pub fn max_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_current().into())
    }
}

bitfield! {
    /// A battery supply PDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Battery(pub u32): Debug, FromStorage, IntoStorage {
        /// Battery
        pub kind: u8 @ 30..=31,
        /// Maximum Voltage in 50 mV units
        pub raw_max_voltage: u16 @ 20..=29,
        /// Minimum Voltage in 50 mV units
        pub raw_min_voltage: u16 @ 10..=19,
        /// Maximum Allowable Power in 250 mW units
        pub raw_max_power: u16 @ 0..=9,
    }
}

impl Battery {
    /// A battery supply with the given voltage range and power.
    pub fn new(min_voltage: ElectricPotential, max_voltage: ElectricPotential, max_power: Power) -> Self {
        Self(0)
            .with_kind(0b01)
            .with_raw_min_voltage(min_voltage.get::<_50millivolts>() as u16)
            .with_raw_max_voltage(max_voltage.get::<_50millivolts>() as u16)
            .with_raw_max_power(max_power.get::<_250milliwatts>() as u16)
    }

    /// The maximum voltage.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_max_voltage().into())
    }

    /// The minimum voltage.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_min_voltage().into())
    }

    /// The maximum power.
    pub fn max_power(&self) -> Power {
        Power::new::<_250milliwatts>(self.raw_max_power().into())
    }
}

bitfield! {
    /// A variable supply PDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct VariableSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Variable supply (non-battery)
        pub kind: u8 @ 30..=31,
        /// Maximum Voltage in 50mV units
        pub raw_max_voltage: u16 @ 20..=29,
        /// Minimum Voltage in 50mV units
        pub raw_min_voltage: u16 @ 10..=19,
        /// Maximum current in 10mA units
        pub raw_max_current: u16 @ 0..=9,
    }
}

impl VariableSupply {
    /// A variable supply with the given voltage range and current.
    pub fn new(min_voltage: ElectricPotential, max_voltage: ElectricPotential, max_current: ElectricCurrent) -> Self {
        Self(0)
            .with_kind(0b10)
            .with_raw_min_voltage(min_voltage.get::<_50millivolts>() as u16)
            .with_raw_max_voltage(max_voltage.get::<_50millivolts>() as u16)
            .with_raw_max_current(max_current.get::<centiampere>() as u16)
    }

    /// The maximum voltage.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_max_voltage().into())
    }

    /// The minimum voltage.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_min_voltage().into())
    }

    /// The maximum current.
    pub fn max_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_current().into())
    }
}

bitfield! {
    /// An SPR programmable power supply APDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SprProgrammablePowerSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Augmented power data object
        pub kind: u8 @ 30..=31,
        /// SPR programmable power supply
        pub supply: u8 @ 28..=29,
        /// PPS power limited
        pub pps_power_limited: bool @ 27,
        /// Maximum voltage in 100mV increments
        pub raw_max_voltage: u8 @ 17..=24,
        /// Minimum Voltage in 100mV increments
        pub raw_min_voltage: u8 @ 8..=15,
        /// Maximum Current in 50mA increments
        pub raw_max_current: u8 @ 0..=6,
    }
}

impl Default for SprProgrammablePowerSupply {
    fn default() -> Self {
        Self(0).with_kind(0b11).with_supply(0b00)
    }
}

impl SprProgrammablePowerSupply {
    /// The maximum voltage.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<decivolt>(self.raw_max_voltage().into())
    }

    /// The minimum voltage.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<decivolt>(self.raw_min_voltage().into())
    }

    /// The maximum current.
    pub fn max_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<_50milliamperes>(self.raw_max_current().into())
    }
}

/// Check a capability list against the ordering and uniqueness rules of the PD specification.
pub fn validate(pdos: &[PowerDataObject]) -> Result<(), PdoError> {
    let first = pdos.first().ok_or(PdoError::NoVsafe5v)?;

    if !first.is_vsafe_5v() {
        return Err(PdoError::Vsafe5vNotFirst);
    }

    if pdos.len() > PDO_MAX_OBJECTS {
        return Err(PdoError::TooManyObjects);
    }

    for pair in pdos.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        if current.kind().rank() < previous.kind().rank() {
            return Err(PdoError::TypeNotInOrder);
        }

        match (previous, current) {
            (PowerDataObject::FixedSupply(previous), PowerDataObject::FixedSupply(current)) => {
                if current.voltage() <= previous.voltage() {
                    return Err(PdoError::FixedNotSorted);
                }
            }
            (PowerDataObject::Pps(previous), PowerDataObject::Pps(current)) => {
                if current.max_voltage() < previous.max_voltage() {
                    return Err(PdoError::PpsNotSorted);
                }

                if current.min_voltage() == previous.min_voltage()
                    && current.max_voltage() == previous.max_voltage()
                    && current.max_current() == previous.max_current()
                {
                    return Err(PdoError::DuplicatePps);
                }
            }
            (previous, current) if current.kind().rank() == 1 && previous.kind().rank() == 1 => {
                if let (Some((previous_min, previous_max)), Some((current_min, current_max))) =
                    (previous.voltage_range(), current.voltage_range())
                {
                    if current_min < previous_min {
                        return Err(PdoError::VariableBatteryNotSorted);
                    }

                    if current_min == previous_min && current_max == previous_max {
                        return Err(PdoError::DuplicatePdo);
                    }
                }
            }
            _ => (),
        }
    }

    Ok(())
}

/// A bounded list of power data objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PdoList(Vec<PowerDataObject, PDO_MAX_OBJECTS>);

impl PdoList {
    /// An empty list.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Decode raw objects, without checking the list rules.
    pub fn from_raw(raw: &[u32]) -> Result<Self, PdoError> {
        let mut list = Vec::new();
        for &pdo in raw {
            list.push(PowerDataObject::from(pdo))
                .map_err(|_| PdoError::TooManyObjects)?;
        }

        Ok(Self(list))
    }

    /// Decode raw objects and check the list rules.
    pub fn from_raw_validated(raw: &[u32]) -> Result<Self, PdoError> {
        if raw.is_empty() {
            return Err(PdoError::NoVsafe5v);
        }

        let list = Self::from_raw(raw)?;
        list.validate()?;
        Ok(list)
    }

    /// Parse little-endian data objects from a message payload.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, PdoError> {
        let mut list = Vec::new();
        for chunk in buf.chunks_exact(4) {
            list.push(PowerDataObject::from(LittleEndian::read_u32(chunk)))
                .map_err(|_| PdoError::TooManyObjects)?;
        }

        Ok(Self(list))
    }

    /// Serialize the data objects, returning the number of written bytes.
    pub fn to_bytes(&self, buf: &mut [u8]) -> usize {
        for (pdo, chunk) in self.0.iter().zip(buf.chunks_exact_mut(4)) {
            LittleEndian::write_u32(chunk, (*pdo).into());
        }

        self.0.len() * 4
    }

    /// Check the list rules.
    pub fn validate(&self) -> Result<(), PdoError> {
        validate(&self.0)
    }

    /// The first entry, if it is a fixed supply.
    pub fn vsafe_5v(&self) -> Option<&FixedSupply> {
        match self.0.first() {
            Some(PowerDataObject::FixedSupply(supply)) => Some(supply),
            _ => None,
        }
    }

    /// The power data objects.
    pub fn pdos(&self) -> &[PowerDataObject] {
        &self.0
    }

    /// The object at a 1-based object position, as used by request data objects.
    pub fn at_object_position(&self, position: u8) -> Option<&PowerDataObject> {
        (position as usize).checked_sub(1).and_then(|index| self.0.get(index))
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no objects.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use uom::si::electric_current::milliampere;
    use uom::si::electric_potential::{millivolt, volt};
    use uom::si::power::milliwatt;

    use super::*;

    fn fixed(millivolts: u32, milliamperes: u32) -> PowerDataObject {
        PowerDataObject::FixedSupply(FixedSupply::new(
            ElectricPotential::new::<millivolt>(millivolts),
            ElectricCurrent::new::<milliampere>(milliamperes),
        ))
    }

    fn variable(min_mv: u32, max_mv: u32, milliamperes: u32) -> PowerDataObject {
        PowerDataObject::VariableSupply(VariableSupply::new(
            ElectricPotential::new::<millivolt>(min_mv),
            ElectricPotential::new::<millivolt>(max_mv),
            ElectricCurrent::new::<milliampere>(milliamperes),
        ))
    }

    fn battery(min_mv: u32, max_mv: u32, milliwatts: u32) -> PowerDataObject {
        PowerDataObject::Battery(Battery::new(
            ElectricPotential::new::<millivolt>(min_mv),
            ElectricPotential::new::<millivolt>(max_mv),
            Power::new::<milliwatt>(milliwatts),
        ))
    }

    fn pps(min_dv: u8, max_dv: u8, raw_current: u8) -> PowerDataObject {
        PowerDataObject::Pps(
            SprProgrammablePowerSupply::default()
                .with_raw_min_voltage(min_dv)
                .with_raw_max_voltage(max_dv)
                .with_raw_max_current(raw_current),
        )
    }

    #[test]
    fn test_fixed_supply_fields() {
        // Fixed 5 V at 3 A, as sent by a typical charger.
        let pdo = PowerDataObject::from(0x0801_912C);

        let PowerDataObject::FixedSupply(supply) = pdo else {
            panic!("expected a fixed supply");
        };
        assert_eq!(supply.voltage(), ElectricPotential::new::<volt>(5));
        assert_eq!(supply.max_current(), ElectricCurrent::new::<milliampere>(3000));
        assert!(supply.unconstrained_power());
        assert_eq!(u32::from(pdo), 0x0801_912C);
    }

    #[test]
    fn test_pps_detected() {
        let pdo = PowerDataObject::from(0xC8DC_2164);

        let PowerDataObject::Pps(supply) = pdo else {
            panic!("expected a PPS APDO");
        };
        assert_eq!(supply.max_voltage(), ElectricPotential::new::<millivolt>(11000));
        assert_eq!(supply.min_voltage(), ElectricPotential::new::<millivolt>(3300));
        assert_eq!(supply.max_current(), ElectricCurrent::new::<milliampere>(5000));
    }

    #[test]
    fn test_validate_accepts_typical_list() {
        let pdos = [
            fixed(5000, 3000),
            fixed(9000, 3000),
            fixed(15000, 3000),
            fixed(20000, 2250),
            pps(33, 110, 100),
            pps(33, 160, 60),
            pps(33, 210, 45),
        ];

        assert_eq!(validate(&pdos), Ok(()));
    }

    #[test]
    fn test_validate_empty() {
        assert_eq!(validate(&[]), Err(PdoError::NoVsafe5v));
    }

    #[test]
    fn test_validate_vsafe_5v_not_first() {
        assert_eq!(
            validate(&[fixed(12000, 1000), fixed(5000, 1000)]),
            Err(PdoError::Vsafe5vNotFirst)
        );
        assert_eq!(validate(&[variable(5000, 9000, 1000)]), Err(PdoError::Vsafe5vNotFirst));
    }

    #[test]
    fn test_validate_fixed_duplicate_voltage() {
        assert_eq!(
            validate(&[fixed(5000, 3000), fixed(9000, 3000), fixed(9000, 2000)]),
            Err(PdoError::FixedNotSorted)
        );
    }

    #[test]
    fn test_validate_type_order() {
        assert_eq!(
            validate(&[fixed(5000, 3000), variable(5000, 12000, 1000), fixed(9000, 3000)]),
            Err(PdoError::TypeNotInOrder)
        );
        assert_eq!(
            validate(&[fixed(5000, 3000), pps(33, 110, 100), battery(5000, 12000, 10000)]),
            Err(PdoError::TypeNotInOrder)
        );
    }

    #[test]
    fn test_validate_battery_and_variable_share_rank() {
        // A battery may follow a variable supply, as long as the minimum voltage does not decrease.
        assert_eq!(
            validate(&[fixed(5000, 3000), variable(5000, 12000, 1000), battery(9000, 12000, 10000)]),
            Ok(())
        );
        assert_eq!(
            validate(&[fixed(5000, 3000), variable(9000, 12000, 1000), battery(5000, 12000, 10000)]),
            Err(PdoError::VariableBatteryNotSorted)
        );
        assert_eq!(
            validate(&[fixed(5000, 3000), variable(5000, 12000, 1000), battery(5000, 12000, 10000)]),
            Err(PdoError::DuplicatePdo)
        );
    }

    #[test]
    fn test_validate_pps() {
        assert_eq!(
            validate(&[fixed(5000, 3000), pps(33, 160, 60), pps(33, 110, 100)]),
            Err(PdoError::PpsNotSorted)
        );
        assert_eq!(
            validate(&[fixed(5000, 3000), pps(33, 110, 60), pps(33, 110, 60)]),
            Err(PdoError::DuplicatePps)
        );
        // Same range, but a different current is allowed.
        assert_eq!(validate(&[fixed(5000, 3000), pps(33, 110, 60), pps(33, 110, 100)]), Ok(()));
    }

    #[test]
    fn test_validation_is_stable_over_serialization() {
        let lists: [&[PowerDataObject]; 3] = [
            &[fixed(5000, 3000), fixed(9000, 2000)],
            &[fixed(5000, 3000), fixed(9000, 2000), fixed(9000, 1000)],
            &[fixed(5000, 3000), battery(5000, 12000, 10000), battery(5000, 12000, 10000)],
        ];

        for pdos in lists {
            let mut raw = [0u32; PDO_MAX_OBJECTS];
            for (slot, pdo) in raw.iter_mut().zip(pdos) {
                *slot = (*pdo).into();
            }

            let list = PdoList::from_raw(&raw[..pdos.len()]).unwrap();
            let mut buf = [0u8; PDO_MAX_OBJECTS * 4];
            let len = list.to_bytes(&mut buf);
            let reparsed = PdoList::from_bytes(&buf[..len]).unwrap();

            assert_eq!(reparsed, list);
            assert_eq!(reparsed.validate(), validate(pdos));
        }
    }

    #[test]
    fn test_too_many_objects() {
        let raw = [0x0801_912C; PDO_MAX_OBJECTS + 1];
        assert_eq!(PdoList::from_raw(&raw), Err(PdoError::TooManyObjects));
    }

    #[test]
    fn test_object_position() {
        let list = PdoList::from_raw(&[0x0801_912C, 0x0002_D12C]).unwrap();

        assert!(list.at_object_position(0).is_none());
        assert_eq!(list.at_object_position(2).map(PowerDataObject::kind), Some(Kind::FixedSupply));
        assert!(list.at_object_position(3).is_none());
    }
}
