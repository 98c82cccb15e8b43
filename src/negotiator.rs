//! Selection of a power contract from the partner's capabilities.
//!
//! The sink side picks the best matching source PDO and builds a request for it. The source side checks
//! a received request against its own capabilities.
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::millivolt;
use uom::si::power::milliwatt;

use crate::message::pdo::{PdoList, PowerDataObject};
use crate::message::request::{self, RawRequest};
use crate::units::{ElectricCurrent, ElectricPotential, Power};

/// Negotiation errors.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NegotiationError {
    /// No source PDO lies within the voltage range of any sink PDO.
    #[error("no matching source/sink PDO pair")]
    NoMatchingPdo,
    /// The request references a PDO that does not exist.
    #[error("invalid object position `{0}`")]
    InvalidObjectPosition(u8),
    /// The requested current exceeds the advertised maximum.
    #[error("requested current exceeds the advertised maximum")]
    CurrentExceeded,
    /// The requested power exceeds the advertised maximum.
    #[error("requested power exceeds the advertised maximum")]
    PowerExceeded,
    /// The selected PDO type cannot be requested.
    #[error("unsupported PDO type")]
    UnsupportedPdo,
}

/// A request, built from a selected PDO pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// The raw request data object.
    pub rdo: u32,
    /// The requested supply voltage.
    pub voltage: ElectricPotential,
    /// The requested current limit.
    pub current: ElectricCurrent,
}

/// Voltage range of a PDO in millivolts. Programmable and other augmented PDOs have none.
fn voltage_range(pdo: &PowerDataObject) -> Option<(u32, u32)> {
    pdo.voltage_range()
        .map(|(min, max)| (min.get::<millivolt>(), max.get::<millivolt>()))
}

/// Maximum current in milliamperes. Battery supplies declare power instead.
fn max_milliamperes(pdo: &PowerDataObject) -> u32 {
    match (pdo.max_current(), pdo.max_power(), voltage_range(pdo)) {
        (Some(current), _, _) => current.get::<milliampere>(),
        (None, Some(power), Some((min_mv, _))) if min_mv > 0 => power.get::<milliwatt>() * 1000 / min_mv,
        _ => 0,
    }
}

/// Maximum power in milliwatts, at the PDO's minimum voltage.
fn max_milliwatts(pdo: &PowerDataObject) -> u32 {
    match (pdo.max_power(), pdo.max_current(), voltage_range(pdo)) {
        (Some(power), _, _) => power.get::<milliwatt>(),
        (None, Some(current), Some((min_mv, _))) => current.get::<milliampere>() * min_mv / 1000,
        _ => 0,
    }
}

/// Select the source and sink PDO pair that offers the most power.
///
/// The source's voltage range must lie within the sink's. Among pairs with equal power, the higher
/// minimum source voltage wins. Programmable supplies are skipped on both sides.
///
/// Returns zero-based indices into the source and sink lists.
pub fn select_pdo(source: &PdoList, sink: &PdoList) -> Result<(usize, usize), NegotiationError> {
    let mut selected = None;
    let mut max_mw = 0;
    let mut max_mv = 0;

    for (source_index, source_pdo) in source.pdos().iter().enumerate() {
        let Some((min_src_mv, max_src_mv)) = voltage_range(source_pdo) else {
            continue;
        };
        let src_mw = max_milliwatts(source_pdo);

        for (sink_index, sink_pdo) in sink.pdos().iter().enumerate() {
            let Some((min_snk_mv, max_snk_mv)) = voltage_range(sink_pdo) else {
                continue;
            };

            if max_src_mv > max_snk_mv || min_src_mv < min_snk_mv {
                continue;
            }

            if selected.is_none() || src_mw > max_mw || (src_mw == max_mw && min_src_mv > max_mv) {
                selected = Some((source_index, sink_index));
                max_mw = src_mw;
                max_mv = min_src_mv;
            }
        }
    }

    selected.ok_or(NegotiationError::NoMatchingPdo)
}

/// Build a request for the best matching source PDO.
///
/// If the contract does not cover `operating_sink_milliwatt`, the capability mismatch flag is set and the
/// advertised maximum is raised to the sink's own ceiling.
pub fn build_request(
    source: &PdoList,
    sink: &PdoList,
    operating_sink_milliwatt: u32,
) -> Result<Request, NegotiationError> {
    let (source_index, sink_index) = select_pdo(source, sink)?;
    let (Some(source_pdo), Some(sink_pdo)) = (source.pdos().get(source_index), sink.pdos().get(sink_index))
    else {
        return Err(NegotiationError::NoMatchingPdo);
    };

    let mv = match voltage_range(source_pdo) {
        Some((min_mv, _)) if min_mv > 0 => min_mv,
        _ => return Err(NegotiationError::UnsupportedPdo),
    };

    let is_battery = matches!(source_pdo, PowerDataObject::Battery(_));
    let (ma, mw) = if is_battery {
        let mw = max_milliwatts(source_pdo).min(max_milliwatts(sink_pdo));
        (1000 * mw / mv, mw)
    } else {
        let ma = max_milliamperes(source_pdo).min(max_milliamperes(sink_pdo));
        (ma, ma * mv / 1000)
    };

    let mut max_ma = ma;
    let mut max_mw = mw;
    let mismatch = mw < operating_sink_milliwatt;

    if mismatch {
        if is_battery {
            max_mw = max_mw.max(max_milliwatts(sink_pdo));
        }
        max_ma = max_ma.max(max_milliamperes(sink_pdo));
    }

    let object_position = (source_index + 1) as u8;
    let rdo = if is_battery {
        debug!(
            "requesting PDO {}: {} mV, {} mW{}",
            object_position,
            mv,
            mw,
            if mismatch { " [mismatch]" } else { "" }
        );

        request::Battery(0)
            .with_object_position(object_position)
            .with_capability_mismatch(mismatch)
            .with_usb_communications_capable(true)
            .with_no_usb_suspend(true)
            .with_operating_power(Power::new::<milliwatt>(mw))
            .with_max_operating_power(Power::new::<milliwatt>(max_mw))
            .0
    } else {
        debug!(
            "requesting PDO {}: {} mV, {} mA{}",
            object_position,
            mv,
            ma,
            if mismatch { " [mismatch]" } else { "" }
        );

        request::FixedVariableSupply(0)
            .with_object_position(object_position)
            .with_capability_mismatch(mismatch)
            .with_usb_communications_capable(true)
            .with_no_usb_suspend(true)
            .with_operating_current(ElectricCurrent::new::<milliampere>(ma))
            .with_max_operating_current(ElectricCurrent::new::<milliampere>(max_ma))
            .0
    };

    Ok(Request {
        rdo,
        voltage: ElectricPotential::new::<millivolt>(mv),
        current: ElectricCurrent::new::<milliampere>(ma),
    })
}

/// Check a received request against the source capabilities that were offered.
///
/// Returns the contract that the request asks for.
pub fn check_request(rdo: u32, source: &PdoList) -> Result<Request, NegotiationError> {
    let raw = RawRequest(rdo);
    let position = raw.object_position();
    let pdo = *source
        .at_object_position(position)
        .ok_or(NegotiationError::InvalidObjectPosition(position))?;

    let mv = voltage_range(&pdo).map_or(0, |(min_mv, _)| min_mv);

    let ma = match pdo {
        PowerDataObject::FixedSupply(_) | PowerDataObject::VariableSupply(_) => {
            let request = request::FixedVariableSupply(rdo);
            let max = max_milliamperes(&pdo);
            let op = request.operating_current().get::<milliampere>();
            let max_requested = request.max_operating_current().get::<milliampere>();

            if op > max || (max_requested > max && !request.capability_mismatch()) {
                return Err(NegotiationError::CurrentExceeded);
            }

            debug!("requested {} mA ({} mA max) from PDO {}", op, max_requested, position);
            op
        }
        PowerDataObject::Battery(_) => {
            let request = request::Battery(rdo);
            let max = max_milliwatts(&pdo);
            let op = request.operating_power().get::<milliwatt>();
            let max_requested = request.max_operating_power().get::<milliwatt>();

            if op > max || (max_requested > max && !request.capability_mismatch()) {
                return Err(NegotiationError::PowerExceeded);
            }

            debug!("requested {} mW ({} mW max) from PDO {}", op, max_requested, position);
            if mv > 0 { 1000 * op / mv } else { 0 }
        }
        _ => return Err(NegotiationError::UnsupportedPdo),
    };

    Ok(Request {
        rdo,
        voltage: ElectricPotential::new::<millivolt>(mv),
        current: ElectricCurrent::new::<milliampere>(ma),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::pdo::{Battery, FixedSupply, PDO_MAX_OBJECTS, VariableSupply};

    fn list(pdos: &[PowerDataObject]) -> PdoList {
        let mut raw = [0u32; PDO_MAX_OBJECTS];
        for (slot, pdo) in raw.iter_mut().zip(pdos) {
            *slot = (*pdo).into();
        }
        PdoList::from_raw(&raw[..pdos.len()]).unwrap()
    }

    fn fixed(mv: u32, ma: u32) -> PowerDataObject {
        PowerDataObject::FixedSupply(FixedSupply::new(
            ElectricPotential::new::<millivolt>(mv),
            ElectricCurrent::new::<milliampere>(ma),
        ))
    }

    fn variable(min_mv: u32, max_mv: u32, ma: u32) -> PowerDataObject {
        PowerDataObject::VariableSupply(VariableSupply::new(
            ElectricPotential::new::<millivolt>(min_mv),
            ElectricPotential::new::<millivolt>(max_mv),
            ElectricCurrent::new::<milliampere>(ma),
        ))
    }

    fn battery(min_mv: u32, max_mv: u32, mw: u32) -> PowerDataObject {
        PowerDataObject::Battery(Battery::new(
            ElectricPotential::new::<millivolt>(min_mv),
            ElectricPotential::new::<millivolt>(max_mv),
            Power::new::<milliwatt>(mw),
        ))
    }

    #[test]
    fn test_single_5v_contract() {
        let source = list(&[fixed(5000, 3000)]);
        let sink = list(&[fixed(5000, 1500)]);

        assert_eq!(select_pdo(&source, &sink), Ok((0, 0)));

        let request = build_request(&source, &sink, 5000).unwrap();
        let rdo = request::FixedVariableSupply(request.rdo);

        assert_eq!(rdo.object_position(), 1);
        assert_eq!(rdo.operating_current(), ElectricCurrent::new::<milliampere>(1500));
        assert_eq!(rdo.max_operating_current(), ElectricCurrent::new::<milliampere>(1500));
        assert!(!rdo.capability_mismatch());
        assert!(rdo.usb_communications_capable());
        assert!(rdo.no_usb_suspend());
        assert_eq!(request.voltage, ElectricPotential::new::<millivolt>(5000));
        assert_eq!(request.current, ElectricCurrent::new::<milliampere>(1500));
    }

    #[test]
    fn test_highest_power_within_sink_range() {
        let source = list(&[fixed(5000, 3000), fixed(9000, 3000), fixed(15000, 3000), fixed(20000, 2250)]);
        let sink = list(&[fixed(5000, 3000), variable(5000, 15000, 3000)]);

        // 20 V is outside the sink's range, 15 V at 3 A is the most power.
        assert_eq!(select_pdo(&source, &sink), Ok((2, 1)));
    }

    #[test]
    fn test_equal_power_prefers_higher_voltage() {
        // 5 V at 3 A and 10 V at 1.5 A both provide 15 W.
        let source = list(&[fixed(5000, 3000), fixed(10000, 1500)]);
        let sink = list(&[fixed(5000, 3000), fixed(10000, 3000)]);

        assert_eq!(select_pdo(&source, &sink), Ok((1, 1)));
    }

    #[test]
    fn test_no_match() {
        let source = list(&[fixed(5000, 3000)]);
        let sink = list(&[variable(9000, 12000, 1000)]);

        assert_eq!(select_pdo(&source, &sink), Err(NegotiationError::NoMatchingPdo));
        assert_eq!(build_request(&source, &sink, 0), Err(NegotiationError::NoMatchingPdo));
    }

    #[test]
    fn test_mismatch_raises_maximum_current() {
        let source = list(&[fixed(5000, 900)]);
        let sink = list(&[fixed(5000, 2000)]);

        // 900 mA at 5 V is 4.5 W, less than the 10 W needed.
        let request = build_request(&source, &sink, 10000).unwrap();
        let rdo = request::FixedVariableSupply(request.rdo);

        assert!(rdo.capability_mismatch());
        assert_eq!(rdo.operating_current(), ElectricCurrent::new::<milliampere>(900));
        assert_eq!(rdo.max_operating_current(), ElectricCurrent::new::<milliampere>(2000));
    }

    #[test]
    fn test_battery_request() {
        let source = list(&[fixed(5000, 100), battery(5000, 12000, 10000)]);
        let sink = list(&[fixed(5000, 100), battery(5000, 12000, 8000)]);

        let request = build_request(&source, &sink, 0).unwrap();
        let rdo = request::Battery(request.rdo);

        assert_eq!(rdo.object_position(), 2);
        assert_eq!(rdo.operating_power(), Power::new::<milliwatt>(8000));
        assert_eq!(request.current, ElectricCurrent::new::<milliampere>(1600));
    }

    #[test]
    fn test_check_request() {
        let source = list(&[fixed(5000, 3000), fixed(9000, 2000)]);

        let valid = request::FixedVariableSupply(0)
            .with_object_position(2)
            .with_operating_current(ElectricCurrent::new::<milliampere>(2000))
            .with_max_operating_current(ElectricCurrent::new::<milliampere>(2000));
        let contract = check_request(valid.0, &source).unwrap();
        assert_eq!(contract.voltage, ElectricPotential::new::<millivolt>(9000));
        assert_eq!(contract.current, ElectricCurrent::new::<milliampere>(2000));

        let too_much = valid.with_max_operating_current(ElectricCurrent::new::<milliampere>(2500));
        assert_eq!(check_request(too_much.0, &source), Err(NegotiationError::CurrentExceeded));

        // A mismatch request may ask for more than offered as its maximum.
        assert!(check_request(too_much.with_capability_mismatch(true).0, &source).is_ok());

        let operating_too_high = valid.with_operating_current(ElectricCurrent::new::<milliampere>(2100));
        assert_eq!(
            check_request(operating_too_high.0, &source),
            Err(NegotiationError::CurrentExceeded)
        );

        for position in [0, 3] {
            assert_eq!(
                check_request(valid.with_object_position(position).0, &source),
                Err(NegotiationError::InvalidObjectPosition(position))
            );
        }
    }
}
