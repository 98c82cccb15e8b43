//! Static port configuration.
use crate::message::pdo::{PdoError, PdoList};
use crate::{ConnectorConfig, PortType, PowerRole};

/// Configuration errors.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A source capable port has no source PDOs.
    #[error("source capable port without source PDOs")]
    MissingSourcePdos,
    /// A sink capable port has no sink PDOs.
    #[error("sink capable port without sink PDOs")]
    MissingSinkPdos,
    /// A dual-role port has no preferred power role.
    #[error("dual-role port without try power role")]
    MissingTryPowerRole,
    /// A PDO list violates the capability rules.
    #[error("invalid PDO list: {0}")]
    Pdo(#[from] PdoError),
}

/// Configuration of a port.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Power role capability.
    pub port_type: PortType,
    /// Preferred power role of a dual-role port.
    pub try_power_role: Option<PowerRole>,
    /// Capabilities that are offered when sourcing power.
    pub source_pdos: PdoList,
    /// Capabilities that are accepted when sinking power.
    pub sink_pdos: PdoList,
    /// Power that the sink needs for operation.
    pub operating_sink_milliwatt: u32,
    /// The port has a power supply other than VBUS.
    pub self_powered: bool,
}

impl Config {
    /// An empty configuration for a port type. Complete it with the `with_*` methods.
    pub fn new(port_type: PortType) -> Self {
        Self {
            port_type,
            try_power_role: None,
            source_pdos: PdoList::new(),
            sink_pdos: PdoList::new(),
            operating_sink_milliwatt: 0,
            self_powered: false,
        }
    }

    /// Set the preferred power role.
    pub fn with_try_power_role(mut self, role: PowerRole) -> Self {
        self.try_power_role = Some(role);
        self
    }

    /// Set the source capabilities.
    pub fn with_source_pdos(mut self, pdos: PdoList) -> Self {
        self.source_pdos = pdos;
        self
    }

    /// Set the sink capabilities.
    pub fn with_sink_pdos(mut self, pdos: PdoList) -> Self {
        self.sink_pdos = pdos;
        self
    }

    /// Set the operating sink power.
    pub fn with_operating_sink_milliwatt(mut self, milliwatt: u32) -> Self {
        self.operating_sink_milliwatt = milliwatt;
        self
    }

    /// Set whether the port is self-powered.
    pub fn with_self_powered(mut self, self_powered: bool) -> Self {
        self.self_powered = self_powered;
        self
    }

    /// Load and validate the connector configuration that a driver provides.
    pub fn from_connector(connector: &ConnectorConfig<'_>) -> Result<Self, ConfigError> {
        let config = Self {
            port_type: connector.port_type,
            try_power_role: connector.try_power_role,
            source_pdos: PdoList::from_raw(connector.source_pdos)?,
            sink_pdos: PdoList::from_raw(connector.sink_pdos)?,
            operating_sink_milliwatt: connector.operating_sink_microwatt / 1000,
            self_powered: connector.self_powered,
        };

        config.validate()?;
        Ok(config)
    }

    /// Whether the port can source power.
    pub fn can_source(&self) -> bool {
        self.port_type != PortType::Sink
    }

    /// Whether the port can sink power.
    pub fn can_sink(&self) -> bool {
        self.port_type != PortType::Source
    }

    /// Check the configuration for completeness, and the PDO lists against the capability rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.can_source() {
            if self.source_pdos.is_empty() {
                return Err(ConfigError::MissingSourcePdos);
            }
            self.source_pdos.validate()?;
        }

        if self.can_sink() {
            if self.sink_pdos.is_empty() {
                return Err(ConfigError::MissingSinkPdos);
            }
            self.sink_pdos.validate()?;
        }

        if self.port_type == PortType::DualRole && self.try_power_role.is_none() {
            return Err(ConfigError::MissingTryPowerRole);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED_5V_3A: u32 = 0x0001_912C;
    const FIXED_9V_3A: u32 = 0x0002_D12C;
    const FIXED_12V_1A: u32 = 0x0003_C064;

    fn connector<'a>(port_type: PortType, source: &'a [u32], sink: &'a [u32]) -> ConnectorConfig<'a> {
        ConnectorConfig {
            port_type,
            try_power_role: None,
            source_pdos: source,
            sink_pdos: sink,
            operating_sink_microwatt: 10_000_000,
            self_powered: false,
        }
    }

    #[test]
    fn test_sink_connector() {
        let config = Config::from_connector(&connector(PortType::Sink, &[], &[FIXED_5V_3A, FIXED_9V_3A])).unwrap();

        assert_eq!(config.sink_pdos.len(), 2);
        assert_eq!(config.operating_sink_milliwatt, 10_000);
        assert!(!config.can_source());
    }

    #[test]
    fn test_missing_pdos() {
        assert_eq!(
            Config::from_connector(&connector(PortType::Source, &[], &[FIXED_5V_3A])),
            Err(ConfigError::MissingSourcePdos)
        );
        assert_eq!(
            Config::from_connector(&connector(PortType::Sink, &[FIXED_5V_3A], &[])),
            Err(ConfigError::MissingSinkPdos)
        );
    }

    #[test]
    fn test_dual_role_needs_try_role() {
        let mut dual_role = connector(PortType::DualRole, &[FIXED_5V_3A], &[FIXED_5V_3A]);
        assert_eq!(Config::from_connector(&dual_role), Err(ConfigError::MissingTryPowerRole));

        dual_role.try_power_role = Some(PowerRole::Sink);
        assert!(Config::from_connector(&dual_role).is_ok());
    }

    #[test]
    fn test_invalid_list_fails() {
        assert_eq!(
            Config::from_connector(&connector(PortType::Sink, &[], &[FIXED_12V_1A, FIXED_5V_3A])),
            Err(ConfigError::Pdo(PdoError::Vsafe5vNotFirst))
        );
        assert_eq!(
            Config::from_connector(&connector(PortType::Source, &[FIXED_5V_3A; 8], &[])),
            Err(ConfigError::Pdo(PdoError::TooManyObjects))
        );
    }

    #[test]
    fn test_builder_runs_same_validation() {
        let config = Config::new(PortType::Source)
            .with_source_pdos(PdoList::from_raw(&[FIXED_5V_3A, FIXED_5V_3A]).unwrap())
            .with_self_powered(true);

        assert_eq!(config.validate(), Err(ConfigError::Pdo(PdoError::FixedNotSorted)));
    }
}
