//! Port states.
use core::fmt;

/// States of the port state machine.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    Toggling,

    SrcUnattached,
    SrcAttachWait,
    SrcAttached,
    SrcStartup,
    SrcSendCapabilities,
    SrcSendCapabilitiesTimeout,
    SrcNegotiateCapabilities,
    SrcTransitionSupply,
    SrcReady,
    SrcWaitNewCapabilities,

    SnkUnattached,
    SnkAttachWait,
    SnkDebounced,
    SnkAttached,
    SnkStartup,
    SnkDiscovery,
    SnkDiscoveryDebounce,
    SnkDiscoveryDebounceDone,
    SnkWaitCapabilities,
    SnkNegotiateCapabilities,
    SnkTransitionSink,
    SnkTransitionSinkVbus,
    SnkReady,

    HardResetSend,
    HardResetStart,
    SrcHardResetVbusOff,
    SrcHardResetVbusOn,
    SnkHardResetSinkOff,
    SnkHardResetWaitVbus,
    SnkHardResetSinkOn,

    SoftReset,
    SoftResetSend,

    DrSwapAccept,
    DrSwapChangeDr,

    ErrorRecovery,
    PortReset,
    PortResetWaitOff,
}

impl State {
    /// The canonical name of the state.
    pub fn name(self) -> &'static str {
        match self {
            State::Toggling => "TOGGLING",
            State::SrcUnattached => "SRC_UNATTACHED",
            State::SrcAttachWait => "SRC_ATTACH_WAIT",
            State::SrcAttached => "SRC_ATTACHED",
            State::SrcStartup => "SRC_STARTUP",
            State::SrcSendCapabilities => "SRC_SEND_CAPABILITIES",
            State::SrcSendCapabilitiesTimeout => "SRC_SEND_CAPABILITIES_TIMEOUT",
            State::SrcNegotiateCapabilities => "SRC_NEGOTIATE_CAPABILITIES",
            State::SrcTransitionSupply => "SRC_TRANSITION_SUPPLY",
            State::SrcReady => "SRC_READY",
            State::SrcWaitNewCapabilities => "SRC_WAIT_NEW_CAPABILITIES",
            State::SnkUnattached => "SNK_UNATTACHED",
            State::SnkAttachWait => "SNK_ATTACH_WAIT",
            State::SnkDebounced => "SNK_DEBOUNCED",
            State::SnkAttached => "SNK_ATTACHED",
            State::SnkStartup => "SNK_STARTUP",
            State::SnkDiscovery => "SNK_DISCOVERY",
            State::SnkDiscoveryDebounce => "SNK_DISCOVERY_DEBOUNCE",
            State::SnkDiscoveryDebounceDone => "SNK_DISCOVERY_DEBOUNCE_DONE",
            State::SnkWaitCapabilities => "SNK_WAIT_CAPABILITIES",
            State::SnkNegotiateCapabilities => "SNK_NEGOTIATE_CAPABILITIES",
            State::SnkTransitionSink => "SNK_TRANSITION_SINK",
            State::SnkTransitionSinkVbus => "SNK_TRANSITION_SINK_VBUS",
            State::SnkReady => "SNK_READY",
            State::HardResetSend => "HARD_RESET_SEND",
            State::HardResetStart => "HARD_RESET_START",
            State::SrcHardResetVbusOff => "SRC_HARD_RESET_VBUS_OFF",
            State::SrcHardResetVbusOn => "SRC_HARD_RESET_VBUS_ON",
            State::SnkHardResetSinkOff => "SNK_HARD_RESET_SINK_OFF",
            State::SnkHardResetWaitVbus => "SNK_HARD_RESET_WAIT_VBUS",
            State::SnkHardResetSinkOn => "SNK_HARD_RESET_SINK_ON",
            State::SoftReset => "SOFT_RESET",
            State::SoftResetSend => "SOFT_RESET_SEND",
            State::DrSwapAccept => "DR_SWAP_ACCEPT",
            State::DrSwapChangeDr => "DR_SWAP_CHANGE_DR",
            State::ErrorRecovery => "ERROR_RECOVERY",
            State::PortReset => "PORT_RESET",
            State::PortResetWaitOff => "PORT_RESET_WAIT_OFF",
        }
    }

    /// Whether this is one of the ready states, in which a contract (or plain Type-C power) is in place.
    pub fn is_ready(self) -> bool {
        matches!(self, State::SrcReady | State::SnkReady)
    }

    /// Whether this state is only reachable while acting as a source.
    pub fn is_source_state(self) -> bool {
        matches!(
            self,
            State::SrcUnattached
                | State::SrcAttachWait
                | State::SrcAttached
                | State::SrcStartup
                | State::SrcSendCapabilities
                | State::SrcSendCapabilitiesTimeout
                | State::SrcNegotiateCapabilities
                | State::SrcTransitionSupply
                | State::SrcReady
                | State::SrcWaitNewCapabilities
                | State::SrcHardResetVbusOff
                | State::SrcHardResetVbusOn
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for State {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(State::SrcSendCapabilitiesTimeout.to_string(), "SRC_SEND_CAPABILITIES_TIMEOUT");
        assert_eq!(State::PortResetWaitOff.to_string(), "PORT_RESET_WAIT_OFF");
        assert_eq!(State::Toggling as u8, 0);
    }
}
