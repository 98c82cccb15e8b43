//! Timers that are used by the port state machine.

/// The timer trait to implement by the user application.
pub trait Timer {
    /// Monotonic time in microseconds.
    fn now_micros() -> u64;

    /// Block for the specified number of microseconds.
    fn delay_micros(microseconds: u32);
}

/// Types of protocol intervals.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerType {
    CcDebounce,
    DbDetect,
    DrpSnk,
    DrpSrc,
    ErrorRecovery,
    NoResponse,
    PdDebounce,
    PsHardReset,
    PsSourceOff,
    PsSourceOn,
    PsTransition,
    Safe0V,
    SendSourceCap,
    SenderResponse,
    SinkWaitCap,
    SrcRecover,
    SrcRecoverMax,
    SrcTransition,
    SrcTurnOn,
    TcpcTxTimeout,
}

impl TimerType {
    /// The duration of an interval in milliseconds.
    pub const fn millis(self) -> u32 {
        match self {
            TimerType::CcDebounce => 200,
            TimerType::DbDetect => 10000,
            TimerType::DrpSnk => 40,
            TimerType::DrpSrc => 30,
            TimerType::ErrorRecovery => 100,
            TimerType::NoResponse => 5000,
            TimerType::PdDebounce => 20,
            TimerType::PsHardReset => 30,
            TimerType::PsSourceOff => 920,
            TimerType::PsSourceOn => 480,
            TimerType::PsTransition => 500,
            TimerType::Safe0V => 650,
            TimerType::SendSourceCap => 150,
            TimerType::SenderResponse => 60,
            TimerType::SinkWaitCap => 310,
            TimerType::SrcRecover => 760,
            TimerType::SrcRecoverMax => 1000,
            TimerType::SrcTransition => 35,
            TimerType::SrcTurnOn => 275,
            TimerType::TcpcTxTimeout => 100,
        }
    }
}

/// A point in time at which a delayed transition is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    at_micros: u64,
    delay_ms: u32,
}

impl Deadline {
    /// A deadline that lies `delay_ms` in the future.
    pub fn after_millis<TIMER: Timer>(delay_ms: u32) -> Self {
        Self {
            at_micros: TIMER::now_micros() + u64::from(delay_ms) * 1000,
            delay_ms,
        }
    }

    /// Whether the deadline passed.
    pub fn is_elapsed<TIMER: Timer>(&self) -> bool {
        TIMER::now_micros() >= self.at_micros
    }

    /// The delay that the deadline was armed with.
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }
}
