//! Definition of counters, used for retry attempts, and message IDs.

/// Number of source capability transmissions before escalating.
pub const N_CAPS_COUNT: u8 = 3;

/// Number of hard resets before giving up on PD communication.
pub const N_HARD_RESET_COUNT: u8 = 2;

/// Counter errors.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A wrapping counter returned to zero.
    Overrun,
    /// A bounded counter is already at its maximum.
    Exceeded,
}

/// Types of counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterType {
    /// Source capability transmissions.
    Caps,
    /// Hard resets, sent or received.
    HardReset,
    /// Message ID, wraps around.
    MessageId,
}

/// A counter with a maximum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counter {
    counter_type: CounterType,
    value: u8,
    max_value: u8,
}

impl Counter {
    /// Create a new counter at zero.
    pub fn new(counter_type: CounterType) -> Self {
        let max_value = match counter_type {
            CounterType::Caps => N_CAPS_COUNT,
            CounterType::HardReset => N_HARD_RESET_COUNT,
            CounterType::MessageId => 7,
        };

        Self {
            counter_type,
            value: 0,
            max_value,
        }
    }

    /// Create a new counter at a given value.
    pub fn new_from_value(counter_type: CounterType, value: u8) -> Self {
        let mut counter = Self::new(counter_type);
        counter.set(value);
        counter
    }

    /// Set the counter value. Wraps for message IDs, saturates otherwise.
    pub fn set(&mut self, value: u8) {
        self.value = match self.counter_type {
            CounterType::MessageId => value % (self.max_value + 1),
            _ => value.min(self.max_value),
        };
    }

    /// The current value.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Whether a bounded counter reached its maximum.
    pub fn is_exhausted(&self) -> bool {
        self.value >= self.max_value
    }

    /// Count up by one.
    ///
    /// Message IDs wrap to zero and report [`Error::Overrun`]. Bounded counters stay at
    /// their maximum and report [`Error::Exceeded`].
    pub fn increment(&mut self) -> Result<(), Error> {
        match self.counter_type {
            CounterType::MessageId => {
                self.set(self.value + 1);

                if self.value == 0 { Err(Error::Overrun) } else { Ok(()) }
            }
            _ if self.is_exhausted() => Err(Error::Exceeded),
            _ => {
                self.value += 1;
                Ok(())
            }
        }
    }

    /// Return to zero.
    pub fn reset(&mut self) {
        self.value = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_wraps() {
        let mut counter = Counter::new_from_value(CounterType::MessageId, 6);

        assert_eq!(counter.increment(), Ok(()));
        assert_eq!(counter.value(), 7);
        assert_eq!(counter.increment(), Err(Error::Overrun));
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_bounded_counter_saturates() {
        let mut counter = Counter::new(CounterType::Caps);

        for _ in 0..N_CAPS_COUNT {
            assert_eq!(counter.increment(), Ok(()));
        }

        assert!(counter.is_exhausted());
        assert_eq!(counter.increment(), Err(Error::Exceeded));
        assert_eq!(counter.value(), N_CAPS_COUNT);

        counter.reset();
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_set_clamps() {
        let counter = Counter::new_from_value(CounterType::HardReset, 9);
        assert_eq!(counter.value(), N_HARD_RESET_COUNT);
    }
}
