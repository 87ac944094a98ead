//! GPIO pin abstractions
//!
//! The bus only drives one pin: the transceiver direction (DE/RE) line.

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Direction pin backed by an `embedded-hal` output
///
/// Only infallible pins are accepted: a direction pin that can fail to
/// switch would leave the transceiver in an unknown mode.
pub struct DirectionPin<P> {
    pin: P,
    high: bool,
}

impl<P> DirectionPin<P>
where
    P: embedded_hal::digital::OutputPin<Error = core::convert::Infallible>,
{
    /// Wrap a pin, driving it low (receive) immediately
    pub fn new(mut pin: P) -> Self {
        pin.set_low().unwrap_or_else(|e| match e {});
        Self { pin, high: false }
    }

    /// Give the underlying pin back
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> OutputPin for DirectionPin<P>
where
    P: embedded_hal::digital::OutputPin<Error = core::convert::Infallible>,
{
    fn set_high(&mut self) {
        self.pin.set_high().unwrap_or_else(|e| match e {});
        self.high = true;
    }

    fn set_low(&mut self) {
        self.pin.set_low().unwrap_or_else(|e| match e {});
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct Level {
        high: bool,
        writes: u8,
    }

    impl embedded_hal::digital::ErrorType for Level {
        type Error = Infallible;
    }

    impl embedded_hal::digital::OutputPin for Level {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_direction_pin_starts_low() {
        let pin = DirectionPin::new(Level {
            high: true,
            writes: 0,
        });
        assert!(pin.is_set_low());

        let raw = pin.release();
        assert!(!raw.high);
        assert_eq!(raw.writes, 1);
    }

    #[test]
    fn test_direction_pin_set_state() {
        let mut pin = DirectionPin::new(Level {
            high: false,
            writes: 0,
        });

        pin.set_state(true);
        assert!(pin.is_set_high());

        pin.set_state(false);
        assert!(pin.is_set_low());
        assert!(!pin.release().high);
    }
}
