//! Pin bank backends.
//!
//! `MemoryBank` simulates the board in-process and records every level
//! change; it backs `--simulate` runs and the test suite. `RppalBank` drives
//! the Raspberry Pi GPIO header and is only built with the `rpi` feature.

use crate::error::{Result, VendError};
use crate::relay::{Level, OutputPin, PinBank};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ---------------------------------------------------------------------------
// MemoryBank
// ---------------------------------------------------------------------------

/// One recorded level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    pub bcm: u8,
    pub level: Level,
}

#[derive(Default)]
struct BankState {
    levels: HashMap<u8, Level>,
    outputs: HashSet<u8>,
    history: Vec<PinEvent>,
    fail_claim: HashSet<u8>,
}

/// In-process pin bank. Clones share the same simulated board.
#[derive(Clone, Default)]
pub struct MemoryBank {
    state: Arc<Mutex<BankState>>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make claiming `bcm` fail, as a missing or busy line would.
    pub fn fail_claim(self, bcm: u8) -> Self {
        self.lock().fail_claim.insert(bcm);
        self
    }

    pub fn level(&self, bcm: u8) -> Option<Level> {
        self.lock().levels.get(&bcm).copied()
    }

    pub fn is_output(&self, bcm: u8) -> bool {
        self.lock().outputs.contains(&bcm)
    }

    pub fn history(&self) -> Vec<PinEvent> {
        self.lock().history.clone()
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    /// Pins that were ever driven to `level`, in first-seen order.
    pub fn pins_driven(&self, level: Level) -> Vec<u8> {
        let mut seen = Vec::new();
        for event in self.lock().history.iter().filter(|e| e.level == level) {
            if !seen.contains(&event.bcm) {
                seen.push(event.bcm);
            }
        }
        seen
    }

    fn lock(&self) -> MutexGuard<'_, BankState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PinBank for MemoryBank {
    fn claim(&self, bcm: u8) -> Result<Box<dyn OutputPin>> {
        if self.lock().fail_claim.contains(&bcm) {
            return Err(VendError::HardwareInit(format!("pin {bcm} is unavailable")));
        }
        Ok(Box::new(MemoryPin {
            bcm,
            bank: self.clone(),
        }))
    }
}

struct MemoryPin {
    bcm: u8,
    bank: MemoryBank,
}

impl MemoryPin {
    fn write(&mut self, level: Level) {
        let mut state = self.bank.lock();
        state.levels.insert(self.bcm, level);
        state.history.push(PinEvent {
            bcm: self.bcm,
            level,
        });
    }
}

impl OutputPin for MemoryPin {
    fn configure_as_output(&mut self) -> Result<()> {
        self.bank.lock().outputs.insert(self.bcm);
        Ok(())
    }

    fn set_high(&mut self) {
        self.write(Level::High);
    }

    fn set_low(&mut self) {
        self.write(Level::Low);
    }

    fn is_high(&self) -> bool {
        self.bank.level(self.bcm) == Some(Level::High)
    }
}

// ---------------------------------------------------------------------------
// RppalBank
// ---------------------------------------------------------------------------

#[cfg(feature = "rpi")]
pub use rpi::RppalBank;

#[cfg(feature = "rpi")]
mod rpi {
    use super::*;
    use rppal::gpio::Gpio;

    /// Raspberry Pi GPIO header via `/dev/gpiomem`.
    pub struct RppalBank {
        gpio: Gpio,
    }

    impl RppalBank {
        pub fn open() -> Result<Self> {
            let gpio = Gpio::new()
                .map_err(|e| VendError::HardwareInit(format!("cannot open GPIO: {e}")))?;
            Ok(Self { gpio })
        }
    }

    impl PinBank for RppalBank {
        fn claim(&self, bcm: u8) -> Result<Box<dyn OutputPin>> {
            let pin = self
                .gpio
                .get(bcm)
                .map_err(|e| VendError::HardwareInit(e.to_string()))?;
            // into_output_high avoids a low glitch between mode switch and first write.
            Ok(Box::new(RppalPin {
                pin: pin.into_output_high(),
            }))
        }
    }

    struct RppalPin {
        pin: rppal::gpio::OutputPin,
    }

    impl OutputPin for RppalPin {
        fn configure_as_output(&mut self) -> Result<()> {
            Ok(())
        }

        fn set_high(&mut self) {
            self.pin.set_high();
        }

        fn set_low(&mut self) {
            self.pin.set_low();
        }

        fn is_high(&self) -> bool {
            self.pin.is_set_high()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claimed_pin_records_levels() {
        let bank = MemoryBank::new();
        let mut pin = bank.claim(17).unwrap();
        assert_eq!(bank.level(17), None);
        assert!(!pin.is_high());

        pin.configure_as_output().unwrap();
        pin.set_low();
        pin.set_high();

        assert!(bank.is_output(17));
        assert!(pin.is_high());
        assert_eq!(
            bank.history(),
            vec![
                PinEvent {
                    bcm: 17,
                    level: Level::Low,
                },
                PinEvent {
                    bcm: 17,
                    level: Level::High,
                },
            ]
        );
    }

    #[test]
    fn clones_share_the_board() {
        let bank = MemoryBank::new();
        let view = bank.clone();
        bank.claim(4).unwrap().set_low();
        assert_eq!(view.level(4), Some(Level::Low));
        assert_eq!(view.pins_driven(Level::Low), vec![4]);
    }

    #[test]
    fn failing_pin_refuses_claim() {
        let bank = MemoryBank::new().fail_claim(2);
        assert!(matches!(bank.claim(2), Err(VendError::HardwareInit(_))));
        assert!(bank.claim(3).is_ok());
    }
}
