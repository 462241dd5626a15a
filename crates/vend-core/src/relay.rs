//! Relay board driver.
//!
//! The relay board is active-low: a channel is energized while its pin is
//! driven low and released while it is high. Every channel is forced high as
//! soon as it is claimed so the motors never start on power-up.

use crate::error::{Result, VendError};
use crate::slot::Channel;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    High,
    Low,
}

impl Level {
    /// Released / safe.
    pub const IDLE: Level = Level::High;
    /// Energized.
    pub const ACTIVE: Level = Level::Low;
}

// ---------------------------------------------------------------------------
// Pin capability
// ---------------------------------------------------------------------------

/// A single claimed output line.
pub trait OutputPin: Send {
    fn configure_as_output(&mut self) -> Result<()>;
    fn set_high(&mut self);
    fn set_low(&mut self);
    fn is_high(&self) -> bool;
}

/// Source of output pins, addressed by BCM number.
pub trait PinBank {
    fn claim(&self, bcm: u8) -> Result<Box<dyn OutputPin>>;
}

// ---------------------------------------------------------------------------
// ChannelTable
// ---------------------------------------------------------------------------

/// Logical channel → BCM pin, as wired on the controller board.
const STANDARD_PINS: [(u8, u8); 16] = [
    (1, 2),
    (2, 3),
    (3, 4),
    (4, 17),
    (5, 27),
    (6, 22),
    (7, 10),
    (8, 9),
    (9, 11),
    (10, 5),
    (11, 6),
    (12, 13),
    (13, 19),
    (14, 26),
    (15, 14),
    (16, 15),
];

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ChannelTable {
    pins: BTreeMap<Channel, u8>,
}

impl ChannelTable {
    pub fn standard() -> Self {
        Self::from_pairs(STANDARD_PINS.iter().map(|&(ch, bcm)| (Channel(ch), bcm)))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (Channel, u8)>) -> Self {
        Self {
            pins: pairs.into_iter().collect(),
        }
    }

    pub fn pin(&self, channel: Channel) -> Option<u8> {
        self.pins.get(&channel).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, u8)> + '_ {
        self.pins.iter().map(|(ch, bcm)| (*ch, *bcm))
    }
}

// ---------------------------------------------------------------------------
// RelayDriver
// ---------------------------------------------------------------------------

/// Owns every relay output for the lifetime of the process.
///
/// Each pin sits behind its own mutex, held only for the duration of a single
/// level change. Operations on distinct channels never contend, and nothing
/// serializes a whole dispense cycle.
pub struct RelayDriver {
    pins: BTreeMap<Channel, Mutex<Box<dyn OutputPin>>>,
}

impl RelayDriver {
    /// Claim every pin in `table`, switch it to output and force it idle.
    ///
    /// Any failure here is fatal: the controller must not accept payments it
    /// cannot fulfil.
    pub fn configure(bank: &dyn PinBank, table: &ChannelTable) -> Result<Self> {
        let mut pins = BTreeMap::new();
        for (channel, bcm) in table.iter() {
            let mut pin = bank.claim(bcm).map_err(|e| match e {
                VendError::HardwareInit(msg) => {
                    VendError::HardwareInit(format!("channel {channel} (BCM {bcm}): {msg}"))
                }
                other => other,
            })?;
            pin.configure_as_output()?;
            pin.set_high();
            pins.insert(channel, Mutex::new(pin));
        }
        tracing::info!(channels = pins.len(), "relay outputs configured idle");
        Ok(Self { pins })
    }

    /// Energize a channel. Unknown channels are logged and skipped.
    pub fn engage(&self, channel: Channel) {
        self.drive(channel, Level::ACTIVE);
    }

    /// Release a channel. Unknown channels are logged and skipped.
    pub fn disengage(&self, channel: Channel) {
        self.drive(channel, Level::IDLE);
    }

    pub fn level(&self, channel: Channel) -> Option<Level> {
        let pin = self.pins.get(&channel)?;
        let pin = pin.lock().unwrap_or_else(PoisonError::into_inner);
        if pin.is_high() {
            Some(Level::High)
        } else {
            Some(Level::Low)
        }
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.pins.keys().copied()
    }

    pub fn all_idle(&self) -> bool {
        self.channels().all(|c| self.level(c) == Some(Level::IDLE))
    }

    /// Force every channel idle regardless of in-flight cycles.
    pub fn release_all(&self) {
        for channel in self.pins.keys() {
            self.disengage(*channel);
        }
    }

    fn drive(&self, channel: Channel, level: Level) {
        let Some(pin) = self.pins.get(&channel) else {
            tracing::warn!(%channel, "relay channel not configured; skipping");
            return;
        };
        let mut pin = pin.lock().unwrap_or_else(PoisonError::into_inner);
        match level {
            Level::High => pin.set_high(),
            Level::Low => pin.set_low(),
        }
    }
}

impl std::fmt::Debug for RelayDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayDriver")
            .field("channels", &self.pins.keys().collect::<Vec<_>>())
            .finish()
    }
}
