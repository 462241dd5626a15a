use crate::error::{Result, VendError};
use crate::relay::ChannelTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// SlotId / Channel
// ---------------------------------------------------------------------------

/// Human-readable slot label such as `A1` or `D8`.
///
/// Labels are normalized on construction (trimmed, upper-cased) so that the
/// label configured in the catalog and the one typed at the bench resolve to
/// the same compartment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SlotId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SlotId {
    type Err = VendError;

    fn from_str(s: &str) -> Result<Self> {
        let id = SlotId::new(s);
        if id.0.is_empty() {
            return Err(VendError::InvalidSlot(s.to_string()));
        }
        Ok(id)
    }
}

/// Logical relay channel, numbered 1..=16 on the relay board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub u8);

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ActuatorMap
// ---------------------------------------------------------------------------

/// Relay channels per slot, in the order they are driven.
///
/// Rows A, B, C and F use four channels: one row selector plus three of the
/// shared column channels (7, 12, 13, 14). Rows D and E drive eight channels
/// through the lift mechanism shared by both rows.
const STANDARD_SLOTS: &[(&str, &[u8])] = &[
    ("A1", &[3, 12, 13, 14]),
    ("A2", &[3, 7, 13, 14]),
    ("A3", &[3, 7, 12, 14]),
    ("A4", &[3, 7, 12, 13]),
    ("B1", &[2, 12, 13, 14]),
    ("B2", &[2, 7, 13, 14]),
    ("B3", &[2, 7, 12, 14]),
    ("B4", &[2, 7, 12, 13]),
    ("C1", &[5, 12, 13, 14]),
    ("C2", &[5, 7, 13, 14]),
    ("C3", &[5, 7, 12, 14]),
    ("C4", &[5, 7, 12, 13]),
    ("D1", &[4, 16, 15, 14, 13, 12, 10, 8]),
    ("D2", &[4, 16, 15, 14, 13, 10, 8, 7]),
    ("D3", &[4, 16, 15, 14, 12, 10, 8, 7]),
    ("D4", &[4, 16, 15, 13, 12, 10, 8, 7]),
    ("D5", &[4, 16, 14, 13, 12, 7, 8, 10]),
    ("D6", &[4, 16, 14, 13, 12, 7, 8, 15]),
    ("D7", &[4, 15, 14, 13, 12, 10, 8, 7]),
    ("D8", &[4, 16, 15, 14, 13, 12, 10, 7]),
    ("E1", &[1, 16, 15, 14, 13, 12, 10, 8]),
    ("E2", &[1, 16, 15, 14, 13, 10, 8, 7]),
    ("E3", &[1, 16, 15, 14, 12, 10, 8, 7]),
    ("E4", &[1, 16, 15, 13, 12, 10, 8, 7]),
    ("E5", &[1, 16, 14, 13, 12, 7, 8, 10]),
    ("E6", &[1, 16, 14, 13, 12, 7, 8, 15]),
    ("E7", &[1, 15, 14, 13, 12, 10, 8, 7]),
    ("E8", &[1, 16, 15, 14, 13, 12, 10, 7]),
    ("F1", &[6, 12, 13, 14]),
    ("F2", &[6, 7, 13, 14]),
    ("F3", &[6, 7, 12, 14]),
    ("F4", &[6, 7, 12, 13]),
];

/// Static slot → relay channel table. Built once at startup and shared
/// read-only between every dispense task.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ActuatorMap {
    slots: BTreeMap<SlotId, Vec<Channel>>,
}

impl ActuatorMap {
    /// The table wired into the deployed enclosure.
    pub fn standard() -> Self {
        let entries = STANDARD_SLOTS.iter().map(|(label, channels)| {
            let channels = channels.iter().map(|&c| Channel(c)).collect();
            (SlotId::new(label), channels)
        });
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (SlotId, Vec<Channel>)>) -> Self {
        Self {
            slots: entries.into_iter().collect(),
        }
    }

    pub fn channels(&self, slot: &SlotId) -> Option<&[Channel]> {
        self.slots.get(slot).map(Vec::as_slice)
    }

    /// Slots in label order.
    pub fn slots(&self) -> impl Iterator<Item = (&SlotId, &[Channel])> {
        self.slots.iter().map(|(id, chans)| (id, chans.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Every channel referenced by a slot must be bound to a pin.
    pub fn validate(&self, table: &ChannelTable) -> Result<()> {
        for (slot, channels) in &self.slots {
            if let Some(missing) = channels.iter().find(|c| table.pin(**c).is_none()) {
                return Err(VendError::UnboundChannel {
                    slot: slot.to_string(),
                    channel: missing.0,
                });
            }
        }
        Ok(())
    }
}
