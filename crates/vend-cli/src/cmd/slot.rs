use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use vend_core::dispense::Dispenser;
use vend_core::inflight::InFlight;
use vend_core::relay::{ChannelTable, RelayDriver};
use vend_core::slot::{ActuatorMap, SlotId};

use crate::hardware;

/// Bench check for one compartment: the same cycle a paid order runs.
pub fn run(simulate: bool, label: &str, dwell_ms: u64) -> Result<()> {
    let slot: SlotId = label.parse()?;
    let map = ActuatorMap::standard();
    let channels = map
        .channels(&slot)
        .ok_or_else(|| anyhow!("unknown slot '{slot}' (run `vend slots` to list them)"))?
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let bank = hardware::open_bank(simulate)?;
    let driver = RelayDriver::configure(bank.as_ref(), &ChannelTable::standard())?;
    let dispenser = Dispenser::new(
        map,
        Arc::new(driver),
        Duration::from_millis(dwell_ms),
        InFlight::new(),
    );

    println!(
        "Triggering slot {slot} (channels {channels}) for {} ms",
        dispenser.dwell().as_millis()
    );
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(dispenser.dispense(&slot))?;
    println!("Slot {slot} released");
    Ok(())
}
