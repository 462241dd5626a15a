use std::time::Duration;

use anyhow::{bail, Result};
use vend_core::relay::{ChannelTable, RelayDriver};
use vend_core::slot::Channel;

use crate::hardware;

/// Energize raw channels together, hold, then release them. Channels the
/// board does not have are reported and skipped.
pub fn run(simulate: bool, channels: &[u8], hold_ms: u64) -> Result<()> {
    let table = ChannelTable::standard();

    let mut selected: Vec<(Channel, u8)> = Vec::new();
    for &raw in channels {
        let channel = Channel(raw);
        match table.pin(channel) {
            Some(_) if selected.iter().any(|(c, _)| *c == channel) => {}
            Some(bcm) => selected.push((channel, bcm)),
            None => eprintln!("skipping relay {raw}: channels are numbered 1-16"),
        }
    }
    if selected.is_empty() {
        bail!("no valid relay channels given");
    }

    let bank = hardware::open_bank(simulate)?;
    let driver = RelayDriver::configure(bank.as_ref(), &table)?;

    for (channel, bcm) in &selected {
        driver.engage(*channel);
        println!("Relay {channel} ON (BCM {bcm})");
    }
    std::thread::sleep(Duration::from_millis(hold_ms));
    for (channel, _) in &selected {
        driver.disengage(*channel);
        println!("Relay {channel} OFF");
    }
    Ok(())
}
