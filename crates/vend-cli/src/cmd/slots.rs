use anyhow::Result;
use serde::Serialize;
use vend_core::relay::ChannelTable;
use vend_core::slot::ActuatorMap;

use crate::output::{print_json, print_table};

#[derive(Serialize)]
struct SlotRow<'a> {
    slot: &'a str,
    channels: Vec<u8>,
    /// BCM pin numbers, in channel order; unbound channels are omitted.
    pins: Vec<u8>,
}

impl SlotRow<'_> {
    fn cells(&self) -> Vec<String> {
        vec![self.slot.to_string(), join(&self.channels), join(&self.pins)]
    }
}

pub fn run(json: bool) -> Result<()> {
    let map = ActuatorMap::standard();
    let table = ChannelTable::standard();

    let rows: Vec<SlotRow<'_>> = map
        .slots()
        .map(|(slot, channels)| SlotRow {
            slot: slot.as_str(),
            channels: channels.iter().map(|c| c.0).collect(),
            pins: channels.iter().filter_map(|c| table.pin(*c)).collect(),
        })
        .collect();

    if json {
        return print_json(&rows);
    }

    let cells: Vec<Vec<String>> = rows.iter().map(SlotRow::cells).collect();
    print_table(&["SLOT", "CHANNELS", "BCM PINS"], &cells);
    println!("\n{} slots, {} relay channels", map.len(), table.iter().count());
    Ok(())
}

fn join(values: &[u8]) -> String {
    values
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
