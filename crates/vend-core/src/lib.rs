pub mod config;
pub mod dispense;
pub mod error;
pub mod gpio;
pub mod inflight;
pub mod ledger;
pub mod relay;
pub mod slot;

pub use error::{Result, VendError};
