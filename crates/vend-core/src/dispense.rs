use crate::error::{Result, VendError};
use crate::inflight::InFlight;
use crate::relay::RelayDriver;
use crate::slot::{ActuatorMap, Channel, SlotId};
use std::sync::Arc;
use std::time::Duration;

/// Long enough for the spiral to complete one release turn.
pub const DEFAULT_DWELL: Duration = Duration::from_millis(3300);

/// Runs engage → hold → release cycles for slots.
///
/// Cycles are independent: two slots that share a channel (the column
/// channels, or the D/E lift) may overlap, and the first to finish releases
/// the shared channel while the other is still holding. That overlap is a
/// property of the enclosure wiring and is left as is.
#[derive(Clone)]
pub struct Dispenser {
    inner: Arc<Inner>,
}

struct Inner {
    map: ActuatorMap,
    driver: Arc<RelayDriver>,
    dwell: Duration,
    in_flight: InFlight,
}

impl Dispenser {
    pub fn new(
        map: ActuatorMap,
        driver: Arc<RelayDriver>,
        dwell: Duration,
        in_flight: InFlight,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                map,
                driver,
                dwell,
                in_flight,
            }),
        }
    }

    pub fn driver(&self) -> &RelayDriver {
        &self.inner.driver
    }

    pub fn dwell(&self) -> Duration {
        self.inner.dwell
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.inner.in_flight
    }

    /// Start a cycle on a detached task and return immediately.
    ///
    /// The cycle always runs to completion, including the release step,
    /// even after the request that triggered it is gone.
    pub fn launch(&self, slot: SlotId) {
        let guard = self.inner.in_flight.guard();
        let this = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = this.dispense(&slot).await {
                tracing::warn!(%slot, "dispense skipped: {e}");
            }
        });
    }

    /// Run one full cycle for `slot` and wait for it to finish.
    ///
    /// An unknown slot is a configuration error: nothing is driven and the
    /// error is returned for the caller to log.
    pub async fn dispense(&self, slot: &SlotId) -> Result<()> {
        let channels = self
            .inner
            .map
            .channels(slot)
            .ok_or_else(|| VendError::UnknownSlot(slot.to_string()))?;

        tracing::info!(%slot, ?channels, "dispensing");

        let release = ReleaseOnDrop {
            driver: &self.inner.driver,
            channels,
        };
        for channel in channels {
            self.inner.driver.engage(*channel);
        }
        tokio::time::sleep(self.inner.dwell).await;
        drop(release);

        tracing::info!(%slot, "finished dispensing");
        Ok(())
    }
}

/// Releases every channel of a cycle when dropped, so an early exit from the
/// cycle (panic, aborted task) still leaves the outputs idle.
struct ReleaseOnDrop<'a> {
    driver: &'a RelayDriver,
    channels: &'a [Channel],
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        for channel in self.channels {
            self.driver.disengage(*channel);
        }
    }
}
