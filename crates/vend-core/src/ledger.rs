use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Order ids that have already triggered a dispense.
///
/// Square delivers webhooks at least once, so the same `payment.updated`
/// event can arrive several times. `try_claim` is the only thing standing
/// between a redelivery and a second physical dispense.
#[derive(Debug, Default)]
pub struct OrderLedger {
    claimed: Mutex<HashMap<String, Instant>>,
    retention: Option<Duration>,
}

impl OrderLedger {
    /// Remembers every order for the lifetime of the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets orders claimed more than `retention` ago. Pick a window longer
    /// than the provider's redelivery horizon.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            claimed: Mutex::default(),
            retention: Some(retention),
        }
    }

    /// Record `order_id` and return `true` the first time it is seen; return
    /// `false` for every later call. Check and insert happen under one lock.
    pub fn try_claim(&self, order_id: &str) -> bool {
        self.try_claim_at(order_id, Instant::now())
    }

    fn try_claim_at(&self, order_id: &str, now: Instant) -> bool {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(retention) = self.retention {
            claimed.retain(|_, at| now.saturating_duration_since(*at) < retention);
        }
        if claimed.contains_key(order_id) {
            return false;
        }
        claimed.insert(order_id.to_string(), now);
        true
    }

    pub fn len(&self) -> usize {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
