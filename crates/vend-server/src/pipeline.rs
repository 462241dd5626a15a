use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use square_client::SquareApi;
use tokio::time::Instant;
use vend_core::dispense::Dispenser;
use vend_core::inflight::InFlight;
use vend_core::ledger::OrderLedger;

use crate::catalog::CatalogResolver;
use crate::event::WebhookEvent;

/// Outcome of handing an event to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intake {
    /// Not a completed payment; nothing recorded.
    Ignored,
    /// Order already claimed by an earlier delivery.
    Duplicate,
    /// Order claimed; processing continues on a detached task.
    Accepted,
}

/// Completed payment → order lookup → per-item slot resolution → dispense.
pub struct Pipeline {
    square: Arc<dyn SquareApi>,
    resolver: CatalogResolver,
    dispenser: Dispenser,
    ledger: OrderLedger,
    timeout: Duration,
}

impl Pipeline {
    pub fn new(
        square: Arc<dyn SquareApi>,
        dispenser: Dispenser,
        ledger: OrderLedger,
        timeout: Duration,
    ) -> Self {
        Self {
            resolver: CatalogResolver::new(Arc::clone(&square), timeout),
            square,
            dispenser,
            ledger,
            timeout,
        }
    }

    pub fn dispenser(&self) -> &Dispenser {
        &self.dispenser
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    pub fn in_flight(&self) -> &InFlight {
        self.dispenser.in_flight()
    }

    /// Gate the event through the ledger and, if it is new, process the
    /// order on a detached task. Never blocks on Square or on the relays.
    pub fn submit(self: &Arc<Self>, event: WebhookEvent) -> Intake {
        let order_id = match event {
            WebhookEvent::Ignored { reason } => {
                tracing::debug!(reason, "ignoring webhook event");
                return Intake::Ignored;
            }
            WebhookEvent::PaymentCompleted { order_id } => order_id,
        };

        if !self.ledger.try_claim(&order_id) {
            tracing::info!(%order_id, "ignoring duplicate webhook for order");
            return Intake::Duplicate;
        }

        let guard = self.in_flight().guard();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            this.process_order(&order_id).await;
        });
        Intake::Accepted
    }

    /// Fetch the order, resolve every line item concurrently and launch a
    /// dispense for each slot as soon as it resolves. Returns the number of
    /// dispenses launched.
    ///
    /// The order fetch and every item resolution share one deadline, `timeout`
    /// after the call starts. Dispense cycles are not bounded by it.
    pub async fn process_order(&self, order_id: &str) -> usize {
        tracing::info!(%order_id, "processing order");
        let deadline = Instant::now() + self.timeout;

        let fetch = tokio::time::timeout_at(deadline, self.square.fetch_order(order_id));
        let order = match fetch.await {
            Ok(Ok(Some(order))) => order,
            Ok(Ok(None)) => {
                tracing::warn!(%order_id, "order not found");
                return 0;
            }
            Ok(Err(e)) => {
                tracing::warn!(%order_id, "error fetching order: {e}");
                return 0;
            }
            Err(_) => {
                tracing::warn!(%order_id, timeout = ?self.timeout, "timed out fetching order");
                return 0;
            }
        };

        let mut pending: FuturesUnordered<_> = order
            .line_items
            .iter()
            .map(|item| async move {
                let result = self.resolver.resolve_slot_before(item, deadline).await;
                (item, result)
            })
            .collect();

        let mut launched = 0;
        while let Some((item, result)) = pending.next().await {
            match result {
                Ok(slot) => {
                    self.dispenser.launch(slot);
                    launched += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        %order_id,
                        line_item = item.uid.as_deref().unwrap_or("-"),
                        "skipping line item: {e}"
                    );
                }
            }
        }

        tracing::info!(%order_id, line_items = order.line_items.len(), launched, "order processed");
        launched
    }
}
