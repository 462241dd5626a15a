//! In-memory `SquareApi` for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use square_client::types::CustomAttributeDefinitionObject;
use square_client::{
    AllowedSelection, CatalogItemObject, CatalogObject, CustomAttributeDefinition,
    CustomAttributeValue, LineItem, Order, SelectionConfig, SquareApi, SquareError,
};

#[derive(Default)]
pub struct FakeSquare {
    orders: HashMap<String, Order>,
    objects: HashMap<String, CatalogObject>,
    failing: HashSet<String>,
    latency: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl FakeSquare {
    pub fn new() -> Self {
        Self::default()
    }

    /// Order whose line items reference `catalog_ids`, in order.
    pub fn with_order(mut self, order_id: &str, catalog_ids: &[&str]) -> Self {
        let line_items = catalog_ids
            .iter()
            .enumerate()
            .map(|(i, id)| LineItem {
                uid: Some(format!("{order_id}-li-{i}")),
                catalog_object_id: Some(id.to_string()),
                ..Default::default()
            })
            .collect();
        self.orders.insert(
            order_id.to_string(),
            Order {
                id: order_id.to_string(),
                line_items,
            },
        );
        self
    }

    pub fn with_plain_item(mut self, object_id: &str) -> Self {
        self.objects.insert(
            object_id.to_string(),
            CatalogObject::ItemVariation(CatalogItemObject {
                id: object_id.to_string(),
                ..Default::default()
            }),
        );
        self
    }

    /// Add one custom attribute value to an item variation, creating it if needed.
    pub fn with_attribute(
        mut self,
        object_id: &str,
        key: &str,
        definition_id: Option<&str>,
        selection_uids: &[&str],
    ) -> Self {
        let entry = self
            .objects
            .entry(object_id.to_string())
            .or_insert_with(|| {
                CatalogObject::ItemVariation(CatalogItemObject {
                    id: object_id.to_string(),
                    ..Default::default()
                })
            });
        if let CatalogObject::Item(item) | CatalogObject::ItemVariation(item) = entry {
            item.custom_attribute_values.insert(
                key.to_string(),
                CustomAttributeValue {
                    key: Some(key.to_string()),
                    custom_attribute_definition_id: definition_id.map(str::to_string),
                    selection_uid_values: selection_uids.iter().map(|s| s.to_string()).collect(),
                    ..Default::default()
                },
            );
        }
        self
    }

    pub fn with_slot_item(self, object_id: &str, definition_id: &str, selection_uid: &str) -> Self {
        self.with_attribute(object_id, "slot", Some(definition_id), &[selection_uid])
    }

    /// Definition with `(uid, name)` allowed selections.
    pub fn with_definition(mut self, definition_id: &str, selections: &[(&str, &str)]) -> Self {
        let allowed_selections = selections
            .iter()
            .map(|(uid, name)| AllowedSelection {
                uid: Some(uid.to_string()),
                name: name.to_string(),
            })
            .collect();
        self.objects.insert(
            definition_id.to_string(),
            CatalogObject::CustomAttributeDefinition(CustomAttributeDefinitionObject {
                id: definition_id.to_string(),
                custom_attribute_definition_data: Some(CustomAttributeDefinition {
                    name: Some("Slot".into()),
                    selection_config: Some(SelectionConfig {
                        max_allowed_selections: Some(1),
                        allowed_selections,
                    }),
                }),
            }),
        );
        self
    }

    /// Lookups of `id` (order or catalog object) answer with a 500.
    pub fn failing_object(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Shared counter of every call made, readable after the fake is moved.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    async fn enter(&self, id: &str) -> square_client::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(id) {
            return Err(SquareError::Status {
                status: 500,
                body: format!("injected failure for {id}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SquareApi for FakeSquare {
    async fn fetch_order(&self, order_id: &str) -> square_client::Result<Option<Order>> {
        self.enter(order_id).await?;
        Ok(self.orders.get(order_id).cloned())
    }

    async fn fetch_catalog_object(
        &self,
        object_id: &str,
    ) -> square_client::Result<Option<CatalogObject>> {
        self.enter(object_id).await?;
        Ok(self.objects.get(object_id).cloned())
    }

    async fn fetch_attribute_definition(
        &self,
        definition_id: &str,
    ) -> square_client::Result<Option<CustomAttributeDefinition>> {
        self.enter(definition_id).await?;
        Ok(self
            .objects
            .get(definition_id)
            .cloned()
            .and_then(CatalogObject::into_definition))
    }
}
