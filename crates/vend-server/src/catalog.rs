//! Line item → slot resolution.
//!
//! The slot label is not stored on the item directly. Each sellable variation
//! carries a SELECTION custom attribute whose value is a selection uid; the
//! attribute's definition maps that uid to the human-readable option name,
//! and that name is the slot label:
//!
//! ```text
//! LineItem.catalog_object_id
//!     → CatalogObject.custom_attribute_values[lowest key]
//!         → (custom_attribute_definition_id, selection_uid_values[0])
//!             → CustomAttributeDefinition.selection_config.allowed_selections[uid].name
//! ```
//!
//! Any missing link fails the item, never the order.

use std::sync::Arc;
use std::time::Duration;

use square_client::{LineItem, SquareApi, SquareError};
use thiserror::Error;
use tokio::time::Instant;
use vend_core::slot::SlotId;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("line item has neither a catalog object id nor a uid")]
    NoCatalogReference,

    #[error("catalog object {0} not found")]
    ObjectNotFound(String),

    #[error("no custom attributes found on {0}")]
    NoCustomAttributes(String),

    #[error("custom attribute on {0} has no selection uid values")]
    NoSelection(String),

    #[error("custom attribute on {0} names no definition")]
    NoDefinitionId(String),

    #[error("custom attribute definition {0} not found")]
    DefinitionNotFound(String),

    #[error("selection uid {uid} not found in definition {definition_id}")]
    SelectionNotAllowed { uid: String, definition_id: String },

    #[error("deadline passed while resolving {object_id}")]
    Timeout { object_id: String },

    #[error(transparent)]
    Api(#[from] SquareError),
}

pub struct CatalogResolver {
    square: Arc<dyn SquareApi>,
    timeout: Duration,
}

impl CatalogResolver {
    pub fn new(square: Arc<dyn SquareApi>, timeout: Duration) -> Self {
        Self { square, timeout }
    }

    /// Resolve the slot a line item is stocked in. Both catalog calls run
    /// back to back and share one `timeout` budget.
    pub async fn resolve_slot(&self, item: &LineItem) -> Result<SlotId, ResolveError> {
        let deadline = Instant::now() + self.timeout;
        self.resolve_slot_before(item, deadline).await
    }

    /// Like `resolve_slot`, but bounded by a deadline shared with the rest of
    /// the order.
    pub async fn resolve_slot_before(
        &self,
        item: &LineItem,
        deadline: Instant,
    ) -> Result<SlotId, ResolveError> {
        let object_id = item
            .catalog_reference()
            .ok_or(ResolveError::NoCatalogReference)?;
        tokio::time::timeout_at(deadline, self.resolve_reference(object_id))
            .await
            .map_err(|_| ResolveError::Timeout {
                object_id: object_id.to_string(),
            })?
    }

    async fn resolve_reference(&self, object_id: &str) -> Result<SlotId, ResolveError> {
        let object = self
            .square
            .fetch_catalog_object(object_id)
            .await?
            .ok_or_else(|| ResolveError::ObjectNotFound(object_id.to_string()))?;

        let no_attributes = || ResolveError::NoCustomAttributes(object_id.to_string());
        let values = object.custom_attribute_values().ok_or_else(no_attributes)?;
        let (key, value) = values.iter().next().ok_or_else(no_attributes)?;
        if values.len() > 1 {
            tracing::debug!(object_id, key = %key, "several custom attributes; using lowest key");
        }

        let selection_uid = value
            .selection_uid_values
            .first()
            .ok_or_else(|| ResolveError::NoSelection(object_id.to_string()))?;
        let definition_id = value
            .custom_attribute_definition_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ResolveError::NoDefinitionId(object_id.to_string()))?;

        let definition = self
            .square
            .fetch_attribute_definition(definition_id)
            .await?
            .ok_or_else(|| ResolveError::DefinitionNotFound(definition_id.to_string()))?;

        let label = definition.selection_name(selection_uid).ok_or_else(|| {
            ResolveError::SelectionNotAllowed {
                uid: selection_uid.clone(),
                definition_id: definition_id.to_string(),
            }
        })?;

        tracing::info!(object_id, slot = label, "resolved slot label");
        Ok(SlotId::new(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSquare;

    fn item(catalog_object_id: &str) -> LineItem {
        LineItem {
            uid: Some(format!("uid-{catalog_object_id}")),
            catalog_object_id: Some(catalog_object_id.to_string()),
            ..Default::default()
        }
    }

    fn resolver(square: FakeSquare) -> CatalogResolver {
        CatalogResolver::new(Arc::new(square), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn resolves_selection_name_as_slot() {
        let square = FakeSquare::new()
            .with_slot_item("VAR1", "DEF1", "SEL-B3")
            .with_definition("DEF1", &[("SEL-A1", "A1"), ("SEL-B3", "B3")]);

        let slot = resolver(square).resolve_slot(&item("VAR1")).await.unwrap();
        assert_eq!(slot, SlotId::new("B3"));
    }

    #[tokio::test]
    async fn falls_back_to_line_item_uid() {
        let square = FakeSquare::new()
            .with_slot_item("uid-only", "DEF1", "SEL-A1")
            .with_definition("DEF1", &[("SEL-A1", "A1")]);
        let item = LineItem {
            uid: Some("uid-only".into()),
            ..Default::default()
        };

        let slot = resolver(square).resolve_slot(&item).await.unwrap();
        assert_eq!(slot, SlotId::new("A1"));
    }

    #[tokio::test]
    async fn item_without_reference_fails() {
        let err = resolver(FakeSquare::new())
            .resolve_slot(&LineItem::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoCatalogReference));
    }

    #[tokio::test]
    async fn missing_object_fails() {
        let err = resolver(FakeSquare::new())
            .resolve_slot(&item("GONE"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ObjectNotFound(ref id) if id == "GONE"));
    }

    #[tokio::test]
    async fn object_without_attributes_fails() {
        let square = FakeSquare::new().with_plain_item("VAR1");
        let err = resolver(square).resolve_slot(&item("VAR1")).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoCustomAttributes(_)));
    }

    #[tokio::test]
    async fn attribute_without_selection_fails() {
        let square = FakeSquare::new()
            .with_attribute("VAR1", "slot", Some("DEF1"), &[])
            .with_definition("DEF1", &[("SEL-A1", "A1")]);
        let err = resolver(square).resolve_slot(&item("VAR1")).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoSelection(_)));
    }

    #[tokio::test]
    async fn missing_definition_fails() {
        let square = FakeSquare::new().with_slot_item("VAR1", "DEF1", "SEL-A1");
        let err = resolver(square).resolve_slot(&item("VAR1")).await.unwrap_err();
        assert!(matches!(err, ResolveError::DefinitionNotFound(ref id) if id == "DEF1"));
    }

    #[tokio::test]
    async fn uid_outside_allowed_selections_fails() {
        let square = FakeSquare::new()
            .with_slot_item("VAR1", "DEF1", "SEL-Z9")
            .with_definition("DEF1", &[("SEL-A1", "A1")]);
        let err = resolver(square).resolve_slot(&item("VAR1")).await.unwrap_err();
        match err {
            ResolveError::SelectionNotAllowed { uid, .. } => assert_eq!(uid, "SEL-Z9"),
            other => panic!("expected SelectionNotAllowed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lowest_attribute_key_wins() {
        let square = FakeSquare::new()
            .with_attribute("VAR1", "zz-other", Some("DEF2"), &["SEL-X"])
            .with_attribute("VAR1", "aa-slot", Some("DEF1"), &["SEL-C2"])
            .with_definition("DEF1", &[("SEL-C2", "C2")])
            .with_definition("DEF2", &[("SEL-X", "F4")]);

        let slot = resolver(square).resolve_slot(&item("VAR1")).await.unwrap();
        assert_eq!(slot, SlotId::new("C2"));
    }

    #[tokio::test]
    async fn api_error_is_confined_to_the_item() {
        let square = FakeSquare::new().failing_object("VAR1");
        let err = resolver(square).resolve_slot(&item("VAR1")).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Api(SquareError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn slow_lookup_times_out() {
        let square = FakeSquare::new()
            .with_slot_item("VAR1", "DEF1", "SEL-A1")
            .with_definition("DEF1", &[("SEL-A1", "A1")])
            .with_latency(Duration::from_millis(200));
        let resolver = CatalogResolver::new(Arc::new(square), Duration::from_millis(50));

        let err = resolver.resolve_slot(&item("VAR1")).await.unwrap_err();
        assert!(matches!(err, ResolveError::Timeout { .. }));
    }
}
