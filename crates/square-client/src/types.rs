use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// `GET /v2/orders/{order_id}` response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrieveOrderResponse {
    #[serde(default)]
    pub order: Option<Order>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Order {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LineItem {
    /// Order-scoped id of the line item.
    #[serde(default)]
    pub uid: Option<String>,
    /// Catalog item variation the line item was sold from.
    #[serde(default)]
    pub catalog_object_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
}

impl LineItem {
    /// Catalog id to resolve: the explicit catalog object id, falling back to
    /// the line item uid. Empty strings count as absent.
    pub fn catalog_reference(&self) -> Option<&str> {
        fn non_empty(s: &Option<String>) -> Option<&str> {
            s.as_deref().filter(|s| !s.is_empty())
        }
        non_empty(&self.catalog_object_id).or_else(|| non_empty(&self.uid))
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// `POST /v2/catalog/batch-retrieve` request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchRetrieveRequest {
    pub object_ids: Vec<String>,
    pub include_related_objects: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BatchRetrieveResponse {
    #[serde(default)]
    pub objects: Vec<CatalogObject>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub detail: Option<String>,
}

/// A catalog object, discriminated by the JSON `"type"` field.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogObject {
    Item(CatalogItemObject),
    ItemVariation(CatalogItemObject),
    CustomAttributeDefinition(CustomAttributeDefinitionObject),
    /// Categories, taxes, images and the rest; never carries a slot.
    #[serde(other)]
    Other,
}

impl CatalogObject {
    /// Custom attribute values of an item or item variation. `None` for any
    /// other object type.
    pub fn custom_attribute_values(&self) -> Option<&BTreeMap<String, CustomAttributeValue>> {
        match self {
            CatalogObject::Item(o) | CatalogObject::ItemVariation(o) => {
                Some(&o.custom_attribute_values)
            }
            _ => None,
        }
    }

    pub fn into_definition(self) -> Option<CustomAttributeDefinition> {
        match self {
            CatalogObject::CustomAttributeDefinition(d) => d.custom_attribute_definition_data,
            _ => None,
        }
    }
}

/// Fields shared by `ITEM` and `ITEM_VARIATION` objects.
///
/// Values are keyed by attribute key and kept in a `BTreeMap`, so iteration
/// starts at the lexicographically lowest key regardless of the order Square
/// serialized them in.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogItemObject {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub custom_attribute_values: BTreeMap<String, CustomAttributeValue>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CustomAttributeValue {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub custom_attribute_definition_id: Option<String>,
    #[serde(default)]
    pub selection_uid_values: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CustomAttributeDefinitionObject {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub custom_attribute_definition_data: Option<CustomAttributeDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CustomAttributeDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub selection_config: Option<SelectionConfig>,
}

impl CustomAttributeDefinition {
    /// Name of the allowed selection with `uid`, if any.
    pub fn selection_name(&self, uid: &str) -> Option<&str> {
        self.selection_config
            .as_ref()?
            .allowed_selections
            .iter()
            .find(|s| s.uid.as_deref() == Some(uid) && !s.name.is_empty())
            .map(|s| s.name.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub max_allowed_selections: Option<u32>,
    #[serde(default)]
    pub allowed_selections: Vec<AllowedSelection>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AllowedSelection {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: String,
}
