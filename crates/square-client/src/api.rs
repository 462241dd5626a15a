use async_trait::async_trait;

use crate::client::SquareClient;
use crate::types::{CatalogObject, CustomAttributeDefinition, Order};
use crate::Result;

/// The three lookups the order pipeline performs against Square.
///
/// `Ok(None)` means Square answered but has no such object; `Err` means the
/// call itself failed. Both are confined to the item being resolved.
#[async_trait]
pub trait SquareApi: Send + Sync {
    async fn fetch_order(&self, order_id: &str) -> Result<Option<Order>>;

    async fn fetch_catalog_object(&self, object_id: &str) -> Result<Option<CatalogObject>>;

    async fn fetch_attribute_definition(
        &self,
        definition_id: &str,
    ) -> Result<Option<CustomAttributeDefinition>>;
}

#[async_trait]
impl SquareApi for SquareClient {
    async fn fetch_order(&self, order_id: &str) -> Result<Option<Order>> {
        self.get_order(order_id).await
    }

    async fn fetch_catalog_object(&self, object_id: &str) -> Result<Option<CatalogObject>> {
        let objects = self.batch_get_catalog_objects(&[object_id]).await?;
        Ok(objects.into_iter().next())
    }

    async fn fetch_attribute_definition(
        &self,
        definition_id: &str,
    ) -> Result<Option<CustomAttributeDefinition>> {
        let objects = self.batch_get_catalog_objects(&[definition_id]).await?;
        Ok(objects.into_iter().find_map(CatalogObject::into_definition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SquareConfig;
    use std::sync::Arc;

    #[tokio::test]
    async fn definition_lookup_ignores_other_object_types() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v2/catalog/batch-retrieve")
            .with_status(200)
            .with_body(r#"{"objects": [{"type": "ITEM", "id": "DEF1"}]}"#)
            .create_async()
            .await;
        let config = SquareConfig::new("tok").with_base_url(server.url());
        let api: Arc<dyn SquareApi> = Arc::new(SquareClient::new(config).unwrap());

        let definition = api.fetch_attribute_definition("DEF1").await.unwrap();
        assert!(definition.is_none());
    }

    #[tokio::test]
    async fn empty_batch_means_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v2/catalog/batch-retrieve")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let config = SquareConfig::new("tok").with_base_url(server.url());
        let api = SquareClient::new(config).unwrap();

        let object = api.fetch_catalog_object("GONE").await.unwrap();
        assert!(object.is_none());
    }
}
