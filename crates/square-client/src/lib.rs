//! The slice of the Square REST API the vending controller needs:
//! retrieve an order, and batch-retrieve catalog objects (items, item
//! variations and custom attribute definitions).
//!
//! ```text
//! SquareClient  ← reqwest, bearer token, pinned Square-Version
//!     │
//!     ▼
//! SquareApi     ← object-safe seam used by the order pipeline
//!     │            (fetch_order / fetch_catalog_object / fetch_attribute_definition)
//!     ▼
//! types         ← Order, LineItem, CatalogObject, CustomAttributeDefinition
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::SquareApi;
pub use client::{SquareClient, SquareConfig};
pub use error::{Result, SquareError};
pub use types::{
    AllowedSelection, CatalogItemObject, CatalogObject, CustomAttributeDefinition,
    CustomAttributeValue, LineItem, Order, SelectionConfig,
};
