//! Product entity model and summary projection.
//!
//! The catalog itself (upload, edit, filtering) lives outside this
//! system; conversations only need existence, current ownership, and the
//! summary fields shown in thread previews.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tradepost_core::types::{DbId, Timestamp};

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category: String,
    pub condition: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Summary fields joined into conversation previews.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category: String,
    pub condition: String,
}

/// DTO for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub owner_id: DbId,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category: String,
    pub condition: String,
}
