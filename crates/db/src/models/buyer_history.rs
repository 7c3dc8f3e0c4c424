//! Buyer change-history models.
//!
//! History rows are immutable once created (no `updated_at`) and exist only
//! as a side effect of a successful update that changed at least one field.

use leadbase_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// A row from the `buyer_history` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BuyerHistory {
    pub id: DbId,
    pub buyer_id: DbId,
    pub changed_by: DbId,
    pub changed_at: Timestamp,
    /// Field name -> `{old, new}` for every field the update changed.
    pub diff: Value,
}

/// One field's old/new value pair inside a history diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

impl FieldChange {
    /// Build a change record from any two serializable values.
    pub fn of<O: Serialize, N: Serialize>(old: &O, new: &N) -> Self {
        Self {
            old: serde_json::to_value(old).unwrap_or_default(),
            new: serde_json::to_value(new).unwrap_or_default(),
        }
    }
}
