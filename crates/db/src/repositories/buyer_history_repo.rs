//! Repository for the append-only `buyer_history` table.

use leadbase_core::types::DbId;
use sqlx::PgPool;

use crate::models::buyer_history::BuyerHistory;

/// Column list for buyer_history queries.
const COLUMNS: &str = "id, buyer_id, changed_by, changed_at, diff";

/// Read and append operations for buyer change history. Entries are only
/// ever written from inside the update procedure's transaction.
pub struct BuyerHistoryRepo;

impl BuyerHistoryRepo {
    /// Append one history entry. Takes a connection so the caller can run it
    /// inside the same transaction as the update it records.
    pub async fn append(
        conn: &mut sqlx::PgConnection,
        buyer_id: DbId,
        changed_by: DbId,
        diff: serde_json::Value,
    ) -> Result<BuyerHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO buyer_history (buyer_id, changed_by, diff)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BuyerHistory>(&query)
            .bind(buyer_id)
            .bind(changed_by)
            .bind(diff)
            .fetch_one(conn)
            .await
    }

    /// The most recent history entries for a buyer, newest first.
    pub async fn list_recent(
        pool: &PgPool,
        buyer_id: DbId,
        limit: i64,
    ) -> Result<Vec<BuyerHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM buyer_history
             WHERE buyer_id = $1
             ORDER BY changed_at DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, BuyerHistory>(&query)
            .bind(buyer_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Total number of history entries for a buyer.
    pub async fn count_for_buyer(pool: &PgPool, buyer_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM buyer_history WHERE buyer_id = $1",
        )
        .bind(buyer_id)
        .fetch_one(pool)
        .await
    }
}
