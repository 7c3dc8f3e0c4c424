//! Repository for the `buyers` table.

use chrono::Duration;
use leadbase_core::search::MAX_EXPORT_ROWS;
use leadbase_core::types::{DbId, Timestamp};
use leadbase_core::validation::DEFAULT_STATUS;
use sqlx::PgPool;

use crate::models::buyer::{
    Buyer, BuyerFilter, CreateBuyer, SortColumn, SortOrder, UpdateBuyer,
};
use crate::repositories::BuyerHistoryRepo;

/// Column list for buyers queries.
const COLUMNS: &str = "\
    id, owner_id, full_name, email, phone, city, property_type, bhk, \
    purpose, budget_min, budget_max, timeline, source, status, notes, \
    tags, created_at, updated_at";

/// Column list for INSERT (excludes auto-generated `id`, `created_at`,
/// `updated_at`).
const INSERT_COLUMNS: &str = "\
    owner_id, full_name, email, phone, city, property_type, bhk, purpose, \
    budget_min, budget_max, timeline, source, status, notes, tags";

/// Number of bind parameters per row in [`INSERT_COLUMNS`].
const INSERT_PARAMS: usize = 15;

/// The pre- and post-update row returned by
/// [`BuyerRepo::update_with_history`].
#[derive(Debug)]
pub struct BuyerUpdate {
    pub before: Buyer,
    pub after: Buyer,
}

/// Failure modes of the update-with-history procedure.
#[derive(Debug, thiserror::Error)]
pub enum BuyerUpdateError {
    /// No row matched the id within the caller's ownership scope.
    #[error("buyer not found")]
    NotFound,

    /// The caller's expected timestamp is stale, or the row vanished between
    /// the locked read and the write.
    #[error("buyer was modified concurrently")]
    Conflict,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Provides CRUD, search, and tag-suggestion operations for buyers.
pub struct BuyerRepo;

impl BuyerRepo {
    /// Create a new buyer owned by `owner_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateBuyer,
    ) -> Result<Buyer, sqlx::Error> {
        let query = format!(
            "INSERT INTO buyers ({INSERT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Buyer>(&query)
            .bind(owner_id)
            .bind(&input.full_name)
            .bind(input.email.as_deref())
            .bind(&input.phone)
            .bind(&input.city)
            .bind(&input.property_type)
            .bind(input.bhk.as_deref())
            .bind(&input.purpose)
            .bind(input.budget_min)
            .bind(input.budget_max)
            .bind(&input.timeline)
            .bind(&input.source)
            .bind(input.status.as_deref().unwrap_or(DEFAULT_STATUS))
            .bind(input.notes.as_deref())
            .bind(input.tags.clone().unwrap_or_default())
            .fetch_one(pool)
            .await
    }

    /// Find a buyer by id, scoped to `owner` unless `owner` is `None`
    /// (admin: any owner).
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        owner: Option<DbId>,
    ) -> Result<Option<Buyer>, sqlx::Error> {
        match owner {
            Some(owner_id) => {
                let query =
                    format!("SELECT {COLUMNS} FROM buyers WHERE id = $1 AND owner_id = $2");
                sqlx::query_as::<_, Buyer>(&query)
                    .bind(id)
                    .bind(owner_id)
                    .fetch_optional(pool)
                    .await
            }
            None => {
                let query = format!("SELECT {COLUMNS} FROM buyers WHERE id = $1");
                sqlx::query_as::<_, Buyer>(&query)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            }
        }
    }

    /// List one page of buyers matching the filter.
    pub async fn list(
        pool: &PgPool,
        owner: Option<DbId>,
        filter: &BuyerFilter,
        sort: SortColumn,
        order: SortOrder,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Buyer>, sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_buyer_filter(owner, filter);
        let offset = (page - 1) * page_size;

        let query = format!(
            "SELECT {COLUMNS} FROM buyers {where_clause} \
             ORDER BY {} {} \
             LIMIT ${bind_idx} OFFSET ${}",
            sort.as_sql(),
            order.as_sql(),
            bind_idx + 1
        );

        let q = bind_filter_values(sqlx::query_as::<_, Buyer>(&query), &bind_values);
        q.bind(page_size).bind(offset).fetch_all(pool).await
    }

    /// Count buyers matching the filter (for page-count computation).
    pub async fn count(
        pool: &PgPool,
        owner: Option<DbId>,
        filter: &BuyerFilter,
    ) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_buyer_filter(owner, filter);

        let query = format!("SELECT COUNT(*)::BIGINT FROM buyers {where_clause}");

        let q = bind_filter_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
        q.fetch_one(pool).await
    }

    /// Fetch rows for CSV export: same filters as [`list`](Self::list) but
    /// unpaginated, capped at [`MAX_EXPORT_ROWS`].
    pub async fn export_rows(
        pool: &PgPool,
        owner: Option<DbId>,
        filter: &BuyerFilter,
        sort: SortColumn,
        order: SortOrder,
    ) -> Result<Vec<Buyer>, sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_buyer_filter(owner, filter);

        let query = format!(
            "SELECT {COLUMNS} FROM buyers {where_clause} \
             ORDER BY {} {} \
             LIMIT ${bind_idx}",
            sort.as_sql(),
            order.as_sql(),
        );

        let q = bind_filter_values(sqlx::query_as::<_, Buyer>(&query), &bind_values);
        q.bind(MAX_EXPORT_ROWS).fetch_all(pool).await
    }

    /// Distinct tag suggestions across the owner's buyers, case-insensitive
    /// substring match on `q`, ordered alphabetically.
    pub async fn suggest_tags(
        pool: &PgPool,
        owner_id: DbId,
        q: &str,
        limit: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        let pattern = format!("%{q}%");
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT tag FROM (
                 SELECT UNNEST(tags) AS tag FROM buyers WHERE owner_id = $1
             ) t
             WHERE tag <> '' AND tag ILIKE $2
             ORDER BY tag
             LIMIT $3",
        )
        .bind(owner_id)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Insert a batch of buyers for one owner in a single multi-row INSERT.
    ///
    /// One statement means one transaction: either every row inserts or,
    /// on any constraint violation, none do.
    pub async fn insert_many(
        pool: &PgPool,
        owner_id: DbId,
        rows: &[CreateBuyer],
    ) -> Result<u64, sqlx::Error> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut query = format!("INSERT INTO buyers ({INSERT_COLUMNS}) VALUES ");
        let mut param_idx = 1usize;
        let mut first = true;

        for _ in rows {
            if !first {
                query.push_str(", ");
            }
            first = false;
            query.push('(');
            for i in 0..INSERT_PARAMS {
                if i > 0 {
                    query.push_str(", ");
                }
                query.push_str(&format!("${param_idx}"));
                param_idx += 1;
            }
            query.push(')');
        }

        let mut q = sqlx::query(&query);
        for row in rows {
            q = q
                .bind(owner_id)
                .bind(&row.full_name)
                .bind(row.email.as_deref())
                .bind(&row.phone)
                .bind(&row.city)
                .bind(&row.property_type)
                .bind(row.bhk.as_deref())
                .bind(&row.purpose)
                .bind(row.budget_min)
                .bind(row.budget_max)
                .bind(&row.timeline)
                .bind(&row.source)
                .bind(row.status.as_deref().unwrap_or(DEFAULT_STATUS))
                .bind(row.notes.as_deref())
                .bind(row.tags.clone().unwrap_or_default());
        }

        let result = q.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete a buyer by id within the ownership scope. History rows cascade.
    /// Returns `true` if a row was deleted.
    pub async fn delete(
        pool: &PgPool,
        id: DbId,
        owner: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let result = match owner {
            Some(owner_id) => {
                sqlx::query("DELETE FROM buyers WHERE id = $1 AND owner_id = $2")
                    .bind(id)
                    .bind(owner_id)
                    .execute(pool)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM buyers WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    /// Apply a partial update with optimistic concurrency control, recording
    /// exactly what changed.
    ///
    /// Runs in one transaction with the row locked (`SELECT ... FOR UPDATE`),
    /// so no concurrent writer can slip between the read and the write:
    ///
    /// 1. Fetch and lock the current row (scoped to `owner` unless admin);
    ///    absent -> [`BuyerUpdateError::NotFound`].
    /// 2. If the caller supplied `expected_updated_at` and it differs from
    ///    the stored value by more than `tolerance`, fail with
    ///    [`BuyerUpdateError::Conflict`] -- another writer got there first.
    /// 3. Apply the provided fields and stamp a fresh `updated_at`.
    /// 4. Record one history entry containing the old/new pair for every
    ///    field whose value actually changed; an update that changed nothing
    ///    appends no history.
    ///
    /// Returns both the pre- and post-update row.
    pub async fn update_with_history(
        pool: &PgPool,
        id: DbId,
        changed_by: DbId,
        owner: Option<DbId>,
        input: &UpdateBuyer,
        expected_updated_at: Option<Timestamp>,
        tolerance: Duration,
    ) -> Result<BuyerUpdate, BuyerUpdateError> {
        let mut tx = pool.begin().await?;

        let before = match owner {
            Some(owner_id) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM buyers WHERE id = $1 AND owner_id = $2 FOR UPDATE"
                );
                sqlx::query_as::<_, Buyer>(&query)
                    .bind(id)
                    .bind(owner_id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => {
                let query = format!("SELECT {COLUMNS} FROM buyers WHERE id = $1 FOR UPDATE");
                sqlx::query_as::<_, Buyer>(&query)
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
        };
        let Some(before) = before else {
            return Err(BuyerUpdateError::NotFound);
        };

        if let Some(expected) = expected_updated_at {
            // A small tolerance absorbs clock/serialization skew between the
            // caller's snapshot and the stored microsecond timestamp.
            let skew = (before.updated_at - expected)
                .num_milliseconds()
                .abs();
            if skew > tolerance.num_milliseconds() {
                return Err(BuyerUpdateError::Conflict);
            }
        }

        let after = apply_update(&mut tx, id, input).await?;
        let Some(after) = after else {
            // Row vanished between the locked read and the write.
            return Err(BuyerUpdateError::Conflict);
        };

        let diff = input.changed_fields(&before);
        if !diff.is_empty() {
            let diff_json = serde_json::to_value(&diff).unwrap_or_default();
            BuyerHistoryRepo::append(&mut *tx, id, changed_by, diff_json).await?;
        }

        tx.commit().await?;
        Ok(BuyerUpdate { before, after })
    }
}

/// Execute the dynamic UPDATE for the provided fields, stamping `updated_at`.
///
/// The SET clause and the bind chain below enumerate the fields in the same
/// fixed order; keep them in sync when adding a column.
async fn apply_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: DbId,
    input: &UpdateBuyer,
) -> Result<Option<Buyer>, sqlx::Error> {
    let mut sets: Vec<String> = Vec::new();
    let mut idx = 1u32;
    let mut push = |sets: &mut Vec<String>, column: &str| {
        sets.push(format!("{column} = ${idx}"));
        idx += 1;
    };

    if input.full_name.is_some() {
        push(&mut sets, "full_name");
    }
    if input.email.is_some() {
        push(&mut sets, "email");
    }
    if input.phone.is_some() {
        push(&mut sets, "phone");
    }
    if input.city.is_some() {
        push(&mut sets, "city");
    }
    if input.property_type.is_some() {
        push(&mut sets, "property_type");
    }
    if input.bhk.is_some() {
        push(&mut sets, "bhk");
    }
    if input.purpose.is_some() {
        push(&mut sets, "purpose");
    }
    if input.budget_min.is_some() {
        push(&mut sets, "budget_min");
    }
    if input.budget_max.is_some() {
        push(&mut sets, "budget_max");
    }
    if input.timeline.is_some() {
        push(&mut sets, "timeline");
    }
    if input.source.is_some() {
        push(&mut sets, "source");
    }
    if input.status.is_some() {
        push(&mut sets, "status");
    }
    if input.notes.is_some() {
        push(&mut sets, "notes");
    }
    if input.tags.is_some() {
        push(&mut sets, "tags");
    }
    // Always stamp, even when no field was provided.
    sets.push("updated_at = NOW()".to_string());

    let query = format!(
        "UPDATE buyers SET {} WHERE id = ${idx} RETURNING {COLUMNS}",
        sets.join(", ")
    );

    let mut q = sqlx::query_as::<_, Buyer>(&query);
    if let Some(v) = &input.full_name {
        q = q.bind(v);
    }
    if let Some(v) = &input.email {
        q = q.bind(v.as_deref());
    }
    if let Some(v) = &input.phone {
        q = q.bind(v);
    }
    if let Some(v) = &input.city {
        q = q.bind(v);
    }
    if let Some(v) = &input.property_type {
        q = q.bind(v);
    }
    if let Some(v) = &input.bhk {
        q = q.bind(v.as_deref());
    }
    if let Some(v) = &input.purpose {
        q = q.bind(v);
    }
    if let Some(v) = &input.budget_min {
        q = q.bind(*v);
    }
    if let Some(v) = &input.budget_max {
        q = q.bind(*v);
    }
    if let Some(v) = &input.timeline {
        q = q.bind(v);
    }
    if let Some(v) = &input.source {
        q = q.bind(v);
    }
    if let Some(v) = &input.status {
        q = q.bind(v);
    }
    if let Some(v) = &input.notes {
        q = q.bind(v.as_deref());
    }
    if let Some(v) = &input.tags {
        q = q.bind(v);
    }
    q.bind(id).fetch_optional(&mut **tx).await
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built buyer queries.
enum BindValue {
    Id(DbId),
    Text(String),
    Ts(Timestamp),
}

/// Build a WHERE clause and bind values from the ownership scope and filter.
///
/// Returns `(where_clause, bind_values, next_bind_index)`. The clause is
/// empty if no conditions are active, or starts with `WHERE `.
fn build_buyer_filter(
    owner: Option<DbId>,
    filter: &BuyerFilter,
) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(owner_id) = owner {
        conditions.push(format!("owner_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Id(owner_id));
    }

    if let Some(ref city) = filter.city {
        conditions.push(format!("city = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(city.clone()));
    }

    if let Some(ref property_type) = filter.property_type {
        conditions.push(format!("property_type = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(property_type.clone()));
    }

    if let Some(ref status) = filter.status {
        conditions.push(format!("status = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(status.clone()));
    }

    if let Some(ref timeline) = filter.timeline {
        conditions.push(format!("timeline = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(timeline.clone()));
    }

    if let Some(from) = filter.updated_from {
        conditions.push(format!("updated_at >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Ts(from));
    }

    if let Some(to) = filter.updated_to {
        conditions.push(format!("updated_at <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Ts(to));
    }

    if let Some(ref search) = filter.search {
        // One placeholder reused across the four searched columns.
        conditions.push(format!(
            "(full_name ILIKE ${bind_idx} \
             OR COALESCE(email, '') ILIKE ${bind_idx} \
             OR phone ILIKE ${bind_idx} \
             OR COALESCE(notes, '') ILIKE ${bind_idx})"
        ));
        bind_idx += 1;
        bind_values.push(BindValue::Text(format!("%{search}%")));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_filter_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Id(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Ts(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_filter_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Id(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Ts(v) => q = q.bind(*v),
        }
    }
    q
}
