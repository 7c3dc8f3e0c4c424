//! Buyer lead model and DTOs.

use std::collections::BTreeMap;

use leadbase_core::types::{DbId, Timestamp};
use leadbase_core::validation::{
    self, FieldIssue, BHK_VALUES, CITIES, PROPERTY_TYPES, PURPOSES, SOURCES, STATUSES, TIMELINES,
};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::models::buyer_history::FieldChange;

/// A row from the `buyers` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Buyer {
    pub id: DbId,
    pub owner_id: DbId,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub city: String,
    pub property_type: String,
    pub bhk: Option<String>,
    pub purpose: String,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: String,
    pub source: String,
    pub status: String,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// DTO for creating a new buyer (also the shape of one CSV import row).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBuyer {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub city: String,
    pub property_type: String,
    pub bhk: Option<String>,
    pub purpose: String,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: String,
    pub source: String,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl CreateBuyer {
    /// Normalize the payload before validation/insert: an empty-string email
    /// means "no email".
    pub fn normalize(&mut self) {
        if self.email.as_deref() == Some("") {
            self.email = None;
        }
    }

    /// Collect every field-level violation in the payload.
    pub fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        validation::check_full_name(&mut issues, &self.full_name);
        validation::check_email(&mut issues, self.email.as_deref());
        validation::check_phone(&mut issues, &self.phone);
        validation::check_member(&mut issues, "city", &self.city, CITIES);
        validation::check_member(&mut issues, "property_type", &self.property_type, PROPERTY_TYPES);
        validation::check_bhk(&mut issues, &self.property_type, self.bhk.as_deref());
        validation::check_member(&mut issues, "purpose", &self.purpose, PURPOSES);
        validation::check_budget(&mut issues, self.budget_min, self.budget_max);
        validation::check_member(&mut issues, "timeline", &self.timeline, TIMELINES);
        validation::check_member(&mut issues, "source", &self.source, SOURCES);
        if let Some(status) = &self.status {
            validation::check_member(&mut issues, "status", status, STATUSES);
        }
        validation::check_notes(&mut issues, self.notes.as_deref());
        if let Some(tags) = &self.tags {
            validation::check_tags(&mut issues, tags);
        }

        issues
    }
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// Deserialize any present value -- including JSON `null` -- as `Some(..)`.
///
/// Plain `Option<Option<T>>` collapses `null` to `None`, losing the
/// distinction between "field absent" and "field explicitly cleared".
fn some_if_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// DTO for a partial buyer update.
///
/// Non-nullable columns are `Option<T>`: absent means "leave unchanged".
/// Nullable columns are `Option<Option<T>>`: absent means "leave unchanged",
/// an explicit JSON `null` means "clear the value".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBuyer {
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub email: Option<Option<String>>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub bhk: Option<Option<String>>,
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub budget_min: Option<Option<i64>>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub budget_max: Option<Option<i64>>,
    pub timeline: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl UpdateBuyer {
    /// True when no field was provided at all. Such an update still stamps a
    /// fresh `updated_at` but can never produce a history entry.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.city.is_none()
            && self.property_type.is_none()
            && self.bhk.is_none()
            && self.purpose.is_none()
            && self.budget_min.is_none()
            && self.budget_max.is_none()
            && self.timeline.is_none()
            && self.source.is_none()
            && self.status.is_none()
            && self.notes.is_none()
            && self.tags.is_none()
    }

    /// Normalize the payload: clearing an email with `""` behaves like `null`.
    pub fn normalize(&mut self) {
        if let Some(Some(email)) = &self.email {
            if email.is_empty() {
                self.email = Some(None);
            }
        }
    }

    /// Validate the provided fields only. The bhk requirement is enforced
    /// when the payload itself pins `property_type` to Apartment/Villa while
    /// explicitly clearing `bhk`; requirements against the stored row are
    /// the database constraints' job.
    pub fn validate(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        if let Some(full_name) = &self.full_name {
            validation::check_full_name(&mut issues, full_name);
        }
        if let Some(email) = &self.email {
            validation::check_email(&mut issues, email.as_deref());
        }
        if let Some(phone) = &self.phone {
            validation::check_phone(&mut issues, phone);
        }
        if let Some(city) = &self.city {
            validation::check_member(&mut issues, "city", city, CITIES);
        }
        if let Some(property_type) = &self.property_type {
            validation::check_member(&mut issues, "property_type", property_type, PROPERTY_TYPES);
            if validation::requires_bhk(property_type) && self.bhk == Some(None) {
                issues.push(FieldIssue::new(
                    "bhk",
                    "bhk is required when property_type is Apartment or Villa",
                ));
            }
        }
        if let Some(Some(bhk)) = &self.bhk {
            validation::check_member(&mut issues, "bhk", bhk, BHK_VALUES);
        }
        if let Some(purpose) = &self.purpose {
            validation::check_member(&mut issues, "purpose", purpose, PURPOSES);
        }
        validation::check_budget(
            &mut issues,
            self.budget_min.flatten(),
            self.budget_max.flatten(),
        );
        if let Some(timeline) = &self.timeline {
            validation::check_member(&mut issues, "timeline", timeline, TIMELINES);
        }
        if let Some(source) = &self.source {
            validation::check_member(&mut issues, "source", source, SOURCES);
        }
        if let Some(status) = &self.status {
            validation::check_member(&mut issues, "status", status, STATUSES);
        }
        if let Some(notes) = &self.notes {
            validation::check_notes(&mut issues, notes.as_deref());
        }
        if let Some(tags) = &self.tags {
            validation::check_tags(&mut issues, tags);
        }

        issues
    }

    /// Typed field-by-field diff against the pre-update row.
    ///
    /// Only fields present in the payload are considered; a provided field
    /// whose value equals the stored one is excluded. The fixed enumeration
    /// keeps the history payload schema stable.
    pub fn changed_fields(&self, before: &Buyer) -> BTreeMap<&'static str, FieldChange> {
        let mut diff = BTreeMap::new();

        if let Some(v) = &self.full_name {
            if *v != before.full_name {
                diff.insert("full_name", FieldChange::of(&before.full_name, v));
            }
        }
        if let Some(v) = &self.email {
            if *v != before.email {
                diff.insert("email", FieldChange::of(&before.email, v));
            }
        }
        if let Some(v) = &self.phone {
            if *v != before.phone {
                diff.insert("phone", FieldChange::of(&before.phone, v));
            }
        }
        if let Some(v) = &self.city {
            if *v != before.city {
                diff.insert("city", FieldChange::of(&before.city, v));
            }
        }
        if let Some(v) = &self.property_type {
            if *v != before.property_type {
                diff.insert("property_type", FieldChange::of(&before.property_type, v));
            }
        }
        if let Some(v) = &self.bhk {
            if *v != before.bhk {
                diff.insert("bhk", FieldChange::of(&before.bhk, v));
            }
        }
        if let Some(v) = &self.purpose {
            if *v != before.purpose {
                diff.insert("purpose", FieldChange::of(&before.purpose, v));
            }
        }
        if let Some(v) = &self.budget_min {
            if *v != before.budget_min {
                diff.insert("budget_min", FieldChange::of(&before.budget_min, v));
            }
        }
        if let Some(v) = &self.budget_max {
            if *v != before.budget_max {
                diff.insert("budget_max", FieldChange::of(&before.budget_max, v));
            }
        }
        if let Some(v) = &self.timeline {
            if *v != before.timeline {
                diff.insert("timeline", FieldChange::of(&before.timeline, v));
            }
        }
        if let Some(v) = &self.source {
            if *v != before.source {
                diff.insert("source", FieldChange::of(&before.source, v));
            }
        }
        if let Some(v) = &self.status {
            if *v != before.status {
                diff.insert("status", FieldChange::of(&before.status, v));
            }
        }
        if let Some(v) = &self.notes {
            if *v != before.notes {
                diff.insert("notes", FieldChange::of(&before.notes, v));
            }
        }
        if let Some(v) = &self.tags {
            if *v != before.tags {
                diff.insert("tags", FieldChange::of(&before.tags, v));
            }
        }

        diff
    }
}

// ---------------------------------------------------------------------------
// List parameters
// ---------------------------------------------------------------------------

/// Filter parameters for buyer listing, counting, and export.
#[derive(Debug, Clone, Default)]
pub struct BuyerFilter {
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub status: Option<String>,
    pub timeline: Option<String>,
    /// Substring match across full_name, email, phone, and notes.
    pub search: Option<String>,
    /// Inclusive lower bound on `updated_at`.
    pub updated_from: Option<Timestamp>,
    /// Inclusive upper bound on `updated_at`.
    pub updated_to: Option<Timestamp>,
}

/// Sortable list columns. Parsing goes through this allowlist so user input
/// never reaches the ORDER BY clause directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    UpdatedAt,
    CreatedAt,
    FullName,
}

impl SortColumn {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "updated_at" => Some(Self::UpdatedAt),
            "created_at" => Some(Self::CreatedAt),
            "full_name" => Some(Self::FullName),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::UpdatedAt => "updated_at",
            Self::CreatedAt => "created_at",
            Self::FullName => "full_name",
        }
    }
}

/// Sort direction; lists default to most-recently-updated first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One page of buyers plus the total matching count.
#[derive(Debug, Serialize)]
pub struct BuyerPage {
    pub rows: Vec<Buyer>,
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
