//! List, export, and suggestion limits shared by the repository and API layers.
//!
//! This module lives in `core` (zero internal deps) so the same clamping rules
//! apply wherever a user-supplied limit enters the system.

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of buyers per list page.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum number of buyers per list page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default number of tag autocomplete suggestions.
pub const DEFAULT_TAG_SUGGEST_LIMIT: i64 = 10;

/// Maximum number of tag autocomplete suggestions.
pub const MAX_TAG_SUGGEST_LIMIT: i64 = 50;

/// Hard cap on CSV export size.
pub const MAX_EXPORT_ROWS: i64 = 1000;

/// Hard cap on CSV import size. Enforced before any row is validated.
pub const MAX_IMPORT_ROWS: usize = 200;

/// Number of history entries returned alongside a buyer detail.
pub const RECENT_HISTORY_LIMIT: i64 = 5;

// ---------------------------------------------------------------------------
// Clamp helpers
// ---------------------------------------------------------------------------

/// Clamp a user-provided page size to valid bounds.
pub fn clamp_page_size(page_size: Option<i64>) -> i64 {
    page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .max(1)
        .min(MAX_PAGE_SIZE)
}

/// Clamp a user-provided 1-based page number.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Clamp a user-provided tag suggestion limit.
pub fn clamp_suggest_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_TAG_SUGGEST_LIMIT)
        .max(1)
        .min(MAX_TAG_SUGGEST_LIMIT)
}
