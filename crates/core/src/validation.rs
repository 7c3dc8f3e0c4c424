//! Field validation rules for buyer payloads.
//!
//! Enum-valued columns are stored as TEXT and modeled as `String`; the
//! allowed-value constants here are the single source of truth for both the
//! validation layer and the database CHECK constraints in the migrations.
//!
//! Each check appends zero or more [`FieldIssue`]s so callers can collect
//! every violation in one pass and surface them field-by-field.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Allowed values
// ---------------------------------------------------------------------------

pub const CITIES: &[&str] = &["Chandigarh", "Mohali", "Zirakpur", "Panchkula", "Other"];

pub const PROPERTY_TYPES: &[&str] = &["Apartment", "Villa", "Plot", "Office", "Retail"];

pub const BHK_VALUES: &[&str] = &["1", "2", "3", "4", "Studio"];

pub const PURPOSES: &[&str] = &["Buy", "Rent"];

pub const TIMELINES: &[&str] = &["0-3m", "3-6m", ">6m", "Exploring"];

pub const SOURCES: &[&str] = &["Website", "Referral", "Walk-in", "Call", "Other"];

pub const STATUSES: &[&str] = &[
    "New",
    "Qualified",
    "Contacted",
    "Visited",
    "Negotiation",
    "Converted",
    "Dropped",
];

/// Status assigned to new buyers when the payload omits one.
pub const DEFAULT_STATUS: &str = "New";

// ---------------------------------------------------------------------------
// Length limits
// ---------------------------------------------------------------------------

pub const FULL_NAME_MIN_CHARS: usize = 2;
pub const FULL_NAME_MAX_CHARS: usize = 80;
pub const EMAIL_MAX_CHARS: usize = 255;
pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 15;
pub const NOTES_MAX_CHARS: usize = 1000;
pub const MAX_TAGS: usize = 50;

// ---------------------------------------------------------------------------
// Issue type
// ---------------------------------------------------------------------------

/// A single field-level validation violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

pub fn check_full_name(issues: &mut Vec<FieldIssue>, full_name: &str) {
    let chars = full_name.chars().count();
    if !(FULL_NAME_MIN_CHARS..=FULL_NAME_MAX_CHARS).contains(&chars) {
        issues.push(FieldIssue::new(
            "full_name",
            format!("full_name must be {FULL_NAME_MIN_CHARS}-{FULL_NAME_MAX_CHARS} characters"),
        ));
    }
}

pub fn check_email(issues: &mut Vec<FieldIssue>, email: Option<&str>) {
    let Some(email) = email else { return };
    if email.chars().count() > EMAIL_MAX_CHARS || !is_plausible_email(email) {
        issues.push(FieldIssue::new("email", "email must be a valid address"));
    }
}

/// Phone numbers are digit-only strings of 10-15 digits.
pub fn check_phone(issues: &mut Vec<FieldIssue>, phone: &str) {
    let digits_only = phone.chars().all(|c| c.is_ascii_digit());
    if !digits_only || !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&phone.len()) {
        issues.push(FieldIssue::new(
            "phone",
            format!("phone must be {PHONE_MIN_DIGITS}-{PHONE_MAX_DIGITS} digits"),
        ));
    }
}

/// Validate that `value` is one of the allowed values for `field`.
pub fn check_member(issues: &mut Vec<FieldIssue>, field: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        issues.push(FieldIssue::new(
            field,
            format!("{field} must be one of: {}", allowed.join(", ")),
        ));
    }
}

/// Whether the property type makes `bhk` mandatory.
pub fn requires_bhk(property_type: &str) -> bool {
    property_type == "Apartment" || property_type == "Villa"
}

/// Validate the bhk value and its conditional requirement.
pub fn check_bhk(issues: &mut Vec<FieldIssue>, property_type: &str, bhk: Option<&str>) {
    match bhk {
        Some(value) => check_member(issues, "bhk", value, BHK_VALUES),
        None => {
            if requires_bhk(property_type) {
                issues.push(FieldIssue::new(
                    "bhk",
                    "bhk is required when property_type is Apartment or Villa",
                ));
            }
        }
    }
}

pub fn check_budget(issues: &mut Vec<FieldIssue>, budget_min: Option<i64>, budget_max: Option<i64>) {
    if let Some(min) = budget_min {
        if min < 0 {
            issues.push(FieldIssue::new("budget_min", "budget_min must be non-negative"));
        }
    }
    if let Some(max) = budget_max {
        if max < 0 {
            issues.push(FieldIssue::new("budget_max", "budget_max must be non-negative"));
        }
    }
    if let (Some(min), Some(max)) = (budget_min, budget_max) {
        if min >= 0 && max >= 0 && max < min {
            issues.push(FieldIssue::new(
                "budget_max",
                "budget_max must be greater than or equal to budget_min",
            ));
        }
    }
}

pub fn check_notes(issues: &mut Vec<FieldIssue>, notes: Option<&str>) {
    if let Some(notes) = notes {
        if notes.chars().count() > NOTES_MAX_CHARS {
            issues.push(FieldIssue::new(
                "notes",
                format!("notes must be at most {NOTES_MAX_CHARS} characters"),
            ));
        }
    }
}

pub fn check_tags(issues: &mut Vec<FieldIssue>, tags: &[String]) {
    if tags.len() > MAX_TAGS {
        issues.push(FieldIssue::new(
            "tags",
            format!("at most {MAX_TAGS} tags are allowed"),
        ));
    }
}

/// Shape check only: one `@`, non-empty local part, dotted domain, no
/// whitespace. Deliverability is not our problem.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.split_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
