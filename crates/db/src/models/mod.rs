//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and partial updates
//! - Filter/sort parameter types used by the repositories

pub mod buyer;
pub mod buyer_history;
