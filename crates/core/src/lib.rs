//! Leadbase core domain layer.
//!
//! Zero-internal-dependency building blocks shared by the repository and API
//! layers: shared types, the error taxonomy, field validation rules, the
//! token-bucket rate limiter, CSV encoding, and search/pagination constants.

pub mod csv;
pub mod error;
pub mod rate_limit;
pub mod roles;
pub mod search;
pub mod types;
pub mod validation;
