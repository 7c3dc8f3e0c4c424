//! Well-known role name constants.
//!
//! Role names arrive in JWT claims issued by the external identity provider;
//! these constants must match what it emits.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_AGENT: &str = "agent";
