//! Authentication: JWT claims, config, and token helpers.

pub mod jwt;
