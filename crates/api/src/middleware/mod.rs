//! Request extractors for authentication.
//!
//! - [`auth::AuthUser`] -- user from an `Authorization: Bearer` header.
//! - [`auth::QueryTokenUser`] -- user from a `?token=` query parameter, for
//!   WebSocket upgrades where browsers cannot set headers.

pub mod auth;
