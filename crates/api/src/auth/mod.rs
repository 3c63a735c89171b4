//! Authentication primitives.
//!
//! - [`jwt`] -- HS256 access-token validation (and generation for tooling and tests).
//!
//! Token issuance (login, refresh) belongs to the identity service in front
//! of this API; only bearer-token validation happens here.

pub mod jwt;
