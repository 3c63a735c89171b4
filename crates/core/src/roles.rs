//! Well-known role name constants.
//!
//! These must match the `role` claim issued by the authentication service.

pub const ROLE_ADMIN: &str = "admin";
