//! Domain types and pure rules for the pagecraft content backend.
//!
//! Nothing in this crate performs I/O; persistence lives in `pagecraft-db`
//! and the HTTP surface in `pagecraft-api`.

pub mod block;
pub mod error;
pub mod history;
pub mod publishing;
pub mod roles;
pub mod types;
pub mod validation;
