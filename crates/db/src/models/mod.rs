//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize`-free input DTOs built by the API layer after validation

pub mod page;
pub mod page_version;
