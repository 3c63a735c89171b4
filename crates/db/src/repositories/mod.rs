//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod page_repo;
pub mod page_version_repo;

pub use page_repo::PageRepo;
pub use page_version_repo::PageVersionRepo;
