//! Page versioning and publishing engine.
//!
//! Shared by the HTTP handlers and the background scheduler so both apply
//! the same rules:
//! - [`versioning`] -- version store operations, autosave, undo/redo, restore.
//! - [`publishing`] -- publish/unpublish/schedule and the due-page sweep.

pub mod publishing;
pub mod versioning;
