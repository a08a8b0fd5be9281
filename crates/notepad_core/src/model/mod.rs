//! Note domain model.
//!
//! # Responsibility
//! - Define the page record shared by the store and every storage backend.
//! - Define the derived tag index projection.
//!
//! # Invariants
//! - Every page is identified by a stable `PageId`.
//! - Deletion is a hard removal; tags and places have no storage of their own.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod page;
pub mod tag_index;
