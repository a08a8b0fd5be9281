//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate extraction, derivation and persistence into store-level APIs.
//! - Keep UI layers decoupled from storage details.

pub mod page_store;
