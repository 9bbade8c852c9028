//! Persistence boundary.
//!
//! # Responsibility
//! - Expose the opaque key-value store used by the registry and to-do list.
//! - Isolate SQLite details from service code.

pub mod kv_store;
