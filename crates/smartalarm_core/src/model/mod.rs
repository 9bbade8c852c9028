//! Domain model for alarms and to-do tasks.
//!
//! # Responsibility
//! - Define the records persisted in the key-value store.
//! - Keep identity and validation rules next to the data they guard.

pub mod alarm;
pub mod task;
