//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, notifier and scheduler calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod alarm_registry;
pub mod app;
pub mod todo_service;
