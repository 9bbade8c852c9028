//! Alarm scheduling.
//!
//! # Responsibility
//! - Match registered alarms against the wall clock once per tick.
//! - Own the single active ring, its audio, and its dismissal gate.
//! - Re-ring snoozed alarms when their deferral comes due.

pub mod audio;
pub mod clock;
pub mod engine;
