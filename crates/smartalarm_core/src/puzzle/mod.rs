//! Dismissal puzzles.
//!
//! # Responsibility
//! - Generate randomized challenges from fixed content banks.
//! - Gate stop/snooze behind a started and solved challenge.

pub mod bank;
pub mod challenge;
pub mod gate;
