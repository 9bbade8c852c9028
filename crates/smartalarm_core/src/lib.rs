//! Core domain logic for SmartAlarm.
//! This crate is the single source of truth for alarm, puzzle and to-do
//! invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod puzzle;
pub mod scheduler;
pub mod service;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::alarm::{AlarmId, AlarmRecord, AlarmSound, AlarmValidationError, TimeOfDay};
pub use model::task::{TaskCategory, TaskId, TaskValidationError, ToDoTask};
pub use notify::{NoopNotifier, Notifier, NotifyError};
pub use puzzle::challenge::{Challenge, ChallengeSettings, PuzzleKind};
pub use puzzle::gate::{ChallengeView, DismissalGate, GateAction, GateState};
pub use scheduler::audio::{AudioError, AudioPlayer, SilentAudio, SoundHandle};
pub use scheduler::clock::{Clock, ClockReading, SystemClock};
pub use scheduler::engine::{
    AlarmScheduler, SchedulerEvent, SchedulerState, SnoozeDeferral, TickOutcome,
};
pub use service::alarm_registry::{AlarmPartition, AlarmRegistry, RegistryError};
pub use service::app::SmartAlarmApp;
pub use service::todo_service::{
    completion_percent, week_start, DayProgress, TaskDraft, TodoError, TodoList,
};
pub use store::kv_store::{KvStore, SqliteKvStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
