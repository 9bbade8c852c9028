//! App facade wiring registry, to-do list and scheduler.
//!
//! # Responsibility
//! - Load both persisted collections from one store.
//! - Feed the live registry into every scheduler tick.
//!
//! # Invariants
//! - The scheduler never sees a stale alarm list; each tick borrows the
//!   registry as it is at call time.

use crate::config::CoreConfig;
use crate::notify::Notifier;
use crate::scheduler::audio::AudioPlayer;
use crate::scheduler::engine::{AlarmScheduler, SchedulerEvent, TickOutcome};
use crate::service::alarm_registry::AlarmRegistry;
use crate::service::todo_service::TodoList;
use crate::store::kv_store::KvStore;
use chrono::NaiveDateTime;
use log::info;
use rand::rngs::StdRng;

pub struct SmartAlarmApp<S: KvStore + Clone> {
    registry: AlarmRegistry<S>,
    todos: TodoList<S>,
    scheduler: AlarmScheduler,
}

impl<S: KvStore + Clone> SmartAlarmApp<S> {
    pub fn open(
        store: S,
        config: CoreConfig,
        audio: Box<dyn AudioPlayer>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let scheduler = AlarmScheduler::new(config, audio);
        Self::assemble(store, scheduler, notifier)
    }

    /// Same as [`SmartAlarmApp::open`] with a fixed puzzle RNG.
    pub fn open_with_rng(
        store: S,
        config: CoreConfig,
        audio: Box<dyn AudioPlayer>,
        notifier: Box<dyn Notifier>,
        rng: StdRng,
    ) -> Self {
        let scheduler = AlarmScheduler::with_rng(config, audio, rng);
        Self::assemble(store, scheduler, notifier)
    }

    fn assemble(store: S, scheduler: AlarmScheduler, notifier: Box<dyn Notifier>) -> Self {
        let registry = AlarmRegistry::load(store.clone(), notifier);
        let todos = TodoList::load(store);
        info!(
            "event=app_open module=app status=ok alarms={} tasks={}",
            registry.len(),
            todos.all().len()
        );
        Self {
            registry,
            todos,
            scheduler,
        }
    }

    pub fn registry(&self) -> &AlarmRegistry<S> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AlarmRegistry<S> {
        &mut self.registry
    }

    pub fn todos(&self) -> &TodoList<S> {
        &self.todos
    }

    pub fn todos_mut(&mut self) -> &mut TodoList<S> {
        &mut self.todos
    }

    pub fn scheduler(&self) -> &AlarmScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut AlarmScheduler {
        &mut self.scheduler
    }

    pub fn tick(&mut self, now: NaiveDateTime) -> TickOutcome {
        self.scheduler.tick(now, self.registry.list())
    }

    pub fn stop(&mut self) -> Option<SchedulerEvent> {
        self.scheduler.stop()
    }

    pub fn snooze(&mut self, now: NaiveDateTime) -> Option<SchedulerEvent> {
        self.scheduler.snooze(now)
    }
}
