//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose alarm, puzzle and to-do use cases to Dart via FRB.
//! - Queue native side effects (audio, notifications) as `PlatformCommand`s
//!   for the host to drain and execute.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - All app access is serialized through one process-wide mutex.
//! - Every call except `app_init` fails with a message before init.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use log::{info, warn};
use smartalarm_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_db,
    ping as ping_inner, AlarmId, AlarmRecord, AlarmSound, AudioError, AudioPlayer, ChallengeView,
    Clock, CoreConfig, DayProgress, Notifier, NotifyError, SchedulerEvent, SmartAlarmApp,
    SoundHandle, SqliteKvStore, SystemClock, TaskCategory, TaskDraft, TimeOfDay, ToDoTask,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use uuid::Uuid;

const DB_FILE_NAME: &str = "smartalarm.sqlite3";
const DB_PATH_ENV: &str = "SMARTALARM_DB_PATH";
const DATE_FORMAT: &str = "%Y-%m-%d";
const NOT_INITIALIZED: &str = "app not initialized; call app_init first";

static APP_STATE: OnceLock<Mutex<Option<AppState>>> = OnceLock::new();

struct AppState {
    app: SmartAlarmApp<SqliteKvStore>,
    commands: CommandQueue,
}

type CommandQueue = Arc<Mutex<VecDeque<PlatformCommand>>>;

/// Native side effect the host must perform after a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCommand {
    PlaySound {
        handle: u64,
        sound: String,
        looping: bool,
    },
    StopSound {
        handle: u64,
    },
    ScheduleNotification {
        notification_id: String,
        alarm_id: String,
        time: String,
    },
    CancelNotification {
        notification_id: String,
    },
}

struct QueueAudio {
    queue: CommandQueue,
    next_handle: SoundHandle,
}

impl AudioPlayer for QueueAudio {
    fn play(&mut self, sound: AlarmSound, looping: bool) -> Result<SoundHandle, AudioError> {
        self.next_handle += 1;
        push_command(
            &self.queue,
            PlatformCommand::PlaySound {
                handle: self.next_handle,
                sound: sound.key().to_string(),
                looping,
            },
        )
        .map_err(AudioError)?;
        Ok(self.next_handle)
    }

    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        push_command(&self.queue, PlatformCommand::StopSound { handle }).map_err(AudioError)
    }
}

struct QueueNotifier {
    queue: CommandQueue,
}

impl Notifier for QueueNotifier {
    fn schedule(&mut self, alarm: &AlarmRecord) -> Result<String, NotifyError> {
        let notification_id = Uuid::new_v4().to_string();
        push_command(
            &self.queue,
            PlatformCommand::ScheduleNotification {
                notification_id: notification_id.clone(),
                alarm_id: alarm.id.to_string(),
                time: alarm.time.to_string(),
            },
        )
        .map_err(NotifyError)?;
        Ok(notification_id)
    }

    fn cancel(&mut self, notification_id: &str) -> Result<(), NotifyError> {
        push_command(
            &self.queue,
            PlatformCommand::CancelNotification {
                notification_id: notification_id.to_string(),
            },
        )
        .map_err(NotifyError)
    }
}

fn push_command(queue: &CommandQueue, command: PlatformCommand) -> Result<(), String> {
    queue
        .lock()
        .map_err(|_| "platform command queue poisoned".to_string())?
        .push_back(command);
    Ok(())
}

// ── Envelopes ────────────────────────────────────────────────────────

/// Generic success/failure envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

impl ActionResponse {
    fn from_result(result: Result<String, String>) -> Self {
        match result {
            Ok(message) => Self { ok: true, message },
            Err(message) => Self { ok: false, message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmItem {
    /// Derived id, e.g. `07:30-chime`.
    pub id: String,
    pub time: String,
    pub sound: String,
    pub notification_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmActionResponse {
    pub ok: bool,
    pub alarm: Option<AlarmItem>,
    pub message: String,
}

/// Alarms split around the current minute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmListResponse {
    pub ok: bool,
    pub upcoming: Vec<AlarmItem>,
    pub past: Vec<AlarmItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickResponse {
    pub ok: bool,
    /// `HH:MM:SS` display text.
    pub clock: String,
    /// `idle|ringing|snooze_pending`.
    pub state: String,
    pub ringing_alarm_id: Option<String>,
    /// Set only on the tick where a ring began.
    pub started_puzzle: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateView {
    pub kind: String,
    /// `not_started|in_progress|solved`.
    pub state: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub sequence_visible: bool,
    pub answer: String,
    pub solved: bool,
    pub reminder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    pub ok: bool,
    pub view: Option<GateView>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingActionResponse {
    pub ok: bool,
    pub alarm_id: Option<String>,
    /// Local `YYYY-MM-DDTHH:MM:SS` when a snooze was armed.
    pub snooze_due_at: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub description: String,
    pub done: bool,
    pub category: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    pub task: Option<TaskItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    pub items: Vec<TaskItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayProgressItem {
    pub date: String,
    pub total: u32,
    pub done: u32,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyProgressResponse {
    pub ok: bool,
    pub days: Vec<DayProgressItem>,
    pub message: String,
}

// ── Health and bootstrap ─────────────────────────────────────────────

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens the database and builds the app.
///
/// Input semantics:
/// - `db_path`: SQLite file; blank falls back to `SMARTALARM_DB_PATH`, then
///   the system temp dir.
/// - `config_json`: `CoreConfig` JSON; blank uses defaults.
///
/// # FFI contract
/// - Calling again replaces the running app and drops queued commands.
#[flutter_rust_bridge::frb(sync)]
pub fn app_init(db_path: Option<String>, config_json: Option<String>) -> ActionResponse {
    ActionResponse::from_result(init_app(db_path, config_json.as_deref().unwrap_or("")))
}

fn init_app(db_path: Option<String>, config_json: &str) -> Result<String, String> {
    let config = CoreConfig::from_json(config_json).map_err(|err| err.to_string())?;
    let path = resolve_db_path(db_path);
    let conn = open_db(&path).map_err(|err| format!("app_init failed: {err}"))?;

    let commands: CommandQueue = Arc::default();
    let app = SmartAlarmApp::open(
        SqliteKvStore::new(conn),
        config,
        Box::new(QueueAudio {
            queue: Arc::clone(&commands),
            next_handle: 0,
        }),
        Box::new(QueueNotifier {
            queue: Arc::clone(&commands),
        }),
    );

    let mut slot = app_slot()
        .lock()
        .map_err(|_| "app state poisoned".to_string())?;
    if slot.is_some() {
        warn!("event=app_init module=ffi status=ok note=replacing_running_app");
    }
    *slot = Some(AppState { app, commands });
    info!("event=app_init module=ffi status=ok db_path={}", path.display());
    Ok("App ready.".to_string())
}

fn resolve_db_path(explicit: Option<String>) -> PathBuf {
    explicit
        .or_else(|| std::env::var(DB_PATH_ENV).ok())
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME))
}

/// Removes and returns all queued native side effects, oldest first.
#[flutter_rust_bridge::frb(sync)]
pub fn drain_platform_commands() -> Vec<PlatformCommand> {
    with_app(|state| {
        let mut queue = state
            .commands
            .lock()
            .map_err(|_| "platform command queue poisoned".to_string())?;
        Ok(queue.drain(..).collect())
    })
    .unwrap_or_default()
}

// ── Alarms ───────────────────────────────────────────────────────────

/// Adds an alarm from user text such as `7:30` and a sound key.
#[flutter_rust_bridge::frb(sync)]
pub fn alarm_add(time: String, sound: String) -> AlarmActionResponse {
    let result = with_app(|state| {
        let sound = AlarmSound::parse(&sound).map_err(|err| err.to_string())?;
        state
            .app
            .registry_mut()
            .add_from_text(&time, sound)
            .map_err(|err| err.to_string())
    });
    alarm_action(result, "Alarm added.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn alarm_remove(alarm_id: String) -> AlarmActionResponse {
    let result = with_app(|state| {
        state
            .app
            .registry_mut()
            .remove(&AlarmId::from_raw(alarm_id.trim()))
            .map_err(|err| err.to_string())
    });
    alarm_action(result, "Alarm removed.")
}

/// Lists alarms split around `now_epoch_ms` (local clock when absent).
#[flutter_rust_bridge::frb(sync)]
pub fn alarm_list(now_epoch_ms: Option<i64>) -> AlarmListResponse {
    let result: Result<(Vec<AlarmItem>, Vec<AlarmItem>), String> = with_app(|state| {
        let now = resolve_now(now_epoch_ms)?;
        let partition = state
            .app
            .registry()
            .upcoming_and_past(TimeOfDay::from_naive_time(now.time()));
        Ok((
            partition.upcoming.into_iter().map(to_alarm_item).collect(),
            partition.past.into_iter().map(to_alarm_item).collect(),
        ))
    });
    match result {
        Ok((upcoming, past)) => AlarmListResponse {
            ok: true,
            upcoming,
            past,
            message: String::new(),
        },
        Err(message) => AlarmListResponse {
            ok: false,
            upcoming: Vec::new(),
            past: Vec::new(),
            message,
        },
    }
}

// ── Ringing ──────────────────────────────────────────────────────────

/// Advances the scheduler; the host calls this once per second.
#[flutter_rust_bridge::frb(sync)]
pub fn clock_tick(now_epoch_ms: Option<i64>) -> TickResponse {
    let result = with_app(|state| {
        let now = resolve_now(now_epoch_ms)?;
        let outcome = state.app.tick(now);
        let started_puzzle = match outcome.event {
            Some(SchedulerEvent::RingStarted { kind, .. }) => Some(kind.key().to_string()),
            _ => None,
        };
        Ok(TickResponse {
            ok: true,
            clock: outcome.clock.display(),
            state: snake_case_label(&outcome.state),
            ringing_alarm_id: state
                .app
                .scheduler()
                .active_alarm()
                .map(ToString::to_string),
            started_puzzle,
            message: String::new(),
        })
    });
    result.unwrap_or_else(|message| TickResponse {
        ok: false,
        clock: String::new(),
        state: String::new(),
        ringing_alarm_id: None,
        started_puzzle: None,
        message,
    })
}

/// Dismisses the cover and reveals the puzzle.
#[flutter_rust_bridge::frb(sync)]
pub fn gate_start(now_epoch_ms: Option<i64>) -> GateResponse {
    gate_command(now_epoch_ms, |app, now| {
        app.scheduler_mut().start_challenge(now);
    })
}

/// Replaces the typed answer.
#[flutter_rust_bridge::frb(sync)]
pub fn gate_answer(text: String, now_epoch_ms: Option<i64>) -> GateResponse {
    gate_command(now_epoch_ms, |app, _| {
        app.scheduler_mut().submit_answer(&text);
    })
}

/// Selects a logic-puzzle option.
#[flutter_rust_bridge::frb(sync)]
pub fn gate_select(option: String, now_epoch_ms: Option<i64>) -> GateResponse {
    gate_command(now_epoch_ms, |app, _| {
        app.scheduler_mut().select_option(&option);
    })
}

/// Swaps in a fresh puzzle behind the cover.
#[flutter_rust_bridge::frb(sync)]
pub fn gate_refresh(now_epoch_ms: Option<i64>) -> GateResponse {
    gate_command(now_epoch_ms, |app, _| {
        app.scheduler_mut().refresh_challenge();
    })
}

/// Shows a reminder line on the ringing alarm's gate; `None` clears it.
#[flutter_rust_bridge::frb(sync)]
pub fn gate_set_reminder(reminder: Option<String>, now_epoch_ms: Option<i64>) -> GateResponse {
    gate_command(now_epoch_ms, |app, _| {
        app.scheduler_mut().set_reminder(reminder);
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn gate_view(now_epoch_ms: Option<i64>) -> GateResponse {
    gate_command(now_epoch_ms, |_, _| {})
}

/// Stops the ringing alarm once its puzzle is solved.
#[flutter_rust_bridge::frb(sync)]
pub fn alarm_stop() -> RingActionResponse {
    ring_action(with_app(|state| Ok(state.app.stop())))
}

/// Snoozes the ringing alarm once its puzzle is solved.
#[flutter_rust_bridge::frb(sync)]
pub fn alarm_snooze(now_epoch_ms: Option<i64>) -> RingActionResponse {
    ring_action(with_app(|state| {
        let now = resolve_now(now_epoch_ms)?;
        Ok(state.app.snooze(now))
    }))
}

/// Reports native playback that could not start or broke mid-ring.
#[flutter_rust_bridge::frb(sync)]
pub fn audio_failed(handle: u64, reason: String) -> ActionResponse {
    warn!(
        "event=audio_failed module=ffi status=error handle={} reason={}",
        handle,
        reason.replace(['\n', '\r'], " ")
    );
    ActionResponse::from_result(with_app(|state| {
        state.app.scheduler_mut().forget_sound(handle);
        Ok("Audio failure recorded.".to_string())
    }))
}

/// Reports native playback that reached its end.
#[flutter_rust_bridge::frb(sync)]
pub fn audio_finished(handle: u64) -> RingActionResponse {
    ring_action(with_app(|state| {
        Ok(state.app.scheduler_mut().on_playback_finished(handle))
    }))
}

// ── To-do ────────────────────────────────────────────────────────────

/// Creates a task (`id` absent) or edits one in place.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_upsert(
    id: Option<String>,
    description: String,
    category: String,
    date: String,
) -> TaskActionResponse {
    let result = with_app(|state| {
        let draft = TaskDraft {
            id: id.as_deref().map(parse_task_id).transpose()?,
            description,
            category: TaskCategory::parse(&category)
                .ok_or_else(|| format!("unknown task category `{}`", category.trim()))?,
            date: parse_date(&date)?,
        };
        state
            .app
            .todos_mut()
            .upsert(draft)
            .map_err(|err| err.to_string())
    });
    task_action(result, "Task saved.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_toggle(id: String) -> TaskActionResponse {
    let result = with_app(|state| {
        let id = parse_task_id(&id)?;
        let todos = state.app.todos_mut();
        todos.toggle_done(id).map_err(|err| err.to_string())?;
        todos
            .get(id)
            .cloned()
            .ok_or_else(|| format!("task not found: {id}"))
    });
    task_action(result, "Task updated.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete(id: String) -> TaskActionResponse {
    let result = with_app(|state| {
        let id = parse_task_id(&id)?;
        state
            .app
            .todos_mut()
            .delete(id)
            .map_err(|err| err.to_string())
    });
    task_action(result, "Task deleted.")
}

/// Lists tasks for `date`, or every task when `date` is absent.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list(date: Option<String>) -> TaskListResponse {
    let result: Result<Vec<TaskItem>, String> = with_app(|state| {
        let todos = state.app.todos();
        let items = match date.as_deref() {
            Some(raw) => todos
                .tasks_for_date(parse_date(raw)?)
                .into_iter()
                .map(to_task_item)
                .collect(),
            None => todos.all().iter().map(to_task_item).collect(),
        };
        Ok(items)
    });
    match result {
        Ok(items) => TaskListResponse {
            ok: true,
            items,
            message: String::new(),
        },
        Err(message) => TaskListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Per-day completion for the Monday-started week containing `date`.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_weekly(date: String) -> WeeklyProgressResponse {
    let result: Result<Vec<DayProgressItem>, String> = with_app(|state| {
        let anchor = parse_date(&date)?;
        Ok(state
            .app
            .todos()
            .weekly_progress(anchor)
            .into_iter()
            .map(to_day_progress_item)
            .collect())
    });
    match result {
        Ok(days) => WeeklyProgressResponse {
            ok: true,
            days,
            message: String::new(),
        },
        Err(message) => WeeklyProgressResponse {
            ok: false,
            days: Vec::new(),
            message,
        },
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn app_slot() -> &'static Mutex<Option<AppState>> {
    APP_STATE.get_or_init(|| Mutex::new(None))
}

fn with_app<T>(f: impl FnOnce(&mut AppState) -> Result<T, String>) -> Result<T, String> {
    let mut slot = app_slot()
        .lock()
        .map_err(|_| "app state poisoned".to_string())?;
    let state = slot.as_mut().ok_or_else(|| NOT_INITIALIZED.to_string())?;
    f(state)
}

fn gate_command(
    now_epoch_ms: Option<i64>,
    f: impl FnOnce(&mut SmartAlarmApp<SqliteKvStore>, NaiveDateTime),
) -> GateResponse {
    let result = with_app(|state| {
        let now = resolve_now(now_epoch_ms)?;
        f(&mut state.app, now);
        Ok(state.app.scheduler().challenge_view(now).map(to_gate_view))
    });
    match result {
        Ok(Some(view)) => GateResponse {
            ok: true,
            view: Some(view),
            message: String::new(),
        },
        Ok(None) => GateResponse {
            ok: false,
            view: None,
            message: "No alarm is ringing.".to_string(),
        },
        Err(message) => GateResponse {
            ok: false,
            view: None,
            message,
        },
    }
}

fn resolve_now(now_epoch_ms: Option<i64>) -> Result<NaiveDateTime, String> {
    match now_epoch_ms {
        None => Ok(SystemClock.now()),
        Some(ms) => Local
            .timestamp_millis_opt(ms)
            .single()
            .map(|at| at.naive_local())
            .ok_or_else(|| format!("invalid timestamp: {ms}")),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| format!("invalid date `{}`; expected YYYY-MM-DD", raw.trim()))
}

fn parse_task_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid task id `{}`", raw.trim()))
}

fn snake_case_label<T: std::fmt::Debug>(value: &T) -> String {
    let debug = format!("{value:?}");
    let mut label = String::with_capacity(debug.len() + 4);
    for (index, ch) in debug.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if index > 0 {
                label.push('_');
            }
            label.push(ch.to_ascii_lowercase());
        } else {
            label.push(ch);
        }
    }
    label
}

fn alarm_action(result: Result<AlarmRecord, String>, success: &str) -> AlarmActionResponse {
    match result {
        Ok(record) => AlarmActionResponse {
            ok: true,
            alarm: Some(to_alarm_item(&record)),
            message: success.to_string(),
        },
        Err(message) => AlarmActionResponse {
            ok: false,
            alarm: None,
            message,
        },
    }
}

fn ring_action(result: Result<Option<SchedulerEvent>, String>) -> RingActionResponse {
    let refused = |message: &str| RingActionResponse {
        ok: false,
        alarm_id: None,
        snooze_due_at: None,
        message: message.to_string(),
    };
    match result {
        Ok(Some(SchedulerEvent::Stopped { key })) => RingActionResponse {
            ok: true,
            alarm_id: Some(key.to_string()),
            snooze_due_at: None,
            message: "Alarm stopped.".to_string(),
        },
        Ok(Some(SchedulerEvent::AutoStopped { key })) => RingActionResponse {
            ok: true,
            alarm_id: Some(key.to_string()),
            snooze_due_at: None,
            message: "Alarm finished.".to_string(),
        },
        Ok(Some(SchedulerEvent::Snoozed { key, due_at })) => RingActionResponse {
            ok: true,
            alarm_id: Some(key.to_string()),
            snooze_due_at: Some(due_at.format("%Y-%m-%dT%H:%M:%S").to_string()),
            message: "Alarm snoozed.".to_string(),
        },
        Ok(Some(SchedulerEvent::RingStarted { .. })) | Ok(None) => {
            refused("Solve the puzzle first.")
        }
        Err(message) => refused(&message),
    }
}

fn task_action(result: Result<ToDoTask, String>, success: &str) -> TaskActionResponse {
    match result {
        Ok(task) => TaskActionResponse {
            ok: true,
            task: Some(to_task_item(&task)),
            message: success.to_string(),
        },
        Err(message) => TaskActionResponse {
            ok: false,
            task: None,
            message,
        },
    }
}

fn to_alarm_item(record: &AlarmRecord) -> AlarmItem {
    AlarmItem {
        id: record.id.to_string(),
        time: record.time.to_string(),
        sound: record.sound.key().to_string(),
        notification_id: record.notification_id.clone(),
    }
}

fn to_gate_view(view: ChallengeView) -> GateView {
    GateView {
        kind: view.kind.key().to_string(),
        state: snake_case_label(&view.state),
        prompt: view.prompt,
        options: view.options,
        sequence_visible: view.sequence_visible,
        answer: view.answer,
        solved: view.solved,
        reminder: view.reminder,
    }
}

fn to_task_item(task: &ToDoTask) -> TaskItem {
    TaskItem {
        id: task.id.to_string(),
        description: task.description.clone(),
        done: task.done,
        category: task.category.key().to_string(),
        date: task.date.format(DATE_FORMAT).to_string(),
    }
}

fn to_day_progress_item(progress: DayProgress) -> DayProgressItem {
    DayProgressItem {
        date: progress.date.format(DATE_FORMAT).to_string(),
        total: u32::try_from(progress.total).unwrap_or(u32::MAX),
        done: u32::try_from(progress.done).unwrap_or(u32::MAX),
        percent: progress.percent,
    }
}
