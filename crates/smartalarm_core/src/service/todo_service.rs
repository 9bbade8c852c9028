//! To-do list use-case service.
//!
//! # Responsibility
//! - Create, edit, toggle and delete date-bucketed tasks.
//! - Compute per-day completion for a Monday-started week.
//!
//! # Invariants
//! - Date filtering is exact-day; tasks never recur.
//! - Editing a task keeps its id and `done` flag.
//! - Every mutation overwrites the whole `tasks` value, unless that value
//!   could not be read at load time.

use crate::model::task::{
    normalize_description, TaskCategory, TaskId, TaskValidationError, ToDoTask,
};
use crate::store::kv_store::{load_json_list, save_json, KvStore, TASKS_KEY};
use chrono::{Datelike, Duration, NaiveDate};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    NotFound(TaskId),
    Validation(TaskValidationError),
}

impl Display for TodoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TodoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<TaskValidationError> for TodoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Create-or-edit request from the task editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// `None` creates a task; `Some` edits the task in place.
    pub id: Option<TaskId>,
    pub description: String,
    pub category: TaskCategory,
    pub date: NaiveDate,
}

/// Completion summary for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub total: usize,
    pub done: usize,
    /// `round(done / total * 100)`, or 0 for a day without tasks.
    pub percent: u8,
}

pub struct TodoList<S: KvStore> {
    store: S,
    tasks: Vec<ToDoTask>,
    unsaved: bool,
    read_failed: bool,
}

impl<S: KvStore> TodoList<S> {
    /// Loads persisted tasks, skipping entries that fail to decode.
    ///
    /// An unreadable list yields an empty one and is left untouched in the
    /// store.
    pub fn load(store: S) -> Self {
        let (tasks, read_failed) = match load_json_list::<ToDoTask>(&store, TASKS_KEY) {
            Ok(loaded) => {
                for (index, err) in &loaded.rejected {
                    warn!(
                        "event=task_load module=todo status=skipped error_code=invalid_record index={} error={}",
                        index, err
                    );
                }
                (loaded.items, false)
            }
            Err(err) => {
                error!(
                    "event=task_load module=todo status=error error_code=store_read_failed error={}",
                    err
                );
                (Vec::new(), true)
            }
        };
        info!("event=task_load module=todo status=ok count={}", tasks.len());

        Self {
            store,
            tasks,
            unsaved: false,
            read_failed,
        }
    }

    /// Creates a task, or edits one in place when `draft.id` is set.
    pub fn upsert(&mut self, draft: TaskDraft) -> Result<ToDoTask, TodoError> {
        let saved = match draft.id {
            None => {
                let task = ToDoTask::new(draft.description, draft.category, draft.date)?;
                self.tasks.push(task.clone());
                info!("event=task_add module=todo status=ok task_id={}", task.id);
                task
            }
            Some(id) => {
                let description = normalize_description(draft.description)?;
                let task = self.find_mut(id)?;
                task.description = description;
                task.category = draft.category;
                task.date = draft.date;
                let task = task.clone();
                info!("event=task_update module=todo status=ok task_id={}", id);
                task
            }
        };
        self.persist();
        Ok(saved)
    }

    /// Flips `done` and returns the new value.
    pub fn toggle_done(&mut self, id: TaskId) -> Result<bool, TodoError> {
        let task = self.find_mut(id)?;
        task.done = !task.done;
        let done = task.done;
        info!("event=task_toggle module=todo status=ok task_id={id} done={done}");
        self.persist();
        Ok(done)
    }

    pub fn delete(&mut self, id: TaskId) -> Result<ToDoTask, TodoError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(TodoError::NotFound(id))?;
        let removed = self.tasks.remove(index);
        info!("event=task_delete module=todo status=ok task_id={id}");
        self.persist();
        Ok(removed)
    }

    pub fn get(&self, id: TaskId) -> Option<&ToDoTask> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn all(&self) -> &[ToDoTask] {
        &self.tasks
    }

    /// Tasks bucketed on `date`, in insertion order.
    pub fn tasks_for_date(&self, date: NaiveDate) -> Vec<&ToDoTask> {
        self.tasks.iter().filter(|task| task.date == date).collect()
    }

    pub fn day_progress(&self, date: NaiveDate) -> DayProgress {
        let day_tasks = self.tasks_for_date(date);
        let total = day_tasks.len();
        let done = day_tasks.iter().filter(|task| task.done).count();
        DayProgress {
            date,
            total,
            done,
            percent: completion_percent(done, total),
        }
    }

    /// Progress for each day of the Monday-started week containing `anchor`.
    pub fn weekly_progress(&self, anchor: NaiveDate) -> Vec<DayProgress> {
        let monday = week_start(anchor);
        (0..7)
            .map(|offset| self.day_progress(monday + Duration::days(offset)))
            .collect()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    fn find_mut(&mut self, id: TaskId) -> Result<&mut ToDoTask, TodoError> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(TodoError::NotFound(id))
    }

    fn persist(&mut self) {
        if self.read_failed {
            self.unsaved = true;
            warn!("event=task_persist module=todo status=skipped error_code=store_unreadable");
            return;
        }
        match save_json(&self.store, TASKS_KEY, &self.tasks) {
            Ok(()) => self.unsaved = false,
            Err(err) => {
                self.unsaved = true;
                error!(
                    "event=task_persist module=todo status=error error_code=store_write_failed error={}",
                    err
                );
            }
        }
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn completion_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (done as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::{completion_percent, week_start, TaskDraft, TodoList};
    use crate::db::open_db_in_memory;
    use crate::model::task::TaskCategory;
    use crate::store::kv_store::{KvStore, SqliteKvStore, TASKS_KEY};
    use chrono::NaiveDate;

    #[test]
    fn completion_percent_rounds_half_up() {
        assert_eq!(completion_percent(2, 3), 67);
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(1, 8), 13);
        assert_eq!(completion_percent(0, 0), 0);
        assert_eq!(completion_percent(4, 4), 100);
    }

    #[test]
    fn week_start_is_monday() {
        let thursday = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        assert_eq!(week_start(thursday), NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
        let monday = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn invalid_stored_task_does_not_erase_the_rest() {
        let store = SqliteKvStore::new(open_db_in_memory().unwrap());
        store
            .write(
                TASKS_KEY,
                r#"[{"id":"6f1c1d4e-8a44-4c8e-9a49-0b4f8e0f6a01","description":"gym",
                     "done":true,"category":"health","date":"2026-10-16"},
                    {"id":"6f1c1d4e-8a44-4c8e-9a49-0b4f8e0f6a02","description":"nap",
                     "done":false,"category":"bogus","date":"2026-10-16"}]"#,
            )
            .unwrap();
        let mut todos = TodoList::load(store.clone());
        assert_eq!(todos.all().len(), 1);

        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        todos
            .upsert(TaskDraft {
                id: None,
                description: "read".to_string(),
                category: TaskCategory::Study,
                date,
            })
            .unwrap();
        assert!(!todos.has_unsaved_changes());

        let reloaded = TodoList::load(store);
        let names: Vec<&str> = reloaded
            .tasks_for_date(date)
            .iter()
            .map(|task| task.description.as_str())
            .collect();
        assert_eq!(names, ["gym", "read"]);
        assert!(reloaded.tasks_for_date(date)[0].done);
    }

    #[test]
    fn unreadable_stored_tasks_are_not_overwritten() {
        let store = SqliteKvStore::new(open_db_in_memory().unwrap());
        store.write(TASKS_KEY, "not json").unwrap();
        let mut todos = TodoList::load(store.clone());
        assert!(todos.all().is_empty());

        todos
            .upsert(TaskDraft {
                id: None,
                description: "stretch".to_string(),
                category: TaskCategory::Health,
                date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            })
            .unwrap();
        assert!(todos.has_unsaved_changes());
        assert_eq!(store.read(TASKS_KEY).unwrap().as_deref(), Some("not json"));
    }
}
