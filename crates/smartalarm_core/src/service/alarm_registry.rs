//! Alarm registry use-case service.
//!
//! # Responsibility
//! - Own the ordered alarm list and its duplicate rule.
//! - Persist the whole list after every mutation.
//! - Schedule and cancel platform notifications alongside add/remove.
//!
//! # Invariants
//! - No two alarms share an `AlarmId`.
//! - Insertion order is preserved; it is also the firing priority.
//! - A failed write never rolls back the in-memory list.
//! - A stored list that could not be read is never overwritten.

use crate::model::alarm::{AlarmId, AlarmRecord, AlarmSound, AlarmValidationError, TimeOfDay};
use crate::notify::Notifier;
use crate::store::kv_store::{load_json_list, save_json, KvStore, ALARMS_KEY};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An alarm with the same derived id already exists.
    Duplicate(AlarmId),
    /// Time text entered by the user could not be parsed.
    InvalidTime(AlarmValidationError),
    NotFound(AlarmId),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate(id) => write!(f, "alarm already exists: {id}"),
            Self::InvalidTime(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "alarm not found: {id}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTime(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AlarmValidationError> for RegistryError {
    fn from(value: AlarmValidationError) -> Self {
        Self::InvalidTime(value)
    }
}

/// Alarms split around the current minute, each half in registry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmPartition<'a> {
    /// Alarms at or after the current minute of day.
    pub upcoming: Vec<&'a AlarmRecord>,
    /// Alarms earlier in the day.
    pub past: Vec<&'a AlarmRecord>,
}

/// Ordered, persisted alarm collection.
pub struct AlarmRegistry<S: KvStore> {
    store: S,
    notifier: Box<dyn Notifier>,
    alarms: Vec<AlarmRecord>,
    unsaved: bool,
    /// Set when the stored list was unreadable; writes are held back.
    read_failed: bool,
}

impl<S: KvStore> AlarmRegistry<S> {
    /// Loads the persisted alarm list.
    ///
    /// Invalid entries are logged and skipped. When the list cannot be read
    /// at all the registry starts empty and keeps the stored value intact.
    pub fn load(store: S, notifier: Box<dyn Notifier>) -> Self {
        let (alarms, read_failed) = match load_json_list::<AlarmRecord>(&store, ALARMS_KEY) {
            Ok(loaded) => {
                for (index, err) in &loaded.rejected {
                    warn!(
                        "event=alarm_load module=registry status=skipped error_code=invalid_record index={} error={}",
                        index, err
                    );
                }
                (dedupe_loaded(loaded.items), false)
            }
            Err(err) => {
                error!(
                    "event=alarm_load module=registry status=error error_code=store_read_failed error={}",
                    err
                );
                (Vec::new(), true)
            }
        };
        info!(
            "event=alarm_load module=registry status=ok count={}",
            alarms.len()
        );

        Self {
            store,
            notifier,
            alarms,
            unsaved: false,
            read_failed,
        }
    }

    /// Adds a new alarm and schedules its notification.
    ///
    /// # Errors
    /// - `Duplicate` when `(time, sound)` is already registered; nothing changes.
    pub fn add(
        &mut self,
        time: TimeOfDay,
        sound: AlarmSound,
    ) -> Result<AlarmRecord, RegistryError> {
        let mut record = AlarmRecord::new(time, sound);
        if self.contains(&record.id) {
            warn!(
                "event=alarm_add module=registry status=rejected error_code=duplicate alarm_id={}",
                record.id
            );
            return Err(RegistryError::Duplicate(record.id));
        }

        match self.notifier.schedule(&record) {
            Ok(handle) => record.notification_id = Some(handle),
            Err(err) => warn!(
                "event=notification_schedule module=registry status=error alarm_id={} error={}",
                record.id, err
            ),
        }

        self.alarms.push(record.clone());
        info!(
            "event=alarm_add module=registry status=ok alarm_id={} count={}",
            record.id,
            self.alarms.len()
        );
        self.persist();
        Ok(record)
    }

    /// Parses user time text and adds the alarm.
    ///
    /// # Errors
    /// - `InvalidTime` for malformed text; nothing changes.
    /// - `Duplicate` as for [`AlarmRegistry::add`].
    pub fn add_from_text(
        &mut self,
        time_text: &str,
        sound: AlarmSound,
    ) -> Result<AlarmRecord, RegistryError> {
        let time = TimeOfDay::parse(time_text)?;
        self.add(time, sound)
    }

    /// Removes an alarm and cancels its notification.
    ///
    /// A ringing alarm keeps ringing; only the registry entry goes away.
    pub fn remove(&mut self, id: &AlarmId) -> Result<AlarmRecord, RegistryError> {
        let index = self
            .alarms
            .iter()
            .position(|alarm| &alarm.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let removed = self.alarms.remove(index);

        if let Some(handle) = removed.notification_id.as_deref() {
            if let Err(err) = self.notifier.cancel(handle) {
                warn!(
                    "event=notification_cancel module=registry status=error alarm_id={} error={}",
                    removed.id, err
                );
            }
        }

        info!(
            "event=alarm_remove module=registry status=ok alarm_id={} count={}",
            removed.id,
            self.alarms.len()
        );
        self.persist();
        Ok(removed)
    }

    /// Alarms in insertion order.
    pub fn list(&self) -> &[AlarmRecord] {
        &self.alarms
    }

    pub fn get(&self, id: &AlarmId) -> Option<&AlarmRecord> {
        self.alarms.iter().find(|alarm| &alarm.id == id)
    }

    pub fn contains(&self, id: &AlarmId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// Splits alarms into upcoming (at or after `now`) and past.
    pub fn upcoming_and_past(&self, now: TimeOfDay) -> AlarmPartition<'_> {
        let (upcoming, past): (Vec<&AlarmRecord>, Vec<&AlarmRecord>) = self
            .alarms
            .iter()
            .partition(|alarm| alarm.time.minutes_of_day() >= now.minutes_of_day());
        AlarmPartition { upcoming, past }
    }

    /// Whether the last write failed and memory is ahead of storage.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    fn persist(&mut self) {
        if self.read_failed {
            self.unsaved = true;
            warn!(
                "event=alarm_persist module=registry status=skipped error_code=store_unreadable"
            );
            return;
        }
        match save_json(&self.store, ALARMS_KEY, &self.alarms) {
            Ok(()) => self.unsaved = false,
            Err(err) => {
                self.unsaved = true;
                error!(
                    "event=alarm_persist module=registry status=error error_code=store_write_failed error={}",
                    err
                );
            }
        }
    }
}

fn dedupe_loaded(alarms: Vec<AlarmRecord>) -> Vec<AlarmRecord> {
    let mut unique: Vec<AlarmRecord> = Vec::with_capacity(alarms.len());
    for alarm in alarms {
        if unique.iter().any(|existing| existing.id == alarm.id) {
            warn!(
                "event=alarm_load module=registry status=skipped error_code=duplicate alarm_id={}",
                alarm.id
            );
            continue;
        }
        unique.push(alarm);
    }
    unique
}
