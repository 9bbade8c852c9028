use smartalarm_core::{
    open_db, AlarmId, AlarmRegistry, AlarmSound, NoopNotifier, RegistryError, SqliteKvStore,
    TimeOfDay,
};

fn time(text: &str) -> TimeOfDay {
    TimeOfDay::parse(text).unwrap()
}

#[test]
fn distinct_pairs_add_and_duplicates_leave_registry_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteKvStore::new(open_db(dir.path().join("alarms.db")).unwrap());
    let mut registry = AlarmRegistry::load(store, Box::new(NoopNotifier));

    registry.add(time("07:30"), AlarmSound::Chime).unwrap();
    registry.add(time("07:30"), AlarmSound::Beep).unwrap();
    registry.add(time("08:00"), AlarmSound::Chime).unwrap();
    assert_eq!(registry.len(), 3);

    let before = registry.list().to_vec();
    let err = registry.add(time("7:30"), AlarmSound::Chime).unwrap_err();
    assert_eq!(err, RegistryError::Duplicate(AlarmId::from_raw("07:30-chime")));
    assert_eq!(registry.list(), before.as_slice());
}

#[test]
fn invalid_time_text_is_rejected_without_state_change() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteKvStore::new(open_db(dir.path().join("alarms.db")).unwrap());
    let mut registry = AlarmRegistry::load(store, Box::new(NoopNotifier));

    for text in ["", "25:00", "07:60", "seven", "7:3"] {
        let err = registry.add_from_text(text, AlarmSound::Beep).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTime(_)), "{text}");
    }
    assert!(registry.is_empty());
}

#[test]
fn alarms_survive_reload_in_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alarms.db");

    {
        let store = SqliteKvStore::new(open_db(&path).unwrap());
        let mut registry = AlarmRegistry::load(store, Box::new(NoopNotifier));
        registry.add_from_text("9:15", AlarmSound::Ringtone).unwrap();
        registry.add_from_text("06:05", AlarmSound::Default).unwrap();
        registry.add_from_text("12:00", AlarmSound::Beep).unwrap();
        registry.remove(&AlarmId::from_raw("06:05-default")).unwrap();
        assert!(!registry.has_unsaved_changes());
    }

    let store = SqliteKvStore::new(open_db(&path).unwrap());
    let registry = AlarmRegistry::load(store, Box::new(NoopNotifier));
    let ids: Vec<&str> = registry.list().iter().map(|alarm| alarm.id.as_str()).collect();
    assert_eq!(ids, ["09:15-ringtone", "12:00-beep"]);
}

#[test]
fn partition_splits_around_current_minute() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteKvStore::new(open_db(dir.path().join("alarms.db")).unwrap());
    let mut registry = AlarmRegistry::load(store, Box::new(NoopNotifier));
    registry.add_from_text("22:00", AlarmSound::Beep).unwrap();
    registry.add_from_text("06:00", AlarmSound::Beep).unwrap();
    registry.add_from_text("12:30", AlarmSound::Chime).unwrap();

    let partition = registry.upcoming_and_past(time("12:30"));
    let upcoming: Vec<&str> = partition.upcoming.iter().map(|a| a.id.as_str()).collect();
    let past: Vec<&str> = partition.past.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(upcoming, ["22:00-beep", "12:30-chime"]);
    assert_eq!(past, ["06:00-beep"]);
}
