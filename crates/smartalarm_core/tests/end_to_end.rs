use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use smartalarm_core::{
    open_db_in_memory, AlarmSound, Challenge, CoreConfig, NoopNotifier, PuzzleKind,
    SchedulerEvent, SchedulerState, SilentAudio, SmartAlarmApp, SqliteKvStore,
};

fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

fn open_app(seed: u64) -> SmartAlarmApp<SqliteKvStore> {
    SmartAlarmApp::open_with_rng(
        SqliteKvStore::new(open_db_in_memory().unwrap()),
        CoreConfig::default(),
        Box::new(SilentAudio::default()),
        Box::new(NoopNotifier),
        StdRng::seed_from_u64(seed),
    )
}

fn solve_active(app: &mut SmartAlarmApp<SqliteKvStore>, now: NaiveDateTime) {
    let scheduler = app.scheduler_mut();
    assert!(scheduler.start_challenge(now));
    let challenge = scheduler.active_challenge().unwrap().clone();
    match challenge {
        Challenge::Logic { .. } => assert!(scheduler.select_option(&challenge.solution())),
        _ => assert!(scheduler.submit_answer(&challenge.solution())),
    }
}

#[test]
fn added_alarm_rings_and_is_gated_by_its_puzzle() {
    // Several seeds so more than one puzzle kind goes through the flow.
    for seed in 0..8 {
        let mut app = open_app(seed);
        let alarm = app
            .registry_mut()
            .add_from_text("07:30", AlarmSound::Chime)
            .unwrap();
        assert_eq!(alarm.id.as_str(), "07:30-chime");

        assert!(app.tick(at(7, 29, 59)).event.is_none());
        let outcome = app.tick(at(7, 30, 0));
        let kind = match outcome.event {
            Some(SchedulerEvent::RingStarted { kind, .. }) => kind,
            other => panic!("expected ring, got {other:?}"),
        };
        assert!(PuzzleKind::ALL.contains(&kind));

        assert!(app.stop().is_none());
        assert!(app.snooze(at(7, 30, 1)).is_none());
        assert_eq!(app.scheduler().state(), SchedulerState::Ringing);

        solve_active(&mut app, at(7, 30, 2));
        assert!(app.scheduler().challenge_view(at(7, 30, 3)).unwrap().solved);
        assert!(matches!(app.stop(), Some(SchedulerEvent::Stopped { .. })));
        assert_eq!(app.scheduler().state(), SchedulerState::Idle);
    }
}

#[test]
fn removing_a_ringing_alarm_keeps_the_ring() {
    let mut app = open_app(1);
    let alarm = app
        .registry_mut()
        .add_from_text("6:45", AlarmSound::Beep)
        .unwrap();
    app.tick(at(6, 45, 0));

    app.registry_mut().remove(&alarm.id).unwrap();
    let outcome = app.tick(at(6, 45, 1));
    assert_eq!(outcome.state, SchedulerState::Ringing);
    assert_eq!(app.scheduler().active_alarm(), Some(&alarm.id));
}

#[test]
fn snoozed_alarm_removed_before_due_never_returns() {
    let mut app = open_app(2);
    let alarm = app
        .registry_mut()
        .add_from_text("06:45", AlarmSound::Beep)
        .unwrap();
    app.tick(at(6, 45, 0));
    solve_active(&mut app, at(6, 45, 1));
    assert!(app.snooze(at(6, 45, 2)).is_some());

    app.registry_mut().remove(&alarm.id).unwrap();
    let outcome = app.tick(at(6, 45, 7));
    assert!(outcome.event.is_none());
    assert_eq!(outcome.state, SchedulerState::Idle);
}
