//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `smartalarm_core` linkage without the Flutter/FFI runtime.
//! - Exercise one in-memory add-and-tick cycle with deterministic output.

use smartalarm_core::{
    open_db_in_memory, AlarmSound, CoreConfig, NoopNotifier, SilentAudio, SmartAlarmApp,
    SqliteKvStore,
};

fn main() {
    println!("smartalarm_core ping={}", smartalarm_core::ping());
    println!("smartalarm_core version={}", smartalarm_core::core_version());

    let conn = match open_db_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("smartalarm_core db=error {err}");
            std::process::exit(1);
        }
    };
    let mut app = SmartAlarmApp::open(
        SqliteKvStore::new(conn),
        CoreConfig::default(),
        Box::new(SilentAudio::default()),
        Box::new(NoopNotifier),
    );

    match app.registry_mut().add_from_text("7:30", AlarmSound::Chime) {
        Ok(alarm) => println!("smartalarm_core alarm={}", alarm.id),
        Err(err) => println!("smartalarm_core alarm=error {err}"),
    }

    let ring_at = chrono::NaiveDate::from_ymd_opt(2026, 1, 1)
        .and_then(|day| day.and_hms_opt(7, 30, 0));
    if let Some(now) = ring_at {
        let outcome = app.tick(now);
        println!(
            "smartalarm_core tick={} state={:?}",
            outcome.clock.display(),
            outcome.state
        );
    }
}
