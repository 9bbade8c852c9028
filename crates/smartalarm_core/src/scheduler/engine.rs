//! Alarm scheduler/matcher.
//!
//! The scheduler is a wall-clock state machine with no internal threads. The
//! host calls `tick()` once per second; the snooze deferral is evaluated inside
//! the same call, so the two timers never overlap.
//!
//! ```text
//! Idle --match at HH:MM:00--> Ringing --stop--> Idle
//!                               |  ^
//!                         snooze|  |deferral due
//!                               v  |
//!                           SnoozePending
//! ```
//!
//! # Invariants
//! - At most one alarm rings at a time.
//! - Stop/snooze only take effect when the active gate authorizes them.
//! - At most one snooze deferral is pending; a new snooze replaces it.
//! - A trigger key fires at most once.

use crate::config::CoreConfig;
use crate::model::alarm::{AlarmId, AlarmRecord, AlarmSound};
use crate::puzzle::challenge::{Challenge, PuzzleKind};
use crate::puzzle::gate::{ChallengeView, DismissalGate, GateAction};
use crate::scheduler::audio::{AudioPlayer, SoundHandle, SoundSlot};
use crate::scheduler::clock::ClockReading;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Ringing,
    /// Nothing rings, but a snoozed alarm is waiting to ring again.
    SnoozePending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    RingStarted {
        key: AlarmId,
        kind: PuzzleKind,
        resumed_from_snooze: bool,
    },
    Stopped {
        key: AlarmId,
    },
    Snoozed {
        key: AlarmId,
        due_at: NaiveDateTime,
    },
    /// Non-looping playback finished and ended the ring.
    AutoStopped {
        key: AlarmId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub clock: ClockReading,
    pub state: SchedulerState,
    pub event: Option<SchedulerEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnoozeDeferral {
    pub key: AlarmId,
    pub due_at: NaiveDateTime,
}

/// Identity used for re-fire suppression.
///
/// `day` is set when alarms re-arm daily, and `None` when an alarm fires at
/// most once per process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TriggerKey {
    alarm: AlarmId,
    day: Option<NaiveDate>,
}

struct ActiveRing {
    key: AlarmId,
    gate: DismissalGate,
}

pub struct AlarmScheduler {
    config: CoreConfig,
    audio: SoundSlot,
    rng: StdRng,
    active: Option<ActiveRing>,
    triggered: HashSet<TriggerKey>,
    snooze: Option<SnoozeDeferral>,
}

impl AlarmScheduler {
    pub fn new(config: CoreConfig, audio: Box<dyn AudioPlayer>) -> Self {
        Self::with_rng(config, audio, StdRng::from_entropy())
    }

    /// Builds a scheduler with a caller-provided RNG for reproducible puzzles.
    pub fn with_rng(config: CoreConfig, audio: Box<dyn AudioPlayer>, rng: StdRng) -> Self {
        Self {
            config,
            audio: SoundSlot::new(audio),
            rng,
            active: None,
            triggered: HashSet::new(),
            snooze: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SchedulerState {
        match (&self.active, &self.snooze) {
            (Some(_), _) => SchedulerState::Ringing,
            (None, Some(_)) => SchedulerState::SnoozePending,
            (None, None) => SchedulerState::Idle,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Alarm currently ringing, if any.
    pub fn active_alarm(&self) -> Option<&AlarmId> {
        self.active.as_ref().map(|ring| &ring.key)
    }

    pub fn pending_snooze(&self) -> Option<&SnoozeDeferral> {
        self.snooze.as_ref()
    }

    pub fn active_sound(&self) -> Option<SoundHandle> {
        self.audio.active()
    }

    /// Whether `alarm` already fired for `day` (or at all, without daily re-arm).
    pub fn has_fired(&self, alarm: &AlarmId, day: NaiveDate) -> bool {
        self.triggered.contains(&self.trigger_key(alarm, day))
    }

    pub fn active_challenge(&self) -> Option<&Challenge> {
        self.active.as_ref().map(|ring| ring.gate.challenge())
    }

    pub fn challenge_view(&self, now: NaiveDateTime) -> Option<ChallengeView> {
        self.active.as_ref().map(|ring| ring.gate.view(now))
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Advances the scheduler to `now` against the current registry contents.
    pub fn tick(&mut self, now: NaiveDateTime, alarms: &[AlarmRecord]) -> TickOutcome {
        let clock = ClockReading::new(now);
        if self.config.rearm_daily {
            self.triggered
                .retain(|key| key.day.map_or(true, |day| day >= clock.date));
        }

        let event = self
            .match_alarms(&clock, alarms)
            .or_else(|| self.resume_snoozed(now, alarms));

        TickOutcome {
            clock,
            state: self.state(),
            event,
        }
    }

    fn match_alarms(
        &mut self,
        clock: &ClockReading,
        alarms: &[AlarmRecord],
    ) -> Option<SchedulerEvent> {
        if !clock.is_top_of_minute() {
            return None;
        }

        for alarm in alarms.iter().filter(|alarm| alarm.time == clock.time) {
            let key = self.trigger_key(&alarm.id, clock.date);
            if self.triggered.contains(&key) {
                continue;
            }
            if let Some(ring) = &self.active {
                info!(
                    "event=alarm_match module=scheduler status=skipped reason=already_ringing alarm_id={} active_id={}",
                    alarm.id, ring.key
                );
                continue;
            }
            self.triggered.insert(key);
            return Some(self.begin_ring(alarm.id.clone(), alarm.sound, false));
        }
        None
    }

    fn resume_snoozed(
        &mut self,
        now: NaiveDateTime,
        alarms: &[AlarmRecord],
    ) -> Option<SchedulerEvent> {
        let due = self
            .snooze
            .as_ref()
            .is_some_and(|deferral| deferral.due_at <= now);
        if !due || self.active.is_some() {
            return None;
        }

        let deferral = self.snooze.take()?;
        match alarms.iter().find(|alarm| alarm.id == deferral.key) {
            Some(alarm) => Some(self.begin_ring(alarm.id.clone(), alarm.sound, true)),
            None => {
                info!(
                    "event=snooze_resume module=scheduler status=dropped reason=alarm_removed alarm_id={}",
                    deferral.key
                );
                None
            }
        }
    }

    fn begin_ring(
        &mut self,
        key: AlarmId,
        sound: AlarmSound,
        resumed_from_snooze: bool,
    ) -> SchedulerEvent {
        let challenge = self.next_challenge();
        let kind = challenge.kind();
        self.audio.swap(sound, self.config.loop_audio);
        self.active = Some(ActiveRing {
            key: key.clone(),
            gate: DismissalGate::new(challenge, self.config.memory_reveal()),
        });

        info!(
            "event=ring_start module=scheduler status=ok alarm_id={} puzzle={} resumed={}",
            key,
            kind.key(),
            resumed_from_snooze
        );
        SchedulerEvent::RingStarted {
            key,
            kind,
            resumed_from_snooze,
        }
    }

    // ── Gate commands ────────────────────────────────────────────────

    pub fn start_challenge(&mut self, now: NaiveDateTime) -> bool {
        self.active
            .as_mut()
            .is_some_and(|ring| ring.gate.start(now))
    }

    pub fn submit_answer(&mut self, text: &str) -> bool {
        self.active
            .as_mut()
            .is_some_and(|ring| ring.gate.set_answer(text))
    }

    pub fn select_option(&mut self, option: &str) -> bool {
        self.active
            .as_mut()
            .is_some_and(|ring| ring.gate.select_option(option))
    }

    /// Attaches a reminder line to the ringing alarm's gate.
    pub fn set_reminder(&mut self, reminder: Option<String>) -> bool {
        match self.active.as_mut() {
            Some(ring) => {
                ring.gate.set_reminder(reminder);
                true
            }
            None => false,
        }
    }

    /// Replaces the active challenge with a fresh one behind the cover.
    pub fn refresh_challenge(&mut self) -> bool {
        if self.active.is_none() {
            return false;
        }
        let challenge = self.next_challenge();
        let Some(ring) = self.active.as_mut() else {
            return false;
        };
        debug!(
            "event=puzzle_refresh module=scheduler status=ok alarm_id={} puzzle={}",
            ring.key,
            challenge.kind().key()
        );
        ring.gate.reset(challenge);
        true
    }

    /// Ends the ring when the gate is solved.
    ///
    /// Returns `None`, with no state change, when nothing rings or the gate
    /// refuses.
    pub fn stop(&mut self) -> Option<SchedulerEvent> {
        let ring = self.take_authorized(GateAction::Stop)?;
        self.audio.stop();
        if let Some(cancelled) = self.snooze.take() {
            info!(
                "event=snooze_cancel module=scheduler status=ok alarm_id={}",
                cancelled.key
            );
        }
        info!(
            "event=ring_stop module=scheduler status=ok alarm_id={}",
            ring.key
        );
        Some(SchedulerEvent::Stopped { key: ring.key })
    }

    /// Ends the ring when the gate is solved and arms a deferral.
    pub fn snooze(&mut self, now: NaiveDateTime) -> Option<SchedulerEvent> {
        let ring = self.take_authorized(GateAction::Snooze)?;
        self.audio.stop();

        let due_at = now + self.config.snooze_delay();
        if let Some(previous) = self.snooze.replace(SnoozeDeferral {
            key: ring.key.clone(),
            due_at,
        }) {
            info!(
                "event=snooze_replace module=scheduler status=ok cancelled_alarm_id={} due_at={}",
                previous.key, previous.due_at
            );
        }
        info!(
            "event=ring_snooze module=scheduler status=ok alarm_id={} due_at={}",
            ring.key, due_at
        );
        Some(SchedulerEvent::Snoozed {
            key: ring.key,
            due_at,
        })
    }

    /// Host callback for playback that reached its end.
    pub fn on_playback_finished(&mut self, handle: SoundHandle) -> Option<SchedulerEvent> {
        if self.config.loop_audio || !self.audio.forget(handle) {
            debug!(
                "event=audio_finished module=scheduler status=ignored handle={}",
                handle
            );
            return None;
        }
        let ring = self.active.take()?;
        info!(
            "event=ring_autostop module=scheduler status=ok alarm_id={}",
            ring.key
        );
        Some(SchedulerEvent::AutoStopped { key: ring.key })
    }

    /// Host callback for playback that failed to start or broke mid-ring.
    ///
    /// Drops the dead handle so the next stop does not target it. The ring
    /// itself stays active until the user dismisses it.
    pub fn forget_sound(&mut self, handle: SoundHandle) -> bool {
        let forgotten = self.audio.forget(handle);
        info!(
            "event=audio_forget module=scheduler status={} handle={}",
            if forgotten { "ok" } else { "ignored" },
            handle
        );
        forgotten
    }

    fn take_authorized(&mut self, action: GateAction) -> Option<ActiveRing> {
        let ring = self.active.as_ref()?;
        if !ring.gate.authorize(action) {
            debug!(
                "event=gate_action module=scheduler status=rejected action={:?} alarm_id={} gate_state={:?}",
                action,
                ring.key,
                ring.gate.state()
            );
            return None;
        }
        self.active.take()
    }

    fn next_challenge(&mut self) -> Challenge {
        Challenge::random(
            &self.config.puzzle_kinds,
            self.config.challenge_settings(),
            &mut self.rng,
        )
    }

    fn trigger_key(&self, alarm: &AlarmId, day: NaiveDate) -> TriggerKey {
        TriggerKey {
            alarm: alarm.clone(),
            day: self.config.rearm_daily.then_some(day),
        }
    }
}

impl Drop for AlarmScheduler {
    fn drop(&mut self) {
        if self.audio.active().is_some() {
            warn!("event=scheduler_drop module=scheduler status=ok note=stopping_active_sound");
            self.audio.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AlarmScheduler, SchedulerEvent, SchedulerState};
    use crate::config::CoreConfig;
    use crate::model::alarm::{AlarmRecord, AlarmSound, TimeOfDay};
    use crate::puzzle::challenge::PuzzleKind;
    use crate::scheduler::audio::SilentAudio;
    use chrono::{NaiveDate, NaiveDateTime};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn arithmetic_only() -> AlarmScheduler {
        let config = CoreConfig {
            puzzle_kinds: vec![PuzzleKind::Arithmetic],
            ..CoreConfig::default()
        };
        AlarmScheduler::with_rng(config, Box::new(SilentAudio::default()), StdRng::seed_from_u64(3))
    }

    fn alarm(hour: u8, minute: u8) -> AlarmRecord {
        AlarmRecord::new(TimeOfDay::new(hour, minute).unwrap(), AlarmSound::Beep)
    }

    #[test]
    fn only_top_of_minute_ticks_match() {
        let mut scheduler = arithmetic_only();
        let alarms = [alarm(7, 30)];

        let outcome = scheduler.tick(at(7, 30, 1), &alarms);
        assert_eq!(outcome.state, SchedulerState::Idle);
        assert!(outcome.event.is_none());

        let outcome = scheduler.tick(at(7, 30, 0), &alarms);
        assert_eq!(outcome.state, SchedulerState::Ringing);
        assert!(matches!(
            outcome.event,
            Some(SchedulerEvent::RingStarted { resumed_from_snooze: false, .. })
        ));
        assert!(scheduler.active_sound().is_some());
    }

    #[test]
    fn stop_is_refused_until_gate_solved() {
        let mut scheduler = arithmetic_only();
        let alarms = [alarm(6, 0)];
        scheduler.tick(at(6, 0, 0), &alarms);

        assert!(scheduler.stop().is_none());
        assert!(!scheduler.submit_answer("7"), "answers ignored before start");
        assert!(scheduler.start_challenge(at(6, 0, 2)));
        assert!(scheduler.submit_answer(" 7 "));

        let event = scheduler.stop();
        assert!(matches!(event, Some(SchedulerEvent::Stopped { .. })));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.active_sound().is_none());
    }

    #[test]
    fn refresh_returns_gate_to_cover() {
        let mut scheduler = arithmetic_only();
        scheduler.tick(at(6, 0, 0), &[alarm(6, 0)]);
        scheduler.start_challenge(at(6, 0, 1));
        scheduler.submit_answer("7");

        assert!(scheduler.refresh_challenge());
        let view = scheduler.challenge_view(at(6, 0, 2)).unwrap();
        assert!(!view.solved);
        assert!(view.answer.is_empty());
        assert!(scheduler.stop().is_none());
    }
}
