//! Dismissal gate state machine.
//!
//! ```text
//! NotStarted --start--> InProgress <--answer--> Solved
//!      ^                                           |
//!      +------------------refresh-------------------+
//! ```
//!
//! # Invariants
//! - Challenge content is hidden until `start`; memory sequences are only
//!   visible inside the reveal window after start.
//! - Answers are ignored before start.
//! - Stop/snooze are authorized only while `Solved`.

use crate::puzzle::challenge::{Challenge, PuzzleKind};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

const COVER_PROMPT: &str = "Tap anywhere to begin puzzle to snooze or stop";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Cover shown; nothing revealed yet.
    NotStarted,
    InProgress,
    Solved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateAction {
    Stop,
    Snooze,
}

/// Render-ready snapshot of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeView {
    pub kind: PuzzleKind,
    pub state: GateState,
    pub prompt: String,
    pub options: Vec<String>,
    /// Whether the memory sequence is currently on screen.
    pub sequence_visible: bool,
    pub answer: String,
    pub solved: bool,
    /// Host-supplied reminder, shown on the cover and during the puzzle.
    pub reminder: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DismissalGate {
    challenge: Challenge,
    answer: String,
    started_at: Option<NaiveDateTime>,
    reveal: Duration,
    reminder: Option<String>,
}

impl DismissalGate {
    pub fn new(challenge: Challenge, reveal: Duration) -> Self {
        Self {
            challenge,
            answer: String::new(),
            started_at: None,
            reveal,
            reminder: None,
        }
    }

    pub fn reminder(&self) -> Option<&str> {
        self.reminder.as_deref()
    }

    /// Sets the reminder line. Blank text clears it.
    pub fn set_reminder(&mut self, reminder: Option<String>) {
        self.reminder = reminder
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn state(&self) -> GateState {
        match self.started_at {
            None => GateState::NotStarted,
            Some(_) if self.is_solved() => GateState::Solved,
            Some(_) => GateState::InProgress,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Solved-ness of the current answer, independent of start.
    pub fn is_solved(&self) -> bool {
        self.challenge.is_solved_by(&self.answer)
    }

    /// Lifts the cover. Returns `false` when already started.
    pub fn start(&mut self, now: NaiveDateTime) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    /// Replaces the free-text answer. Ignored before start.
    pub fn set_answer(&mut self, text: impl Into<String>) -> bool {
        if !self.is_started() {
            return false;
        }
        self.answer = text.into();
        true
    }

    /// Selects a multiple-choice option.
    ///
    /// Ignored before start, for free-text kinds, and for unknown options.
    pub fn select_option(&mut self, option: &str) -> bool {
        if !self.is_started() {
            return false;
        }
        match self
            .challenge
            .options()
            .iter()
            .find(|candidate| **candidate == option)
        {
            Some(candidate) => {
                self.answer = (*candidate).to_string();
                true
            }
            None => false,
        }
    }

    /// Whether `action` may proceed right now.
    pub fn authorize(&self, _action: GateAction) -> bool {
        self.state() == GateState::Solved
    }

    /// Swaps in a new challenge and resets to `NotStarted`. The reminder stays.
    pub fn reset(&mut self, challenge: Challenge) {
        self.challenge = challenge;
        self.answer.clear();
        self.started_at = None;
    }

    pub fn sequence_visible(&self, now: NaiveDateTime) -> bool {
        match (&self.challenge, self.started_at) {
            (Challenge::Memory { .. }, Some(started_at)) => now < started_at + self.reveal,
            _ => false,
        }
    }

    pub fn view(&self, now: NaiveDateTime) -> ChallengeView {
        let state = self.state();
        let sequence_visible = self.sequence_visible(now);
        let (prompt, options) = if state == GateState::NotStarted {
            (COVER_PROMPT.to_string(), Vec::new())
        } else {
            (
                self.challenge.prompt(sequence_visible),
                self.challenge
                    .options()
                    .iter()
                    .map(|option| (*option).to_string())
                    .collect(),
            )
        };

        ChallengeView {
            kind: self.challenge.kind(),
            state,
            prompt,
            options,
            sequence_visible,
            answer: self.answer.clone(),
            solved: state == GateState::Solved,
            reminder: self.reminder.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DismissalGate, GateAction, GateState};
    use crate::puzzle::bank::{Color, LOGIC_QUESTIONS};
    use crate::puzzle::challenge::Challenge;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(hms: (u32, u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(hms.0, hms.1, hms.2)
            .unwrap()
    }

    fn gate(challenge: Challenge) -> DismissalGate {
        DismissalGate::new(challenge, Duration::seconds(5))
    }

    #[test]
    fn answers_are_ignored_before_start() {
        let mut gate = gate(Challenge::Arithmetic);
        assert!(!gate.set_answer("7"));
        assert_eq!(gate.state(), GateState::NotStarted);
        assert!(!gate.authorize(GateAction::Stop));
    }

    #[test]
    fn solved_tracks_every_answer_change() {
        let mut gate = gate(Challenge::Arithmetic);
        gate.start(at((7, 30, 1)));
        assert_eq!(gate.state(), GateState::InProgress);

        gate.set_answer("7");
        assert_eq!(gate.state(), GateState::Solved);
        assert!(gate.authorize(GateAction::Snooze));

        gate.set_answer("8");
        assert_eq!(gate.state(), GateState::InProgress);
        assert!(!gate.authorize(GateAction::Stop));
    }

    #[test]
    fn cover_hides_challenge_content() {
        let gate = gate(Challenge::Retype {
            text: "abcdefghij".to_string(),
        });
        let view = gate.view(at((7, 30, 0)));
        assert_eq!(view.state, GateState::NotStarted);
        assert!(!view.prompt.contains("abcdefghij"));
    }

    #[test]
    fn memory_sequence_shows_only_inside_reveal_window() {
        let mut gate = gate(Challenge::Memory {
            sequence: vec![Color::Red, Color::Blue, Color::Green, Color::Purple],
        });
        assert!(!gate.sequence_visible(at((7, 30, 0))));

        gate.start(at((7, 30, 10)));
        let during = gate.view(at((7, 30, 14)));
        assert!(during.sequence_visible);
        assert!(during.prompt.contains("Red - Blue - Green - Purple"));

        let after = gate.view(at((7, 30, 15)));
        assert!(!after.sequence_visible);
        assert!(!after.prompt.contains("Red"));
    }

    #[test]
    fn select_option_only_applies_to_logic_options() {
        let mut logic = gate(Challenge::Logic {
            question: &LOGIC_QUESTIONS[2],
        });
        assert!(!logic.select_option("231"));
        logic.start(at((6, 0, 0)));
        assert!(!logic.select_option("999"));
        assert!(logic.select_option("231"));
        assert_eq!(logic.state(), GateState::Solved);
        assert_eq!(logic.view(at((6, 0, 1))).options.len(), 4);

        let mut arithmetic = gate(Challenge::Arithmetic);
        arithmetic.start(at((6, 0, 0)));
        assert!(!arithmetic.select_option("7"));
    }

    #[test]
    fn reset_returns_to_cover_with_empty_answer() {
        let mut gate = gate(Challenge::Arithmetic);
        gate.start(at((7, 0, 0)));
        gate.set_answer("7");
        gate.reset(Challenge::Retype {
            text: "zzzzzzzzzz".to_string(),
        });
        assert_eq!(gate.state(), GateState::NotStarted);
        assert_eq!(gate.answer(), "");
    }

    #[test]
    fn reminder_shows_on_cover_and_survives_reset() {
        let mut gate = gate(Challenge::Arithmetic);
        assert_eq!(gate.view(at((6, 0, 0))).reminder, None);

        gate.set_reminder(Some("  take vitamins ".to_string()));
        let cover = gate.view(at((6, 0, 0)));
        assert_eq!(cover.state, GateState::NotStarted);
        assert_eq!(cover.reminder.as_deref(), Some("take vitamins"));

        gate.start(at((6, 0, 1)));
        gate.reset(Challenge::Arithmetic);
        assert_eq!(gate.reminder(), Some("take vitamins"));

        gate.set_reminder(Some("   ".to_string()));
        assert_eq!(gate.view(at((6, 0, 2))).reminder, None);
    }
}
