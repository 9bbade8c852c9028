//! Challenge generation and answer checking.
//!
//! # Invariants
//! - Each kind carries only the material it needs to render and verify.
//! - Answer checks are pure functions of the challenge and the answer text.

use crate::puzzle::bank::{Color, LogicQuestion, LOGIC_QUESTIONS, RETYPE_ALPHABET, WORDS};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const ARITHMETIC_PROMPT: &str = "What is 3 + 4?";
const ARITHMETIC_SOLUTION: &str = "7";
const SCRAMBLE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleKind {
    Arithmetic,
    Unscramble,
    Logic,
    Memory,
    Retype,
}

impl PuzzleKind {
    pub const ALL: [PuzzleKind; 5] = [
        Self::Arithmetic,
        Self::Unscramble,
        Self::Logic,
        Self::Memory,
        Self::Retype,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Arithmetic => "arithmetic",
            Self::Unscramble => "unscramble",
            Self::Logic => "logic",
            Self::Memory => "memory",
            Self::Retype => "retype",
        }
    }
}

/// Size parameters for randomized kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeSettings {
    pub color_sequence_len: usize,
    pub retype_len: usize,
}

impl Default for ChallengeSettings {
    fn default() -> Self {
        Self {
            color_sequence_len: 4,
            retype_len: 10,
        }
    }
}

/// One generated dismissal challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    /// Fixed sum; typed answer compared after trimming.
    Arithmetic,
    Unscramble {
        word: &'static str,
        scrambled: String,
    },
    /// Answered by selecting one of the question's options.
    Logic { question: &'static LogicQuestion },
    /// Shown briefly after start, then typed back from memory.
    Memory { sequence: Vec<Color> },
    Retype { text: String },
}

impl Challenge {
    /// Picks a kind uniformly from `kinds` and generates it.
    ///
    /// Falls back to every kind when `kinds` is empty.
    pub fn random<R: Rng + ?Sized>(
        kinds: &[PuzzleKind],
        settings: ChallengeSettings,
        rng: &mut R,
    ) -> Self {
        let pool: &[PuzzleKind] = if kinds.is_empty() {
            &PuzzleKind::ALL
        } else {
            kinds
        };
        let kind = pool.choose(rng).copied().unwrap_or(PuzzleKind::Arithmetic);
        Self::generate(kind, settings, rng)
    }

    pub fn generate<R: Rng + ?Sized>(
        kind: PuzzleKind,
        settings: ChallengeSettings,
        rng: &mut R,
    ) -> Self {
        match kind {
            PuzzleKind::Arithmetic => Self::Arithmetic,
            PuzzleKind::Unscramble => {
                let word = WORDS.choose(rng).copied().unwrap_or("alarm");
                Self::Unscramble {
                    word,
                    scrambled: scramble(word, rng),
                }
            }
            PuzzleKind::Logic => Self::Logic {
                question: LOGIC_QUESTIONS.choose(rng).unwrap_or(&LOGIC_QUESTIONS[0]),
            },
            PuzzleKind::Memory => Self::Memory {
                sequence: (0..settings.color_sequence_len)
                    .map(|_| Color::ALL[rng.gen_range(0..Color::ALL.len())])
                    .collect(),
            },
            PuzzleKind::Retype => Self::Retype {
                text: (0..settings.retype_len)
                    .map(|_| char::from(RETYPE_ALPHABET[rng.gen_range(0..RETYPE_ALPHABET.len())]))
                    .collect(),
            },
        }
    }

    pub fn kind(&self) -> PuzzleKind {
        match self {
            Self::Arithmetic => PuzzleKind::Arithmetic,
            Self::Unscramble { .. } => PuzzleKind::Unscramble,
            Self::Logic { .. } => PuzzleKind::Logic,
            Self::Memory { .. } => PuzzleKind::Memory,
            Self::Retype { .. } => PuzzleKind::Retype,
        }
    }

    /// Canonical answer, before normalization.
    pub fn solution(&self) -> String {
        match self {
            Self::Arithmetic => ARITHMETIC_SOLUTION.to_string(),
            Self::Unscramble { word, .. } => (*word).to_string(),
            Self::Logic { question } => question.answer.to_string(),
            Self::Memory { sequence } => sequence.iter().map(|color| color.name()).collect(),
            Self::Retype { text } => text.clone(),
        }
    }

    pub fn is_solved_by(&self, answer: &str) -> bool {
        match self {
            Self::Arithmetic => answer.trim() == ARITHMETIC_SOLUTION,
            Self::Memory { .. } => {
                strip_whitespace(&answer.to_lowercase()) == self.solution().to_lowercase()
            }
            Self::Unscramble { .. } | Self::Logic { .. } | Self::Retype { .. } => {
                answer.trim().to_lowercase() == self.solution().to_lowercase()
            }
        }
    }

    /// Prompt text once the challenge is revealed.
    ///
    /// `sequence_visible` only affects memory challenges.
    pub fn prompt(&self, sequence_visible: bool) -> String {
        match self {
            Self::Arithmetic => ARITHMETIC_PROMPT.to_string(),
            Self::Unscramble { scrambled, .. } => {
                format!("Unscramble this: {}", scrambled.to_uppercase())
            }
            Self::Logic { question } => question.question.to_string(),
            Self::Memory { sequence } if sequence_visible => {
                let names: Vec<&str> = sequence.iter().map(|color| color.name()).collect();
                format!("Memorize: {}", names.join(" - "))
            }
            Self::Memory { .. } => "Enter the color sequence (no spaces)".to_string(),
            Self::Retype { text } => format!("Type this word exactly: {text}"),
        }
    }

    /// Selectable options; empty for free-text kinds.
    pub fn options(&self) -> &[&'static str] {
        match self {
            Self::Logic { question } => &question.options[..],
            _ => &[],
        }
    }
}

fn scramble<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let mut chars: Vec<char> = word.chars().collect();
    for _ in 0..SCRAMBLE_ATTEMPTS {
        chars.shuffle(rng);
        let candidate: String = chars.iter().collect();
        if candidate != word {
            return candidate;
        }
    }
    chars.into_iter().collect()
}

fn strip_whitespace(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::{Challenge, ChallengeSettings, PuzzleKind};
    use crate::puzzle::bank::{Color, LOGIC_QUESTIONS, WORDS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn arithmetic_accepts_trimmed_seven_only() {
        let challenge = Challenge::Arithmetic;
        assert!(challenge.is_solved_by(" 7 "));
        assert!(!challenge.is_solved_by("07"));
        assert!(!challenge.is_solved_by("seven"));
        assert_eq!(challenge.prompt(false), "What is 3 + 4?");
    }

    #[test]
    fn unscramble_is_case_insensitive_and_hides_the_word() {
        let challenge =
            Challenge::generate(PuzzleKind::Unscramble, ChallengeSettings::default(), &mut rng());
        let Challenge::Unscramble { word, scrambled } = &challenge else {
            panic!("expected unscramble, got {challenge:?}");
        };
        assert!(WORDS.contains(word));
        assert_ne!(scrambled.as_str(), *word);

        let mut sorted_scrambled: Vec<char> = scrambled.chars().collect();
        let mut sorted_word: Vec<char> = word.chars().collect();
        sorted_scrambled.sort_unstable();
        sorted_word.sort_unstable();
        assert_eq!(sorted_scrambled, sorted_word);

        assert!(challenge.is_solved_by(&format!("  {} ", word.to_uppercase())));
        assert!(!challenge.is_solved_by(scrambled));
    }

    #[test]
    fn logic_exposes_options_and_checks_answer() {
        let challenge = Challenge::Logic {
            question: &LOGIC_QUESTIONS[1],
        };
        assert_eq!(challenge.options(), &["Dog", "Cat", "Car", "Rabbit"]);
        assert!(challenge.is_solved_by("car"));
        assert!(!challenge.is_solved_by("Dog"));
    }

    #[test]
    fn memory_ignores_case_and_all_whitespace() {
        let challenge = Challenge::Memory {
            sequence: vec![Color::Red, Color::Blue, Color::Green, Color::Gray],
        };
        assert_eq!(challenge.solution(), "RedBlueGreenGray");
        assert!(challenge.is_solved_by("red blue\tgreen gray"));
        assert!(challenge.is_solved_by("REDBLUEGREENGRAY"));
        assert!(!challenge.is_solved_by("red blue green"));
        assert_eq!(challenge.prompt(true), "Memorize: Red - Blue - Green - Gray");
        assert!(!challenge.prompt(false).contains("Red"));
    }

    #[test]
    fn memory_and_retype_honor_configured_lengths() {
        let settings = ChallengeSettings {
            color_sequence_len: 6,
            retype_len: 12,
        };
        let mut rng = rng();
        match Challenge::generate(PuzzleKind::Memory, settings, &mut rng) {
            Challenge::Memory { sequence } => assert_eq!(sequence.len(), 6),
            other => panic!("expected memory, got {other:?}"),
        }
        match Challenge::generate(PuzzleKind::Retype, settings, &mut rng) {
            Challenge::Retype { text } => {
                assert_eq!(text.len(), 12);
                assert!(text.chars().all(|c| c.is_ascii_lowercase()));
            }
            other => panic!("expected retype, got {other:?}"),
        }
    }

    #[test]
    fn retype_compares_case_insensitively() {
        let challenge = Challenge::Retype {
            text: "qwertyuiop".to_string(),
        };
        assert!(challenge.is_solved_by("QWERTYuiop"));
        assert!(!challenge.is_solved_by("qwertyuio"));
    }

    #[test]
    fn random_covers_every_kind_and_respects_pool() {
        let mut rng = rng();
        let seen: HashSet<PuzzleKind> = (0..200)
            .map(|_| Challenge::random(&PuzzleKind::ALL, ChallengeSettings::default(), &mut rng).kind())
            .collect();
        assert_eq!(seen.len(), PuzzleKind::ALL.len());

        for _ in 0..20 {
            let challenge =
                Challenge::random(&[PuzzleKind::Retype], ChallengeSettings::default(), &mut rng);
            assert_eq!(challenge.kind(), PuzzleKind::Retype);
        }
    }
}
