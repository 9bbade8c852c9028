//! Fixed content banks for puzzle generation.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Words offered by the unscramble challenge.
pub const WORDS: &[&str] = &[
    "cat", "plant", "alarm", "react", "clock", "night", "smart", "brain",
];

/// Alphabet for the retype challenge.
pub const RETYPE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Purple,
    Orange,
    Gray,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Self::Red,
        Self::Blue,
        Self::Green,
        Self::Purple,
        Self::Orange,
        Self::Gray,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::Purple => "Purple",
            Self::Orange => "Orange",
            Self::Gray => "Gray",
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One multiple-choice question with its designated answer.
#[derive(Debug, PartialEq, Eq)]
pub struct LogicQuestion {
    pub question: &'static str,
    pub options: [&'static str; 4],
    pub answer: &'static str,
}

pub static LOGIC_QUESTIONS: [LogicQuestion; 3] = [
    LogicQuestion {
        question: "Which is the largest number?",
        options: ["71213", "71312", "72563", "72932"],
        answer: "72932",
    },
    LogicQuestion {
        question: "Which one does not belong?",
        options: ["Dog", "Cat", "Car", "Rabbit"],
        answer: "Car",
    },
    LogicQuestion {
        question: "Which number is odd?",
        options: ["231", "646", "0", "512"],
        answer: "231",
    },
];

#[cfg(test)]
mod tests {
    use super::LOGIC_QUESTIONS;

    #[test]
    fn every_answer_is_one_of_its_options() {
        for question in &LOGIC_QUESTIONS {
            assert!(question.options.contains(&question.answer), "{}", question.question);
        }
    }
}
