use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of items the generator is asked for. Only drives the progress display.
pub const TARGET_ITEM_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerLabel {
    A,
    B,
    C,
    D,
}

impl AnswerLabel {
    pub const ALL: [AnswerLabel; 4] = [AnswerLabel::A, AnswerLabel::B, AnswerLabel::C, AnswerLabel::D];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            AnswerLabel::A => 0,
            AnswerLabel::B => 1,
            AnswerLabel::C => 2,
            AnswerLabel::D => 3,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(AnswerLabel::A),
            'B' => Some(AnswerLabel::B),
            'C' => Some(AnswerLabel::C),
            'D' => Some(AnswerLabel::D),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerLabel::A => "A",
            AnswerLabel::B => "B",
            AnswerLabel::C => "C",
            AnswerLabel::D => "D",
        }
    }
}

impl fmt::Display for AnswerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multiple-choice question. `answer` points at `options` through the fixed A..D mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuizQuestion {
    pub question: String,
    pub options: [String; 4],
    pub answer: AnswerLabel,
}

impl QuizQuestion {
    pub fn correct_option(&self) -> &str {
        &self.options[self.answer.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LearningMode {
    #[default]
    Flashcards,
    Quiz,
    Match,
}

impl LearningMode {
    pub const ALL: [LearningMode; 3] = [
        LearningMode::Flashcards,
        LearningMode::Quiz,
        LearningMode::Match,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LearningMode::Flashcards => "Flashcards",
            LearningMode::Quiz => "Quiz",
            LearningMode::Match => "Match",
        }
    }

    /// Match reuses the flashcard-shaped generator.
    pub fn schema(self) -> TargetSchema {
        match self {
            LearningMode::Quiz => TargetSchema::Quiz,
            LearningMode::Flashcards | LearningMode::Match => TargetSchema::Flashcards,
        }
    }

    pub fn position(self) -> usize {
        match self {
            LearningMode::Flashcards => 0,
            LearningMode::Quiz => 1,
            LearningMode::Match => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSchema {
    Flashcards,
    Quiz,
}

impl TargetSchema {
    pub fn noun(self) -> &'static str {
        match self {
            TargetSchema::Flashcards => "flashcards",
            TargetSchema::Quiz => "quiz",
        }
    }
}

/// Finalized output of one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "schema", content = "items", rename_all = "lowercase")]
pub enum Items {
    Flashcards(Vec<Flashcard>),
    Quiz(Vec<QuizQuestion>),
}

impl Items {
    pub fn empty(schema: TargetSchema) -> Self {
        match schema {
            TargetSchema::Flashcards => Items::Flashcards(Vec::new()),
            TargetSchema::Quiz => Items::Quiz(Vec::new()),
        }
    }

    pub fn schema(&self) -> TargetSchema {
        match self {
            Items::Flashcards(_) => TargetSchema::Flashcards,
            Items::Quiz(_) => TargetSchema::Quiz,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Items::Flashcards(cards) => cards.len(),
            Items::Quiz(questions) => questions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uploaded study material. Opaque to everything but the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Learning,
}
