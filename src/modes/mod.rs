pub mod flashcards;
pub mod match_game;
pub mod quiz;

pub use flashcards::{CardFace, FlashcardMode};
pub use match_game::{MatchCard, MatchMode, SelectOutcome};
pub use quiz::{OptionMark, QuizMode, QuizPhase};

use crate::models::{Items, LearningMode};
use crossterm::event::KeyEvent;
use std::time::Instant;

/// The one mounted practice view. Replacing or dropping it drops its timers.
#[derive(Debug)]
pub enum ModeView {
    Flashcards(FlashcardMode),
    Quiz(QuizMode),
    Match(MatchMode),
}

impl ModeView {
    /// Builds the view for `mode`. Items of the other schema mount an empty view.
    pub fn mount(mode: LearningMode, items: &Items, now: Instant) -> Self {
        match (mode, items) {
            (LearningMode::Flashcards, Items::Flashcards(cards)) => {
                ModeView::Flashcards(FlashcardMode::new(cards.clone()))
            }
            (LearningMode::Match, Items::Flashcards(cards)) => {
                ModeView::Match(MatchMode::new(cards.clone(), now))
            }
            (LearningMode::Quiz, Items::Quiz(questions)) => {
                ModeView::Quiz(QuizMode::new(questions.clone(), now))
            }
            (LearningMode::Flashcards, Items::Quiz(_)) => {
                ModeView::Flashcards(FlashcardMode::new(Vec::new()))
            }
            (LearningMode::Match, Items::Quiz(_)) => ModeView::Match(MatchMode::new(Vec::new(), now)),
            (LearningMode::Quiz, Items::Flashcards(_)) => ModeView::Quiz(QuizMode::new(Vec::new(), now)),
        }
    }

    pub fn mode(&self) -> LearningMode {
        match self {
            ModeView::Flashcards(_) => LearningMode::Flashcards,
            ModeView::Quiz(_) => LearningMode::Quiz,
            ModeView::Match(_) => LearningMode::Match,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        match self {
            ModeView::Flashcards(view) => view.handle_key(key, now),
            ModeView::Quiz(view) => view.handle_key(key, now),
            ModeView::Match(view) => view.handle_key(key, now),
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        match self {
            ModeView::Flashcards(view) => view.on_tick(now),
            ModeView::Quiz(view) => view.on_tick(now),
            ModeView::Match(view) => view.on_tick(now),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self {
            ModeView::Flashcards(view) => view.next_deadline(),
            ModeView::Quiz(view) => view.next_deadline(),
            ModeView::Match(view) => view.next_deadline(),
        }
    }
}
