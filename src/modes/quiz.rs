use crate::models::{AnswerLabel, QuizQuestion};
use crate::scheduler::Timers;
use crossterm::event::{KeyCode, KeyEvent};
use std::time::{Duration, Instant};

/// Gap between closing the submit dialog and grading.
pub const FINALIZE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Answering,
    /// Skipped questions remain; waiting for "review skipped" or "submit anyway".
    ReviewPrompt { skipped: usize },
    Finalizing,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Neutral,
    Selected,
    Correct,
    IncorrectSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuizTimer {
    Finalize,
}

#[derive(Debug)]
pub struct QuizMode {
    questions: Vec<QuizQuestion>,
    answers: Vec<Option<AnswerLabel>>,
    focus: usize,
    phase: QuizPhase,
    score: usize,
    started_at: Instant,
    elapsed_seconds: u64,
    timers: Timers<QuizTimer>,
}

impl QuizMode {
    pub fn new(questions: Vec<QuizQuestion>, now: Instant) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            questions,
            answers,
            focus: 0,
            phase: QuizPhase::Answering,
            score: 0,
            started_at: now,
            elapsed_seconds: 0,
            timers: Timers::new(),
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn answer(&self, question_index: usize) -> Option<AnswerLabel> {
        self.answers.get(question_index).copied().flatten()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn is_submitted(&self) -> bool {
        self.phase == QuizPhase::Submitted
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn skipped_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_none()).count()
    }

    pub fn first_unanswered(&self) -> Option<usize> {
        self.answers.iter().position(|a| a.is_none())
    }

    /// Overwrites any earlier answer. Ignored once submission has been confirmed.
    pub fn select_answer(&mut self, question_index: usize, label: AnswerLabel) -> bool {
        if self.phase != QuizPhase::Answering {
            return false;
        }
        match self.answers.get_mut(question_index) {
            Some(slot) => {
                *slot = Some(label);
                true
            }
            None => false,
        }
    }

    /// Moves focus to the next unanswered question after `question_index`.
    pub fn skip(&mut self, question_index: usize) -> bool {
        if self.phase != QuizPhase::Answering {
            return false;
        }
        let next = self
            .answers
            .iter()
            .enumerate()
            .skip(question_index + 1)
            .find(|(_, answer)| answer.is_none())
            .map(|(index, _)| index);
        match next {
            Some(index) => {
                self.focus = index;
                true
            }
            None => false,
        }
    }

    pub fn submit(&mut self, now: Instant) {
        if self.phase != QuizPhase::Answering {
            return;
        }
        let skipped = self.skipped_count();
        if skipped > 0 {
            self.phase = QuizPhase::ReviewPrompt { skipped };
        } else {
            self.begin_finalize(now);
        }
    }

    pub fn review_skipped(&mut self) {
        if !matches!(self.phase, QuizPhase::ReviewPrompt { .. }) {
            return;
        }
        self.phase = QuizPhase::Answering;
        if let Some(index) = self.first_unanswered() {
            self.focus = index;
        }
    }

    pub fn submit_anyway(&mut self, now: Instant) {
        if matches!(self.phase, QuizPhase::ReviewPrompt { .. }) {
            self.begin_finalize(now);
        }
    }

    pub fn option_mark(&self, question_index: usize, option_index: usize) -> OptionMark {
        let Some(question) = self.questions.get(question_index) else {
            return OptionMark::Neutral;
        };
        let Some(label) = AnswerLabel::from_index(option_index) else {
            return OptionMark::Neutral;
        };
        let selected = self.answer(question_index) == Some(label);

        if !self.is_submitted() {
            return if selected {
                OptionMark::Selected
            } else {
                OptionMark::Neutral
            };
        }
        if label == question.answer {
            OptionMark::Correct
        } else if selected {
            OptionMark::IncorrectSelected
        } else {
            OptionMark::Neutral
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn on_tick(&mut self, now: Instant) {
        for timer in self.timers.fire_due(now) {
            match timer {
                QuizTimer::Finalize => self.finalize(now),
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if let QuizPhase::ReviewPrompt { .. } = self.phase {
            match key.code {
                KeyCode::Char('r') | KeyCode::Esc => self.review_skipped(),
                KeyCode::Char('y') => self.submit_anyway(now),
                _ => {}
            }
            return true;
        }

        match key.code {
            KeyCode::Up => {
                self.focus = self.focus.saturating_sub(1);
                true
            }
            KeyCode::Down => {
                if self.focus + 1 < self.questions.len() {
                    self.focus += 1;
                }
                true
            }
            KeyCode::Left => self.cycle_answer(false),
            KeyCode::Right => self.cycle_answer(true),
            KeyCode::Char(c @ ('a' | 'b' | 'c' | 'd' | 'A' | 'B' | 'C' | 'D')) => {
                if let Some(label) = AnswerLabel::from_char(c) {
                    self.select_answer(self.focus, label);
                }
                true
            }
            KeyCode::Char('k') => {
                self.skip(self.focus);
                true
            }
            KeyCode::Enter => {
                self.submit(now);
                true
            }
            _ => false,
        }
    }

    fn cycle_answer(&mut self, forward: bool) -> bool {
        if self.phase != QuizPhase::Answering || self.questions.is_empty() {
            return true;
        }
        let current = self.answer(self.focus).map(AnswerLabel::index);
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => 3,
            (Some(i), true) => (i + 1) % 4,
            (Some(i), false) => (i + 3) % 4,
        };
        if let Some(label) = AnswerLabel::from_index(next) {
            self.select_answer(self.focus, label);
        }
        true
    }

    fn begin_finalize(&mut self, now: Instant) {
        self.phase = QuizPhase::Finalizing;
        self.timers.schedule_once(now, FINALIZE_DELAY, QuizTimer::Finalize);
    }

    fn finalize(&mut self, now: Instant) {
        if self.is_submitted() {
            return;
        }
        self.score = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(question, answer)| **answer == Some(question.answer))
            .count();
        self.elapsed_seconds = now.saturating_duration_since(self.started_at).as_secs();
        self.phase = QuizPhase::Submitted;
        self.focus = 0;
    }
}
