use crate::models::Flashcard;
use crate::scheduler::{TimerId, Timers};
use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

pub const HIDE_DELAY: Duration = Duration::from_secs(2);
pub const INCORRECT_DELAY: Duration = Duration::from_millis(1500);
pub const CLOCK_PERIOD: Duration = Duration::from_secs(1);
pub const GRID_COLUMNS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCard {
    pub id: usize,
    pub text: String,
    pub pair_id: usize,
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchTimer {
    Clock,
    Hide { pair_id: usize },
    ClearIncorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Ignored,
    FirstPick,
    Matched { pair_id: usize },
    Mismatched,
}

#[derive(Debug)]
pub struct MatchMode {
    source: Vec<Flashcard>,
    cards: Vec<MatchCard>,
    selected: Vec<usize>,
    matched: BTreeSet<usize>,
    incorrect: Vec<usize>,
    elapsed_seconds: u64,
    complete: bool,
    cursor: usize,
    clock: Option<TimerId>,
    incorrect_timer: Option<TimerId>,
    timers: Timers<MatchTimer>,
    rng: StdRng,
}

impl MatchMode {
    pub fn new(source: Vec<Flashcard>, now: Instant) -> Self {
        Self::with_rng(source, StdRng::from_entropy(), now)
    }

    pub fn with_rng(source: Vec<Flashcard>, rng: StdRng, now: Instant) -> Self {
        let mut mode = Self {
            source,
            cards: Vec::new(),
            selected: Vec::new(),
            matched: BTreeSet::new(),
            incorrect: Vec::new(),
            elapsed_seconds: 0,
            complete: false,
            cursor: 0,
            clock: None,
            incorrect_timer: None,
            timers: Timers::new(),
            rng,
        };
        mode.start_game(now);
        mode
    }

    /// Deals a fresh shuffled board and resets every piece of round state.
    pub fn start_game(&mut self, now: Instant) {
        self.timers.clear();
        self.clock = None;
        self.incorrect_timer = None;

        self.cards = self
            .source
            .iter()
            .enumerate()
            .flat_map(|(index, pair)| {
                [
                    MatchCard {
                        id: index * 2,
                        text: pair.question.clone(),
                        pair_id: index,
                        hidden: false,
                    },
                    MatchCard {
                        id: index * 2 + 1,
                        text: pair.answer.clone(),
                        pair_id: index,
                        hidden: false,
                    },
                ]
            })
            .collect();
        self.cards.shuffle(&mut self.rng);

        self.selected.clear();
        self.matched.clear();
        self.incorrect.clear();
        self.elapsed_seconds = 0;
        self.complete = false;
        self.cursor = 0;

        // An empty board has nothing to time.
        if !self.cards.is_empty() {
            self.clock = Some(self.timers.schedule_every(now, CLOCK_PERIOD, MatchTimer::Clock));
        }
    }

    pub fn cards(&self) -> &[MatchCard] {
        &self.cards
    }

    pub fn pair_count(&self) -> usize {
        self.source.len()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_selected(&self, id: usize) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_matched(&self, pair_id: usize) -> bool {
        self.matched.contains(&pair_id)
    }

    pub fn is_incorrect(&self, id: usize) -> bool {
        self.incorrect.contains(&id)
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn select(&mut self, id: usize, now: Instant) -> SelectOutcome {
        let Some(card) = self.card(id) else {
            return SelectOutcome::Ignored;
        };
        if card.hidden || self.matched.contains(&card.pair_id) || self.selected.contains(&id) {
            return SelectOutcome::Ignored;
        }

        self.selected.push(id);
        if self.selected.len() < 2 {
            return SelectOutcome::FirstPick;
        }

        let first = self.selected[0];
        let second = self.selected[1];
        self.selected.clear();

        let first_pair = self.card(first).map(|c| c.pair_id);
        let second_pair = self.card(second).map(|c| c.pair_id);

        match (first_pair, second_pair) {
            (Some(a), Some(b)) if a == b => {
                self.matched.insert(a);
                self.timers
                    .schedule_once(now, HIDE_DELAY, MatchTimer::Hide { pair_id: a });
                SelectOutcome::Matched { pair_id: a }
            }
            _ => {
                self.incorrect = vec![first, second];
                if let Some(previous) = self.incorrect_timer.take() {
                    self.timers.cancel(previous);
                }
                self.incorrect_timer = Some(self.timers.schedule_once(
                    now,
                    INCORRECT_DELAY,
                    MatchTimer::ClearIncorrect,
                ));
                SelectOutcome::Mismatched
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn on_tick(&mut self, now: Instant) {
        for timer in self.timers.fire_due(now) {
            match timer {
                MatchTimer::Clock => {
                    if !self.complete {
                        self.elapsed_seconds += 1;
                    }
                }
                MatchTimer::Hide { pair_id } => {
                    for card in self.cards.iter_mut().filter(|c| c.pair_id == pair_id) {
                        card.hidden = true;
                    }
                    self.check_completion();
                }
                MatchTimer::ClearIncorrect => {
                    self.incorrect.clear();
                    self.incorrect_timer = None;
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if self.complete {
            if key.code == KeyCode::Char('r') {
                self.start_game(now);
                return true;
            }
            return false;
        }

        let len = self.cards.len();
        match key.code {
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                true
            }
            KeyCode::Right => {
                if self.cursor + 1 < len {
                    self.cursor += 1;
                }
                true
            }
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(GRID_COLUMNS);
                true
            }
            KeyCode::Down => {
                if self.cursor + GRID_COLUMNS < len {
                    self.cursor += GRID_COLUMNS;
                }
                true
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.cards.get(self.cursor).map(|c| c.id) {
                    self.select(id, now);
                }
                true
            }
            _ => false,
        }
    }

    fn card(&self, id: usize) -> Option<&MatchCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    fn check_completion(&mut self) {
        if self.complete || self.source.is_empty() {
            return;
        }
        if self.matched.len() == self.source.len() {
            self.complete = true;
            if let Some(clock) = self.clock.take() {
                self.timers.cancel(clock);
            }
        }
    }
}
