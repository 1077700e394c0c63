use crate::models::Flashcard;
use crate::scheduler::{TimerId, Timers};
use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::{Duration, Instant};

pub const AUTOPLAY_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFace {
    Question,
    Answer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlashcardTimer {
    Autoplay,
}

#[derive(Debug)]
pub struct FlashcardMode {
    source: Vec<Flashcard>,
    cards: Vec<Flashcard>,
    current_index: usize,
    face: CardFace,
    autoplay: bool,
    autoplay_timer: Option<TimerId>,
    timers: Timers<FlashcardTimer>,
    rng: StdRng,
}

impl FlashcardMode {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self::with_rng(cards, StdRng::from_entropy())
    }

    /// The deck is shuffled once on construction.
    pub fn with_rng(cards: Vec<Flashcard>, rng: StdRng) -> Self {
        let mut mode = Self {
            cards: cards.clone(),
            source: cards,
            current_index: 0,
            face: CardFace::Question,
            autoplay: false,
            autoplay_timer: None,
            timers: Timers::new(),
            rng,
        };
        mode.cards.shuffle(&mut mode.rng);
        mode
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_card(&self) -> Option<&Flashcard> {
        self.cards.get(self.current_index)
    }

    pub fn face(&self) -> CardFace {
        self.face
    }

    pub fn is_autoplaying(&self) -> bool {
        self.autoplay
    }

    pub fn at_first(&self) -> bool {
        self.current_index == 0
    }

    pub fn at_last(&self) -> bool {
        self.current_index + 1 >= self.cards.len()
    }

    pub fn toggle_reveal(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        self.face = match self.face {
            CardFace::Question => CardFace::Answer,
            CardFace::Answer => CardFace::Question,
        };
    }

    pub fn next(&mut self, now: Instant) -> bool {
        if self.cards.is_empty() || self.at_last() {
            return false;
        }
        self.move_to(self.current_index + 1, now);
        true
    }

    pub fn previous(&mut self, now: Instant) -> bool {
        if self.cards.is_empty() || self.at_first() {
            return false;
        }
        self.move_to(self.current_index - 1, now);
        true
    }

    /// Reshuffles the whole deck from the original item set and starts over.
    pub fn shuffle(&mut self, now: Instant) {
        self.cards = self.source.clone();
        self.cards.shuffle(&mut self.rng);
        self.move_to(0, now);
    }

    /// Autoplay stays enabled at the last card; ticks there are no-ops until
    /// the user steps back.
    pub fn toggle_autoplay(&mut self, now: Instant) {
        self.autoplay = !self.autoplay;
        if self.autoplay {
            self.arm_autoplay(now);
        } else if let Some(id) = self.autoplay_timer.take() {
            self.timers.cancel(id);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn on_tick(&mut self, now: Instant) {
        for timer in self.timers.fire_due(now) {
            match timer {
                FlashcardTimer::Autoplay => {
                    if self.cards.is_empty() || self.at_last() {
                        continue;
                    }
                    self.current_index += 1;
                    self.face = CardFace::Question;
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        match key.code {
            KeyCode::Right => {
                self.next(now);
                true
            }
            KeyCode::Left => {
                self.previous(now);
                true
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.toggle_reveal();
                true
            }
            KeyCode::Char('p') => {
                self.toggle_autoplay(now);
                true
            }
            KeyCode::Char('s') => {
                self.shuffle(now);
                true
            }
            _ => false,
        }
    }

    fn move_to(&mut self, index: usize, now: Instant) {
        self.current_index = index;
        self.face = CardFace::Question;
        // The autoplay interval restarts whenever the user moves.
        if self.autoplay {
            self.arm_autoplay(now);
        }
    }

    fn arm_autoplay(&mut self, now: Instant) {
        if let Some(id) = self.autoplay_timer.take() {
            self.timers.cancel(id);
        }
        self.autoplay_timer = Some(self.timers.schedule_every(
            now,
            AUTOPLAY_INTERVAL,
            FlashcardTimer::Autoplay,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn deck(n: usize) -> Vec<Flashcard> {
        (0..n)
            .map(|i| Flashcard {
                question: format!("Q{}", i),
                answer: format!("A{}", i),
            })
            .collect()
    }

    fn mode(n: usize) -> FlashcardMode {
        FlashcardMode::with_rng(deck(n), StdRng::seed_from_u64(7))
    }

    fn sorted(cards: &[Flashcard]) -> Vec<String> {
        let mut questions: Vec<String> = cards.iter().map(|c| c.question.clone()).collect();
        questions.sort();
        questions
    }

    #[test]
    fn test_initial_shuffle_keeps_every_card() {
        let mode = mode(8);
        assert_eq!(sorted(mode.cards()), sorted(&deck(8)));
        assert_eq!(mode.current_index(), 0);
        assert_eq!(mode.face(), CardFace::Question);
    }

    #[test]
    fn test_shuffle_is_a_permutation_and_resets_position() {
        let now = Instant::now();
        for n in [0, 1, 2, 5, 8, 13] {
            let mut mode = mode(n);
            mode.next(now);
            mode.toggle_reveal();
            mode.shuffle(now);
            assert_eq!(sorted(mode.cards()), sorted(&deck(n)));
            assert_eq!(mode.current_index(), 0);
            assert_eq!(mode.face(), CardFace::Question);
        }
    }

    #[test]
    fn test_navigation_is_bounded() {
        let now = Instant::now();
        let mut mode = mode(3);
        assert!(!mode.previous(now));
        assert_eq!(mode.current_index(), 0);

        assert!(mode.next(now));
        assert!(mode.next(now));
        assert!(!mode.next(now));
        assert_eq!(mode.current_index(), 2);

        assert!(mode.previous(now));
        assert_eq!(mode.current_index(), 1);
    }

    #[test]
    fn test_moving_resets_to_question_face() {
        let now = Instant::now();
        let mut mode = mode(3);
        mode.toggle_reveal();
        assert_eq!(mode.face(), CardFace::Answer);
        mode.next(now);
        assert_eq!(mode.face(), CardFace::Question);
    }

    #[test]
    fn test_toggle_reveal_keeps_index() {
        let mut mode = mode(3);
        mode.toggle_reveal();
        mode.toggle_reveal();
        assert_eq!(mode.face(), CardFace::Question);
        assert_eq!(mode.current_index(), 0);
    }

    #[test]
    fn test_empty_deck_operations_are_noops() {
        let now = Instant::now();
        let mut mode = mode(0);
        assert!(!mode.next(now));
        assert!(!mode.previous(now));
        mode.toggle_reveal();
        mode.shuffle(now);
        assert!(mode.current_card().is_none());
        assert_eq!(mode.face(), CardFace::Question);
    }

    #[test]
    fn test_autoplay_advances_every_interval() {
        let start = Instant::now();
        let mut mode = mode(4);
        mode.toggle_autoplay(start);

        mode.on_tick(start + Duration::from_millis(2999));
        assert_eq!(mode.current_index(), 0);
        mode.on_tick(start + AUTOPLAY_INTERVAL);
        assert_eq!(mode.current_index(), 1);
        mode.on_tick(start + AUTOPLAY_INTERVAL * 2);
        assert_eq!(mode.current_index(), 2);
    }

    #[test]
    fn test_autoplay_stays_enabled_at_last_card_and_resumes() {
        let start = Instant::now();
        let mut mode = mode(2);
        mode.toggle_autoplay(start);
        mode.on_tick(start + AUTOPLAY_INTERVAL);
        assert_eq!(mode.current_index(), 1);

        mode.on_tick(start + AUTOPLAY_INTERVAL * 3);
        assert_eq!(mode.current_index(), 1);
        assert!(mode.is_autoplaying());

        let back = start + AUTOPLAY_INTERVAL * 3;
        mode.previous(back);
        assert_eq!(mode.current_index(), 0);
        mode.on_tick(back + AUTOPLAY_INTERVAL);
        assert_eq!(mode.current_index(), 1);
    }

    #[test]
    fn test_disabling_autoplay_cancels_timer() {
        let start = Instant::now();
        let mut mode = mode(4);
        mode.toggle_autoplay(start);
        mode.toggle_autoplay(start);
        assert_eq!(mode.next_deadline(), None);
        mode.on_tick(start + AUTOPLAY_INTERVAL * 5);
        assert_eq!(mode.current_index(), 0);
    }

    #[test]
    fn test_manual_move_restarts_autoplay_interval() {
        let start = Instant::now();
        let mut mode = mode(5);
        mode.toggle_autoplay(start);

        let moved_at = start + Duration::from_secs(2);
        mode.next(moved_at);
        mode.on_tick(start + AUTOPLAY_INTERVAL);
        assert_eq!(mode.current_index(), 1);
        mode.on_tick(moved_at + AUTOPLAY_INTERVAL);
        assert_eq!(mode.current_index(), 2);
    }

    #[test]
    fn test_shuffle_mid_autoplay() {
        let start = Instant::now();
        let mut mode = mode(5);
        mode.toggle_autoplay(start);
        mode.on_tick(start + AUTOPLAY_INTERVAL);
        mode.shuffle(start + AUTOPLAY_INTERVAL);
        assert_eq!(mode.current_index(), 0);
        assert!(mode.is_autoplaying());
    }

    #[test]
    fn test_arrow_keys_navigate() {
        let now = Instant::now();
        let mut mode = mode(3);
        assert!(mode.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE), now));
        assert_eq!(mode.current_index(), 1);
        assert!(mode.handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE), now));
        assert_eq!(mode.current_index(), 0);
        assert!(!mode.handle_key(KeyEvent::new(KeyCode::Char('z'), KeyModifiers::NONE), now));
    }
}
