use crate::ai_worker::GenerationLauncher;
use crate::config::DEFAULT_RESULTS_DIR;
use crate::db::{keys, load, save, SessionStore};
use crate::error::{GenerationError, MountError};
use crate::file_io;
use crate::generation::{Accepted, GenerationEvent, GenerationSession};
use crate::logger;
use crate::models::{Items, LearningMode, SourceDocument};
use crate::modes::ModeView;
use crate::scheduler::{TimerId, Timers};
use crossterm::event::{KeyCode, KeyEvent};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const NOTIFICATION_LIFETIME: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerAction {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

#[derive(Debug, Clone)]
enum ControllerTimer {
    ClearNotification,
}

#[derive(Debug)]
pub struct SessionState {
    pub active_mode: LearningMode,
    pub source_document: SourceDocument,
    pub items: Items,
    pub title: String,
}

pub struct ModeController {
    session: SessionState,
    generation: GenerationSession,
    view: Option<ModeView>,
    selector_open: bool,
    selector_index: usize,
    launcher: GenerationLauncher,
    store: Box<dyn SessionStore>,
    notification: Option<Notification>,
    notification_timer: Option<TimerId>,
    timers: Timers<ControllerTimer>,
    results_dir: PathBuf,
}

impl ModeController {
    /// Restores the session from `store` and starts generating for the last
    /// selected mode. Without a source document the learning view is unreachable.
    pub fn mount(
        store: Box<dyn SessionStore>,
        launcher: GenerationLauncher,
    ) -> Result<Self, MountError> {
        let source_document = match load::<SourceDocument>(store.as_ref(), keys::SOURCE_DOCUMENT) {
            Ok(Some(document)) => document,
            Ok(None) => {
                logger::log("No source document in session, redirecting to menu");
                return Err(MountError::MissingDocument);
            }
            Err(e) => {
                logger::log(&format!("Could not read source document: {}, redirecting to menu", e));
                return Err(MountError::MissingDocument);
            }
        };

        let title = read_or_log::<String>(store.as_ref(), keys::TITLE)
            .unwrap_or_else(|| source_document.name.clone());
        let active_mode =
            read_or_log::<LearningMode>(store.as_ref(), keys::SELECTED_MODE).unwrap_or_default();

        logger::log(&format!(
            "Mounting learning view for '{}' in {} mode",
            title,
            active_mode.label()
        ));

        let mut controller = Self {
            session: SessionState {
                active_mode,
                items: Items::empty(active_mode.schema()),
                source_document,
                title,
            },
            generation: GenerationSession::new(),
            view: None,
            selector_open: false,
            selector_index: active_mode.position(),
            launcher,
            store,
            notification: None,
            notification_timer: None,
            timers: Timers::new(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
        };
        controller.trigger_generation();
        Ok(controller)
    }

    pub fn with_results_dir(mut self, dir: PathBuf) -> Self {
        self.results_dir = dir;
        self
    }

    pub fn title(&self) -> &str {
        &self.session.title
    }

    pub fn active_mode(&self) -> LearningMode {
        self.session.active_mode
    }

    pub fn items(&self) -> &Items {
        &self.session.items
    }

    pub fn source_document(&self) -> &SourceDocument {
        &self.session.source_document
    }

    pub fn is_loading(&self) -> bool {
        self.generation.is_loading()
    }

    pub fn progress_percent(&self) -> u16 {
        self.generation.progress_percent()
    }

    pub fn status_line(&self) -> String {
        self.generation.status_line()
    }

    /// The mounted practice view. `None` while generation is in flight.
    pub fn view(&self) -> Option<&ModeView> {
        if self.is_loading() {
            None
        } else {
            self.view.as_ref()
        }
    }

    pub fn selector_open(&self) -> bool {
        self.selector_open
    }

    pub fn selector_index(&self) -> usize {
        self.selector_index
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub fn set_mode(&mut self, mode: LearningMode) {
        self.selector_open = false;
        self.selector_index = mode.position();

        if self.session.active_mode == mode && self.generation.loading_mode() == Some(mode) {
            return;
        }

        logger::log(&format!(
            "Switching mode {} -> {}",
            self.session.active_mode.label(),
            mode.label()
        ));
        self.session.active_mode = mode;
        self.persist(keys::SELECTED_MODE, &mode);
        self.clear_items();
        self.trigger_generation();
    }

    /// Discards the current items and asks for a fresh set for the active mode.
    pub fn regenerate(&mut self) {
        if self.generation.is_loading() {
            return;
        }
        logger::log(&format!(
            "Regenerating {}",
            self.session.active_mode.schema().noun()
        ));
        self.clear_items();
        self.trigger_generation();
    }

    pub fn on_generation_event(&mut self, event: GenerationEvent, now: Instant) {
        match self.generation.accept(event) {
            Accepted::Ignored => {}
            Accepted::Progress(count) => {
                logger::log(&format!("Generation progress: {} items", count));
            }
            Accepted::Completed(items) => {
                let mode = self.session.active_mode;
                if items.schema() != mode.schema() {
                    self.fail(
                        GenerationError::Validation(format!(
                            "expected {} items, got {}",
                            mode.schema().noun(),
                            items.schema().noun()
                        )),
                        now,
                    );
                    return;
                }
                logger::log(&format!("Generated {} items for {}", items.len(), mode.label()));
                self.persist(keys::ITEMS, &items);
                self.view = Some(ModeView::mount(mode, &items, now));
                self.session.items = items;
            }
            Accepted::Failed(error) => self.fail(error, now),
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        for timer in self.timers.fire_due(now) {
            match timer {
                ControllerTimer::ClearNotification => {
                    self.notification = None;
                    self.notification_timer = None;
                }
            }
        }
        if let Some(view) = &mut self.view {
            view.on_tick(now);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let view = self.view.as_ref().and_then(ModeView::next_deadline);
        match (self.timers.next_deadline(), view) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> ControllerAction {
        if self.selector_open {
            self.handle_selector_key(key);
            return ControllerAction::Continue;
        }

        if !self.is_loading()
            && let Some(view) = &mut self.view
            && view.handle_key(key, now)
        {
            return ControllerAction::Continue;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('x') => {
                logger::log("Leaving learning view");
                self.generation.cancel();
                return ControllerAction::Exit;
            }
            KeyCode::Char('m') => {
                self.selector_open = true;
                self.selector_index = self.session.active_mode.position();
            }
            KeyCode::Char(c @ '1'..='3') => {
                let index = c as usize - '1' as usize;
                if let Some(mode) = LearningMode::ALL.get(index) {
                    self.set_mode(*mode);
                }
            }
            KeyCode::Char('g') => self.regenerate(),
            KeyCode::Char('p') => self.print_results(now),
            _ => {}
        }
        ControllerAction::Continue
    }

    /// Exports submitted quiz results to the results directory.
    pub fn print_results(&mut self, now: Instant) {
        let Some(ModeView::Quiz(quiz)) = self.view() else {
            return;
        };
        if !quiz.is_submitted() {
            return;
        }

        match file_io::write_quiz_report(&self.results_dir, &self.session.title, quiz) {
            Ok(path) => {
                logger::log(&format!("Quiz report written to {}", path.display()));
                self.notify(
                    format!("Results saved to {}", path.display()),
                    NotificationKind::Info,
                    now,
                );
            }
            Err(e) => {
                logger::log(&format!("Could not write quiz report: {}", e));
                self.notify(
                    format!("Could not save results: {}", e),
                    NotificationKind::Error,
                    now,
                );
            }
        }
    }

    pub fn notify(&mut self, message: String, kind: NotificationKind, now: Instant) {
        if let Some(id) = self.notification_timer.take() {
            self.timers.cancel(id);
        }
        self.notification = Some(Notification { message, kind });
        self.notification_timer = Some(self.timers.schedule_once(
            now,
            NOTIFICATION_LIFETIME,
            ControllerTimer::ClearNotification,
        ));
    }

    fn handle_selector_key(&mut self, key: KeyEvent) {
        let count = LearningMode::ALL.len();
        match key.code {
            KeyCode::Up => self.selector_index = (self.selector_index + count - 1) % count,
            KeyCode::Down => self.selector_index = (self.selector_index + 1) % count,
            KeyCode::Enter => {
                if let Some(mode) = LearningMode::ALL.get(self.selector_index) {
                    self.set_mode(*mode);
                }
            }
            KeyCode::Esc | KeyCode::Char('m') => self.selector_open = false,
            _ => {}
        }
    }

    fn clear_items(&mut self) {
        self.view = None;
        self.session.items = Items::empty(self.session.active_mode.schema());
    }

    fn trigger_generation(&mut self) {
        let mode = self.session.active_mode;
        let Some(ticket) = self.generation.begin(mode) else {
            logger::log(&format!("Generation for {} already in flight", mode.label()));
            return;
        };
        logger::log(&format!(
            "Starting {} generation {:?} for '{}'",
            mode.schema().noun(),
            ticket,
            self.session.source_document.name
        ));
        let handle = self.launcher.launch(
            ticket,
            self.session.source_document.clone(),
            mode.schema(),
        );
        self.generation.attach(ticket, handle);
    }

    fn fail(&mut self, error: GenerationError, now: Instant) {
        let mode = self.session.active_mode;
        logger::log(&format!("Generation failed for {}: {}", mode.label(), error));
        self.view = Some(ModeView::mount(mode, &self.session.items, now));
        self.notify(
            GenerationError::user_message(mode.schema()),
            NotificationKind::Error,
            now,
        );
    }

    fn persist<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        if let Err(e) = save(self.store.as_mut(), key, value) {
            logger::log(&format!("Could not save '{}' to session store: {}", key, e));
        }
    }
}

fn read_or_log<T: serde::de::DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Option<T> {
    match load::<T>(store, key) {
        Ok(value) => value,
        Err(e) => {
            logger::log(&format!("Could not read '{}' from session store: {}", key, e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::generator::MockGenerator;
    use crate::db::MemoryStore;
    use crate::models::{AnswerLabel, Flashcard, QuizQuestion, TargetSchema};
    use crossterm::event::KeyModifiers;
    use std::sync::Arc;
    use tokio::runtime::Handle;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn cards(n: usize) -> Items {
        Items::Flashcards(
            (0..n)
                .map(|i| Flashcard {
                    question: format!("Term ____ {}", i),
                    answer: format!("answer {}", i),
                })
                .collect(),
        )
    }

    fn quiz_items() -> Items {
        Items::Quiz(vec![QuizQuestion {
            question: "Which gas do plants absorb?".to_string(),
            options: [
                "Oxygen".to_string(),
                "Carbon dioxide".to_string(),
                "Nitrogen".to_string(),
                "Helium".to_string(),
            ],
            answer: AnswerLabel::B,
        }])
    }

    fn store_with_document(mode: Option<LearningMode>) -> Box<dyn SessionStore> {
        let mut store = MemoryStore::new();
        save(
            &mut store,
            keys::SOURCE_DOCUMENT,
            &SourceDocument {
                name: "plants.md".to_string(),
                content: "Plants absorb carbon dioxide.".to_string(),
            },
        )
        .unwrap();
        save(&mut store, keys::TITLE, "Plants").unwrap();
        if let Some(mode) = mode {
            save(&mut store, keys::SELECTED_MODE, &mode).unwrap();
        }
        Box::new(store)
    }

    fn launcher(generator: MockGenerator) -> (GenerationLauncher, UnboundedReceiver<GenerationEvent>) {
        let (tx, rx) = unbounded_channel();
        let launcher = GenerationLauncher::new(
            Handle::current(),
            Arc::new(generator),
            tx,
            Duration::from_secs(5),
        );
        (launcher, rx)
    }

    async fn drain_one(controller: &mut ModeController, rx: &mut UnboundedReceiver<GenerationEvent>, now: Instant) {
        let event = rx.recv().await.unwrap();
        controller.on_generation_event(event, now);
    }

    #[tokio::test]
    async fn test_mount_without_document_redirects() {
        let (launcher, _rx) = launcher(MockGenerator::succeeding(cards(1)));
        let result = ModeController::mount(Box::new(MemoryStore::new()), launcher);
        assert_eq!(result.err(), Some(MountError::MissingDocument));
    }

    #[tokio::test]
    async fn test_mount_restores_session_and_generates() {
        let now = Instant::now();
        let (launcher, mut rx) = launcher(MockGenerator::succeeding(cards(3)));
        let mut controller = ModeController::mount(store_with_document(None), launcher).unwrap();

        assert_eq!(controller.title(), "Plants");
        assert_eq!(controller.active_mode(), LearningMode::Flashcards);
        assert!(controller.is_loading());
        assert!(controller.view().is_none());
        assert_eq!(controller.status_line(), "Analyzing…");

        drain_one(&mut controller, &mut rx, now).await;
        assert!(!controller.is_loading());
        assert_eq!(controller.items().len(), 3);
        match controller.view() {
            Some(ModeView::Flashcards(view)) => assert_eq!(view.len(), 3),
            other => panic!("expected flashcards view, got {:?}", other),
        }
        let stored: Option<Items> = load(controller.store(), keys::ITEMS).unwrap();
        assert_eq!(stored.map(|items| items.len()), Some(3));
    }

    #[tokio::test]
    async fn test_mount_restores_selected_mode() {
        let now = Instant::now();
        let (launcher, mut rx) = launcher(MockGenerator::succeeding(quiz_items()));
        let mut controller =
            ModeController::mount(store_with_document(Some(LearningMode::Quiz)), launcher).unwrap();
        assert_eq!(controller.active_mode(), LearningMode::Quiz);

        drain_one(&mut controller, &mut rx, now).await;
        assert!(matches!(controller.view(), Some(ModeView::Quiz(_))));
    }

    #[tokio::test]
    async fn test_failure_notifies_and_mounts_empty_view() {
        let now = Instant::now();
        let (launcher, mut rx) = launcher(MockGenerator::failing(GenerationError::Api("down".to_string())));
        let mut controller =
            ModeController::mount(store_with_document(Some(LearningMode::Quiz)), launcher).unwrap();

        drain_one(&mut controller, &mut rx, now).await;
        assert!(!controller.is_loading());
        assert!(controller.items().is_empty());
        let notification = controller.notification().unwrap();
        assert_eq!(notification.message, "Failed to generate quiz. Please try again.");
        assert_eq!(notification.kind, NotificationKind::Error);
        match controller.view() {
            Some(ModeView::Quiz(quiz)) => assert!(quiz.questions().is_empty()),
            other => panic!("expected empty quiz view, got {:?}", other),
        }

        controller.on_tick(now + NOTIFICATION_LIFETIME);
        assert!(controller.notification().is_none());
    }

    #[tokio::test]
    async fn test_stale_result_does_not_overwrite_items() {
        let now = Instant::now();
        let (launcher, _rx) = launcher(MockGenerator::succeeding(cards(2)));
        let mut controller = ModeController::mount(store_with_document(None), launcher).unwrap();
        let abandoned = controller.generation.ticket().unwrap();

        controller.set_mode(LearningMode::Quiz);
        assert_eq!(controller.active_mode(), LearningMode::Quiz);
        assert!(controller.is_loading());

        controller.on_generation_event(
            GenerationEvent::Finished {
                ticket: abandoned,
                result: Ok(cards(8)),
            },
            now,
        );
        assert!(controller.is_loading());
        assert!(controller.items().is_empty());
        assert_eq!(controller.items().schema(), TargetSchema::Quiz);
    }

    #[tokio::test]
    async fn test_progress_updates_status_line() {
        let now = Instant::now();
        let (launcher, _rx) = launcher(MockGenerator::succeeding(cards(2)));
        let mut controller = ModeController::mount(store_with_document(None), launcher).unwrap();
        let ticket = controller.generation.ticket().unwrap();

        controller.on_generation_event(
            GenerationEvent::Partial {
                ticket,
                count: 4,
            },
            now,
        );
        assert_eq!(controller.progress_percent(), 50);
        assert_eq!(controller.status_line(), "Generating item 5 of 8");
    }

    #[tokio::test]
    async fn test_selector_switches_mode_and_persists() {
        let now = Instant::now();
        let (launcher, mut rx) = launcher(MockGenerator::succeeding(cards(2)));
        let mut controller = ModeController::mount(store_with_document(None), launcher).unwrap();
        drain_one(&mut controller, &mut rx, now).await;

        controller.handle_key(key(KeyCode::Char('m')), now);
        assert!(controller.selector_open());
        controller.handle_key(key(KeyCode::Down), now);
        controller.handle_key(key(KeyCode::Down), now);
        controller.handle_key(key(KeyCode::Enter), now);

        assert!(!controller.selector_open());
        assert_eq!(controller.active_mode(), LearningMode::Match);
        assert!(controller.is_loading());
        assert!(controller.items().is_empty());
        let stored: Option<LearningMode> = load(controller.store(), keys::SELECTED_MODE).unwrap();
        assert_eq!(stored, Some(LearningMode::Match));

        drain_one(&mut controller, &mut rx, now).await;
        assert!(matches!(controller.view(), Some(ModeView::Match(_))));
    }

    #[tokio::test]
    async fn test_result_from_previous_controller_is_ignored() {
        let now = Instant::now();
        let (launcher, mut rx) = launcher(MockGenerator::succeeding(cards(5)));
        let first = ModeController::mount(store_with_document(None), launcher.clone()).unwrap();
        let held = rx.recv().await.unwrap();
        drop(first);

        let mut store = MemoryStore::new();
        save(
            &mut store,
            keys::SOURCE_DOCUMENT,
            &SourceDocument {
                name: "rivers.md".to_string(),
                content: "The Nile flows north.".to_string(),
            },
        )
        .unwrap();
        let mut second = ModeController::mount(Box::new(store), launcher).unwrap();

        second.on_generation_event(held, now);
        assert!(second.is_loading());
        assert!(second.items().is_empty());
        assert!(second.view().is_none());

        drain_one(&mut second, &mut rx, now).await;
        assert!(!second.is_loading());
        assert!(second.items().is_empty());
    }

    #[tokio::test]
    async fn test_switching_mode_clears_previous_view_timers() {
        let now = Instant::now();
        let (launcher, mut rx) = launcher(MockGenerator::succeeding(cards(2)));
        let mut controller =
            ModeController::mount(store_with_document(Some(LearningMode::Match)), launcher).unwrap();
        drain_one(&mut controller, &mut rx, now).await;
        assert!(matches!(controller.view(), Some(ModeView::Match(_))));
        assert!(controller.next_deadline().is_some());

        controller.set_mode(LearningMode::Quiz);
        assert!(controller.view().is_none());
        assert_eq!(controller.next_deadline(), None);

        controller.on_tick(now + Duration::from_secs(60));
        assert!(controller.is_loading());
        assert!(controller.view().is_none());
        assert_eq!(controller.next_deadline(), None);
    }

    #[tokio::test]
    async fn test_same_mode_while_loading_is_noop() {
        let now = Instant::now();
        let (launcher, _rx) = launcher(MockGenerator::succeeding(cards(2)));
        let mut controller = ModeController::mount(store_with_document(None), launcher).unwrap();
        let mounted = controller.generation.ticket().unwrap();

        controller.handle_key(key(KeyCode::Char('1')), now);
        controller.handle_key(key(KeyCode::Char('g')), now);
        assert_eq!(controller.generation.ticket(), Some(mounted));

        controller.on_generation_event(
            GenerationEvent::Finished {
                ticket: mounted,
                result: Ok(cards(2)),
            },
            now,
        );
        assert_eq!(controller.items().len(), 2);
    }

    #[tokio::test]
    async fn test_escape_exits() {
        let now = Instant::now();
        let (launcher, _rx) = launcher(MockGenerator::succeeding(cards(2)));
        let mut controller = ModeController::mount(store_with_document(None), launcher).unwrap();
        assert_eq!(
            controller.handle_key(key(KeyCode::Esc), now),
            ControllerAction::Exit
        );
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_print_writes_report_after_submission() {
        let now = Instant::now();
        let temp_dir = tempfile::tempdir().unwrap();
        let (launcher, mut rx) = launcher(MockGenerator::succeeding(quiz_items()));
        let mut controller =
            ModeController::mount(store_with_document(Some(LearningMode::Quiz)), launcher)
                .unwrap()
                .with_results_dir(temp_dir.path().to_path_buf());
        drain_one(&mut controller, &mut rx, now).await;

        // Printing before submission does nothing.
        controller.handle_key(key(KeyCode::Char('p')), now);
        assert!(controller.notification().is_none());

        controller.handle_key(key(KeyCode::Char('b')), now);
        controller.handle_key(key(KeyCode::Enter), now);
        let later = now + Duration::from_millis(300);
        assert_eq!(controller.next_deadline(), Some(later));
        controller.on_tick(later);

        match controller.view() {
            Some(ModeView::Quiz(quiz)) => assert_eq!(quiz.score(), 1),
            other => panic!("expected quiz view, got {:?}", other),
        }

        controller.handle_key(key(KeyCode::Char('p')), later);
        let notification = controller.notification().unwrap();
        assert_eq!(notification.kind, NotificationKind::Info);
        assert!(notification.message.starts_with("Results saved to"));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }
}
