use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use learning_modes::{
    db::{keys, save, MemoryStore, SessionStore, SqliteStore},
    document::{document_title, get_document_files, load_document},
    logger, AppConfig, AppState, ControllerAction, GenerationEvent, GenerationLauncher,
    ModeController, OpenRouterGenerator,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Upper bound on one input poll so generation events keep flowing.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct App {
    state: AppState,
    config: AppConfig,
    documents: Vec<PathBuf>,
    selected_index: usize,
    menu_error: Option<String>,
    launcher: GenerationLauncher,
    controller: Option<ModeController>,
}

fn open_store() -> Box<dyn SessionStore> {
    match SqliteStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            logger::log(&format!("Session database unavailable, using memory store: {}", e));
            Box::new(MemoryStore::new())
        }
    }
}

impl App {
    fn new(config: AppConfig, launcher: GenerationLauncher) -> Self {
        let documents = get_document_files(&config.documents_dir);
        Self {
            state: AppState::Menu,
            config,
            documents,
            selected_index: 0,
            menu_error: None,
            launcher,
            controller: None,
        }
    }

    fn draw(&self, f: &mut Frame) {
        match (&self.state, &self.controller) {
            (AppState::Learning, Some(controller)) => learning_modes::ui::draw_learning(f, controller),
            _ => learning_modes::ui::draw_menu(
                f,
                &learning_modes::ui::MenuView {
                    documents: &self.documents,
                    selected_index: self.selected_index,
                    documents_dir: &self.config.documents_dir,
                    ai_enabled: self.config.ai_enabled(),
                    model: &self.config.model.model,
                    error: self.menu_error.as_deref(),
                },
            ),
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.controller.as_ref().and_then(ModeController::next_deadline)
    }

    fn on_generation_event(&mut self, event: GenerationEvent, now: Instant) {
        match &mut self.controller {
            Some(controller) => controller.on_generation_event(event, now),
            None => logger::log(&format!(
                "Dropping generation event {:?} with no learning view",
                event.ticket()
            )),
        }
    }

    fn on_tick(&mut self, now: Instant) {
        if let Some(controller) = &mut self.controller {
            controller.on_tick(now);
        }
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        match self.state {
            AppState::Menu => self.handle_menu_key(key),
            AppState::Learning => {
                let action = match &mut self.controller {
                    Some(controller) => controller.handle_key(key, now),
                    None => ControllerAction::Exit,
                };
                if action == ControllerAction::Exit {
                    self.return_to_menu();
                }
                false
            }
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_index + 1 < self.documents.len() {
                    self.selected_index += 1;
                }
            }
            KeyCode::Enter => self.open_selected_document(),
            KeyCode::Esc | KeyCode::Char('q') => return true,
            _ => {}
        }
        false
    }

    fn open_selected_document(&mut self) {
        let Some(path) = self.documents.get(self.selected_index).cloned() else {
            return;
        };

        let document = match load_document(&path) {
            Ok(document) => document,
            Err(e) => {
                logger::log(&format!("Failed to load {}: {}", path.display(), e));
                self.menu_error = Some(format!("Could not open {}", path.display()));
                return;
            }
        };

        let mut store = open_store();
        let title = document_title(&path);
        if let Err(e) = save(store.as_mut(), keys::SOURCE_DOCUMENT, &document)
            .and_then(|_| save(store.as_mut(), keys::TITLE, &title))
        {
            logger::log(&format!("Could not record document in session store: {}", e));
        }

        match ModeController::mount(store, self.launcher.clone()) {
            Ok(controller) => {
                self.menu_error = None;
                self.controller = Some(
                    controller.with_results_dir(self.config.results_dir.clone()),
                );
                self.state = AppState::Learning;
            }
            Err(e) => {
                logger::log(&format!("Learning view not mounted: {}", e));
            }
        }
    }

    fn return_to_menu(&mut self) {
        self.controller = None;
        self.state = AppState::Menu;
        self.documents = get_document_files(&self.config.documents_dir);
        if self.selected_index >= self.documents.len() {
            self.selected_index = self.documents.len().saturating_sub(1);
        }
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &mut UnboundedReceiver<GenerationEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.draw(f))?;

        let now = Instant::now();
        let timeout = app
            .next_deadline()
            .map_or(MAX_POLL_INTERVAL, |deadline| {
                deadline.saturating_duration_since(now).min(MAX_POLL_INTERVAL)
            });

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(());
            }
            if app.handle_key(key, Instant::now()) {
                return Ok(());
            }
        }

        while let Ok(event) = events.try_recv() {
            app.on_generation_event(event, Instant::now());
        }
        app.on_tick(Instant::now());
    }
}

fn main() -> io::Result<()> {
    logger::init();
    let config = AppConfig::from_env();
    logger::log(&format!(
        "Starting with model {} (AI {})",
        config.model.model,
        if config.ai_enabled() { "enabled" } else { "disabled" }
    ));

    let runtime = tokio::runtime::Runtime::new()?;
    let (tx, mut rx) = unbounded_channel();
    let generator = Arc::new(OpenRouterGenerator::new(
        config.api_key.as_deref(),
        config.model.clone(),
    ));
    let launcher = GenerationLauncher::new(
        runtime.handle().clone(),
        generator,
        tx,
        config.generation_timeout,
    );
    let mut app = App::new(config, launcher);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut rx);

    // Abort any in-flight generation before the runtime shuts down.
    drop(app);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        logger::log(&format!("Exited with error: {}", e));
    }
    result
}
