pub mod ai;
pub mod ai_worker;
pub mod config;
pub mod controller;
pub mod db;
pub mod document;
pub mod error;
pub mod file_io;
pub mod generation;
pub mod logger;
pub mod models;
pub mod modes;
pub mod scheduler;
pub mod ui;
pub mod utils;


// Re-exports for convenience
pub use ai::{Generator, ModelConfig, OpenRouterClient, OpenRouterGenerator, DEFAULT_MODEL};
pub use ai_worker::GenerationLauncher;
pub use config::AppConfig;
pub use controller::{ControllerAction, ModeController, Notification, NotificationKind};
pub use error::{GenerationError, MountError, StoreError};
pub use generation::{GenerationEvent, GenerationSession, PartialSink, Ticket};
pub use models::{
    AnswerLabel, AppState, Flashcard, Items, LearningMode, QuizQuestion, SourceDocument,
    TargetSchema,
};
pub use modes::{FlashcardMode, MatchMode, ModeView, QuizMode};
pub use scheduler::{TimerId, Timers};
