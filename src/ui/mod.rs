pub mod flashcards;
pub mod layout;
pub mod learning;
pub mod match_game;
pub mod menu;
pub mod quiz;

pub use flashcards::draw_flashcards;
pub use layout::{calculate_learning_chunks, calculate_menu_chunks};
pub use learning::draw_learning;
pub use match_game::draw_match;
pub use menu::{draw_menu, MenuView};
pub use quiz::draw_quiz;
