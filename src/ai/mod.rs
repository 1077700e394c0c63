pub mod client;
pub mod generator;

pub use client::{ModelConfig, OpenRouterClient, DEFAULT_MODEL};
pub use generator::{
    clean_json_response, count_complete_items, parse_items, Generator, OpenRouterGenerator,
};
