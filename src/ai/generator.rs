use crate::ai::client::{ModelConfig, OpenRouterClient};
use crate::error::GenerationError;
use crate::generation::PartialSink;
use crate::logger;
use crate::models::{Flashcard, Items, QuizQuestion, SourceDocument, TargetSchema, TARGET_ITEM_COUNT};
use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;

lazy_static::lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)```[a-zA-Z]*\s*(.*?)\s*```").expect("valid fence pattern");
}

/// Turns a document into study items. Implementations report streamed
/// progress through `partial` and return the validated terminal payload.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        document: &SourceDocument,
        schema: TargetSchema,
        partial: &PartialSink,
    ) -> Result<Items, GenerationError>;
}

#[derive(Debug)]
pub struct OpenRouterGenerator {
    client: Option<OpenRouterClient>,
    config: ModelConfig,
}

impl OpenRouterGenerator {
    /// Without an API key every call fails with `MissingApiKey`.
    pub fn new(api_key: Option<&str>, config: ModelConfig) -> Self {
        let client = match OpenRouterClient::new(api_key) {
            Ok(client) => Some(client),
            Err(e) => {
                logger::log(&format!("Generation disabled: {}", e));
                None
            }
        };
        Self { client, config }
    }
}

#[async_trait]
impl Generator for OpenRouterGenerator {
    async fn generate(
        &self,
        document: &SourceDocument,
        schema: TargetSchema,
        partial: &PartialSink,
    ) -> Result<Items, GenerationError> {
        let client = self.client.as_ref().ok_or(GenerationError::MissingApiKey)?;
        logger::log(&format!(
            "Requesting {} for document '{}' ({} bytes)",
            schema.noun(),
            document.name,
            document.content.len()
        ));

        let user_prompt = user_prompt(schema, document);
        let mut reported = 0;
        let text = client
            .stream_completion(system_prompt(schema), &user_prompt, &self.config, |so_far| {
                let count = count_complete_items(so_far);
                if count > reported {
                    reported = count;
                    partial.report(count);
                }
            })
            .await?;

        logger::log(&format!("Raw generation response: {}", text));
        parse_items(schema, &text)
    }
}

pub fn system_prompt(schema: TargetSchema) -> &'static str {
    match schema {
        TargetSchema::Flashcards => {
            "You are a teacher. Your job is to take a document and create a set of fill-in-the-blank (with 8 questions) flashcards based on its content. Each flashcard should have a sentence with a missing word (blank) as the question and the correct word/phrase as the answer."
        }
        TargetSchema::Quiz => {
            "You are a teacher. Your job is to take a document and create a multiple choice test (with 8 questions) based on the content of the document. Each option should be roughly equal in length."
        }
    }
}

pub fn user_prompt(schema: TargetSchema, document: &SourceDocument) -> String {
    let shape = match schema {
        TargetSchema::Flashcards => r#"[{"question": "sentence with a ____ blank", "answer": "missing word or phrase"}]"#,
        TargetSchema::Quiz => {
            r#"[{"question": "question text", "options": ["option A", "option B", "option C", "option D"], "answer": "A"}]"#
        }
    };
    let rules = match schema {
        TargetSchema::Flashcards => "- Each object has exactly the keys \"question\" and \"answer\".",
        TargetSchema::Quiz => {
            "- Each object has exactly the keys \"question\", \"options\" and \"answer\".\n- \"options\" holds exactly 4 strings.\n- \"answer\" is the letter of the correct option: \"A\", \"B\", \"C\" or \"D\"."
        }
    };

    format!(
        r#"Create {count} {noun} items from this document.

IMPORTANT:

- Respond ONLY with a JSON array (no markdown, no extra text) shaped like:
{shape}
{rules}

Document "{name}":
{content}
"#,
        count = TARGET_ITEM_COUNT,
        noun = schema.noun(),
        shape = shape,
        rules = rules,
        name = document.name,
        content = document.content,
    )
}

/// Strips code fences and surrounding prose, leaving the outermost JSON value.
pub fn clean_json_response(response: &str) -> String {
    let mut cleaned = response.trim().to_string();

    if let Some(caps) = CODE_FENCE.captures(&cleaned)
        && let Some(inner) = caps.get(1)
    {
        cleaned = inner.as_str().to_string();
    }

    let open = cleaned.find(['[', '{']);
    let close = cleaned.rfind([']', '}']);
    if let (Some(start), Some(end)) = (open, close)
        && start < end
    {
        cleaned = cleaned[start..=end].to_string();
    }

    cleaned.trim().to_string()
}

/// Counts objects already closed inside the top-level array of a partial response.
pub fn count_complete_items(partial: &str) -> usize {
    let Some(start) = partial.find('[') else {
        return 0;
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut count = 0;

    for c in partial[start + 1..].chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                if depth == 0 && c == '}' {
                    count += 1;
                }
            }
            _ => {}
        }
    }

    count
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Wrapped<T> {
    items: Vec<T>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Bare(Vec<T>),
    Wrapped(Wrapped<T>),
}

fn decode<T: DeserializeOwned>(cleaned: &str) -> Result<Vec<T>, GenerationError> {
    let payload: Payload<T> = serde_json::from_str(cleaned)
        .map_err(|e| GenerationError::Validation(format!("{} (payload: {})", e, cleaned)))?;
    Ok(match payload {
        Payload::Bare(items) => items,
        Payload::Wrapped(wrapped) => wrapped.items,
    })
}

fn require_text(field: &str, index: usize, value: &str) -> Result<(), GenerationError> {
    if value.trim().is_empty() {
        return Err(GenerationError::Validation(format!(
            "item {} has an empty {}",
            index + 1,
            field
        )));
    }
    Ok(())
}

/// Decodes and validates a terminal payload. Non-conforming input is an error,
/// never a partial success.
pub fn parse_items(schema: TargetSchema, response: &str) -> Result<Items, GenerationError> {
    let cleaned = clean_json_response(response);
    match schema {
        TargetSchema::Flashcards => {
            let cards: Vec<Flashcard> = decode(&cleaned)?;
            for (index, card) in cards.iter().enumerate() {
                require_text("question", index, &card.question)?;
                require_text("answer", index, &card.answer)?;
            }
            Ok(Items::Flashcards(cards))
        }
        TargetSchema::Quiz => {
            let questions: Vec<QuizQuestion> = decode(&cleaned)?;
            for (index, question) in questions.iter().enumerate() {
                require_text("question", index, &question.question)?;
                for option in &question.options {
                    require_text("option", index, option)?;
                }
            }
            Ok(Items::Quiz(questions))
        }
    }
}

#[cfg(test)]
use std::time::Duration;

/// Scripted generator for tests: reports each step's partial count, then returns `result`.
#[cfg(test)]
pub struct MockGenerator {
    pub partial_counts: Vec<usize>,
    pub delay: Duration,
    pub result: std::sync::Mutex<Option<Result<Items, GenerationError>>>,
}

#[cfg(test)]
impl MockGenerator {
    pub fn succeeding(items: Items) -> Self {
        Self {
            partial_counts: Vec::new(),
            delay: Duration::ZERO,
            result: std::sync::Mutex::new(Some(Ok(items))),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            partial_counts: Vec::new(),
            delay: Duration::ZERO,
            result: std::sync::Mutex::new(Some(Err(error))),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Generator for MockGenerator {
    async fn generate(
        &self,
        _document: &SourceDocument,
        schema: TargetSchema,
        partial: &PartialSink,
    ) -> Result<Items, GenerationError> {
        for count in &self.partial_counts {
            partial.report(*count);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.result.lock().ok().and_then(|mut slot| slot.take());
        scripted.unwrap_or_else(|| Ok(Items::empty(schema)))
    }
}
