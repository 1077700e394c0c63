use crate::error::GenerationError;
use futures::StreamExt;
use openrouter_api::{
    models::provider_preferences::ProviderPreferences,
    models::provider_preferences::ProviderSort,
    types::chat::{ChatCompletionRequest, Message},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
}

/// One `data:` line of the completion event stream.
#[derive(Debug, PartialEq)]
pub(crate) enum StreamLine {
    Delta(String),
    Done,
    Skip,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    message: String,
}

/// Splits the response body into lines. Only complete lines are decoded so
/// multi-byte characters never split across chunks.
#[derive(Debug, Default)]
pub(crate) struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    pub(crate) fn next_line(&mut self) -> Option<String> {
        let newline = self.pending.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=newline).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Whatever is left once the body has ended, even without a trailing newline.
    pub(crate) fn finish(&mut self) -> Option<String> {
        if self.pending.iter().all(u8::is_ascii_whitespace) {
            self.pending.clear();
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

pub(crate) fn parse_stream_line(line: &str) -> Result<StreamLine, GenerationError> {
    let line = line.trim();
    // Blank separators and ": OPENROUTER PROCESSING" keep-alives.
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(StreamLine::Skip);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(StreamLine::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| GenerationError::Api(format!("malformed stream chunk: {}", e)))?;
    if let Some(error) = chunk.error {
        return Err(GenerationError::Api(error.message));
    }

    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.and_then(|d| d.content))
        .collect();
    if text.is_empty() {
        Ok(StreamLine::Skip)
    } else {
        Ok(StreamLine::Delta(text))
    }
}

impl OpenRouterClient {
    pub fn new(api_key: Option<&str>) -> Result<Self, GenerationError> {
        let api_key = api_key.ok_or(GenerationError::MissingApiKey)?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
        })
    }

    /// Streams a chat completion. After every content delta `on_progress`
    /// receives all text accumulated so far. Returns the full text at the end.
    pub async fn stream_completion<F>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        config: &ModelConfig,
        mut on_progress: F,
    ) -> Result<String, GenerationError>
    where
        F: FnMut(&str) + Send,
    {
        let messages = vec![
            Message::text("system", system_prompt),
            Message::text("user", user_prompt),
        ];

        let provider = ProviderPreferences::new().with_sort(ProviderSort::Throughput);

        let request = ChatCompletionRequest {
            model: config.model.clone(),
            messages,
            provider: Some(provider),
            stream: Some(true),
            response_format: None,
            tools: None,
            tool_choice: None,
            models: None,
            transforms: None,
            route: None,
            user: None,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            repetition_penalty: None,
            min_p: None,
            top_a: None,
            seed: None,
            stop: None,
            logit_bias: None,
            logprobs: None,
            top_logprobs: None,
            prediction: None,
            parallel_tool_calls: None,
            verbosity: None,
        };

        let response = self
            .http
            .post(OPENROUTER_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let mut body = response.bytes_stream();
        let mut lines = SseLineBuffer::default();
        let mut content = String::new();
        let mut done = false;

        'stream: while let Some(chunk) = body.next().await {
            lines.push(&chunk?);
            while let Some(line) = lines.next_line() {
                if apply_stream_line(&line, &mut content, &mut on_progress)? {
                    done = true;
                    break 'stream;
                }
            }
        }
        if !done && let Some(rest) = lines.finish() {
            apply_stream_line(&rest, &mut content, &mut on_progress)?;
        }

        if content.trim().is_empty() {
            return Err(GenerationError::Api("No content received".to_string()));
        }
        Ok(content)
    }
}

/// Appends one line's delta to `content`. Returns true at the end-of-stream marker.
fn apply_stream_line(
    line: &str,
    content: &mut String,
    on_progress: &mut impl FnMut(&str),
) -> Result<bool, GenerationError> {
    match parse_stream_line(line)? {
        StreamLine::Delta(text) => {
            content.push_str(&text);
            on_progress(content);
            Ok(false)
        }
        StreamLine::Done => Ok(true),
        StreamLine::Skip => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        assert!(matches!(
            OpenRouterClient::new(None),
            Err(GenerationError::MissingApiKey)
        ));
        assert!(OpenRouterClient::new(Some("sk-test")).is_ok());
    }

    #[test]
    fn test_parse_stream_line_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"[{\"question\""}}]}"#;
        assert_eq!(
            parse_stream_line(line).unwrap(),
            StreamLine::Delta("[{\"question\"".to_string())
        );
    }

    #[test]
    fn test_parse_stream_line_done_and_comments() {
        assert_eq!(parse_stream_line("data: [DONE]").unwrap(), StreamLine::Done);
        assert_eq!(
            parse_stream_line(": OPENROUTER PROCESSING").unwrap(),
            StreamLine::Skip
        );
        assert_eq!(parse_stream_line("").unwrap(), StreamLine::Skip);
        assert_eq!(
            parse_stream_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(),
            StreamLine::Skip
        );
    }

    #[test]
    fn test_parse_stream_line_error_object() {
        let line = r#"data: {"error":{"message":"rate limited","code":429}}"#;
        match parse_stream_line(line) {
            Err(GenerationError::Api(message)) => assert_eq!(message, "rate limited"),
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_line_buffer_keeps_final_line_without_newline() {
        let mut lines = SseLineBuffer::default();
        lines.push(b"data: {\"choices\":[{\"delta\":{\"content\":\"[{\"}}]}\n");
        lines.push(b"data: {\"choices\":[{\"delta\":{\"content\":\"}]\"}}]}");

        let mut content = String::new();
        let mut updates = 0;
        let mut record = |_: &str| updates += 1;
        while let Some(line) = lines.next_line() {
            apply_stream_line(&line, &mut content, &mut record).unwrap();
        }
        assert_eq!(content, "[{");

        let rest = lines.finish().unwrap();
        apply_stream_line(&rest, &mut content, &mut record).unwrap();
        assert_eq!(content, "[{}]");
        assert_eq!(updates, 2);
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn test_line_buffer_ignores_trailing_whitespace() {
        let mut lines = SseLineBuffer::default();
        lines.push(b"data: [DONE]\n\n  ");
        assert_eq!(lines.next_line().as_deref(), Some("data: [DONE]\n"));
        assert_eq!(lines.next_line().as_deref(), Some("\n"));
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn test_default_model_config() {
        let config = ModelConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(config.max_tokens, Some(DEFAULT_MAX_TOKENS));
    }
}
