//! JSON-or-nothing wrapper around a [`ChatClient`].

use crate::client::ChatClient;
use crate::types::{ChatMessage, ChatRequest, ChatParams, Usage};
use std::time::Duration;

const BACKOFF_STEP_MS: u64 = 300;

/// Ask for a JSON object and parse it, retrying with linear backoff
/// (300ms × attempt) on call failure or unparseable output. Returns `None`
/// after `max_retries` attempts — exhaustion is a payload-level outcome the
/// caller interprets, not an error. Usage accumulates across attempts.
pub async fn safe_json_chat(
    client: &dyn ChatClient,
    messages: Vec<ChatMessage>,
    max_retries: usize,
) -> Option<(serde_json::Value, Usage)> {
    let mut usage = Usage::default();

    for attempt in 1..=max_retries.max(1) {
        if attempt > 1 {
            tokio::time::sleep(Duration::from_millis(BACKOFF_STEP_MS * (attempt as u64 - 1))).await;
        }

        let request = ChatRequest {
            messages: messages.clone(),
            params: ChatParams {
                json_output: true,
                ..Default::default()
            },
        };

        match client.chat(request).await {
            Ok(response) => {
                usage.add(response.usage);
                match serde_json::from_str(strip_fences(&response.content)) {
                    Ok(value) => return Some((value, usage)),
                    Err(err) => {
                        log::warn!("JSON parse failed on attempt {attempt}: {err}");
                    }
                }
            }
            Err(err) => {
                log::warn!("Chat call failed on attempt {attempt}: {err}");
            }
        }
    }

    log::warn!("Giving up after {max_retries} attempts without parseable JSON");
    None
}

/// Models habitually wrap JSON in Markdown fences; strip one layer.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AiError, Result};
    use crate::types::ChatResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedClient {
        responses: Mutex<Vec<Result<ChatResponse>>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<ChatResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Err(AiError::provider("script exhausted"))
            } else {
                responses.remove(0)
            }
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn ok(content: &str, prompt: u64) -> Result<ChatResponse> {
        Ok(ChatResponse {
            content: content.to_string(),
            usage: Usage {
                prompt_tokens: prompt,
                completion_tokens: 1,
                total_tokens: prompt + 1,
            },
        })
    }

    #[test]
    fn strip_fences_handles_plain_and_fenced() {
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn returns_parsed_object_first_try() {
        let client = ScriptedClient::new(vec![ok("{\"score\": 7}", 10)]);
        let (value, usage) = safe_json_chat(&client, vec![ChatMessage::user("go")], 3)
            .await
            .unwrap();
        assert_eq!(value["score"], 7);
        assert_eq!(usage.prompt_tokens, 10);
    }

    #[tokio::test]
    async fn retries_then_succeeds_and_sums_usage() {
        let client = ScriptedClient::new(vec![
            ok("not json at all", 5),
            Err(AiError::transport("boom")),
            ok("```json\n{\"ok\": true}\n```", 7),
        ]);
        let (value, usage) = safe_json_chat(&client, vec![ChatMessage::user("go")], 3)
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(usage.prompt_tokens, 12);
    }

    #[tokio::test]
    async fn exhaustion_yields_none() {
        let client = ScriptedClient::new(vec![
            ok("nope", 1),
            ok("still nope", 1),
            ok("never json", 1),
        ]);
        let result = safe_json_chat(&client, vec![ChatMessage::user("go")], 3).await;
        assert!(result.is_none());
    }
}
