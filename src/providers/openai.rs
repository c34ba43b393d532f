//! Secondary provider: OpenAI Chat Completions, text only (never grounds).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ensure_success, http_client, Provider, ProviderOutput};
use crate::errors::ProviderError;
use crate::types::Language;

const NAME: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: Option<&str>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Self {
        Self {
            http: http_client(timeout),
            api_key: api_key.into(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
pub(crate) struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

pub(crate) fn extract_output(body: Resp) -> Result<ProviderOutput, ProviderError> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ProviderError::EmptyResponse(NAME));
    }
    Ok(ProviderOutput::text_only(content))
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
        language: Language,
    ) -> Result<ProviderOutput, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredentials(NAME));
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system_instruction,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.3,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        tracing::debug!(target: "provider", provider = NAME, model = %self.model, %language, "chat completion");

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;
        let body: Resp = ensure_success(resp).await?.json().await?;
        extract_output(body)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_choice_text_is_returned_without_sources() {
        let body: Resp = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"status\":\"OK\"}"}}]}"#,
        )
        .unwrap();
        let out = extract_output(body).unwrap();
        assert_eq!(out.raw_text, "{\"status\":\"OK\"}");
        assert!(out.sources.is_empty());
    }

    #[test]
    fn null_content_is_empty_response() {
        let body: Resp =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(matches!(
            extract_output(body),
            Err(ProviderError::EmptyResponse("openai"))
        ));
    }
}
