use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::provider::{role_name, CompletionOptions, LlmError, LlmProvider, Message};

/// Name reported to the API for structured-output requests.
const SCHEMA_NAME: &str = "health_analysis";

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    fn build_request_body(&self, messages: &[Message], options: &CompletionOptions) -> Value {
        let api_messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": role_name(&m.role), "content": m.content }))
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        if let Some(schema) = &options.json_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": SCHEMA_NAME,
                    "strict": true,
                    "schema": schema,
                },
            });
        }

        body
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&messages, options);

        debug!("OpenAI request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: Value = response.json().await?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))?
            .to_string();

        Ok(content)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_becomes_strict_response_format() {
        let provider = OpenAiProvider::new("k".into(), "gpt-4o-mini".into(), "http://x".into());
        let options = CompletionOptions {
            json_schema: Some(json!({ "type": "object" })),
            ..CompletionOptions::default()
        };
        let body = provider.build_request_body(
            &[Message::system("sys"), Message::user("hi")],
            &options,
        );

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(body["response_format"]["json_schema"]["schema"]["type"], "object");
    }

    #[test]
    fn plain_request_has_no_response_format() {
        let provider = OpenAiProvider::new("k".into(), "m".into(), "http://x".into());
        let body = provider.build_request_body(&[Message::user("hi")], &CompletionOptions::default());
        assert!(body.get("response_format").is_none());
    }
}
