use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use lore_config::{LlmProviderConfig, ProviderKind};

/// Sends one chat request and returns the raw message content.
///
/// The content is returned untouched: depending on the model it is a string, a list of
/// content parts, or an object. Callers flatten it. There is no retry here.
pub async fn complete(cfg: &LlmProviderConfig, prompt: &str) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let messages = serde_json::json!([{ "role": "user", "content": prompt }]);
	let body = match cfg.kind {
		ProviderKind::OpenAi => serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"max_tokens": cfg.max_tokens,
			"messages": messages,
		}),
		ProviderKind::Ollama => serde_json::json!({
			"model": cfg.model,
			"stream": false,
			"messages": messages,
			"options": { "temperature": cfg.temperature, "num_predict": cfg.max_tokens },
		}),
	};
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_content(json)
}

fn parse_completion_content(mut json: Value) -> Result<Value> {
	if let Some(content) = json
		.get_mut("choices")
		.and_then(|v| v.as_array_mut())
		.and_then(|arr| arr.first_mut())
		.and_then(|choice| choice.get_mut("message"))
		.and_then(|msg| msg.get_mut("content"))
	{
		return Ok(content.take());
	}
	if let Some(content) = json.get_mut("message").and_then(|msg| msg.get_mut("content")) {
		return Ok(content.take());
	}

	Err(Error::InvalidResponse {
		message: "Completion response is missing message content.".to_string(),
	})
}
