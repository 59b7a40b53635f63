use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use lore_config::{EmbeddingProviderConfig, ProviderKind};

pub async fn embed(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let body = match cfg.kind {
		ProviderKind::OpenAi => serde_json::json!({
			"model": cfg.model,
			"input": texts,
			"dimensions": cfg.dimensions,
		}),
		ProviderKind::Ollama => serde_json::json!({
			"model": cfg.model,
			"input": texts,
		}),
	};
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let vectors = match cfg.kind {
		ProviderKind::OpenAi => parse_openai_response(json)?,
		ProviderKind::Ollama => parse_ollama_response(json)?,
	};

	if vectors.len() != texts.len() {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding response returned {} vectors for {} inputs.",
				vectors.len(),
				texts.len()
			),
		});
	}

	tracing::debug!(
		provider_id = %cfg.provider_id,
		count = vectors.len(),
		dimensions = vectors.first().map(Vec::len).unwrap_or(0),
		"Embedding request complete."
	);

	Ok(vectors)
}

fn parse_openai_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").ok_or_else(|| Error::InvalidResponse {
			message: "Embedding item missing embedding array.".to_string(),
		})?;

		indexed.push((index, parse_vector(embedding)?));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

fn parse_ollama_response(json: Value) -> Result<Vec<Vec<f32>>> {
	if let Some(embeddings) = json.get("embeddings").and_then(|v| v.as_array()) {
		return embeddings.iter().map(parse_vector).collect();
	}
	if let Some(embedding) = json.get("embedding") {
		return Ok(vec![parse_vector(embedding)?]);
	}

	Err(Error::InvalidResponse {
		message: "Embedding response is missing embeddings array.".to_string(),
	})
}

fn parse_vector(value: &Value) -> Result<Vec<f32>> {
	let values = value.as_array().ok_or_else(|| Error::InvalidResponse {
		message: "Embedding must be an array.".to_string(),
	})?;
	let mut vec = Vec::with_capacity(values.len());

	for value in values {
		let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
			message: "Embedding value must be numeric.".to_string(),
		})?;

		vec.push(number as f32);
	}

	Ok(vec)
}
