//! Query rewriting ahead of embedding.

use serde_json::Value;

use crate::LanguageModel;
use lore_config::LlmProviderConfig;

/// Queries with this many words or fewer are never rewritten.
pub const DEFAULT_MAX_PASSTHROUGH_WORDS: usize = 2;

const REWRITE_PROMPT: &str = "You rewrite search queries for a semantic search engine. \
Rewrite the query below as one descriptive phrase that is more specific and carries the keywords \
a detailed description of a matching world would contain. Do not phrase it as a question.\n\n\
Query: {query}\n\n\
Reply with the rewritten phrase only, as a single sentence, with no explanation.";

/// Rewrites longer queries into keyword-rich phrases. Never fails: any collaborator error
/// yields the original query.
pub struct QueryPreprocessor<'a> {
	llm: &'a dyn LanguageModel,
	cfg: &'a LlmProviderConfig,
	max_passthrough_words: usize,
}
impl<'a> QueryPreprocessor<'a> {
	pub fn new(llm: &'a dyn LanguageModel, cfg: &'a LlmProviderConfig) -> Self {
		Self { llm, cfg, max_passthrough_words: DEFAULT_MAX_PASSTHROUGH_WORDS }
	}

	pub fn with_max_passthrough_words(mut self, words: usize) -> Self {
		self.max_passthrough_words = words;

		self
	}

	pub async fn preprocess(&self, query: &str) -> String {
		let words = query.split_whitespace().count();

		if words <= self.max_passthrough_words {
			tracing::debug!(words, "Short query. Skipping rewrite.");

			return query.to_string();
		}

		let prompt = build_rewrite_prompt(query);

		match self.llm.complete(self.cfg, &prompt).await {
			Ok(content) => {
				let rewritten = flatten_content(content);

				if rewritten.is_empty() {
					tracing::warn!(query, "Query rewrite came back empty. Using original query.");

					return query.to_string();
				}

				tracing::info!(query, rewritten = %rewritten, "Query preprocessing complete.");

				rewritten
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					query,
					"Query preprocessing failed. Using original query."
				);

				query.to_string()
			},
		}
	}
}

pub fn build_rewrite_prompt(query: &str) -> String {
	REWRITE_PROMPT.replace("{query}", query.trim())
}

/// Collapses model content (text, list of parts, or object) into one trimmed string.
pub fn flatten_content(content: Value) -> String {
	let text = match content {
		Value::String(text) => text,
		Value::Array(parts) => parts.into_iter().map(part_text).collect::<Vec<_>>().join(" "),
		Value::Object(mut map) => match map.remove("text") {
			Some(Value::String(text)) => text,
			Some(other) => other.to_string(),
			None => Value::Object(map).to_string(),
		},
		Value::Null => String::new(),
		other => other.to_string(),
	};

	text.trim().to_string()
}

fn part_text(part: Value) -> String {
	match part {
		Value::String(text) => text,
		Value::Object(mut map) => match map.remove("text") {
			Some(Value::String(text)) => text,
			_ => Value::Object(map).to_string(),
		},
		other => other.to_string(),
	}
}
