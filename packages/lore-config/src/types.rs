use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

/// Wire dialect spoken by a provider endpoint.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
	/// Hosted OpenAI-compatible API.
	OpenAi,
	/// Local Ollama model server.
	Ollama,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub kind: ProviderKind,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub kind: ProviderKind,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	#[serde(default = "default_max_tokens")]
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub top_k: u32,
	pub candidate_k: u32,
	pub fusion: SearchFusion,
	pub dartboard: SearchDartboard,
	pub preprocess: SearchPreprocess,
	pub tokenizer: SearchTokenizer,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			top_k: 10,
			candidate_k: 50,
			fusion: SearchFusion::default(),
			dartboard: SearchDartboard::default(),
			preprocess: SearchPreprocess::default(),
			tokenizer: SearchTokenizer::default(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchFusion {
	/// Vector weight used when fusion feeds diversity reranking.
	pub alpha: f32,
	/// Vector weight used by the standalone fusion entry point.
	pub standalone_alpha: f32,
}
impl Default for SearchFusion {
	fn default() -> Self {
		Self { alpha: 0.7, standalone_alpha: 0.5 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchDartboard {
	pub enabled: bool,
	pub diversity_weight: f32,
	pub relevance_weight: f32,
	pub sigma: f32,
}
impl Default for SearchDartboard {
	fn default() -> Self {
		Self { enabled: true, diversity_weight: 1.0, relevance_weight: 1.0, sigma: 0.1 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchPreprocess {
	pub enabled: bool,
	/// Queries with at most this many words are never rewritten.
	pub max_passthrough_words: u32,
	/// Texts with at least this many words are embedded as content, not as queries.
	pub content_word_threshold: u32,
}
impl Default for SearchPreprocess {
	fn default() -> Self {
		Self { enabled: true, max_passthrough_words: 2, content_word_threshold: 50 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchTokenizer {
	/// Snowball language name. `None` selects the whitespace tokenizer.
	pub language: Option<String>,
}
impl Default for SearchTokenizer {
	fn default() -> Self {
		Self { language: Some("english".to_string()) }
	}
}

fn default_max_tokens() -> u32 {
	200
}
