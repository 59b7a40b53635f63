pub mod dartboard;
pub mod document;
pub mod fusion;
pub mod hybrid;
pub mod keyword;
pub mod preprocess;
pub mod service;
pub mod tokenizer;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

pub use dartboard::DartboardParams;
pub use document::Document;
pub use error::{Error, Result};
pub use fusion::{FusionRetriever, fuse_search_results};
pub use hybrid::{RerankOptions, rerank_with_fusion_dartboard};
pub use keyword::Bm25Indexer;
pub use preprocess::QueryPreprocessor;
pub use service::{SearchRequest, SearchService};
pub use tokenizer::Tokenizer;

use lore_config::{EmbeddingProviderConfig, LlmProviderConfig};
use lore_providers::{completion, embedding};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait LanguageModel
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<Value>>;
}

/// Nearest-neighbour lookup over the world corpus.
///
/// Returned documents carry their vector similarity in `relevance` and, when the index stores
/// them, their embeddings.
pub trait VectorSearch
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		embedding: &'a [f32],
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<Document>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub llm: Arc<dyn LanguageModel>,
	pub vector_search: Arc<dyn VectorSearch>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		llm: Arc<dyn LanguageModel>,
		vector_search: Arc<dyn VectorSearch>,
	) -> Self {
		Self { embedding, llm, vector_search }
	}

	/// HTTP embedding and completion providers around the given vector index.
	pub fn http(vector_search: Arc<dyn VectorSearch>) -> Self {
		let provider = Arc::new(HttpProviders);

		Self { embedding: provider.clone(), llm: provider, vector_search }
	}
}

struct HttpProviders;
impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}
impl LanguageModel for HttpProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<Value>> {
		Box::pin(async move { Ok(completion::complete(cfg, prompt).await?) })
	}
}
