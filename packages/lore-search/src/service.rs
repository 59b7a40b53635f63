use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
	Error, Providers, Result, VectorSearch,
	dartboard::DartboardParams,
	document::Document,
	fusion,
	hybrid::{self, RerankOptions},
	preprocess::QueryPreprocessor,
	tokenizer::Tokenizer,
};
use lore_config::Config;

/// Per-request overrides. Unset fields fall back to `[search]` configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub alpha: Option<f32>,
	#[serde(default)]
	pub diversity_weight: Option<f32>,
	#[serde(default)]
	pub relevance_weight: Option<f32>,
}
impl SearchRequest {
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into(), ..Self::default() }
	}
}

pub struct SearchService {
	pub cfg: Config,
	pub providers: Providers,
	tokenizer: Tokenizer,
}
impl SearchService {
	pub fn new(cfg: Config, vector_search: Arc<dyn VectorSearch>) -> Self {
		Self::with_providers(cfg, Providers::http(vector_search))
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let tokenizer = Tokenizer::for_language(cfg.search.tokenizer.language.as_deref());

		Self { cfg, providers, tokenizer }
	}

	pub fn tokenizer(&self) -> &Tokenizer {
		&self.tokenizer
	}

	pub fn preprocessor(&self) -> QueryPreprocessor<'_> {
		QueryPreprocessor::new(self.providers.llm.as_ref(), &self.cfg.providers.llm)
			.with_max_passthrough_words(self.cfg.search.preprocess.max_passthrough_words as usize)
	}

	/// Embeds a search query or a piece of content.
	///
	/// Texts shorter than `content_word_threshold` words are treated as queries and go through
	/// the rewrite step first. Longer texts are embedded verbatim.
	pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
		let preprocess = &self.cfg.search.preprocess;
		let words = text.split_whitespace().count();
		let prepared = if preprocess.enabled && words < preprocess.content_word_threshold as usize
		{
			self.preprocessor().preprocess(text).await
		} else {
			text.to_string()
		};
		let embeddings =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &[prepared]).await?;
		let Some(vector) = embeddings.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != self.cfg.providers.embedding.dimensions as usize {
			return Err(Error::InvalidEmbedding {
				message: format!(
					"Query embedding has {} dimensions; expected {}.",
					vector.len(),
					self.cfg.providers.embedding.dimensions
				),
			});
		}

		Ok(vector)
	}

	pub async fn search(&self, req: SearchRequest) -> Result<Vec<Document>> {
		let (query, top_k) = validate_request(&req, self.cfg.search.top_k)?;
		let options = self.rerank_options(&req, top_k)?;
		let (query_embedding, candidates) = self.retrieve(query, top_k).await?;
		let results = hybrid::rerank_with_fusion_dartboard(
			query,
			candidates,
			&options,
			&self.tokenizer,
			Some(&query_embedding),
		)?;

		tracing::info!(results = results.len(), "Search complete.");

		Ok(results)
	}

	/// Fusion-only search. Diversity weights are ignored and `alpha` defaults to
	/// `search.fusion.standalone_alpha`.
	pub async fn fuse_search(&self, req: SearchRequest) -> Result<Vec<Document>> {
		let (query, top_k) = validate_request(&req, self.cfg.search.top_k)?;
		let alpha = req.alpha.unwrap_or(self.cfg.search.fusion.standalone_alpha);
		let alpha = validate_alpha(alpha)?;
		let (_, candidates) = self.retrieve(query, top_k).await?;
		let mut results =
			fusion::fuse_search_results(candidates, query, Some(alpha), &self.tokenizer);

		results.truncate(top_k);

		tracing::info!(results = results.len(), alpha, "Fusion-only search complete.");

		Ok(results)
	}

	async fn retrieve(&self, query: &str, top_k: usize) -> Result<(Vec<f32>, Vec<Document>)> {
		let candidate_k = (self.cfg.search.candidate_k as usize).max(top_k);
		let query_embedding = self.embed_text(query).await?;
		let candidates = self.providers.vector_search.search(&query_embedding, candidate_k).await?;

		tracing::info!(candidates = candidates.len(), candidate_k, top_k, "Vector search complete.");

		Ok((query_embedding, candidates))
	}

	fn rerank_options(&self, req: &SearchRequest, top_k: usize) -> Result<RerankOptions> {
		let search = &self.cfg.search;
		let alpha = validate_alpha(req.alpha.unwrap_or(search.fusion.alpha))?;
		let diversity_weight = req.diversity_weight.unwrap_or(search.dartboard.diversity_weight);
		let relevance_weight = req.relevance_weight.unwrap_or(search.dartboard.relevance_weight);

		for (label, weight) in
			[("diversity_weight", diversity_weight), ("relevance_weight", relevance_weight)]
		{
			if !weight.is_finite() || weight < 0.0 {
				return Err(Error::InvalidRequest {
					message: format!("{label} must be zero or greater."),
				});
			}
		}

		let dartboard = search.dartboard.enabled.then(|| DartboardParams {
			diversity_weight,
			relevance_weight,
			sigma: search.dartboard.sigma,
		});

		Ok(RerankOptions { alpha, dartboard, top_k: Some(top_k) })
	}
}

fn validate_request(req: &SearchRequest, default_top_k: u32) -> Result<(&str, usize)> {
	let query = req.query.trim();

	if query.is_empty() {
		return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
	}

	let top_k = req.top_k.unwrap_or(default_top_k);

	if top_k == 0 {
		return Err(Error::InvalidRequest {
			message: "top_k must be greater than zero.".to_string(),
		});
	}

	Ok((query, top_k as usize))
}

fn validate_alpha(alpha: f32) -> Result<f32> {
	if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
		return Err(Error::InvalidRequest {
			message: "alpha must be in the range 0.0-1.0.".to_string(),
		});
	}

	Ok(alpha)
}
