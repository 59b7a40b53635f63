//! Fusion followed by Dartboard diversity reranking over one candidate batch.

use crate::{
	Result,
	dartboard::{self, DartboardParams},
	document::Document,
	fusion::{DEFAULT_ALPHA, FusionRetriever},
	tokenizer::Tokenizer,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RerankOptions {
	pub alpha: f32,
	/// `None` turns diversity reranking off.
	pub dartboard: Option<DartboardParams>,
	/// Output bound. `None` keeps every candidate.
	pub top_k: Option<usize>,
}
impl Default for RerankOptions {
	fn default() -> Self {
		Self { alpha: DEFAULT_ALPHA, dartboard: Some(DartboardParams::default()), top_k: None }
	}
}

/// Fusion first, then best-effort Dartboard reranking.
///
/// Diversity reranking runs only with a query embedding and an embedding on every fused
/// candidate; otherwise the fusion ordering is returned. Fused scores survive reranking
/// untouched. Malformed embeddings are the one error surfaced to the caller.
pub fn rerank_with_fusion_dartboard(
	query: &str,
	candidates: Vec<Document>,
	options: &RerankOptions,
	tokenizer: &Tokenizer,
	query_embedding: Option<&[f32]>,
) -> Result<Vec<Document>> {
	let mut fused = FusionRetriever::new(tokenizer, options.alpha).fuse(candidates, query);
	let limit = options.top_k.unwrap_or(fused.len());
	let Some(params) = options.dartboard.as_ref() else {
		fused.truncate(limit);

		return Ok(fused);
	};
	let Some(query_embedding) = query_embedding else {
		tracing::warn!("No query embedding. Returning fusion-only ranking.");

		fused.truncate(limit);

		return Ok(fused);
	};

	if fused.iter().any(|candidate| candidate.embedding.is_none()) {
		tracing::warn!("Some candidates lack embeddings. Returning fusion-only ranking.");

		fused.truncate(limit);

		return Ok(fused);
	}

	let mut reranked = dartboard::rerank(fused, Some(query_embedding), limit, params)?;

	reranked.truncate(limit);

	Ok(reranked)
}
