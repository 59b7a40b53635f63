//! Dartboard diversity selection.
//!
//! Greedy, log-domain selection over pre-normalized embeddings. Each step picks the candidate
//! whose addition maximizes the log-sum-exp of blended closeness-to-selected and query
//! relevance, which pushes near-duplicates of already selected results down the list.
//! The per-step scores are internal; the output is an ordering, nothing more.

use std::f64::consts::PI;

use crate::{
	document::Document,
	error::{Error, Result},
};

/// Smallest kernel width used by the selection loop.
pub const SIGMA_FLOOR: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DartboardParams {
	pub diversity_weight: f32,
	pub relevance_weight: f32,
	pub sigma: f32,
}
impl DartboardParams {
	/// Kernel width clamped away from zero.
	pub fn effective_sigma(&self) -> f64 {
		let sigma = f64::from(self.sigma);

		if sigma.is_finite() { sigma.max(SIGMA_FLOOR) } else { SIGMA_FLOOR }
	}
}
impl Default for DartboardParams {
	fn default() -> Self {
		Self { diversity_weight: 1.0, relevance_weight: 1.0, sigma: 0.1 }
	}
}
impl From<&lore_config::SearchDartboard> for DartboardParams {
	fn from(cfg: &lore_config::SearchDartboard) -> Self {
		Self {
			diversity_weight: cfg.diversity_weight,
			relevance_weight: cfg.relevance_weight,
			sigma: cfg.sigma,
		}
	}
}

/// `1 - a·b`. Assumes unit-length inputs of equal dimension.
pub fn cosine_distance(lhs: &[f32], rhs: &[f32]) -> f64 {
	let dot: f64 = lhs.iter().zip(rhs.iter()).map(|(l, r)| f64::from(*l) * f64::from(*r)).sum();

	1.0 - dot
}

/// Log-density of `distance` under a zero-mean Gaussian of width `sigma`.
///
/// A non-positive `sigma` degenerates to a delta function: zero distance keeps log-density 0,
/// anything else goes to negative infinity.
pub fn lognorm(distance: f64, sigma: f64) -> f64 {
	if sigma <= 0.0 {
		if distance == 0.0 {
			return 0.0;
		}

		return f64::NEG_INFINITY * distance.abs();
	}

	-sigma.ln() - 0.5 * (2.0 * PI).ln() - distance * distance / (2.0 * sigma * sigma)
}

/// `ln(Σ exp(x))`, shifted by the maximum so large magnitudes do not overflow.
pub fn logsumexp(values: &[f64]) -> f64 {
	let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

	if !max.is_finite() {
		return max;
	}

	let sum: f64 = values.iter().map(|value| (value - max).exp()).sum();

	max + sum.ln()
}

/// Rejects embeddings that break the collaborator contract: empty, mismatched dimensions, or
/// non-finite values.
pub fn validate_embeddings(candidates: &[Document], query_embedding: &[f32]) -> Result<()> {
	if query_embedding.is_empty() {
		return Err(Error::InvalidEmbedding { message: "Query embedding is empty.".to_string() });
	}
	if query_embedding.iter().any(|value| !value.is_finite()) {
		return Err(Error::InvalidEmbedding {
			message: "Query embedding contains a non-finite value.".to_string(),
		});
	}

	let dim = query_embedding.len();

	for candidate in candidates {
		let Some(embedding) = candidate.embedding.as_deref() else { continue };

		if embedding.len() != dim {
			return Err(Error::InvalidEmbedding {
				message: format!(
					"Document {:?} has {} dimensions; the query embedding has {dim}.",
					candidate.id,
					embedding.len()
				),
			});
		}
		if embedding.iter().any(|value| !value.is_finite()) {
			return Err(Error::InvalidEmbedding {
				message: format!(
					"Document {:?} embedding contains a non-finite value.",
					candidate.id
				),
			});
		}
	}

	Ok(())
}

/// Greedy Dartboard selection. Returns up to `k` distinct indices into `embeddings`, in
/// selection order.
pub fn select(
	query_embedding: &[f32],
	embeddings: &[&[f32]],
	k: usize,
	params: &DartboardParams,
) -> Vec<usize> {
	let n = embeddings.len();
	let k = k.min(n);

	if k == 0 {
		return Vec::new();
	}

	let sigma = params.effective_sigma();
	let diversity_weight = f64::from(params.diversity_weight);
	let relevance_weight = f64::from(params.relevance_weight);
	let query_probs: Vec<f64> = embeddings
		.iter()
		.map(|embedding| lognorm(cosine_distance(embedding, query_embedding), sigma))
		.collect();
	let doc_probs: Vec<Vec<f64>> = embeddings
		.iter()
		.map(|lhs| {
			embeddings.iter().map(|rhs| lognorm(cosine_distance(lhs, rhs), sigma)).collect()
		})
		.collect();
	let mut is_selected = vec![false; n];
	let first = argmax(&query_probs, &is_selected).unwrap_or(0);
	let mut selected = vec![first];
	let mut max_closeness = doc_probs[first].clone();

	is_selected[first] = true;

	let mut updated = vec![vec![0.0_f64; n]; n];
	let mut scores = vec![f64::NEG_INFINITY; n];
	let mut combined = vec![0.0_f64; n];

	while selected.len() < k {
		for (row, (updated_row, doc_row)) in updated.iter_mut().zip(doc_probs.iter()).enumerate() {
			for (col, value) in updated_row.iter_mut().enumerate() {
				*value = max_closeness[col].max(doc_row[col]);
				combined[col] = diversity_weight * *value + relevance_weight * query_probs[col];
			}

			scores[row] =
				if is_selected[row] { f64::NEG_INFINITY } else { logsumexp(&combined) };
		}

		let Some(best) = argmax(&scores, &is_selected) else { break };

		selected.push(best);
		is_selected[best] = true;
		max_closeness.clone_from(&updated[best]);
	}

	selected
}

/// Reorders `candidates` by Dartboard selection, keeping at most `k`.
///
/// Fails open: a missing query embedding, a candidate without an embedding, or a batch of one
/// returns the input unchanged. Malformed embeddings are an error, even in a batch of one.
pub fn rerank(
	candidates: Vec<Document>,
	query_embedding: Option<&[f32]>,
	k: usize,
	params: &DartboardParams,
) -> Result<Vec<Document>> {
	let Some(query_embedding) = query_embedding else {
		tracing::warn!("Query embedding unavailable. Skipping diversity reranking.");

		return Ok(candidates);
	};
	let missing = candidates.iter().filter(|candidate| candidate.embedding.is_none()).count();

	if missing > 0 {
		tracing::warn!(
			missing,
			total = candidates.len(),
			"Candidates without embeddings. Skipping diversity reranking."
		);

		return Ok(candidates);
	}

	validate_embeddings(&candidates, query_embedding)?;

	if candidates.len() <= 1 {
		tracing::warn!(count = candidates.len(), "Too few candidates for diversity reranking.");

		return Ok(candidates);
	}

	let embeddings: Vec<&[f32]> =
		candidates.iter().filter_map(|candidate| candidate.embedding.as_deref()).collect();
	let order = select(query_embedding, &embeddings, k, params);

	tracing::info!(
		candidates = candidates.len(),
		selected = order.len(),
		diversity_weight = params.diversity_weight,
		relevance_weight = params.relevance_weight,
		sigma = params.effective_sigma(),
		"Dartboard reranking complete."
	);

	let mut slots: Vec<Option<Document>> = candidates.into_iter().map(Some).collect();

	Ok(order.into_iter().filter_map(|idx| slots[idx].take()).collect())
}

/// First unselected index holding the largest score. NaN ranks below everything; if every
/// remaining score is NaN or negative infinity the first unselected index wins.
fn argmax(values: &[f64], is_selected: &[bool]) -> Option<usize> {
	let mut best: Option<(usize, f64)> = None;

	for (idx, value) in values.iter().copied().enumerate() {
		if is_selected[idx] {
			continue;
		}

		let value = if value.is_nan() { f64::NEG_INFINITY } else { value };

		match best {
			Some((_, current)) if value <= current => {},
			_ => best = Some((idx, value)),
		}
	}

	best.map(|(idx, _)| idx)
}
