//! Linear fusion of vector relevance and normalized BM25 keyword relevance.

use std::cmp::Ordering;

use crate::{document::Document, keyword::Bm25Indexer, tokenizer::Tokenizer};

/// Vector weight used when fusion feeds diversity reranking.
pub const DEFAULT_ALPHA: f32 = 0.7;
/// Vector weight [`fuse_search_results`] falls back to when no alpha is given.
pub const STANDALONE_ALPHA: f32 = 0.5;

/// Re-scores a candidate batch with `alpha * vector + (1 - alpha) * keyword`.
///
/// The keyword index lifetime is explicit: [`FusionRetriever::fuse`] builds a fresh index for
/// every batch, and [`FusionRetriever::fuse_with_index`] uses one the caller built.
#[derive(Debug)]
pub struct FusionRetriever<'t> {
	tokenizer: &'t Tokenizer,
	alpha: f32,
}
impl<'t> FusionRetriever<'t> {
	pub fn new(tokenizer: &'t Tokenizer, alpha: f32) -> Self {
		Self { tokenizer, alpha: sanitize_alpha(alpha) }
	}

	pub fn alpha(&self) -> f32 {
		self.alpha
	}

	pub fn fuse(&self, candidates: Vec<Document>, query: &str) -> Vec<Document> {
		if candidates.is_empty() {
			return Vec::new();
		}

		let indexer = Bm25Indexer::build(self.tokenizer, &candidates);

		self.fuse_with_index(candidates, query, &indexer)
	}

	/// Fuses against a caller-owned index, which must have been built from `candidates`.
	///
	/// An unbuilt index contributes no keyword signal.
	pub fn fuse_with_index(
		&self,
		mut candidates: Vec<Document>,
		query: &str,
		indexer: &Bm25Indexer<'_>,
	) -> Vec<Document> {
		if candidates.is_empty() {
			return Vec::new();
		}
		if indexer.is_built() && indexer.len() != candidates.len() {
			tracing::warn!(
				indexed = indexer.len(),
				candidates = candidates.len(),
				"BM25 index was built from a different batch. Keyword scores may be misaligned."
			);
		}

		let raw = indexer.get_scores(query);
		let mut padded = vec![0.0_f32; candidates.len()];

		for (slot, score) in padded.iter_mut().zip(raw.iter()) {
			*slot = *score;
		}

		let normalized = normalize_min_max(&padded);

		for (idx, (candidate, keyword)) in candidates.iter_mut().zip(normalized.iter()).enumerate()
		{
			let vector = candidate.relevance;
			let fused = self.alpha * vector + (1.0 - self.alpha) * keyword;

			tracing::debug!(
				index = idx,
				title = %candidate.title,
				vector,
				bm25_raw = padded[idx],
				bm25_norm = *keyword,
				fused,
				"Fused candidate score."
			);

			candidate.relevance = fused;
		}

		candidates.sort_by(|a, b| cmp_f32_desc(a.relevance, b.relevance));

		tracing::info!(count = candidates.len(), alpha = self.alpha, "Fused candidate scores.");

		candidates
	}
}

/// Standalone fusion entry point: fresh index, one batch, one query.
///
/// `None` weighs both signals equally with [`STANDALONE_ALPHA`].
pub fn fuse_search_results(
	candidates: Vec<Document>,
	query: &str,
	alpha: Option<f32>,
	tokenizer: &Tokenizer,
) -> Vec<Document> {
	FusionRetriever::new(tokenizer, alpha.unwrap_or(STANDALONE_ALPHA)).fuse(candidates, query)
}

/// Min-max normalization into `[0, 1]`. A flat score vector maps to all zeros.
pub fn normalize_min_max(scores: &[f32]) -> Vec<f32> {
	let finite = scores.iter().copied().filter(|score| score.is_finite());
	let (min, max) = finite.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), score| {
		(lo.min(score), hi.max(score))
	});

	if min >= max {
		return vec![0.0; scores.len()];
	}

	let range = max - min;

	scores
		.iter()
		.map(|score| if score.is_finite() { ((score - min) / range).clamp(0.0, 1.0) } else { 0.0 })
		.collect()
}

/// Descending order with NaN sorted last.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

fn sanitize_alpha(alpha: f32) -> f32 {
	if !alpha.is_finite() {
		tracing::warn!(alpha, "Fusion alpha is not finite. Using the default.");

		return DEFAULT_ALPHA;
	}

	alpha.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn same_text_batch(relevances: &[f32]) -> Vec<Document> {
		relevances
			.iter()
			.enumerate()
			.map(|(idx, relevance)| {
				Document::new(
					format!("doc{idx}"),
					"Ice castle",
					"winter",
					"A frozen castle above the tundra.",
					*relevance,
				)
			})
			.collect()
	}

	fn ids(docs: &[Document]) -> Vec<&str> {
		docs.iter().map(|doc| doc.id.as_str()).collect()
	}

	#[test]
	fn normalization_stays_in_unit_range() {
		let normalized = normalize_min_max(&[2.0, 4.0, 3.0, -1.0]);

		assert_eq!(normalized, vec![0.6, 1.0, 0.8, 0.0]);
		assert!(normalized.iter().all(|value| (0.0..=1.0).contains(value)));
	}

	#[test]
	fn flat_scores_normalize_to_zero() {
		assert_eq!(normalize_min_max(&[1.7, 1.7, 1.7]), vec![0.0, 0.0, 0.0]);
		assert_eq!(normalize_min_max(&[5.0]), vec![0.0]);
		assert!(normalize_min_max(&[]).is_empty());
	}

	#[test]
	fn identical_text_keeps_vector_order_with_stable_ties() {
		let tokenizer = Tokenizer::english();
		let fused =
			fuse_search_results(same_text_batch(&[0.9, 0.5, 0.5]), "ice castle", Some(0.7), &tokenizer);

		assert_eq!(ids(&fused), vec!["doc0", "doc1", "doc2"]);
		assert!((fused[0].relevance - 0.63).abs() < 1e-6);
		assert!((fused[1].relevance - 0.35).abs() < 1e-6);
		assert!((fused[2].relevance - 0.35).abs() < 1e-6);
	}

	#[test]
	fn alpha_one_reproduces_vector_order() {
		let tokenizer = Tokenizer::english();
		let docs = vec![
			Document::new("low", "Glacier fortress", "", "ice ice ice castle", 0.2),
			Document::new("high", "Desert", "", "sand dunes", 0.9),
			Document::new("mid", "Swamp", "", "mud and reeds", 0.5),
		];
		let fused = fuse_search_results(docs, "ice castle", Some(1.0), &tokenizer);

		assert_eq!(ids(&fused), vec!["high", "mid", "low"]);
		assert_eq!(fused[0].relevance, 0.9);
	}

	#[test]
	fn alpha_zero_ranks_by_keywords() {
		let tokenizer = Tokenizer::english();
		let docs = vec![
			Document::new("desert", "Desert", "", "sand dunes", 0.9),
			Document::new("swamp", "Swamp", "", "mud and reeds", 0.5),
			Document::new("glacier", "Glacier fortress", "", "ice castle in the north", 0.1),
		];
		let fused = fuse_search_results(docs, "ice castle", Some(0.0), &tokenizer);

		assert_eq!(ids(&fused), vec!["glacier", "desert", "swamp"]);
		assert_eq!(fused[0].relevance, 1.0);
		assert_eq!(fused[1].relevance, 0.0);
		assert_eq!(fused[2].relevance, 0.0);
	}

	#[test]
	fn missing_alpha_weighs_both_signals_equally() {
		let tokenizer = Tokenizer::english();
		let docs = vec![
			Document::new("desert", "Desert", "", "sand dunes", 0.8),
			Document::new("swamp", "Swamp", "", "mud and reeds", 0.4),
			Document::new("glacier", "Glacier fortress", "", "ice castle in the north", 0.2),
		];
		let fused = fuse_search_results(docs, "ice castle", None, &tokenizer);

		assert_eq!(ids(&fused), vec!["glacier", "desert", "swamp"]);
		assert!((fused[0].relevance - 0.6).abs() < 1e-6);
		assert!((fused[1].relevance - 0.4).abs() < 1e-6);
		assert!((fused[2].relevance - 0.2).abs() < 1e-6);
	}

	#[test]
	fn raising_alpha_never_moves_away_from_vector_order() {
		let tokenizer = Tokenizer::english();
		let batch = || {
			vec![
				Document::new("a", "", "", "sand dunes", 0.9),
				Document::new("b", "", "", "mud and reeds", 0.8),
				Document::new("c", "", "", "storm peaks", 0.7),
				Document::new("d", "", "", "ice tower", 0.6),
				Document::new("e", "", "", "ice castle", 0.5),
				Document::new("f", "", "", "salt flats", 0.4),
			]
		};
		let vector_rank = |id: &str| batch().iter().position(|doc| doc.id == id);
		let inversions = |alpha: f32| {
			let ranks: Vec<Option<usize>> =
				fuse_search_results(batch(), "ice castle", Some(alpha), &tokenizer)
					.iter()
					.map(|doc| vector_rank(&doc.id))
					.collect();
			let mut count = 0;

			for (i, earlier) in ranks.iter().enumerate() {
				count += ranks[i + 1..].iter().filter(|later| later < &earlier).count();
			}

			count
		};
		let sweep: Vec<usize> = (0..=10).map(|step| inversions(step as f32 / 10.0)).collect();

		assert!(sweep[0] > 0, "keyword order should disagree with vector order");
		assert_eq!(sweep[10], 0);
		assert!(sweep.windows(2).all(|pair| pair[1] <= pair[0]), "inversions rose: {sweep:?}");
	}

	#[test]
	fn empty_batch_returns_empty() {
		let tokenizer = Tokenizer::english();

		assert!(FusionRetriever::new(&tokenizer, 0.5).fuse(Vec::new(), "anything").is_empty());
	}

	#[test]
	fn unbuilt_index_contributes_no_keyword_signal() {
		let tokenizer = Tokenizer::english();
		let indexer = Bm25Indexer::new(&tokenizer);
		let retriever = FusionRetriever::new(&tokenizer, 0.5);
		let fused =
			retriever.fuse_with_index(same_text_batch(&[0.4, 0.8]), "ice castle", &indexer);

		assert_eq!(ids(&fused), vec!["doc1", "doc0"]);
		assert!((fused[0].relevance - 0.4).abs() < 1e-6);
	}

	#[test]
	fn alpha_is_clamped() {
		let tokenizer = Tokenizer::english();

		assert_eq!(FusionRetriever::new(&tokenizer, 1.5).alpha(), 1.0);
		assert_eq!(FusionRetriever::new(&tokenizer, -2.0).alpha(), 0.0);
		assert_eq!(FusionRetriever::new(&tokenizer, f32::NAN).alpha(), DEFAULT_ALPHA);
	}
}
