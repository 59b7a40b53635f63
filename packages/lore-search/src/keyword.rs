//! Ephemeral Okapi BM25 index over one candidate batch.
//!
//! The index is small (tens of documents) and lives only as long as the batch it was built
//! from. Scores are raw BM25 magnitudes in document order; normalization belongs to fusion.

use std::collections::HashMap;

use crate::{document::Document, tokenizer::Tokenizer};

/// Term-frequency saturation.
pub const BM25_K1: f32 = 1.5;
/// Length normalization.
pub const BM25_B: f32 = 0.75;
/// Floor for negative IDF values, as a fraction of the average IDF.
pub const BM25_EPSILON: f32 = 0.25;

#[derive(Debug)]
struct Bm25Index {
	doc_freqs: Vec<HashMap<String, u32>>,
	doc_lengths: Vec<usize>,
	avg_doc_length: f32,
	idf: HashMap<String, f32>,
}
impl Bm25Index {
	fn new(corpus: Vec<Vec<String>>) -> Self {
		let mut doc_freqs = Vec::with_capacity(corpus.len());
		let mut doc_lengths = Vec::with_capacity(corpus.len());
		let mut containing: HashMap<String, u32> = HashMap::new();
		let mut total_length = 0_usize;

		for tokens in corpus {
			let mut frequencies: HashMap<String, u32> = HashMap::new();

			total_length += tokens.len();
			doc_lengths.push(tokens.len());

			for token in tokens {
				*frequencies.entry(token).or_insert(0) += 1;
			}
			for term in frequencies.keys() {
				*containing.entry(term.clone()).or_insert(0) += 1;
			}

			doc_freqs.push(frequencies);
		}

		let corpus_size = doc_freqs.len() as f32;
		let avg_doc_length =
			if doc_freqs.is_empty() { 0.0 } else { total_length as f32 / corpus_size };
		let mut idf = HashMap::with_capacity(containing.len());
		let mut idf_sum = 0.0_f32;
		let mut negative = Vec::new();

		for (term, df) in containing {
			let df = df as f32;
			let value = (corpus_size - df + 0.5).ln() - (df + 0.5).ln();

			idf_sum += value;

			if value < 0.0 {
				negative.push(term.clone());
			}

			idf.insert(term, value);
		}

		if !idf.is_empty() {
			let floor = BM25_EPSILON * (idf_sum / idf.len() as f32);

			for term in negative {
				idf.insert(term, floor);
			}
		}

		Self { doc_freqs, doc_lengths, avg_doc_length, idf }
	}

	fn scores(&self, query_tokens: &[String]) -> Vec<f32> {
		let mut scores = vec![0.0_f32; self.doc_freqs.len()];

		for token in query_tokens {
			let Some(idf) = self.idf.get(token).copied() else { continue };

			for (doc_idx, frequencies) in self.doc_freqs.iter().enumerate() {
				let Some(tf) = frequencies.get(token).copied() else { continue };
				let tf = tf as f32;
				let length_ratio = self.doc_lengths[doc_idx] as f32 / self.avg_doc_length;
				let saturation =
					(tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * length_ratio));

				scores[doc_idx] += idf * saturation;
			}
		}

		scores
	}
}

/// Builds and queries a keyword index for one candidate batch.
///
/// Rebuilding replaces the previous index; an indexer never mixes batches.
#[derive(Debug)]
pub struct Bm25Indexer<'t> {
	tokenizer: &'t Tokenizer,
	index: Option<Bm25Index>,
	document_count: usize,
}
impl<'t> Bm25Indexer<'t> {
	pub fn new(tokenizer: &'t Tokenizer) -> Self {
		Self { tokenizer, index: None, document_count: 0 }
	}

	/// Convenience for `new` followed by `build_index`.
	pub fn build(tokenizer: &'t Tokenizer, documents: &[Document]) -> Self {
		let mut indexer = Self::new(tokenizer);

		indexer.build_index(documents);

		indexer
	}

	pub fn build_index(&mut self, documents: &[Document]) {
		let corpus = documents
			.iter()
			.map(|doc| {
				let text = doc.keyword_text();

				tracing::debug!(document_id = %doc.id, text_len = text.len(), "Indexing document.");

				self.tokenizer.tokenize(&text)
			})
			.collect();

		self.index = Some(Bm25Index::new(corpus));
		self.document_count = documents.len();

		tracing::info!(documents = documents.len(), "Built BM25 index.");
	}

	pub fn is_built(&self) -> bool {
		self.index.is_some()
	}

	/// Number of documents in the current index.
	pub fn len(&self) -> usize {
		self.document_count
	}

	pub fn is_empty(&self) -> bool {
		self.document_count == 0
	}

	/// One raw score per indexed document, in indexing order. Empty when no index exists.
	pub fn get_scores(&self, query: &str) -> Vec<f32> {
		let Some(index) = self.index.as_ref() else {
			tracing::warn!("BM25 index not built. Returning no keyword scores.");

			return Vec::new();
		};
		let query_tokens = self.tokenizer.tokenize(query);

		tracing::debug!(?query_tokens, "Scoring query against BM25 index.");

		index.scores(&query_tokens)
	}
}
