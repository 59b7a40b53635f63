use std::{fs, path::Path};

use lore_search::{BoxFuture, Document, Error, VectorSearch, fusion::cmp_f32_desc};

/// In-memory brute-force cosine index over a JSON corpus of embedded documents.
#[derive(Debug, Default)]
pub struct CorpusIndex {
	documents: Vec<Document>,
}
impl CorpusIndex {
	pub fn load(path: &Path) -> color_eyre::Result<Self> {
		let raw = fs::read_to_string(path)?;
		let documents: Vec<Document> = serde_json::from_str(&raw)?;

		Ok(Self::from_documents(documents))
	}

	/// Documents without embeddings cannot be searched and are dropped.
	pub fn from_documents(documents: Vec<Document>) -> Self {
		let total = documents.len();
		let documents: Vec<Document> =
			documents.into_iter().filter(|doc| doc.embedding.is_some()).collect();

		if documents.len() < total {
			tracing::warn!(
				skipped = total - documents.len(),
				"Corpus documents without embeddings were skipped."
			);
		}

		Self { documents }
	}

	pub fn len(&self) -> usize {
		self.documents.len()
	}

	pub fn is_empty(&self) -> bool {
		self.documents.is_empty()
	}

	fn nearest(&self, embedding: &[f32], limit: usize) -> lore_search::Result<Vec<Document>> {
		let mut hits = Vec::with_capacity(self.documents.len());

		for doc in &self.documents {
			let Some(vector) = doc.embedding.as_deref() else {
				continue;
			};

			if vector.len() != embedding.len() {
				return Err(Error::InvalidEmbedding {
					message: format!(
						"Corpus document {} has dimension {}, query has {}.",
						doc.id,
						vector.len(),
						embedding.len()
					),
				});
			}

			let mut hit = doc.clone();

			hit.relevance = cosine_similarity(embedding, vector).clamp(0.0, 1.0);

			hits.push(hit);
		}

		hits.sort_by(|a, b| cmp_f32_desc(a.relevance, b.relevance));
		hits.truncate(limit);

		Ok(hits)
	}
}
impl VectorSearch for CorpusIndex {
	fn search<'a>(
		&'a self,
		embedding: &'a [f32],
		limit: usize,
	) -> BoxFuture<'a, lore_search::Result<Vec<Document>>> {
		Box::pin(async move { self.nearest(embedding, limit) })
	}
}

fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> f32 {
	let mut dot = 0.0_f64;
	let mut lhs_norm = 0.0_f64;
	let mut rhs_norm = 0.0_f64;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		let (l, r) = (f64::from(*l), f64::from(*r));

		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm == 0.0 || rhs_norm == 0.0 {
		return 0.0;
	}

	(dot / (lhs_norm.sqrt() * rhs_norm.sqrt())) as f32
}
