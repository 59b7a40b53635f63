use serde::{Deserialize, Serialize};

/// One candidate result for one query.
///
/// `relevance` starts as the vector-similarity score from the vector search collaborator and
/// is overwritten in place by fusion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
	#[serde(default)]
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub theme: String,
	#[serde(default)]
	pub body: String,
	#[serde(default)]
	pub relevance: f32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub embedding: Option<Vec<f32>>,
}
impl Document {
	pub fn new(
		id: impl Into<String>,
		title: impl Into<String>,
		theme: impl Into<String>,
		body: impl Into<String>,
		relevance: f32,
	) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			theme: theme.into(),
			body: body.into(),
			relevance,
			embedding: None,
		}
	}

	pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
		self.embedding = Some(embedding);

		self
	}

	/// Text fields scored by the keyword index, concatenated.
	pub fn keyword_text(&self) -> String {
		format!("{} {} {}", self.title, self.theme, self.body)
	}
}
