//! Free-text normalization shared by the keyword index and the query side.
//!
//! The linguistic tokenizer lowercases, segments on Unicode word boundaries, keeps purely
//! alphabetic words, drops English stop words, and reduces each word to its Snowball stem.
//! When no linguistic model is available for the configured language, the whitespace
//! tokenizer takes over: lowercase and split on whitespace, nothing else.

use std::{collections::HashSet, sync::LazyLock};

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

const MAX_STEM_PASSES: usize = 8;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
	[
		"a", "about", "above", "after", "again", "against", "all", "almost", "alone", "along",
		"already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
		"anyone", "anything", "are", "around", "as", "at", "be", "became", "because", "become",
		"been", "before", "being", "below", "between", "both", "but", "by", "can", "cannot",
		"could", "did", "do", "does", "doing", "done", "down", "during", "each", "either",
		"else", "enough", "even", "ever", "every", "few", "for", "from", "further", "get", "had",
		"has", "have", "having", "he", "hence", "her", "here", "hers", "herself", "him",
		"himself", "his", "how", "however", "i", "if", "in", "into", "is", "it", "its", "itself",
		"just", "least", "less", "made", "make", "many", "may", "me", "might", "more", "most",
		"much", "must", "my", "myself", "neither", "never", "no", "nor", "not", "nothing", "now",
		"of", "off", "often", "on", "once", "only", "or", "other", "others", "otherwise", "our",
		"ours", "ourselves", "out", "over", "own", "per", "perhaps", "please", "quite",
		"rather", "really", "same", "see", "seem", "seemed", "seems", "several", "she", "should",
		"since", "so", "some", "something", "still", "such", "than", "that", "the", "their",
		"theirs", "them", "themselves", "then", "there", "therefore", "these", "they", "this",
		"those", "though", "through", "thus", "to", "together", "too", "toward", "under",
		"until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what",
		"whatever", "when", "where", "whether", "which", "while", "who", "whoever", "whole",
		"whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you",
		"your", "yours", "yourself", "yourselves",
	]
	.into_iter()
	.collect()
});

/// Text normalizer producing content tokens.
///
/// Deterministic for identical input. Construct once and share by reference; the
/// linguistic variant owns its stemmer.
pub enum Tokenizer {
	Linguistic(Stemmer),
	Whitespace,
}
impl Tokenizer {
	pub fn english() -> Self {
		Self::Linguistic(Stemmer::create(Algorithm::English))
	}

	pub fn whitespace() -> Self {
		Self::Whitespace
	}

	/// Picks the linguistic tokenizer for `language`, or degrades to whitespace splitting
	/// when no model exists for it.
	pub fn for_language(language: Option<&str>) -> Self {
		match language.map(str::trim) {
			Some(lang) if lang.eq_ignore_ascii_case("english") || lang.eq_ignore_ascii_case("en") =>
				Self::english(),
			Some(lang) => {
				tracing::warn!(
					language = lang,
					"No linguistic model for language. Falling back to whitespace tokenization."
				);

				Self::Whitespace
			},
			None => {
				tracing::warn!(
					"No tokenizer language configured. Falling back to whitespace tokenization."
				);

				Self::Whitespace
			},
		}
	}

	pub fn is_linguistic(&self) -> bool {
		matches!(self, Self::Linguistic(_))
	}

	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let lowered = text.to_lowercase();

		match self {
			Self::Linguistic(stemmer) => {
				let mut out = Vec::new();

				for word in lowered.unicode_words() {
					if !word.chars().all(char::is_alphabetic) || STOP_WORDS.contains(word) {
						continue;
					}

					let stem = stem_to_fixpoint(stemmer, word);

					if stem.is_empty() || STOP_WORDS.contains(stem.as_str()) {
						continue;
					}

					out.push(stem);
				}

				out
			},
			Self::Whitespace => lowered.split_whitespace().map(str::to_string).collect(),
		}
	}
}
impl Default for Tokenizer {
	fn default() -> Self {
		Self::english()
	}
}
impl std::fmt::Debug for Tokenizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Linguistic(_) => f.write_str("Tokenizer::Linguistic"),
			Self::Whitespace => f.write_str("Tokenizer::Whitespace"),
		}
	}
}

/// Stems until the output stops changing, so a stem never stems further on re-tokenization.
fn stem_to_fixpoint(stemmer: &Stemmer, word: &str) -> String {
	let mut current = stemmer.stem(word).into_owned();

	for _ in 0..MAX_STEM_PASSES {
		let next = stemmer.stem(&current);

		if next.as_ref() == current.as_str() {
			break;
		}

		current = next.into_owned();
	}

	current
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn drops_stop_words_and_non_alphabetic_tokens() {
		let tokens = Tokenizer::english().tokenize("The 3 dragons of the North, 42nd realm!");

		assert_eq!(tokens, vec!["dragon", "north", "realm"]);
	}

	#[test]
	fn reduces_inflections_to_one_form() {
		let tokenizer = Tokenizer::english();

		assert_eq!(tokenizer.tokenize("castles"), tokenizer.tokenize("castle"));
		assert_eq!(tokenizer.tokenize("Running"), tokenizer.tokenize("runs"));
	}

	#[test]
	fn retokenizing_normalized_text_is_stable() {
		let tokenizer = Tokenizer::english();
		let first = tokenizer.tokenize("Frozen mountain dragons guarding ancient castles");
		let second = tokenizer.tokenize(&first.join(" "));

		assert_eq!(first, second);
	}

	#[test]
	fn stems_that_shrink_again_are_fully_reduced() {
		let tokenizer = Tokenizer::english();

		for text in [
			"agreed",
			"the villagers agreed on a generous feast",
			"generously",
			"conditional relational happiness",
			"organizational hopefulness",
		] {
			let first = tokenizer.tokenize(text);
			let second = tokenizer.tokenize(&first.join(" "));

			assert!(!first.is_empty(), "no tokens for {text:?}");
			assert_eq!(first, second, "unstable tokens for {text:?}");
		}
	}

	#[test]
	fn whitespace_fallback_only_lowercases_and_splits() {
		let tokens = Tokenizer::whitespace().tokenize("The Ice  Castle, 2nd");

		assert_eq!(tokens, vec!["the", "ice", "castle,", "2nd"]);
	}

	#[test]
	fn unsupported_language_degrades_to_whitespace() {
		assert!(!Tokenizer::for_language(Some("klingon")).is_linguistic());
		assert!(!Tokenizer::for_language(None).is_linguistic());
		assert!(Tokenizer::for_language(Some("English")).is_linguistic());
	}

	#[test]
	fn empty_text_yields_no_tokens() {
		assert!(Tokenizer::english().tokenize("").is_empty());
		assert!(Tokenizer::whitespace().tokenize("   ").is_empty());
	}
}
