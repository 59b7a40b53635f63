mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderKind, Providers, Search,
	SearchDartboard, SearchFusion, SearchPreprocess, SearchTokenizer, Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	for (label, kind, key) in [
		("embedding", cfg.providers.embedding.kind, &cfg.providers.embedding.api_key),
		("llm", cfg.providers.llm.kind, &cfg.providers.llm.api_key),
	] {
		if kind == ProviderKind::OpenAi && key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty for kind openai."),
			});
		}
	}

	let search = &cfg.search;

	if search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if search.candidate_k < search.top_k {
		return Err(Error::Validation {
			message: "search.candidate_k must be greater than or equal to search.top_k."
				.to_string(),
		});
	}

	for (label, alpha) in [
		("search.fusion.alpha", search.fusion.alpha),
		("search.fusion.standalone_alpha", search.fusion.standalone_alpha),
	] {
		if !alpha.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&alpha) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}
	for (label, weight) in [
		("search.dartboard.diversity_weight", search.dartboard.diversity_weight),
		("search.dartboard.relevance_weight", search.dartboard.relevance_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if !search.dartboard.sigma.is_finite() {
		return Err(Error::Validation {
			message: "search.dartboard.sigma must be a finite number.".to_string(),
		});
	}
	if search.dartboard.sigma <= 0.0 {
		return Err(Error::Validation {
			message: "search.dartboard.sigma must be greater than zero.".to_string(),
		});
	}
	if search.preprocess.content_word_threshold <= search.preprocess.max_passthrough_words {
		return Err(Error::Validation {
			message: "search.preprocess.content_word_threshold must be greater than search.preprocess.max_passthrough_words."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.search.tokenizer.language.as_deref().map(|lang| lang.trim().is_empty()).unwrap_or(false)
	{
		cfg.search.tokenizer.language = None;
	}
	if let Some(language) = cfg.search.tokenizer.language.as_mut() {
		*language = language.trim().to_lowercase();
	}
}
