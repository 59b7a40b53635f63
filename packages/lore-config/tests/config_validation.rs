use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use lore_config::{Config, Error, ProviderKind};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_with(section: &[&str], key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{name}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("lore_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> lore_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = lore_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation(payload: String, needle: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");
	assert!(message.contains(needle), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads() {
	let cfg = load_payload(SAMPLE_CONFIG_TOML.to_string()).expect("Sample config must load.");

	assert_eq!(cfg.providers.embedding.kind, ProviderKind::OpenAi);
	assert_eq!(cfg.providers.llm.kind, ProviderKind::Ollama);
	assert_eq!(cfg.search.fusion.alpha, 0.7);
	assert_eq!(cfg.search.fusion.standalone_alpha, 0.5);
	assert_eq!(cfg.search.tokenizer.language.as_deref(), Some("english"));
}

#[test]
fn search_section_is_optional() {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse config.");

	root.as_table_mut().expect("Sample config must be a table.").remove("search");

	let payload = toml::to_string(&root).expect("Failed to render config.");
	let cfg = load_payload(payload).expect("Config without [search] must load.");

	assert_eq!(cfg.search.top_k, 10);
	assert_eq!(cfg.search.candidate_k, 50);
	assert_eq!(cfg.search.dartboard.sigma, 0.1);
	assert_eq!(cfg.search.preprocess.max_passthrough_words, 2);
}

#[test]
fn alpha_must_be_in_unit_range() {
	expect_validation(
		sample_with(&["search", "fusion"], "alpha", Value::Float(1.5)),
		"search.fusion.alpha must be in the range 0.0-1.0.",
	);
}

#[test]
fn standalone_alpha_must_be_in_unit_range() {
	expect_validation(
		sample_with(&["search", "fusion"], "standalone_alpha", Value::Float(-0.1)),
		"search.fusion.standalone_alpha must be in the range 0.0-1.0.",
	);
}

#[test]
fn sigma_must_be_positive() {
	expect_validation(
		sample_with(&["search", "dartboard"], "sigma", Value::Float(0.0)),
		"search.dartboard.sigma must be greater than zero.",
	);
}

#[test]
fn diversity_weight_must_not_be_negative() {
	expect_validation(
		sample_with(&["search", "dartboard"], "diversity_weight", Value::Float(-1.0)),
		"search.dartboard.diversity_weight must be zero or greater.",
	);
}

#[test]
fn candidate_k_must_cover_top_k() {
	expect_validation(
		sample_with(&["search"], "candidate_k", Value::Integer(5)),
		"search.candidate_k must be greater than or equal to search.top_k.",
	);
}

#[test]
fn openai_provider_requires_api_key() {
	expect_validation(
		sample_with(&["providers", "embedding"], "api_key", Value::String("  ".to_string())),
		"Provider embedding api_key must be non-empty for kind openai.",
	);
}

#[test]
fn ollama_provider_allows_empty_api_key() {
	let payload = sample_with(&["providers", "llm"], "api_key", Value::String(String::new()));

	load_payload(payload).expect("Ollama providers do not need an api_key.");
}

#[test]
fn unknown_provider_kind_is_a_parse_error() {
	let payload =
		sample_with(&["providers", "llm"], "kind", Value::String("anthropic".to_string()));
	let err = load_payload(payload).expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error kind: {err:?}");
}

#[test]
fn blank_tokenizer_language_selects_fallback() {
	let payload =
		sample_with(&["search", "tokenizer"], "language", Value::String("   ".to_string()));
	let cfg = load_payload(payload).expect("Blank language must load.");

	assert!(cfg.search.tokenizer.language.is_none());
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("lore_config_test_missing.toml");
	let err = lore_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
	assert!(err.to_string().contains("lore_config_test_missing.toml"));
}
