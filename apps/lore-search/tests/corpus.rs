use std::path::PathBuf;

use lore_search::VectorSearch;
use lore_search_cli::corpus::CorpusIndex;

fn fixture(name: &str) -> PathBuf {
	PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[tokio::test]
async fn loads_fixture_and_ranks_nearest_first() {
	let index = CorpusIndex::load(&fixture("worlds.json")).expect("Failed to load corpus.");

	assert_eq!(index.len(), 3);

	let hits = index.search(&[1.0, 0.0, 0.0], 2).await.expect("search failed");

	assert_eq!(hits.len(), 2);
	assert_eq!(hits[0].id, "frostholm");
	assert!(hits.iter().all(|hit| (0.0..=1.0).contains(&hit.relevance)));
	assert!(hits[0].relevance >= hits[1].relevance);
}

#[test]
fn missing_corpus_file_is_an_error() {
	assert!(CorpusIndex::load(&fixture("missing.json")).is_err());
}
