pub mod corpus;

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use corpus::CorpusIndex;
use lore_search::{Document, SearchRequest, SearchService};

#[derive(Debug, Parser)]
#[command(
	version = lore_cli::VERSION,
	rename_all = "kebab",
	styles = lore_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Rank a JSON corpus against a query.
	Search(SearchArgs),
	/// Print the embedding of a query or a piece of content.
	Embed(EmbedArgs),
}

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
	/// JSON array of documents with embeddings.
	#[arg(long, value_name = "FILE")]
	pub corpus: PathBuf,
	#[arg(long, short = 'q')]
	pub query: String,
	#[arg(long, value_name = "N")]
	pub top_k: Option<u32>,
	#[arg(long, value_name = "ALPHA")]
	pub alpha: Option<f32>,
	#[arg(long, value_name = "WEIGHT")]
	pub diversity_weight: Option<f32>,
	#[arg(long, value_name = "WEIGHT")]
	pub relevance_weight: Option<f32>,
	/// Skip diversity reranking and weigh both signals equally unless --alpha is set.
	#[arg(long)]
	pub fusion_only: bool,
}
impl From<SearchArgs> for SearchRequest {
	fn from(args: SearchArgs) -> Self {
		Self {
			query: args.query,
			top_k: args.top_k,
			alpha: args.alpha,
			diversity_weight: args.diversity_weight,
			relevance_weight: args.relevance_weight,
		}
	}
}

#[derive(Debug, clap::Args)]
pub struct EmbedArgs {
	#[arg(long)]
	pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
	pub rank: usize,
	pub id: String,
	pub title: String,
	pub theme: String,
	pub relevance: f32,
}
impl SearchHit {
	fn new(rank: usize, doc: Document) -> Self {
		Self { rank, id: doc.id, title: doc.title, theme: doc.theme, relevance: doc.relevance }
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = lore_config::load(&args.config)?;

	init_tracing(&config.service.log_level);

	match args.command {
		Command::Search(search) => {
			let index = CorpusIndex::load(&search.corpus)?;

			tracing::info!(
				documents = index.len(),
				corpus = %search.corpus.display(),
				"Corpus loaded."
			);

			let service = SearchService::new(config, Arc::new(index));
			let fusion_only = search.fusion_only;
			let req = SearchRequest::from(search);
			let results =
				if fusion_only { service.fuse_search(req).await? } else { service.search(req).await? };
			let hits: Vec<SearchHit> = results
				.into_iter()
				.enumerate()
				.map(|(idx, doc)| SearchHit::new(idx + 1, doc))
				.collect();

			println!("{}", serde_json::to_string_pretty(&hits)?);
		},
		Command::Embed(embed) => {
			let service = SearchService::new(config, Arc::new(CorpusIndex::default()));
			let vector = service.embed_text(&embed.text).await?;

			println!("{}", serde_json::to_string(&vector)?);
		},
	}

	Ok(())
}

fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
