// crates.io
use clap::Parser;
// self
use lore_search_cli::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	lore_search_cli::run(args).await
}
