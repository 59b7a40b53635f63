pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid embedding: {message}")]
	InvalidEmbedding { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}

impl From<lore_providers::Error> for Error {
	fn from(err: lore_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
