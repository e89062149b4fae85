mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, Config, Data, EmbeddingProviderConfig, Ingest, LlmProviderConfig, Providers, Search,
	Security, Service, Storage, Vector,
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
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.vector.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.vector.collection must be non-empty.".to_string(),
		});
	}
	if cfg.storage.vector.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.vector.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.vector.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.vector.vector_dim."
				.to_string(),
		});
	}
	if cfg.chunking.chunk_size == 0 {
		return Err(Error::Validation {
			message: "chunking.chunk_size must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.chunk_overlap >= cfg.chunking.chunk_size {
		return Err(Error::Validation {
			message: "chunking.chunk_overlap must be less than chunking.chunk_size.".to_string(),
		});
	}
	if cfg.search.retrieval_top_k == 0 {
		return Err(Error::Validation {
			message: "search.retrieval_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.rerank_top_k == 0 {
		return Err(Error::Validation {
			message: "search.rerank_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.recommended_tags_top_k == 0 {
		return Err(Error::Validation {
			message: "search.recommended_tags_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.max_file_size == 0 {
		return Err(Error::Validation {
			message: "ingest.max_file_size must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.pandoc_bin.trim().is_empty() {
		return Err(Error::Validation {
			message: "ingest.pandoc_bin must be non-empty.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
		("vision", &cfg.providers.vision.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	for (label, token) in [
		("security.admin_token", &cfg.security.admin_token),
		("security.user_token", &cfg.security.user_token),
	] {
		if token.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.security.admin_token == cfg.security.user_token {
		return Err(Error::Validation {
			message: "security.admin_token and security.user_token must differ.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for ext in &mut cfg.ingest.allowed_extensions {
		let lowered = ext.trim().to_lowercase();

		*ext = if lowered.starts_with('.') { lowered } else { format!(".{lowered}") };
	}
	if cfg.chunking.separators.is_empty() {
		cfg.chunking.separators =
			["\n\n", "\n", "\u{3002}", ".", " "].iter().map(|s| s.to_string()).collect();
	}
}
