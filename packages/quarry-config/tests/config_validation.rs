use toml::Value;

use quarry_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = r#"
[service]
http_bind = "127.0.0.1:8000"
log_level = "info"

[storage.vector]
url        = "http://127.0.0.1:6334"
collection = "quarry_chunks"
vector_dim = 1024

[storage.data]
base_dir = "data"

[providers.embedding]
api_base   = "http://127.0.0.1:9000"
api_key    = "test-key"
path       = "/v1/embeddings"
model      = "text-embedding-v3"
dimensions = 1024
timeout_ms = 30000

[providers.llm]
api_base    = "http://127.0.0.1:9000"
api_key     = "test-key"
path        = "/v1/chat/completions"
model       = "tagging-llm"
temperature = 0.3
timeout_ms  = 30000

[providers.vision]
api_base    = "http://127.0.0.1:9000"
api_key     = "test-key"
path        = "/v1/chat/completions"
model       = "vision-llm"
temperature = 0.3
timeout_ms  = 60000

[chunking]
chunk_size    = 1000
chunk_overlap = 200
separators    = ["\n\n", "\n", "。", ".", " "]

[search]
retrieval_top_k        = 10
rerank_top_k           = 5
recommended_tags_top_k = 15

[ingest]
max_file_size      = 52428800
pandoc_bin         = "pandoc"
allowed_extensions = [".txt", ".md", ".docx", "PDF"]

[security]
admin_token = "admin-token"
user_token  = "user-token"
"#;

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

fn parse(value: Value) -> Result<Config, Error> {
	let raw = toml::to_string(&value).expect("Failed to render sample config.");
	let cfg: Config = toml::from_str(&raw).expect("Failed to deserialize sample config.");

	quarry_config::validate(&cfg).map(|()| cfg)
}

fn set(value: &mut Value, path: &[&str], new: Value) {
	let mut current = value;

	for key in &path[..path.len() - 1] {
		current = current
			.as_table_mut()
			.and_then(|table| table.get_mut(*key))
			.expect("Sample config is missing a table.");
	}

	current
		.as_table_mut()
		.expect("Sample config leaf parent is not a table.")
		.insert(path[path.len() - 1].to_string(), new);
}

#[test]
fn accepts_sample_config() {
	assert!(parse(sample_value()).is_ok());
}

#[test]
fn rejects_dimension_mismatch() {
	let mut value = sample_value();

	set(&mut value, &["providers", "embedding", "dimensions"], Value::Integer(768));

	let err = parse(value).unwrap_err();

	assert!(err.to_string().starts_with("Invalid config:"));
	assert!(err.to_string().contains("dimensions"));
}

#[test]
fn rejects_overlap_not_below_chunk_size() {
	let mut value = sample_value();

	set(&mut value, &["chunking", "chunk_overlap"], Value::Integer(1000));

	assert!(parse(value).is_err());
}

#[test]
fn rejects_empty_api_key() {
	let mut value = sample_value();

	set(&mut value, &["providers", "llm", "api_key"], Value::String(" ".to_string()));

	let err = parse(value).unwrap_err();

	assert!(err.to_string().contains("api_key"));
}

#[test]
fn rejects_identical_tokens() {
	let mut value = sample_value();

	set(&mut value, &["security", "user_token"], Value::String("admin-token".to_string()));

	assert!(parse(value).is_err());
}

#[test]
fn rejects_zero_rerank_top_k() {
	let mut value = sample_value();

	set(&mut value, &["search", "rerank_top_k"], Value::Integer(0));

	assert!(parse(value).is_err());
}

#[test]
fn load_normalizes_extensions() {
	let dir = std::env::temp_dir().join(format!("quarry-config-test-{}", std::process::id()));

	std::fs::create_dir_all(&dir).expect("Failed to create temp dir.");

	let path = dir.join("config.toml");

	std::fs::write(&path, SAMPLE_CONFIG_TOML).expect("Failed to write sample config.");

	let cfg = quarry_config::load(&path).expect("Failed to load sample config.");

	assert!(cfg.ingest.allowed_extensions.contains(&".pdf".to_string()));

	std::fs::remove_dir_all(&dir).ok();
}
