use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Embeds one text. A chunk without an embedding cannot be indexed, so any
/// failure here (transport, malformed response, wrong dimensionality) is a
/// hard error the caller must handle.
pub async fn embed(cfg: &quarry_config::EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": [text],
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let vector = parse_embedding_response(&json)?;

	if vector.len() != cfg.dimensions as usize {
		return Err(eyre::eyre!(
			"Embedding dimension {} does not match configured dimensions {}.",
			vector.len(),
			cfg.dimensions
		));
	}

	Ok(vector)
}

fn parse_embedding_response(json: &Value) -> Result<Vec<f32>> {
	let embedding = json
		.get("data")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|item| item.get("embedding"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding response is missing an embedding array."))?;
	let mut vector = Vec::with_capacity(embedding.len());

	for value in embedding {
		let number =
			value.as_f64().ok_or_else(|| eyre::eyre!("Embedding value must be numeric."))?;

		vector.push(number as f32);
	}

	Ok(vector)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_first_embedding() {
		let json = serde_json::json!({
			"data": [
				{ "index": 0, "embedding": [0.5, 1.5, -2.0] }
			]
		});
		let parsed = parse_embedding_response(&json).expect("parse failed");

		assert_eq!(parsed, vec![0.5, 1.5, -2.0]);
	}

	#[test]
	fn rejects_non_numeric_values() {
		let json = serde_json::json!({
			"data": [
				{ "embedding": [0.5, "oops"] }
			]
		});

		assert!(parse_embedding_response(&json).is_err());
	}

	#[test]
	fn rejects_missing_data() {
		assert!(parse_embedding_response(&serde_json::json!({})).is_err());
	}
}
