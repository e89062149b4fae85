use std::time::Duration;

use color_eyre::Result;
use reqwest::Client;
use serde_json::Value;

pub const MAX_TAGS_PER_CHUNK: usize = 8;

const CONTENT_PREFIX_CHARS: usize = 1000;
const MAX_RESPONSE_TOKENS: u32 = 200;

/// Selects tags for a chunk from the supplied dictionary. Infallible by
/// contract: transport errors and model output that is not a clean JSON
/// array of dictionary members degrade to an empty tag set with a log line,
/// never an error.
pub async fn select_tags(
	cfg: &quarry_config::LlmProviderConfig,
	content: &str,
	dictionary: &[String],
) -> Vec<String> {
	match request_tags(cfg, content, dictionary).await {
		Ok(raw) => parse_tag_array(&raw, dictionary),
		Err(err) => {
			tracing::warn!(error = %err, "Tag selection request failed.");

			Vec::new()
		},
	}
}

async fn request_tags(
	cfg: &quarry_config::LlmProviderConfig,
	content: &str,
	dictionary: &[String],
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let prompt = build_prompt(content, dictionary);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": MAX_RESPONSE_TOKENS,
		"messages": [
			{ "role": "user", "content": prompt }
		],
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	crate::completion_content(&json)
}

fn build_prompt(content: &str, dictionary: &[String]) -> String {
	let prefix: String = content.chars().take(CONTENT_PREFIX_CHARS).collect();
	let dictionary_json =
		serde_json::to_string(dictionary).unwrap_or_else(|_| "[]".to_string());

	format!(
		"\
Based on the following content, select the most relevant tags from the provided tag dictionary.
Return only the selected tags as a JSON array, maximum {MAX_TAGS_PER_CHUNK} tags.

Content: {prefix}...

Tag Dictionary: {dictionary_json}

Response format: [\"tag1\", \"tag2\", \"tag3\"]
IMPORTANT: Only return the JSON array. Do not include any other text, explanation, or markdown code block fences (```json)."
	)
}

/// Parsing policy: take the substring between the first `[` and the last
/// `]` and parse only that as JSON. Anything that is not a list of strings
/// yields an empty set. Tags not present verbatim in the dictionary are
/// dropped; at most [`MAX_TAGS_PER_CHUNK`] survive.
fn parse_tag_array(raw: &str, dictionary: &[String]) -> Vec<String> {
	let Some(start) = raw.find('[') else {
		return Vec::new();
	};
	let Some(end) = raw.rfind(']') else {
		return Vec::new();
	};

	if end <= start {
		return Vec::new();
	}

	let parsed: Value = match serde_json::from_str(&raw[start..=end]) {
		Ok(value) => value,
		Err(_) => return Vec::new(),
	};
	let Some(items) = parsed.as_array() else {
		return Vec::new();
	};
	let mut tags = Vec::new();

	for item in items {
		let Some(tag) = item.as_str() else {
			return Vec::new();
		};

		tags.push(tag.to_string());
	}

	tags.retain(|tag| dictionary.contains(tag));
	tags.truncate(MAX_TAGS_PER_CHUNK);

	tags
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dictionary() -> Vec<String> {
		["rust", "search", "infra", "a", "b", "c", "d", "e", "f", "g"]
			.iter()
			.map(|s| s.to_string())
			.collect()
	}

	#[test]
	fn parses_clean_array() {
		assert_eq!(parse_tag_array(r#"["rust", "search"]"#, &dictionary()), vec![
			"rust".to_string(),
			"search".to_string()
		]);
	}

	#[test]
	fn parses_prose_wrapped_array() {
		let raw = "Sure! Here are the tags:\n```json\n[\"rust\"]\n```\nHope that helps.";

		assert_eq!(parse_tag_array(raw, &dictionary()), vec!["rust".to_string()]);
	}

	#[test]
	fn malformed_json_yields_empty() {
		assert!(parse_tag_array("[not json at all", &dictionary()).is_empty());
		assert!(parse_tag_array("] backwards [", &dictionary()).is_empty());
		assert!(parse_tag_array("no brackets here", &dictionary()).is_empty());
	}

	#[test]
	fn non_string_elements_yield_empty() {
		assert!(parse_tag_array(r#"["rust", 42]"#, &dictionary()).is_empty());
		assert!(parse_tag_array(r#"[{"tag": "rust"}]"#, &dictionary()).is_empty());
	}

	#[test]
	fn bracket_extraction_recovers_nested_array() {
		assert_eq!(parse_tag_array(r#"{"tags": ["rust"]}"#, &dictionary()), vec![
			"rust".to_string()
		]);
	}

	#[test]
	fn drops_tags_outside_the_dictionary() {
		let tags = parse_tag_array(r#"["rust", "Rust", "unknown", "search"]"#, &dictionary());

		assert_eq!(tags, vec!["rust".to_string(), "search".to_string()]);
	}

	#[test]
	fn caps_at_eight_tags() {
		let raw = r#"["a", "b", "c", "d", "e", "f", "g", "rust", "search"]"#;
		let tags = parse_tag_array(raw, &dictionary());

		assert_eq!(tags.len(), MAX_TAGS_PER_CHUNK);
	}

	#[test]
	fn prompt_truncates_long_content() {
		let content = "z".repeat(5000);
		let prompt = build_prompt(&content, &dictionary());

		assert!(prompt.chars().filter(|c| *c == 'z').count() == CONTENT_PREFIX_CHARS);
	}
}
