use std::time::Duration;

use base64::Engine;
use color_eyre::Result;
use reqwest::Client;
use serde_json::Value;

const MAX_RESPONSE_TOKENS: u32 = 500;

/// Asks a vision-capable model to describe one image. The image travels as a
/// base64 data URL next to the prompt. Per-image failure isolation is the
/// pipeline's job; this adapter surfaces errors.
pub async fn describe(
	cfg: &quarry_config::LlmProviderConfig,
	prompt: &str,
	image_name: &str,
	image_data: &[u8],
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let media_type = quarry_extract::media_type_for(image_name);
	let encoded = base64::engine::general_purpose::STANDARD.encode(image_data);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": MAX_RESPONSE_TOKENS,
		"messages": [
			{
				"role": "user",
				"content": [
					{ "type": "text", "text": prompt },
					{
						"type": "image_url",
						"image_url": {
							"url": format!("data:{media_type};base64,{encoded}")
						}
					}
				]
			}
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
