//! Tag dictionary reads and replacement.

use serde::{Deserialize, Serialize};

use crate::{QuarryService, ServiceError, ServiceResult};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TagDictionary {
	pub tags: Vec<String>,
}

impl QuarryService {
	pub async fn tag_dictionary(&self) -> ServiceResult<TagDictionary> {
		let tags = self.tag_store.load_or_init().await?;

		Ok(TagDictionary { tags })
	}

	/// Replaces the dictionary wholesale. Order is preserved; duplicates
	/// are dropped keeping the first occurrence.
	pub async fn update_tag_dictionary(
		&self,
		dictionary: TagDictionary,
	) -> ServiceResult<TagDictionary> {
		let mut seen = std::collections::HashSet::new();
		let tags: Vec<String> = dictionary
			.tags
			.into_iter()
			.map(|tag| tag.trim().to_string())
			.filter(|tag| !tag.is_empty())
			.filter(|tag| seen.insert(tag.clone()))
			.collect();

		if tags.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Tag dictionary must contain at least one tag.".into(),
			});
		}

		self.tag_store.replace(&tags).await?;

		tracing::info!(count = tags.len(), "Tag dictionary replaced.");

		Ok(TagDictionary { tags })
	}
}
