//! Tag-aware semantic search.
//!
//! Retrieval pulls a wide candidate set from the vector index, then the
//! tag filters and ranking run in-process where they are cheap and easy to
//! test. Tag matching is case-insensitive substring containment: a filter
//! tag matches a chunk tag when the lowered filter appears inside the
//! lowered chunk tag.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use quarry_storage::vector::RetrievedChunk;

use crate::{QuarryService, ServiceError, ServiceResult};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchRequest {
	#[serde(default)]
	pub query: String,
	#[serde(default)]
	pub must_tags: Vec<String>,
	#[serde(default)]
	pub must_not_tags: Vec<String>,
	#[serde(default)]
	pub like_tags: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChunkInfo {
	pub chunk_index: i64,
	pub total_chunks: i64,
	pub metadata: serde_json::Value,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
	pub chunk_id: String,
	pub content: String,
	pub source: String,
	pub original_file: String,
	pub tags: Vec<String>,
	pub similarity: f32,
	pub like_score: usize,
	pub chunk_info: ChunkInfo,
}

#[derive(Clone, Debug, Serialize)]
pub struct TagRecommendation {
	pub tag: String,
	pub frequency: usize,
	pub eig: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
	pub results: Vec<SearchResult>,
	pub recommended_tags: Vec<TagRecommendation>,
	pub total_found: usize,
}

impl QuarryService {
	pub async fn search(&self, request: SearchRequest) -> ServiceResult<SearchResponse> {
		let vector = if request.query.trim().is_empty() {
			// Browse mode: a zero vector ranks nothing above anything, so
			// tag filters alone shape the result set.
			vec![0.; self.cfg.storage.vector.vector_dim as usize]
		} else {
			let vector = self
				.providers
				.embedding
				.embed(&self.cfg.providers.embedding, &request.query)
				.await?;

			if vector.len() != self.cfg.storage.vector.vector_dim as usize {
				return Err(ServiceError::Provider {
					message: format!(
						"Embedding dimension mismatch: expected {}, got {}.",
						self.cfg.storage.vector.vector_dim,
						vector.len()
					),
				});
			}

			vector
		};
		let candidates =
			self.vectors.search(vector, self.cfg.search.retrieval_top_k).await?;
		let mut results = filter_and_score(
			candidates,
			&request.must_tags,
			&request.must_not_tags,
			&request.like_tags,
		);

		rank(&mut results);
		results.truncate(self.cfg.search.rerank_top_k);

		let recommended_tags =
			recommend_tags(&results, self.cfg.search.recommended_tags_top_k);
		let total_found = results.len();

		Ok(SearchResponse { results, recommended_tags, total_found })
	}
}

/// The lowered filter tag as a substring of the lowered chunk tag.
fn tag_matches(filter_tag: &str, chunk_tag: &str) -> bool {
	chunk_tag.to_lowercase().contains(&filter_tag.to_lowercase())
}

fn has_tag(tags: &[String], filter_tag: &str) -> bool {
	tags.iter().any(|tag| tag_matches(filter_tag, tag))
}

/// Applies must/must-not filters and computes each survivor's like score:
/// the count of like tags matching at least one of its tags.
pub fn filter_and_score(
	candidates: Vec<RetrievedChunk>,
	must_tags: &[String],
	must_not_tags: &[String],
	like_tags: &[String],
) -> Vec<SearchResult> {
	candidates
		.into_iter()
		.filter(|chunk| must_tags.iter().all(|tag| has_tag(&chunk.tags, tag)))
		.filter(|chunk| !must_not_tags.iter().any(|tag| has_tag(&chunk.tags, tag)))
		.map(|chunk| {
			let like_score =
				like_tags.iter().filter(|tag| has_tag(&chunk.tags, tag)).count();

			SearchResult {
				chunk_id: chunk.chunk_id,
				content: chunk.content,
				source: chunk.source,
				original_file: chunk.original_file,
				tags: chunk.tags,
				similarity: chunk.similarity,
				like_score,
				chunk_info: ChunkInfo {
					chunk_index: chunk.chunk_index,
					total_chunks: chunk.total_chunks,
					metadata: chunk.metadata,
				},
			}
		})
		.collect()
}

/// Like score first, similarity second, both descending.
pub fn rank(results: &mut [SearchResult]) {
	results.sort_by(|a, b| {
		b.like_score.cmp(&a.like_score).then_with(|| {
			b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
		})
	});
}

/// Scores each tag seen in the results by its distance from covering half
/// of them, then returns the top scorers. Ties keep first-seen order.
pub fn recommend_tags(results: &[SearchResult], top_k: usize) -> Vec<TagRecommendation> {
	let total = results.len() as f64;
	let mut order = Vec::new();
	let mut frequency: HashMap<&str, usize> = HashMap::new();

	for result in results {
		for tag in &result.tags {
			if !frequency.contains_key(tag.as_str()) {
				order.push(tag.as_str());
			}

			*frequency.entry(tag.as_str()).or_insert(0) += 1;
		}
	}

	let mut recommendations: Vec<TagRecommendation> = order
		.into_iter()
		.map(|tag| TagRecommendation {
			tag: tag.into(),
			frequency: frequency[tag],
			eig: (frequency[tag] as f64 - total / 2.).abs(),
		})
		.collect();

	recommendations.sort_by(|a, b| {
		b.eig.partial_cmp(&a.eig).unwrap_or(std::cmp::Ordering::Equal)
	});
	recommendations.truncate(top_k);

	recommendations
}
