//! Recursive character text splitter.
//!
//! Text is broken along a prioritized separator list into pieces no longer
//! than the configured chunk size, then pieces are merged back into chunks
//! with a fixed character overlap taken from the tail of the previous chunk.
//! The size limit wins over the overlap: when the next piece is longer than
//! `chunk_size - chunk_overlap`, the carried overlap shrinks to
//! `chunk_size - piece length` so the merged chunk still fits. Lengths are
//! measured in characters, not bytes.

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub chunk_size: usize,
	pub chunk_overlap: usize,
	pub separators: Vec<String>,
}

pub fn split_text(text: &str, cfg: &ChunkingConfig) -> Vec<String> {
	if text.is_empty() {
		return Vec::new();
	}

	let pieces = split_pieces(text, &cfg.separators, cfg.chunk_size);
	let mut chunks = Vec::new();
	let mut current = String::new();
	let mut current_len = 0_usize;
	// Characters at the head of `current` carried over from the previous
	// chunk. A chunk is only emitted once it holds content beyond them.
	let mut carried = 0_usize;

	for piece in pieces {
		let piece_len = char_len(&piece);

		if current_len > carried && current_len + piece_len > cfg.chunk_size {
			chunks.push(current.clone());

			let keep = cfg.chunk_overlap.min(cfg.chunk_size.saturating_sub(piece_len));

			current = tail_chars(&current, keep);
			carried = char_len(&current);
			current_len = carried;
		}

		current.push_str(&piece);
		current_len += piece_len;
	}

	if current_len > carried {
		chunks.push(current);
	}

	chunks
}

/// Breaks `text` into pieces of at most `chunk_size` characters, trying each
/// separator in priority order. An empty-string separator requests a
/// character-level split; a piece that is still oversized once every
/// separator is exhausted is atomic and stays whole. Separators stay attached
/// to the piece they terminate, so concatenating the pieces reproduces
/// `text`.
fn split_pieces(text: &str, separators: &[String], chunk_size: usize) -> Vec<String> {
	if char_len(text) <= chunk_size {
		return vec![text.to_string()];
	}

	let Some((separator, rest)) = separators.split_first() else {
		return vec![text.to_string()];
	};

	if separator.is_empty() {
		return hard_split(text, chunk_size);
	}

	let parts = split_after_separator(text, separator);

	if parts.len() == 1 {
		return split_pieces(text, rest, chunk_size);
	}

	let mut pieces = Vec::new();

	for part in parts {
		if char_len(part) <= chunk_size {
			pieces.push(part.to_string());
		} else {
			pieces.extend(split_pieces(part, rest, chunk_size));
		}
	}

	pieces
}

fn split_after_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
	let mut parts = Vec::new();
	let mut start = 0_usize;

	for (pos, matched) in text.match_indices(separator) {
		let end = pos + matched.len();

		parts.push(&text[start..end]);

		start = end;
	}

	if start < text.len() {
		parts.push(&text[start..]);
	}

	parts
}

fn hard_split(text: &str, chunk_size: usize) -> Vec<String> {
	let chars: Vec<char> = text.chars().collect();

	chars.chunks(chunk_size.max(1)).map(|window| window.iter().collect()).collect()
}

fn char_len(text: &str) -> usize {
	text.chars().count()
}

fn tail_chars(text: &str, count: usize) -> String {
	let total = char_len(text);

	text.chars().skip(total.saturating_sub(count)).collect()
}
