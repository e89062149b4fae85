use std::path::PathBuf;

use crate::Result;

/// Written to a fresh deployment the first time the dictionary is needed.
pub const DEFAULT_TAGS: [&str; 27] = [
	"frontend",
	"backend",
	"javascript",
	"python",
	"react",
	"vue",
	"nodejs",
	"machine-learning",
	"artificial-intelligence",
	"data-science",
	"web-development",
	"mobile-development",
	"architecture",
	"microservices",
	"containers",
	"docker",
	"devops",
	"algorithms",
	"data-structures",
	"databases",
	"api",
	"graphql",
	"frameworks",
	"libraries",
	"tooling",
	"platforms",
	"ecosystems",
];

/// File-backed tag dictionary: a JSON array of unique tag strings. The
/// dictionary is read-mostly; updates replace the whole file atomically so a
/// concurrent reader sees either the old or the new dictionary, never a
/// partial write.
pub struct TagStore {
	path: PathBuf,
}
impl TagStore {
	pub fn new(path: PathBuf) -> Self {
		Self { path }
	}

	/// Loads the dictionary, writing the default set first if the file does
	/// not exist yet. A malformed file degrades to an empty dictionary with
	/// a log line rather than failing the request that needed it.
	pub async fn load_or_init(&self) -> Result<Vec<String>> {
		match tokio::fs::read_to_string(&self.path).await {
			Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
				Ok(tags) => Ok(tags),
				Err(err) => {
					tracing::warn!(
						error = %err,
						path = %self.path.display(),
						"Tag dictionary file is malformed.",
					);

					Ok(Vec::new())
				},
			},
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				let defaults: Vec<String> =
					DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect();

				self.replace(&defaults).await?;

				Ok(defaults)
			},
			Err(err) => Err(err.into()),
		}
	}

	/// Atomic whole-file replace: write a sibling temp file, then rename
	/// over the dictionary.
	pub async fn replace(&self, tags: &[String]) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}

		let temp_path = self.path.with_extension("json.tmp");
		let raw = serde_json::to_vec_pretty(&tags)?;

		tokio::fs::write(&temp_path, raw).await?;
		tokio::fs::rename(&temp_path, &self.path).await?;

		Ok(())
	}
}
