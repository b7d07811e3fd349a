use crate::glb::DEFAULT_MAX_CONTAINER_LEN;

/// Knobs for a load session.
///
/// Every field has a default so a config file only needs the ones it changes.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ImportOptions {
	/// Largest declared `.glb` length that is accepted.
	pub max_container_len: u64,
	/// Run document validation and report its findings.
	pub validate: bool,
	/// Resolve meshes on the rayon thread pool.
	pub parallel: bool,
	/// Reject sparse indices that are not strictly increasing.
	pub strict_sparse_order: bool,
	/// Fetch buffers behind non-data uris through the byte source.
	pub load_external: bool,
	/// Build [crate::mesh::MeshData] for every mesh while importing.
	pub resolve_meshes: bool,
}

impl Default for ImportOptions {
	fn default() -> Self {
		Self {
			max_container_len: DEFAULT_MAX_CONTAINER_LEN,
			validate: true,
			parallel: true,
			strict_sparse_order: true,
			load_external: true,
			resolve_meshes: true,
		}
	}
}

impl ImportOptions {
	pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
		ron::from_str(text)
	}
}
