use crate::extensions::Extensions;
use super::{Extras, Unclassified};

gl_enum!(MagFilter or None {
	Nearest = 9728,
	Linear = 9729,
});

gl_enum!(MinFilter or None {
	Nearest = 9728,
	Linear = 9729,
	NearestMipmapNearest = 9984,
	LinearMipmapNearest = 9985,
	NearestMipmapLinear = 9986,
	LinearMipmapLinear = 9987,
});

gl_enum!(WrapMode {
	ClampToEdge = 33071,
	MirroredRepeat = 33648,
	Repeat = 10497,
});

impl Default for WrapMode {
	fn default() -> Self {
		WrapMode::Repeat
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Texture {
	pub sampler: Option<usize>,
	pub source: Option<usize>,
	pub name: Option<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

/// Image data, either behind a uri or stored in a buffer view.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
	pub uri: Option<String>,
	pub mime_type: Option<String>,
	pub buffer_view: Option<usize>,
	pub name: Option<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sampler {
	#[serde(default)]
	pub mag_filter: MagFilter,
	#[serde(default)]
	pub min_filter: MinFilter,
	#[serde(default)]
	pub wrap_s: WrapMode,
	#[serde(default)]
	pub wrap_t: WrapMode,
	pub name: Option<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}
