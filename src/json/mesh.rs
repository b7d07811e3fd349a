use std::collections::BTreeMap;

use crate::extensions::{DracoMeshCompression, Extensions, KhrMaterialsVariants, VariantMapping, KHR_DRACO_MESH_COMPRESSION, KHR_MATERIALS_VARIANTS};
use super::{Extras, Unclassified};

gl_enum!(PrimitiveMode {
	Points = 0,
	Lines = 1,
	LineLoop = 2,
	LineStrip = 3,
	Triangles = 4,
	TriangleStrip = 5,
	TriangleFan = 6,
});

impl Default for PrimitiveMode {
	fn default() -> Self {
		PrimitiveMode::Triangles
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mesh {
	pub primitives: Vec<Primitive>,
	pub weights: Option<Vec<f32>>,
	pub name: Option<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Primitive {
	pub attributes: BTreeMap<String, usize>,
	pub indices: Option<usize>,
	pub material: Option<usize>,
	#[serde(default)]
	pub mode: PrimitiveMode,
	#[serde(default)]
	pub targets: Vec<BTreeMap<String, usize>>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

impl Primitive {
	pub fn attribute(&self, semantic: &Semantic) -> Option<usize> {
		self.attributes.get(&semantic.to_string()).copied()
	}

	/// Attributes in a numbered set (`TEXCOORD_0`, `TEXCOORD_1`, ..) up to the first gap.
	pub fn attribute_set(&self, make: fn(u32) -> Semantic) -> Vec<usize> {
		(0..).map_while(|n| self.attribute(&make(n))).collect()
	}

	pub fn variant_mappings(&self) -> &[VariantMapping] {
		match self.extensions.get::<KhrMaterialsVariants>(KHR_MATERIALS_VARIANTS) {
			Some(KhrMaterialsVariants::Mappings { mappings }) => mappings,
			_ => &[],
		}
	}

	pub fn draco(&self) -> Option<&DracoMeshCompression> {
		self.extensions.get::<DracoMeshCompression>(KHR_DRACO_MESH_COMPRESSION)
	}
}

/// The meaning of a vertex attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Semantic {
	Positions,
	Normals,
	Tangents,
	TexCoords(u32),
	Colors(u32),
	Joints(u32),
	Weights(u32),
	/// Application specific attributes, usually starting with `_`.
	Custom(String),
}

impl Semantic {
	pub fn parse(name: &str) -> Self {
		let numbered = |prefix: &str| name.strip_prefix(prefix).and_then(|n| n.parse::<u32>().ok());
		match name {
			"POSITION" => Semantic::Positions,
			"NORMAL" => Semantic::Normals,
			"TANGENT" => Semantic::Tangents,
			_ => {
				if let Some(n) = numbered("TEXCOORD_") {
					Semantic::TexCoords(n)
				} else if let Some(n) = numbered("COLOR_") {
					Semantic::Colors(n)
				} else if let Some(n) = numbered("JOINTS_") {
					Semantic::Joints(n)
				} else if let Some(n) = numbered("WEIGHTS_") {
					Semantic::Weights(n)
				} else {
					Semantic::Custom(name.to_string())
				}
			},
		}
	}
}

impl std::fmt::Display for Semantic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Semantic::Positions => f.write_str("POSITION"),
			Semantic::Normals => f.write_str("NORMAL"),
			Semantic::Tangents => f.write_str("TANGENT"),
			Semantic::TexCoords(n) => write!(f, "TEXCOORD_{n}"),
			Semantic::Colors(n) => write!(f, "COLOR_{n}"),
			Semantic::Joints(n) => write!(f, "JOINTS_{n}"),
			Semantic::Weights(n) => write!(f, "WEIGHTS_{n}"),
			Semantic::Custom(name) => f.write_str(name),
		}
	}
}
