use glam::{Mat4, Quat, Vec3};

use crate::extensions::{Extensions, GpuInstancing, KhrLightsPunctual, EXT_MESH_GPU_INSTANCING, KHR_LIGHTS_PUNCTUAL};
use super::{Extras, Unclassified};

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
	#[serde(default)]
	pub version: String,
	pub min_version: Option<String>,
	pub generator: Option<String>,
	pub copyright: Option<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

impl Asset {
	/// `(major, minor)` of `version`, [None] if it is not of the form `major.minor`.
	pub fn parsed_version(&self) -> Option<(u32, u32)> {
		parse_version(&self.version)
	}
}

/// Splits a `major.minor` version string.
pub fn parse_version(version: &str) -> Option<(u32, u32)> {
	let (major, minor) = version.split_once('.')?;
	Some((major.parse().ok()?, minor.parse().ok()?))
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
	#[serde(default)]
	pub nodes: Vec<usize>,
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
pub struct Node {
	pub name: Option<String>,
	pub camera: Option<usize>,
	#[serde(default)]
	pub children: Vec<usize>,
	pub skin: Option<usize>,
	pub mesh: Option<usize>,
	pub matrix: Option<[f32; 16]>,
	pub rotation: Option<[f32; 4]>,
	pub scale: Option<[f32; 3]>,
	pub translation: Option<[f32; 3]>,
	pub weights: Option<Vec<f32>>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

impl Node {
	/// Transform relative to the parent node, `matrix` wins over TRS when both are present.
	pub fn local_transform(&self) -> Mat4 {
		if let Some(matrix) = self.matrix {
			Mat4::from_cols_slice(&matrix)
		} else {
			Mat4::from_scale_rotation_translation(
				self.scale.map(Vec3::from).unwrap_or(Vec3::ONE),
				self.rotation.map(Quat::from_array).unwrap_or_default(),
				self.translation.map(Vec3::from).unwrap_or(Vec3::ZERO),
			)
		}
	}

	/// Index of the `KHR_lights_punctual` light attached to this node.
	pub fn light(&self) -> Option<usize> {
		match self.extensions.get::<KhrLightsPunctual>(KHR_LIGHTS_PUNCTUAL)? {
			KhrLightsPunctual::Node { light } => Some(*light),
			_ => None,
		}
	}

	pub fn gpu_instancing(&self) -> Option<&GpuInstancing> {
		self.extensions.get(EXT_MESH_GPU_INSTANCING)
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skin {
	pub inverse_bind_matrices: Option<usize>,
	pub skeleton: Option<usize>,
	pub joints: Vec<usize>,
	pub name: Option<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

string_enum!(CameraKind {
	Perspective = "perspective",
	Orthographic = "orthographic",
});

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
	#[serde(rename = "type")]
	pub kind: CameraKind,
	pub perspective: Option<Perspective>,
	pub orthographic: Option<Orthographic>,
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
pub struct Perspective {
	pub aspect_ratio: Option<f32>,
	pub yfov: f32,
	pub zfar: Option<f32>,
	pub znear: f32,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Orthographic {
	pub xmag: f32,
	pub ymag: f32,
	pub zfar: f32,
	pub znear: f32,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}
