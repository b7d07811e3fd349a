//! Payload types for the Khronos extensions understood out of the box.

use std::collections::BTreeMap;

use glam::{Mat3, Vec2};
use serde::Deserialize;

use crate::json::{NormalTextureInfo, TextureInfo};
use super::ExtensionRegistry;

pub const KHR_MATERIALS_UNLIT: &str = "KHR_materials_unlit";
pub const KHR_MATERIALS_PBR_SPECULAR_GLOSSINESS: &str = "KHR_materials_pbrSpecularGlossiness";
pub const KHR_MATERIALS_TRANSMISSION: &str = "KHR_materials_transmission";
pub const KHR_MATERIALS_CLEARCOAT: &str = "KHR_materials_clearcoat";
pub const KHR_MATERIALS_SHEEN: &str = "KHR_materials_sheen";
pub const KHR_MATERIALS_EMISSIVE_STRENGTH: &str = "KHR_materials_emissive_strength";
pub const KHR_MATERIALS_IOR: &str = "KHR_materials_ior";
pub const KHR_MATERIALS_VARIANTS: &str = "KHR_materials_variants";
pub const KHR_TEXTURE_TRANSFORM: &str = "KHR_texture_transform";
pub const KHR_LIGHTS_PUNCTUAL: &str = "KHR_lights_punctual";
pub const KHR_MESH_QUANTIZATION: &str = "KHR_mesh_quantization";
pub const KHR_DRACO_MESH_COMPRESSION: &str = "KHR_draco_mesh_compression";
pub const EXT_MESH_GPU_INSTANCING: &str = "EXT_mesh_gpu_instancing";

/// Extensions that change how the core reads data rather than adding payloads.
pub const CORE_EXTENSIONS: &[&str] = &[KHR_MESH_QUANTIZATION];

pub(crate) fn register_all(registry: &mut ExtensionRegistry) {
	registry.register_typed::<KhrMaterialsUnlit>(KHR_MATERIALS_UNLIT);
	registry.register_typed::<KhrMaterialsPbrSpecularGlossiness>(KHR_MATERIALS_PBR_SPECULAR_GLOSSINESS);
	registry.register_typed::<KhrMaterialsTransmission>(KHR_MATERIALS_TRANSMISSION);
	registry.register_typed::<KhrMaterialsClearcoat>(KHR_MATERIALS_CLEARCOAT);
	registry.register_typed::<KhrMaterialsSheen>(KHR_MATERIALS_SHEEN);
	registry.register_typed::<KhrMaterialsEmissiveStrength>(KHR_MATERIALS_EMISSIVE_STRENGTH);
	registry.register_typed::<KhrMaterialsIor>(KHR_MATERIALS_IOR);
	registry.register_typed::<KhrMaterialsVariants>(KHR_MATERIALS_VARIANTS);
	registry.register_typed::<KhrTextureTransform>(KHR_TEXTURE_TRANSFORM);
	registry.register_typed::<KhrLightsPunctual>(KHR_LIGHTS_PUNCTUAL);
	registry.register_typed::<GpuInstancing>(EXT_MESH_GPU_INSTANCING);
	registry.register_typed::<DracoMeshCompression>(KHR_DRACO_MESH_COMPRESSION);
}

fn one() -> f32 {
	1.0
}

fn ones3() -> [f32; 3] {
	[1.0; 3]
}

fn ones4() -> [f32; 4] {
	[1.0; 4]
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct KhrMaterialsUnlit {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KhrMaterialsPbrSpecularGlossiness {
	#[serde(default = "ones4")]
	pub diffuse_factor: [f32; 4],
	pub diffuse_texture: Option<TextureInfo>,
	#[serde(default = "ones3")]
	pub specular_factor: [f32; 3],
	#[serde(default = "one")]
	pub glossiness_factor: f32,
	pub specular_glossiness_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KhrMaterialsTransmission {
	#[serde(default)]
	pub transmission_factor: f32,
	pub transmission_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KhrMaterialsClearcoat {
	#[serde(default)]
	pub clearcoat_factor: f32,
	pub clearcoat_texture: Option<TextureInfo>,
	#[serde(default)]
	pub clearcoat_roughness_factor: f32,
	pub clearcoat_roughness_texture: Option<TextureInfo>,
	pub clearcoat_normal_texture: Option<NormalTextureInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KhrMaterialsSheen {
	#[serde(default)]
	pub sheen_color_factor: [f32; 3],
	pub sheen_color_texture: Option<TextureInfo>,
	#[serde(default)]
	pub sheen_roughness_factor: f32,
	pub sheen_roughness_texture: Option<TextureInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KhrMaterialsEmissiveStrength {
	#[serde(default = "one")]
	pub emissive_strength: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KhrMaterialsIor {
	#[serde(default = "default_ior")]
	pub ior: f32,
}

fn default_ior() -> f32 {
	1.5
}

/// `KHR_materials_variants` appears on the root (variant names) and on primitives (mappings).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum KhrMaterialsVariants {
	Variants { variants: Vec<MaterialVariant> },
	Mappings { mappings: Vec<VariantMapping> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaterialVariant {
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariantMapping {
	pub material: usize,
	pub variants: Vec<usize>,
	pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KhrTextureTransform {
	#[serde(default)]
	pub offset: [f32; 2],
	#[serde(default)]
	pub rotation: f32,
	#[serde(default = "ones2")]
	pub scale: [f32; 2],
	pub tex_coord: Option<usize>,
}

fn ones2() -> [f32; 2] {
	[1.0; 2]
}

impl KhrTextureTransform {
	/// Uv transform as `translation * rotation * scale`.
	pub fn matrix(&self) -> Mat3 {
		let translation = Mat3::from_translation(Vec2::from(self.offset));
		let (s, c) = self.rotation.sin_cos();
		// glTF rotates uvs clockwise
		let rotation = Mat3::from_cols_array(&[
			c, -s, 0.0,
			s, c, 0.0,
			0.0, 0.0, 1.0,
		]);
		let scale = Mat3::from_scale(Vec2::from(self.scale));
		translation * rotation * scale
	}
}

/// `KHR_lights_punctual` appears on the root (light list) and on nodes (light reference).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum KhrLightsPunctual {
	Lights { lights: Vec<Light> },
	Node { light: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
	Directional,
	Point,
	Spot,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Light {
	pub name: Option<String>,
	#[serde(default = "ones3")]
	pub color: [f32; 3],
	#[serde(default = "one")]
	pub intensity: f32,
	#[serde(rename = "type")]
	pub kind: LightKind,
	pub range: Option<f32>,
	pub spot: Option<Spot>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
	#[serde(default)]
	pub inner_cone_angle: f32,
	#[serde(default = "quarter_pi")]
	pub outer_cone_angle: f32,
}

fn quarter_pi() -> f32 {
	std::f32::consts::FRAC_PI_4
}

/// `EXT_mesh_gpu_instancing` on a node, attribute name to accessor index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GpuInstancing {
	pub attributes: BTreeMap<String, usize>,
}

/// `KHR_draco_mesh_compression` on a primitive.
///
/// Only the descriptor is read, decoding needs an external decoder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DracoMeshCompression {
	pub buffer_view: usize,
	pub attributes: BTreeMap<String, usize>,
}
