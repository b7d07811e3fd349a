use crate::extensions::*;
use super::{Extras, Unclassified};

string_enum!(AlphaMode {
	Opaque = "OPAQUE",
	Mask = "MASK",
	Blend = "BLEND",
});

impl Default for AlphaMode {
	fn default() -> Self {
		AlphaMode::Opaque
	}
}

pub(crate) fn one() -> f32 {
	1.0
}

fn white() -> [f32; 4] {
	[1.0; 4]
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
	pub name: Option<String>,
	pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
	pub normal_texture: Option<NormalTextureInfo>,
	pub occlusion_texture: Option<OcclusionTextureInfo>,
	pub emissive_texture: Option<TextureInfo>,
	#[serde(default)]
	pub emissive_factor: [f32; 3],
	#[serde(default)]
	pub alpha_mode: AlphaMode,
	pub alpha_cutoff: Option<f32>,
	#[serde(default)]
	pub double_sided: bool,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

impl Material {
	pub fn alpha_cutoff(&self) -> f32 {
		self.alpha_cutoff.unwrap_or(0.5)
	}

	pub fn unlit(&self) -> Option<&KhrMaterialsUnlit> {
		self.extensions.get(KHR_MATERIALS_UNLIT)
	}

	pub fn specular_glossiness(&self) -> Option<&KhrMaterialsPbrSpecularGlossiness> {
		self.extensions.get(KHR_MATERIALS_PBR_SPECULAR_GLOSSINESS)
	}

	pub fn transmission(&self) -> Option<&KhrMaterialsTransmission> {
		self.extensions.get(KHR_MATERIALS_TRANSMISSION)
	}

	pub fn clearcoat(&self) -> Option<&KhrMaterialsClearcoat> {
		self.extensions.get(KHR_MATERIALS_CLEARCOAT)
	}

	pub fn sheen(&self) -> Option<&KhrMaterialsSheen> {
		self.extensions.get(KHR_MATERIALS_SHEEN)
	}

	pub fn emissive_strength(&self) -> Option<&KhrMaterialsEmissiveStrength> {
		self.extensions.get(KHR_MATERIALS_EMISSIVE_STRENGTH)
	}

	pub fn ior(&self) -> Option<&KhrMaterialsIor> {
		self.extensions.get(KHR_MATERIALS_IOR)
	}

	pub(crate) fn attach_extensions(&mut self, registry: &ExtensionRegistry) {
		self.extensions.attach(registry);
		if let Some(pbr) = &mut self.pbr_metallic_roughness {
			pbr.extensions.attach(registry);
			if let Some(info) = &mut pbr.base_color_texture {
				info.extensions.attach(registry);
			}
			if let Some(info) = &mut pbr.metallic_roughness_texture {
				info.extensions.attach(registry);
			}
		}
		if let Some(info) = &mut self.normal_texture {
			info.extensions.attach(registry);
		}
		if let Some(info) = &mut self.occlusion_texture {
			info.extensions.attach(registry);
		}
		if let Some(info) = &mut self.emissive_texture {
			info.extensions.attach(registry);
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
	#[serde(default = "white")]
	pub base_color_factor: [f32; 4],
	pub base_color_texture: Option<TextureInfo>,
	#[serde(default = "one")]
	pub metallic_factor: f32,
	#[serde(default = "one")]
	pub roughness_factor: f32,
	pub metallic_roughness_texture: Option<TextureInfo>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

/// Reference to a texture from a material.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
	pub index: usize,
	#[serde(default)]
	pub tex_coord: usize,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

impl TextureInfo {
	pub fn transform(&self) -> Option<KhrTextureTransform> {
		texture_transform(&self.extensions)
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalTextureInfo {
	pub index: usize,
	#[serde(default)]
	pub tex_coord: usize,
	#[serde(default = "one")]
	pub scale: f32,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

impl NormalTextureInfo {
	pub fn transform(&self) -> Option<KhrTextureTransform> {
		texture_transform(&self.extensions)
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcclusionTextureInfo {
	pub index: usize,
	#[serde(default)]
	pub tex_coord: usize,
	#[serde(default = "one")]
	pub strength: f32,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

impl OcclusionTextureInfo {
	pub fn transform(&self) -> Option<KhrTextureTransform> {
		texture_transform(&self.extensions)
	}
}

// texture infos nested in extension payloads never went through a registry, so decode those on demand
fn texture_transform(extensions: &Extensions) -> Option<KhrTextureTransform> {
	extensions.get::<KhrTextureTransform>(KHR_TEXTURE_TRANSFORM).cloned()
		.or_else(|| extensions.decode(KHR_TEXTURE_TRANSFORM))
}
