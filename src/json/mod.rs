//! The glTF json document.
//!
//! Cross references between entities are plain indices and are only checked when something is resolved,
//! so a document with a few broken references still parses.

use crate::extensions::{
	ExtensionRegistry, Extensions, KhrLightsPunctual, KhrMaterialsVariants, Light, MaterialVariant, KHR_LIGHTS_PUNCTUAL,
	KHR_MATERIALS_VARIANTS,
};

macro_rules! gl_enum {
	($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),* $(,)? }) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
		#[serde(from = "u32")]
		pub enum $name {
			$($variant,)*
			/// A value not defined by glTF, kept as written.
			Other(u32),
		}

		impl From<u32> for $name {
			fn from(v: u32) -> Self {
				match v {
					$($value => $name::$variant,)*
					v => $name::Other(v),
				}
			}
		}

		impl $name {
			pub fn raw(self) -> u32 {
				match self {
					$($name::$variant => $value,)*
					$name::Other(v) => v,
				}
			}
		}
	};
	// same as above but with a `None` variant for when the field is absent
	($(#[$meta:meta])* $name:ident or None { $($variant:ident = $value:literal),* $(,)? }) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize)]
		#[serde(from = "u32")]
		pub enum $name {
			#[default]
			None,
			$($variant,)*
			/// A value not defined by glTF, kept as written.
			Other(u32),
		}

		impl From<u32> for $name {
			fn from(v: u32) -> Self {
				match v {
					$($value => $name::$variant,)*
					v => $name::Other(v),
				}
			}
		}

		impl $name {
			/// The number as written in the document, [None] if the field was absent.
			pub fn raw(self) -> Option<u32> {
				match self {
					$name::None => None,
					$($name::$variant => Some($value),)*
					$name::Other(v) => Some(v),
				}
			}
		}
	};
}

macro_rules! string_enum {
	($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),* $(,)? }) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize)]
		#[serde(from = "String")]
		pub enum $name {
			$($variant,)*
			/// A value not defined by glTF, kept as written.
			Other(String),
		}

		impl From<String> for $name {
			fn from(s: String) -> Self {
				let known = match s.as_str() {
					$($value => Some($name::$variant),)*
					_ => None,
				};
				known.unwrap_or($name::Other(s))
			}
		}

		impl $name {
			pub fn as_str(&self) -> &str {
				match self {
					$($name::$variant => $value,)*
					$name::Other(s) => s.as_str(),
				}
			}
		}

		impl std::fmt::Display for $name {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				f.write_str(self.as_str())
			}
		}
	};
}

mod opaque;
mod accessor;
mod mesh;
mod material;
mod texture;
mod scene;
mod animation;

pub use opaque::*;
pub use accessor::*;
pub use mesh::*;
pub use material::*;
pub use texture::*;
pub use scene::*;
pub use animation::*;

/// The root of a glTF document.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfDocument {
	#[serde(default)]
	pub asset: Asset,
	pub scene: Option<usize>,
	#[serde(default)]
	pub scenes: Vec<Scene>,
	#[serde(default)]
	pub nodes: Vec<Node>,
	#[serde(default)]
	pub meshes: Vec<Mesh>,
	#[serde(default)]
	pub materials: Vec<Material>,
	#[serde(default)]
	pub accessors: Vec<Accessor>,
	#[serde(default)]
	pub buffer_views: Vec<BufferView>,
	#[serde(default)]
	pub buffers: Vec<Buffer>,
	#[serde(default)]
	pub textures: Vec<Texture>,
	#[serde(default)]
	pub images: Vec<Image>,
	#[serde(default)]
	pub samplers: Vec<Sampler>,
	#[serde(default)]
	pub animations: Vec<Animation>,
	#[serde(default)]
	pub skins: Vec<Skin>,
	#[serde(default)]
	pub cameras: Vec<Camera>,
	#[serde(default)]
	pub extensions_used: Vec<String>,
	#[serde(default)]
	pub extensions_required: Vec<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

impl GltfDocument {
	pub fn uses_extension(&self, name: &str) -> bool {
		self.extensions_used.iter().any(|e| e == name)
	}

	pub fn requires_extension(&self, name: &str) -> bool {
		self.extensions_required.iter().any(|e| e == name)
	}

	/// The scene to show by default, falling back to the first one.
	pub fn default_scene(&self) -> Option<&Scene> {
		match self.scene {
			Some(i) => self.scenes.get(i),
			None => self.scenes.first(),
		}
	}

	/// Lights declared by `KHR_lights_punctual`.
	pub fn lights(&self) -> &[Light] {
		match self.extensions.get::<KhrLightsPunctual>(KHR_LIGHTS_PUNCTUAL) {
			Some(KhrLightsPunctual::Lights { lights }) => lights,
			_ => &[],
		}
	}

	/// Variant names declared by `KHR_materials_variants`.
	pub fn material_variants(&self) -> &[MaterialVariant] {
		match self.extensions.get::<KhrMaterialsVariants>(KHR_MATERIALS_VARIANTS) {
			Some(KhrMaterialsVariants::Variants { variants }) => variants,
			_ => &[],
		}
	}

	/// Types every extension payload in the document that `registry` has a factory for.
	pub fn attach_extensions(&mut self, registry: &ExtensionRegistry) {
		self.extensions.attach(registry);
		self.asset.extensions.attach(registry);
		for scene in &mut self.scenes {
			scene.extensions.attach(registry);
		}
		for node in &mut self.nodes {
			node.extensions.attach(registry);
		}
		for mesh in &mut self.meshes {
			mesh.extensions.attach(registry);
			for primitive in &mut mesh.primitives {
				primitive.extensions.attach(registry);
			}
		}
		for material in &mut self.materials {
			material.attach_extensions(registry);
		}
		for accessor in &mut self.accessors {
			accessor.extensions.attach(registry);
			if let Some(sparse) = &mut accessor.sparse {
				sparse.extensions.attach(registry);
				sparse.indices.extensions.attach(registry);
				sparse.values.extensions.attach(registry);
			}
		}
		for view in &mut self.buffer_views {
			view.extensions.attach(registry);
		}
		for buffer in &mut self.buffers {
			buffer.extensions.attach(registry);
		}
		for texture in &mut self.textures {
			texture.extensions.attach(registry);
		}
		for image in &mut self.images {
			image.extensions.attach(registry);
		}
		for sampler in &mut self.samplers {
			sampler.extensions.attach(registry);
		}
		for animation in &mut self.animations {
			animation.extensions.attach(registry);
			for channel in &mut animation.channels {
				channel.extensions.attach(registry);
				channel.target.extensions.attach(registry);
			}
			for sampler in &mut animation.samplers {
				sampler.extensions.attach(registry);
			}
		}
		for skin in &mut self.skins {
			skin.extensions.attach(registry);
		}
		for camera in &mut self.cameras {
			camera.extensions.attach(registry);
			if let Some(perspective) = &mut camera.perspective {
				perspective.extensions.attach(registry);
			}
			if let Some(orthographic) = &mut camera.orthographic {
				orthographic.extensions.attach(registry);
			}
		}
	}
}

/// A json library able to produce a [GltfDocument].
pub trait JsonBackend: Send + Sync {
	fn name(&self) -> &'static str;

	fn parse(&self, text: &str) -> Result<GltfDocument, String>;
}

/// Parses with `serde_json` straight into the typed schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeJsonBackend;

impl JsonBackend for SerdeJsonBackend {
	fn name(&self) -> &'static str {
		"serde_json"
	}

	fn parse(&self, text: &str) -> Result<GltfDocument, String> {
		serde_json::from_str(text).map_err(|e| e.to_string())
	}
}

/// Parses a glTF json document, returning [None] if the text is not a valid document.
pub fn parse_document(text: &str, registry: &ExtensionRegistry) -> Option<GltfDocument> {
	parse_document_with(&SerdeJsonBackend, text, registry).ok()
}

/// Parses with the given backend, returning the backend's error message on failure.
pub fn parse_document_with(backend: &dyn JsonBackend, text: &str, registry: &ExtensionRegistry) -> Result<GltfDocument, String> {
	let text = text.trim_start_matches('\u{feff}');
	let mut document = backend.parse(text)?;
	document.attach_extensions(registry);
	log::debug!(
		"parsed glTF document with {} nodes, {} meshes, {} accessors using {}",
		document.nodes.len(), document.meshes.len(), document.accessors.len(), backend.name(),
	);
	Ok(document)
}
