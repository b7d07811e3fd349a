//! Document wide consistency checks.
//!
//! Nothing here stops a load, every finding is reported and resolution decides per entity.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
	accessor::{Resolver, Usage},
	buffer::ViewError,
	diagnostics::{Code, DiagnosticSink},
	extensions::{ExtensionRegistry, CORE_EXTENSIONS, KHR_DRACO_MESH_COMPRESSION},
	json::{parse_version, GltfDocument, Semantic},
};

/// Runs every check over `resolver`'s document and reports to `sink`.
pub fn validate_document(resolver: &Resolver<'_>, registry: &ExtensionRegistry, sink: &mut dyn DiagnosticSink) {
	let document = resolver.document();
	check_version(document, sink);
	check_extensions(document, registry, sink);
	check_references(document, sink);
	check_buffer_views(resolver, sink);
	check_accessors(resolver, sink);
	check_usage(resolver, sink);
}

/// Reports a major version other than 2, returns false in that case.
pub fn check_version(document: &GltfDocument, sink: &mut dyn DiagnosticSink) -> bool {
	let supported = match document.asset.parsed_version() {
		Some((major, _)) => major == 2,
		None => false,
	};
	if !supported {
		sink.error(Code::GltfUnsupportedVersion, vec![document.asset.version.clone()]);
		return false;
	}
	if let Some(min) = &document.asset.min_version {
		if parse_version(min).map_or(true, |v| v > (2, 0)) {
			sink.error(Code::GltfUnsupportedVersion, vec![min.clone()]);
			return false;
		}
	}
	true
}

fn check_extensions(document: &GltfDocument, registry: &ExtensionRegistry, sink: &mut dyn DiagnosticSink) {
	let known = |name: &str| registry.is_registered(name) || CORE_EXTENSIONS.contains(&name);
	for name in &document.extensions_required {
		if name == KHR_DRACO_MESH_COMPRESSION {
			sink.warn(Code::PackageMissing, vec![name.clone(), "compressed primitives are skipped".to_string()]);
		} else if !known(name) {
			sink.warn(Code::ExtensionUnsupported, vec![name.clone(), "the asset may not display correctly".to_string()]);
		}
	}
	for name in &document.extensions_used {
		if !known(name) && !document.requires_extension(name) {
			sink.info(Code::ExtensionUnsupported, vec![name.clone(), "its data is kept as json".to_string()]);
		}
	}
}

struct RefCheck<'a> {
	sink: &'a mut dyn DiagnosticSink,
}

impl RefCheck<'_> {
	fn check<T>(&mut self, who: impl FnOnce() -> String, kind: &str, index: Option<usize>, items: &[T]) {
		if let Some(index) = index {
			if index >= items.len() {
				self.sink.error(Code::MissingReference, vec![who(), kind.to_string(), index.to_string()]);
			}
		}
	}
}

/// Reports every index that points past the end of its array.
pub fn check_references(document: &GltfDocument, sink: &mut dyn DiagnosticSink) {
	let d = document;
	let mut refs = RefCheck { sink };
	refs.check(|| "document".to_string(), "scene", d.scene, &d.scenes);
	for (s, scene) in d.scenes.iter().enumerate() {
		for node in &scene.nodes {
			refs.check(|| format!("scene {s}"), "node", Some(*node), &d.nodes);
		}
	}
	for (n, node) in d.nodes.iter().enumerate() {
		let who = || format!("node {n}");
		for child in &node.children {
			refs.check(who, "node", Some(*child), &d.nodes);
		}
		refs.check(who, "mesh", node.mesh, &d.meshes);
		refs.check(who, "skin", node.skin, &d.skins);
		refs.check(who, "camera", node.camera, &d.cameras);
		refs.check(who, "light", node.light(), d.lights());
	}
	for (m, mesh) in d.meshes.iter().enumerate() {
		for (p, primitive) in mesh.primitives.iter().enumerate() {
			let who = || format!("mesh {m} primitive {p}");
			for accessor in primitive.attributes.values().chain(primitive.targets.iter().flat_map(|t| t.values())) {
				refs.check(who, "accessor", Some(*accessor), &d.accessors);
			}
			refs.check(who, "accessor", primitive.indices, &d.accessors);
			refs.check(who, "material", primitive.material, &d.materials);
			for mapping in primitive.variant_mappings() {
				refs.check(who, "material", Some(mapping.material), &d.materials);
			}
		}
	}
	for (m, material) in d.materials.iter().enumerate() {
		let who = || format!("material {m}");
		let pbr = material.pbr_metallic_roughness.as_ref();
		let textures = [
			pbr.and_then(|p| p.base_color_texture.as_ref()).map(|t| t.index),
			pbr.and_then(|p| p.metallic_roughness_texture.as_ref()).map(|t| t.index),
			material.normal_texture.as_ref().map(|t| t.index),
			material.occlusion_texture.as_ref().map(|t| t.index),
			material.emissive_texture.as_ref().map(|t| t.index),
		];
		for texture in textures {
			refs.check(who, "texture", texture, &d.textures);
		}
	}
	for (t, texture) in d.textures.iter().enumerate() {
		let who = || format!("texture {t}");
		refs.check(who, "image", texture.source, &d.images);
		refs.check(who, "sampler", texture.sampler, &d.samplers);
	}
	for (i, image) in d.images.iter().enumerate() {
		refs.check(|| format!("image {i}"), "buffer view", image.buffer_view, &d.buffer_views);
	}
	for (a, accessor) in d.accessors.iter().enumerate() {
		let who = || format!("accessor {a}");
		refs.check(who, "buffer view", accessor.buffer_view, &d.buffer_views);
		if let Some(sparse) = &accessor.sparse {
			refs.check(who, "buffer view", Some(sparse.indices.buffer_view), &d.buffer_views);
			refs.check(who, "buffer view", Some(sparse.values.buffer_view), &d.buffer_views);
		}
	}
	for (v, view) in d.buffer_views.iter().enumerate() {
		refs.check(|| format!("buffer view {v}"), "buffer", Some(view.buffer), &d.buffers);
	}
	for (a, animation) in d.animations.iter().enumerate() {
		for (c, channel) in animation.channels.iter().enumerate() {
			let who = || format!("animation {a} channel {c}");
			refs.check(who, "sampler", Some(channel.sampler), &animation.samplers);
			refs.check(who, "node", channel.target.node, &d.nodes);
		}
		for (s, sampler) in animation.samplers.iter().enumerate() {
			let who = || format!("animation {a} sampler {s}");
			refs.check(who, "accessor", Some(sampler.input), &d.accessors);
			refs.check(who, "accessor", Some(sampler.output), &d.accessors);
		}
	}
	for (s, skin) in d.skins.iter().enumerate() {
		let who = || format!("skin {s}");
		refs.check(who, "accessor", skin.inverse_bind_matrices, &d.accessors);
		refs.check(who, "node", skin.skeleton, &d.nodes);
		for joint in &skin.joints {
			refs.check(who, "node", Some(*joint), &d.nodes);
		}
	}
}

fn check_buffer_views(resolver: &Resolver<'_>, sink: &mut dyn DiagnosticSink) {
	let document = resolver.document();
	for (v, view) in document.buffer_views.iter().enumerate() {
		let Some(buffer) = document.buffers.get(view.buffer) else {
			continue;
		};
		// a view must fit the declared length and, once loaded, the actual bytes
		let len = resolver.buffers().get(view.buffer).map_or(buffer.byte_length, |b| b.len().min(buffer.byte_length));
		let end = view.byte_offset.checked_add(view.byte_length);
		if end.map_or(true, |end| end > len) {
			let error = ViewError::OutOfBounds {
				view: v,
				start: view.byte_offset,
				end: view.byte_offset.saturating_add(view.byte_length),
				buffer: view.buffer,
				len,
			};
			sink.error(error.code(), error.args(""));
		}
	}
}

fn check_accessors(resolver: &Resolver<'_>, sink: &mut dyn DiagnosticSink) {
	for a in 0..resolver.document().accessors.len() {
		match resolver.resolve(a) {
			Ok(_) => {},
			// already reported by the buffer view and buffer checks
			Err(crate::accessor::AccessorError::View { .. }) => {},
			Err(e) => sink.emit(e.diagnostic(&format!("accessor {a}"))),
		}
	}
}

/// Every place an accessor is read from, with what it is read as.
pub fn accessor_usages(document: &GltfDocument) -> Vec<(usize, Usage)> {
	let mut usages = Vec::new();
	for mesh in &document.meshes {
		for primitive in &mesh.primitives {
			// compressed primitives point at accessors that only carry counts and bounds
			if primitive.extensions.contains(KHR_DRACO_MESH_COMPRESSION) {
				continue;
			}
			if let Some(indices) = primitive.indices {
				usages.push((indices, Usage::Index));
			}
			for (name, accessor) in &primitive.attributes {
				usages.push((*accessor, Usage::Attribute(Semantic::parse(name))));
			}
			for target in &primitive.targets {
				for accessor in target.values() {
					usages.push((*accessor, Usage::Generic));
				}
			}
		}
	}
	for animation in &document.animations {
		for sampler in &animation.samplers {
			usages.push((sampler.input, Usage::AnimationInput));
			usages.push((sampler.output, Usage::AnimationOutput));
		}
	}
	for skin in &document.skins {
		if let Some(accessor) = skin.inverse_bind_matrices {
			usages.push((accessor, Usage::InverseBindMatrices));
		}
	}
	usages
}

fn check_usage(resolver: &Resolver<'_>, sink: &mut dyn DiagnosticSink) {
	let document = resolver.document();
	let mut seen: FxHashMap<usize, Vec<Usage>> = FxHashMap::default();
	let mut reported: FxHashSet<usize> = FxHashSet::default();
	for (accessor, usage) in accessor_usages(document) {
		let Some(json) = document.accessors.get(accessor) else {
			continue;
		};
		let previous = seen.entry(accessor).or_default();
		if previous.contains(&usage) {
			continue;
		}
		// compared against every distinct earlier use, a generic one matches anything
		let conflict = previous.iter().find(|p| !p.is_compatible(&usage)).cloned();
		previous.push(usage.clone());
		if let Some(first) = conflict {
			if reported.insert(accessor) {
				sink.error(Code::AccessorInconsistentUsage, vec![accessor.to_string(), first.to_string(), usage.to_string()]);
			}
			continue;
		}
		if let Err(e) = usage.check(accessor, json, resolver.is_quantized()) {
			if reported.insert(accessor) {
				sink.emit(e.diagnostic(&format!("accessor {accessor}")));
			}
		}
	}
}
