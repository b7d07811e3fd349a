mod common;

use common::{assemble_glb, triangle};
use isopod_gltf::{
	json::{MagFilter, MinFilter},
	parse_document, read_container, resolve_accessor, Buffers, ContainerError, ExtensionRegistry, GltfDocument,
};

#[test]
fn glb_round_trip() {
	let (json, bin) = triangle();
	let glb = assemble_glb(&json, Some(&bin));

	let container = read_container(&glb).unwrap();
	assert_eq!(container.version, 2);
	assert_eq!(container.bin.map(<[u8]>::len), Some(bin.len().next_multiple_of(4)));

	let registry = ExtensionRegistry::new();
	let parsed = parse_document(container.json, &registry).unwrap();
	let expected: GltfDocument = serde_json::from_str(&json).unwrap();
	assert_eq!(parsed, expected);
	assert_eq!(parsed.asset.generator.as_deref(), Some("isopod-gltf tests"));
	assert_eq!(parsed.meshes[0].primitives[0].indices, Some(1));

	let buffers = Buffers::from_slices(&[container.bin.unwrap()]);
	let positions = resolve_accessor(&parsed, &buffers, 0).unwrap();
	assert_eq!(positions.to_bytes(), bin[..36]);
	assert!(!positions.is_owned());
	let indices = resolve_accessor(&parsed, &buffers, 1).unwrap();
	assert_eq!(indices.to_bytes(), bin[36..42]);
	assert_eq!(indices.as_slice::<u16>(), Some(&[0u16, 1, 2][..]));
}

#[test]
fn glb_without_binary_chunk() {
	let json = r#"{"asset": {"version": "2.0"}}"#;
	let glb = assemble_glb(json, None);
	let container = read_container(&glb).unwrap();
	assert_eq!(container.json, json);
	assert!(container.bin.is_none());
}

#[test]
fn parsing_is_idempotent() {
	let (json, _) = triangle();
	let registry = ExtensionRegistry::khronos();
	let a = parse_document(&json, &registry).unwrap();
	let b = parse_document(&json, &registry).unwrap();
	assert_eq!(a, b);
}

#[test]
fn garbage_parses_to_nothing() {
	let registry = ExtensionRegistry::khronos();
	assert!(parse_document("", &registry).is_none());
	assert!(parse_document("garbage", &registry).is_none());
	assert!(parse_document("{\"asset\": ", &registry).is_none());
}

#[test]
fn unknown_filter_values_are_kept() {
	let registry = ExtensionRegistry::new();
	let doc = parse_document(r#"{
		"asset": {"version": "2.0"},
		"samplers": [{"magFilter": 100}, {}, {"magFilter": 9729, "minFilter": 9987}]
	}"#, &registry).unwrap();
	assert_eq!(doc.samplers[0].mag_filter, MagFilter::Other(100));
	assert_eq!(doc.samplers[0].mag_filter.raw(), Some(100));
	assert_eq!(doc.samplers[1].mag_filter, MagFilter::None);
	assert_eq!(doc.samplers[1].mag_filter.raw(), None);
	assert_ne!(doc.samplers[0].mag_filter, doc.samplers[1].mag_filter);
	assert_eq!(doc.samplers[2].mag_filter, MagFilter::Linear);
	assert_eq!(doc.samplers[2].min_filter, MinFilter::LinearMipmapLinear);
}

#[test]
fn unknown_fields_are_preserved() {
	let registry = ExtensionRegistry::new();
	let doc = parse_document(r#"{
		"asset": {"version": "2.0"},
		"nodes": [{"name": "a", "futureField": {"x": 1}}],
		"somethingNew": [1, 2, 3]
	}"#, &registry).unwrap();
	assert_eq!(doc.nodes[0].unclassified.try_get::<serde_json::Value>("futureField"), Some(serde_json::json!({"x": 1})));
	assert_eq!(doc.unclassified.try_get::<Vec<u32>>("somethingNew"), Some(vec![1, 2, 3]));
}

#[test]
fn non_binary_data_is_rejected() {
	assert_eq!(read_container(b"").unwrap_err(), ContainerError::NotBinary);
	assert_eq!(read_container(b"{\"asset\": {}}").unwrap_err(), ContainerError::NotBinary);
	assert_eq!(read_container(&[0x67, 0x6c, 0x54, 0x47, 2, 0, 0, 0]).unwrap_err(), ContainerError::NotBinary);
}

#[test]
fn truncated_chunks_are_rejected() {
	let (json, bin) = triangle();
	let mut glb = assemble_glb(&json, Some(&bin));

	// grow the declared json chunk past the end of the container
	let declared = u32::from_le_bytes([glb[12], glb[13], glb[14], glb[15]]);
	glb[12..16].copy_from_slice(&(declared + 1024).to_le_bytes());
	assert!(matches!(read_container(&glb), Err(ContainerError::ChunkIncomplete { index: 0, .. })));

	// cut the container short of its declared length
	let glb = assemble_glb(&json, Some(&bin));
	let short = &glb[..glb.len() - 4];
	assert!(matches!(read_container(short), Err(ContainerError::Truncated { .. })));
}

#[test]
fn every_prefix_is_handled() {
	let (json, bin) = triangle();
	let glb = assemble_glb(&json, Some(&bin));
	for len in 0..glb.len() {
		assert!(read_container(&glb[..len]).is_err(), "prefix of {len} bytes");
	}
	assert!(read_container(&glb).is_ok());
}

#[test]
fn nested_entities_keep_unknown_fields() {
	let registry = ExtensionRegistry::khronos();
	let doc = parse_document(r#"{
		"asset": {"version": "2.0"},
		"accessors": [{
			"componentType": 5126, "count": 2, "type": "SCALAR",
			"sparse": {
				"count": 1,
				"indices": {"bufferView": 0, "componentType": 5121, "vendorI": 1},
				"values": {"bufferView": 1, "vendorV": 2}
			}
		}],
		"animations": [{
			"channels": [{"sampler": 0, "vendorY": true, "target": {"path": "scale", "vendorX": "x"}}],
			"samplers": [{"input": 0, "output": 0, "vendorZ": [3]}]
		}],
		"cameras": [
			{"type": "perspective", "perspective": {"yfov": 1.0, "znear": 0.1, "vendorP": 4,
				"extensions": {"VENDOR_lens": {"mm": 35}}}},
			{"type": "orthographic", "orthographic": {"xmag": 1.0, "ymag": 1.0, "zfar": 10.0, "znear": 0.1, "vendorO": 5}}
		]
	}"#, &registry).unwrap();

	let sparse = doc.accessors[0].sparse.as_ref().unwrap();
	assert_eq!(sparse.indices.unclassified.try_get::<u32>("vendorI"), Some(1));
	assert_eq!(sparse.values.unclassified.try_get::<u32>("vendorV"), Some(2));

	let animation = &doc.animations[0];
	assert_eq!(animation.channels[0].unclassified.try_get::<bool>("vendorY"), Some(true));
	assert_eq!(animation.channels[0].target.unclassified.try_get::<String>("vendorX").as_deref(), Some("x"));
	assert_eq!(animation.samplers[0].unclassified.try_get::<Vec<u32>>("vendorZ"), Some(vec![3]));

	let perspective = doc.cameras[0].perspective.as_ref().unwrap();
	assert_eq!(perspective.unclassified.try_get::<u32>("vendorP"), Some(4));
	assert_eq!(perspective.extensions.raw("VENDOR_lens"), Some(&serde_json::json!({"mm": 35})));
	let orthographic = doc.cameras[1].orthographic.as_ref().unwrap();
	assert_eq!(orthographic.unclassified.try_get::<u32>("vendorO"), Some(5));
}

#[test]
fn nested_extensions_are_typed() {
	let mut registry = ExtensionRegistry::new();
	registry.register_typed::<serde_json::Value>("VENDOR_curve");
	let doc = parse_document(r#"{
		"asset": {"version": "2.0"},
		"animations": [{
			"channels": [{"sampler": 0, "target": {"path": "scale", "extensions": {"VENDOR_curve": {"k": 1}}}}],
			"samplers": [{"input": 0, "output": 0, "extensions": {"VENDOR_curve": {"k": 2}}}]
		}]
	}"#, &registry).unwrap();
	let animation = &doc.animations[0];
	let target = animation.channels[0].target.extensions.get::<serde_json::Value>("VENDOR_curve");
	assert_eq!(target, Some(&serde_json::json!({"k": 1})));
	let sampler = animation.samplers[0].extensions.get::<serde_json::Value>("VENDOR_curve");
	assert_eq!(sampler, Some(&serde_json::json!({"k": 2})));
}
