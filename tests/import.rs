mod common;

use std::sync::Mutex;

use base64::Engine;
use common::{assemble_glb, triangle};
use isopod_gltf::{
	buffer::SourceError, extensions::*, ByteSource, CancelToken, Code, DiagnosticLog, ExtensionRegistry, ImportError,
	ImportOptions, Importer, PrimitiveError, Severity,
};

fn import_glb(json: &str, bin: Option<&[u8]>) -> (Result<Vec<usize>, ImportError>, DiagnosticLog) {
	let registry = ExtensionRegistry::khronos();
	let glb = assemble_glb(json, bin);
	let mut log = DiagnosticLog::new();
	let result = Importer::new(&registry)
		.import(&glb, &mut log, &CancelToken::new())
		.map(|import| import.meshes.iter().map(|m| m.valid_primitives().count()).collect());
	(result, log)
}

#[test]
fn triangle_glb() {
	let (json, bin) = triangle();
	let glb = assemble_glb(&json, Some(&bin));
	let registry = ExtensionRegistry::khronos();
	let mut log = DiagnosticLog::new();
	let import = Importer::new(&registry).import(&glb, &mut log, &CancelToken::new()).unwrap();
	assert!(log.is_empty(), "{log:?}");

	let primitive = import.meshes[0].primitives[0].as_ref().unwrap();
	assert_eq!(primitive.n_vertices, 3);
	assert_eq!(primitive.indices, Some(vec![0, 1, 2]));
	assert_eq!(primitive.positions[1], [1.0, 0.0, 0.0]);
	assert_eq!(import.meshes[0].name.as_deref(), Some("tri"));

	let node = &import.document.nodes[0];
	assert_eq!(node.local_transform().w_axis, glam::Vec4::new(1.0, 2.0, 3.0, 1.0));
}

#[test]
fn material_extensions_are_independent() {
	let registry = ExtensionRegistry::khronos();
	let doc = isopod_gltf::parse_document(r#"{
		"asset": {"version": "2.0"},
		"extensionsUsed": [
			"KHR_materials_unlit", "KHR_materials_pbrSpecularGlossiness", "KHR_materials_transmission",
			"KHR_materials_clearcoat", "KHR_materials_sheen"
		],
		"materials": [
			{"extensions": {"KHR_materials_unlit": {}}},
			{"extensions": {
				"KHR_materials_unlit": {},
				"KHR_materials_pbrSpecularGlossiness": {"glossinessFactor": 0.25},
				"KHR_materials_transmission": {"transmissionFactor": 0.5},
				"KHR_materials_clearcoat": {"clearcoatFactor": 1.0},
				"KHR_materials_sheen": {"sheenRoughnessFactor": 0.75}
			}},
			{}
		]
	}"#, &registry).unwrap();

	let unlit = &doc.materials[0];
	assert!(unlit.unlit().is_some());
	assert!(unlit.specular_glossiness().is_none());
	assert!(unlit.transmission().is_none());
	assert!(unlit.clearcoat().is_none());
	assert!(unlit.sheen().is_none());
	assert_eq!(unlit.extensions.len(), 1);

	let all = &doc.materials[1];
	assert!(all.unlit().is_some());
	assert_eq!(all.specular_glossiness().map(|s| s.glossiness_factor), Some(0.25));
	assert_eq!(all.transmission().map(|t| t.transmission_factor), Some(0.5));
	assert_eq!(all.clearcoat().map(|c| c.clearcoat_factor), Some(1.0));
	assert_eq!(all.sheen().map(|s| s.sheen_roughness_factor), Some(0.75));
	assert!(all.emissive_strength().is_none());
	assert!(all.ior().is_none());
	assert_eq!(all.extensions.len(), 5);

	assert!(doc.materials[2].extensions.is_empty());
}

#[test]
fn unregistered_extensions_stay_json() {
	let registry = ExtensionRegistry::new();
	let doc = isopod_gltf::parse_document(r#"{
		"asset": {"version": "2.0"},
		"materials": [{"extensions": {"KHR_materials_ior": {"ior": 1.33}}}]
	}"#, &registry).unwrap();
	let material = &doc.materials[0];
	assert!(material.ior().is_none());
	assert_eq!(material.extensions.raw(KHR_MATERIALS_IOR), Some(&serde_json::json!({"ior": 1.33})));
	let ior: KhrMaterialsIor = material.extensions.decode(KHR_MATERIALS_IOR).unwrap();
	assert!((ior.ior - 1.33).abs() < 1e-6);
}

#[test]
fn external_buffers_load_beside_the_file() {
	let (json, bin) = triangle();
	let json = json.replacen(r#""buffers": [{"#, r#""buffers": [{"uri": "tri%20data.bin", "#, 1);
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("tri data.bin"), &bin).unwrap();
	let path = dir.path().join("tri.gltf");
	std::fs::write(&path, &json).unwrap();

	let registry = ExtensionRegistry::khronos();
	let mut log = DiagnosticLog::new();
	let import = Importer::new(&registry).import_file(&path, &mut log, &CancelToken::new()).unwrap();
	assert!(log.is_empty(), "{log:?}");
	assert_eq!(import.buffers.get(0), Some(&bin[..]));
	assert_eq!(import.meshes[0].valid_primitives().count(), 1);
}

#[test]
fn buffers_outside_the_directory_are_refused() {
	let (json, bin) = triangle();
	let json = json.replacen(r#""buffers": [{"#, r#""buffers": [{"uri": "../secret.bin", "#, 1);
	let outer = tempfile::tempdir().unwrap();
	let inner = outer.path().join("assets");
	std::fs::create_dir(&inner).unwrap();
	std::fs::write(outer.path().join("secret.bin"), &bin).unwrap();
	let path = inner.join("tri.gltf");
	std::fs::write(&path, &json).unwrap();

	let registry = ExtensionRegistry::khronos();
	let mut log = DiagnosticLog::new();
	let import = Importer::new(&registry).import_file(&path, &mut log, &CancelToken::new()).unwrap();
	assert_eq!(import.buffers.get(0), None);
	let failed = log.with_code(Code::BufferLoadFailed).next().unwrap();
	assert_eq!(failed.args[0], "0");
	assert!(import.meshes[0].primitives[0].is_err());
	assert!(log.has_errors());
}

#[test]
fn missing_files_are_io_errors() {
	let dir = tempfile::tempdir().unwrap();
	let registry = ExtensionRegistry::khronos();
	let mut log = DiagnosticLog::new();
	let result = Importer::new(&registry).import_file(&dir.path().join("nope.glb"), &mut log, &CancelToken::new());
	assert!(matches!(result, Err(ImportError::Io { .. })));
	assert_eq!(log.len(), 1);
}

#[test]
fn data_uri_buffers() {
	let (json, bin) = triangle();
	let uri = format!("data:application/octet-stream;base64,{}", base64::engine::general_purpose::STANDARD.encode(&bin));
	let json = json.replacen(r#""buffers": [{"#, &format!(r#""buffers": [{{"uri": "{uri}", "#), 1);
	let registry = ExtensionRegistry::khronos();
	let mut log = DiagnosticLog::new();
	let import = Importer::new(&registry).import(json.as_bytes(), &mut log, &CancelToken::new()).unwrap();
	assert!(log.is_empty(), "{log:?}");
	assert_eq!(import.accessor(1).unwrap().to_uvecs::<1>(), Some(vec![[0], [1], [2]]));
}

#[test]
fn external_loading_can_be_turned_off() {
	struct Counting(Mutex<usize>);
	impl ByteSource for Counting {
		fn request(&self, _uri: &str) -> Result<Vec<u8>, SourceError> {
			*self.0.lock().unwrap() += 1;
			Ok(Vec::new())
		}
	}

	let (json, _) = triangle();
	let json = json.replacen(r#""buffers": [{"#, r#""buffers": [{"uri": "tri.bin", "#, 1);
	let registry = ExtensionRegistry::khronos();
	let options = ImportOptions { load_external: false, ..Default::default() };
	let mut log = DiagnosticLog::new();
	let import = Importer::new(&registry)
		.with_options(options)
		.with_source(Counting(Mutex::new(0)))
		.import(json.as_bytes(), &mut log, &CancelToken::new())
		.unwrap();
	assert_eq!(import.buffers.get(0), None);
	let failed = log.with_code(Code::BufferLoadFailed).next().unwrap();
	assert_eq!(failed.args[0], "0");
}

#[test]
fn cancelling_while_buffers_load() {
	struct CancelOnRequest(CancelToken);
	impl ByteSource for CancelOnRequest {
		fn request(&self, _uri: &str) -> Result<Vec<u8>, SourceError> {
			self.0.cancel();
			Ok(vec![0; 64])
		}
	}

	let (json, _) = triangle();
	let json = json.replacen(r#""buffers": [{"#, r#""buffers": [{"uri": "tri.bin", "#, 1);
	let registry = ExtensionRegistry::khronos();
	let cancel = CancelToken::new();
	let mut log = DiagnosticLog::new();
	let result = Importer::new(&registry)
		.with_source(CancelOnRequest(cancel.clone()))
		.import(json.as_bytes(), &mut log, &cancel);
	assert!(matches!(result, Err(ImportError::Cancelled("buffer loading"))));
	let cancelled: Vec<_> = log.with_code(Code::Cancelled).collect();
	assert_eq!(cancelled.len(), 1);
	assert_eq!(cancelled[0].severity, Severity::Warning);
}

#[test]
fn accessor_shared_by_indices_and_attribute() {
	let (json, bin) = triangle();
	let json = json.replacen(
		r#""meshes": [{"#,
		r#""meshes": [{"primitives": [{"attributes": {"POSITION": 0, "_ID": 1}}]}, {"#,
		1,
	);
	let (result, log) = import_glb(&json, Some(&bin));
	assert_eq!(result.unwrap(), vec![1, 1]);
	let inconsistent: Vec<_> = log.with_code(Code::AccessorInconsistentUsage).collect();
	assert_eq!(inconsistent.len(), 1);
	assert_eq!(inconsistent[0].args[0], "1");
}

#[test]
fn draco_primitives_are_skipped() {
	let (json, bin) = triangle();
	let json = json
		.replacen(r#""asset""#, r#""extensionsUsed": ["KHR_draco_mesh_compression"],
		"extensionsRequired": ["KHR_draco_mesh_compression"],
		"asset""#, 1)
		.replacen(
			r#""meshes": [{"#,
			r#""meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "extensions": {
				"KHR_draco_mesh_compression": {"bufferView": 0, "attributes": {"POSITION": 0}}
			}}]}, {"#,
			1,
		);
	let registry = ExtensionRegistry::khronos();
	let glb = assemble_glb(&json, Some(&bin));
	let mut log = DiagnosticLog::new();
	let import = Importer::new(&registry).import(&glb, &mut log, &CancelToken::new()).unwrap();

	assert!(!log.has_errors(), "{log:?}");
	assert!(log.with_code(Code::PackageMissing).count() >= 1);
	assert!(matches!(import.meshes[0].primitives[0], Err(PrimitiveError::CompressionUnsupported(_))));
	assert_eq!(import.meshes[1].valid_primitives().count(), 1);
	let draco = import.document.meshes[0].primitives[0].draco().unwrap();
	assert_eq!(draco.buffer_view, 0);
}

#[test]
fn unknown_required_extensions_warn() {
	let (json, bin) = triangle();
	let json = json.replacen(r#""asset""#, r#""extensionsUsed": ["VENDOR_thing"], "extensionsRequired": ["VENDOR_thing"], "asset""#, 1);
	let (result, log) = import_glb(&json, Some(&bin));
	assert_eq!(result.unwrap(), vec![1]);
	let unsupported: Vec<_> = log.with_code(Code::ExtensionUnsupported).collect();
	assert_eq!(unsupported.len(), 1);
	assert_eq!(unsupported[0].severity, Severity::Warning);
}

#[test]
fn options_from_ron() {
	let options = ImportOptions::from_ron("(parallel: false, strict_sparse_order: false)").unwrap();
	assert!(!options.parallel);
	assert!(!options.strict_sparse_order);
	assert!(options.validate);
}

#[test]
fn root_lights_and_variants() {
	let registry = ExtensionRegistry::khronos();
	let doc = isopod_gltf::parse_document(r#"{
		"asset": {"version": "2.0"},
		"extensionsUsed": ["KHR_lights_punctual", "KHR_materials_variants"],
		"extensions": {
			"KHR_lights_punctual": {"lights": [{"type": "spot", "intensity": 3.0, "spot": {}}, {"type": "point"}]},
			"KHR_materials_variants": {"variants": [{"name": "day"}, {"name": "night"}]}
		},
		"nodes": [{"extensions": {"KHR_lights_punctual": {"light": 1}}}]
	}"#, &registry).unwrap();
	let lights = doc.lights();
	assert_eq!(lights.len(), 2);
	assert_eq!(lights[0].kind, LightKind::Spot);
	assert_eq!(lights[0].intensity, 3.0);
	assert_eq!(lights[1].color, [1.0; 3]);
	assert_eq!(doc.nodes[0].light(), Some(1));
	let names: Vec<_> = doc.material_variants().iter().map(|v| v.name.as_str()).collect();
	assert_eq!(names, ["day", "night"]);
}

#[test]
fn meshes_with_failed_primitives_can_be_cloned() {
	let (json, bin) = triangle();
	let json = json.replacen(r#""indices": 1"#, r#""indices": 0"#, 1);
	let glb = assemble_glb(&json, Some(&bin));
	let registry = ExtensionRegistry::khronos();
	let mut log = DiagnosticLog::new();
	let import = Importer::new(&registry).import(&glb, &mut log, &CancelToken::new()).unwrap();
	let meshes = import.meshes.clone();
	assert_eq!(meshes, import.meshes);
	assert_eq!(meshes[0].primitives[0].as_ref().unwrap_err().code(), Code::BufferMainInvalidType);
}

#[test]
fn chunk_padding_is_not_buffer_data() {
	let json = r#"{
		"asset": {"version": "2.0"},
		"buffers": [{"byteLength": 6}],
		"bufferViews": [{"buffer": 0, "byteLength": 8}, {"buffer": 0, "byteLength": 6}],
		"accessors": [
			{"bufferView": 0, "componentType": 5121, "count": 8, "type": "SCALAR"},
			{"bufferView": 1, "componentType": 5121, "count": 6, "type": "SCALAR"}
		]
	}"#;
	let glb = assemble_glb(json, Some(&[1, 2, 3, 4, 5, 6]));
	let registry = ExtensionRegistry::khronos();
	let mut log = DiagnosticLog::new();
	let import = Importer::new(&registry).import(&glb, &mut log, &CancelToken::new()).unwrap();

	assert_eq!(log.with_code(Code::BufferViewOutOfBounds).count(), 1);
	assert!(import.accessor(0).is_err());
	assert_eq!(import.accessor(1).unwrap().to_uvecs::<1>(), Some(vec![[1], [2], [3], [4], [5], [6]]));
}
