//! Helpers shared by the integration tests.
#![allow(dead_code)]

pub const GLB_MAGIC: &[u8; 4] = b"glTF";
pub const CHUNK_JSON: u32 = 0x4E4F534A;
pub const CHUNK_BIN: u32 = 0x004E4942;

/// Builds a `.glb` from json text and an optional binary blob.
///
/// The json chunk is padded with spaces and the binary chunk with zeros, both to 4 bytes.
pub fn assemble_glb(json: &str, bin: Option<&[u8]>) -> Vec<u8> {
	let json = json.as_bytes();
	let json_padding = (4 - (json.len() % 4)) % 4;
	let json_chunk_len = json.len() + json_padding;

	let bin_chunk_len = bin.map(|b| b.len() + (4 - (b.len() % 4)) % 4);
	let total_len = 12 + 8 + json_chunk_len + bin_chunk_len.map_or(0, |len| 8 + len);

	let mut glb = Vec::with_capacity(total_len);

	// header
	glb.extend_from_slice(GLB_MAGIC);
	glb.extend_from_slice(&2u32.to_le_bytes());
	glb.extend_from_slice(&(total_len as u32).to_le_bytes());

	// json chunk
	glb.extend_from_slice(&(json_chunk_len as u32).to_le_bytes());
	glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
	glb.extend_from_slice(json);
	glb.extend(std::iter::repeat_n(0x20u8, json_padding));

	// bin chunk
	if let (Some(bin), Some(len)) = (bin, bin_chunk_len) {
		glb.extend_from_slice(&(len as u32).to_le_bytes());
		glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
		glb.extend_from_slice(bin);
		glb.extend(std::iter::repeat_n(0u8, len - bin.len()));
	}

	assert_eq!(glb.len(), total_len);
	glb
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
	values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn u16_bytes(values: &[u16]) -> Vec<u8> {
	values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn u32_bytes(values: &[u32]) -> Vec<u8> {
	values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// A single indexed triangle: 3 positions followed by 3 u16 indices.
pub fn triangle() -> (String, Vec<u8>) {
	let mut bin = f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
	bin.extend(u16_bytes(&[0, 1, 2]));
	let json = format!(r#"{{
		"asset": {{"version": "2.0", "generator": "isopod-gltf tests"}},
		"scene": 0,
		"scenes": [{{"nodes": [0]}}],
		"nodes": [{{"mesh": 0, "translation": [1.0, 2.0, 3.0]}}],
		"meshes": [{{"name": "tri", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1}}]}}],
		"buffers": [{{"byteLength": {}}}],
		"bufferViews": [
			{{"buffer": 0, "byteLength": 36, "target": 34962}},
			{{"buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963}}
		],
		"accessors": [
			{{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0]}},
			{{"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}}
		]
	}}"#, bin.len());
	(json, bin)
}
