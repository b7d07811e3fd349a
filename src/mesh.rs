//! Vertex and index data of mesh primitives, ready for upload.

use rayon::prelude::*;

use crate::{
	accessor::{AccessorError, AccessorView, Resolver, Usage},
	diagnostics::{Code, Diagnostic, DiagnosticSink, Severity},
	extensions::{VariantMapping, KHR_DRACO_MESH_COMPRESSION},
	json::{Mesh, Primitive, PrimitiveMode, Semantic},
	util::{CancelToken, Cancelled},
};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PrimitiveError {
	#[error("mesh {0} does not exist")]
	MissingMesh(usize),
	#[error("primitive has no POSITION attribute")]
	MissingPositions,
	#[error("primitive is compressed with {0} and no decoder is available")]
	CompressionUnsupported(String),
	#[error("{semantic}: {source}")]
	Attribute { semantic: String, source: AccessorError },
	#[error("indices: {0}")]
	Indices(#[source] AccessorError),
	#[error("{semantic} has {count} elements but POSITION has {expected}")]
	CountMismatch { semantic: String, count: usize, expected: usize },
	#[error("index {position} is {value} but there are only {vertices} vertices")]
	IndexOutOfRange { position: usize, value: u32, vertices: usize },
}

impl PrimitiveError {
	pub fn code(&self) -> Code {
		match self {
			PrimitiveError::MissingMesh(_) | PrimitiveError::MissingPositions => Code::MissingReference,
			PrimitiveError::CompressionUnsupported(_) => Code::PackageMissing,
			PrimitiveError::Attribute { source, .. } | PrimitiveError::Indices(source) => source.code(),
			PrimitiveError::CountMismatch { .. } | PrimitiveError::IndexOutOfRange { .. } => Code::PrimitiveInvalid,
		}
	}

	/// Compression is a missing capability, everything else is an error in the document.
	pub fn severity(&self) -> Severity {
		match self {
			PrimitiveError::CompressionUnsupported(_) => Severity::Warning,
			_ => Severity::Error,
		}
	}

	pub fn diagnostic(&self, mesh: usize, primitive: usize) -> Diagnostic {
		let who = format!("mesh {mesh} primitive {primitive}");
		let args = match self {
			PrimitiveError::MissingMesh(mesh) => vec!["document".to_string(), "mesh".to_string(), mesh.to_string()],
			PrimitiveError::MissingPositions => vec![who, "attribute".to_string(), "POSITION".to_string()],
			PrimitiveError::CompressionUnsupported(name) => vec![name.clone(), format!("{who} is skipped")],
			PrimitiveError::Attribute { source, .. } | PrimitiveError::Indices(source) => source.args(&who),
			PrimitiveError::CountMismatch { .. } | PrimitiveError::IndexOutOfRange { .. } => vec![who, self.to_string()],
		};
		Diagnostic::new(self.severity(), self.code(), args)
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphTarget {
	pub positions: Vec<[f32; 3]>,
	pub normals: Vec<[f32; 3]>,
	pub tangents: Vec<[f32; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveData {
	pub mode: PrimitiveMode,
	pub material: Option<usize>,
	pub indices: Option<Vec<u32>>,
	pub n_vertices: usize,
	pub positions: Vec<[f32; 3]>,
	pub normals: Vec<[f32; 3]>,
	pub tangents: Vec<[f32; 4]>,
	pub tex_coords: Vec<Vec<[f32; 2]>>,
	/// RGB colors are widened with an alpha of 1.
	pub colors: Vec<Vec<[f32; 4]>>,
	pub joints: Vec<Vec<[u16; 4]>>,
	pub weights: Vec<Vec<[f32; 4]>>,
	pub targets: Vec<MorphTarget>,
	pub variants: Vec<VariantMapping>,
}

/// A mesh whose primitives resolved independently of each other.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
	pub name: Option<String>,
	pub weights: Vec<f32>,
	pub primitives: Vec<Result<PrimitiveData, PrimitiveError>>,
}

impl MeshData {
	pub fn valid_primitives(&self) -> impl Iterator<Item = &PrimitiveData> {
		self.primitives.iter().filter_map(|p| p.as_ref().ok())
	}
}

fn attribute<'a>(resolver: &Resolver<'a>, index: usize, semantic: Semantic) -> Result<AccessorView<'a>, PrimitiveError> {
	resolver.resolve_for(index, &Usage::Attribute(semantic.clone()))
		.map_err(|source| PrimitiveError::Attribute { semantic: semantic.to_string(), source })
}

fn attribute_set<const N: usize>(
	resolver: &Resolver<'_>,
	primitive: &Primitive,
	make: fn(u32) -> Semantic,
	fill: f32,
) -> Result<Vec<Vec<[f32; N]>>, PrimitiveError> {
	(0..).map_while(|n| primitive.attribute(&make(n)).map(|i| (n, i)))
		.map(|(n, i)| attribute(resolver, i, make(n)).map(|view| view.to_vecs::<N>(fill)))
		.collect()
}

fn morph_vecs(resolver: &Resolver<'_>, index: Option<&usize>, semantic: Semantic) -> Result<Vec<[f32; 3]>, PrimitiveError> {
	let Some(&index) = index else {
		return Ok(Vec::new());
	};
	// targets hold displacements, so any type a generic read can handle is fine
	resolver.resolve_for(index, &Usage::Generic)
		.map(|view| view.to_vecs::<3>(0.0))
		.map_err(|source| PrimitiveError::Attribute { semantic: semantic.to_string(), source })
}

/// Resolves the vertex and index data of one primitive.
pub fn resolve_primitive(resolver: &Resolver<'_>, primitive: &Primitive) -> Result<PrimitiveData, PrimitiveError> {
	if primitive.extensions.contains(KHR_DRACO_MESH_COMPRESSION) {
		return Err(PrimitiveError::CompressionUnsupported(KHR_DRACO_MESH_COMPRESSION.to_string()));
	}

	let positions = primitive.attribute(&Semantic::Positions)
		.map(|i| attribute(resolver, i, Semantic::Positions))
		.transpose()?
		.ok_or(PrimitiveError::MissingPositions)?
		.to_vecs::<3>(0.0);
	let normals = primitive.attribute(&Semantic::Normals)
		.map(|i| attribute(resolver, i, Semantic::Normals).map(|v| v.to_vecs::<3>(0.0)))
		.transpose()?
		.unwrap_or_default();
	let tangents = primitive.attribute(&Semantic::Tangents)
		.map(|i| attribute(resolver, i, Semantic::Tangents).map(|v| v.to_vecs::<4>(0.0)))
		.transpose()?
		.unwrap_or_default();
	let tex_coords = attribute_set::<2>(resolver, primitive, Semantic::TexCoords, 0.0)?;
	let colors = attribute_set::<4>(resolver, primitive, Semantic::Colors, 1.0)?;
	let weights = attribute_set::<4>(resolver, primitive, Semantic::Weights, 0.0)?;
	let joints: Vec<Vec<[u16; 4]>> = (0..).map_while(|n| primitive.attribute(&Semantic::Joints(n)).map(|i| (n, i)))
		.map(|(n, i)| {
			let view = attribute(resolver, i, Semantic::Joints(n))?;
			// joint types are limited to u8/u16, so they always fit
			Ok(view.to_uvecs::<4>().unwrap_or_default().into_iter().map(|j| j.map(|c| c as u16)).collect())
		})
		.collect::<Result<Vec<_>, PrimitiveError>>()?;

	let indices = primitive.indices.map(|i| {
		let view = resolver.resolve_for(i, &Usage::Index).map_err(PrimitiveError::Indices)?;
		Ok((0..view.len()).filter_map(|e| view.read_u32(e, 0)).collect::<Vec<_>>())
	}).transpose()?;

	let targets = primitive.targets.iter().map(|target| {
		Ok(MorphTarget {
			positions: morph_vecs(resolver, target.get("POSITION"), Semantic::Positions)?,
			normals: morph_vecs(resolver, target.get("NORMAL"), Semantic::Normals)?,
			tangents: morph_vecs(resolver, target.get("TANGENT"), Semantic::Tangents)?,
		})
	}).collect::<Result<Vec<_>, PrimitiveError>>()?;

	// every vertex stream must line up with POSITION and every index must land inside it
	let n_vertices = positions.len();
	let same_count = |semantic: Semantic, count: usize| {
		if count == n_vertices {
			Ok(())
		} else {
			Err(PrimitiveError::CountMismatch { semantic: semantic.to_string(), count, expected: n_vertices })
		}
	};
	if primitive.attribute(&Semantic::Normals).is_some() {
		same_count(Semantic::Normals, normals.len())?;
	}
	if primitive.attribute(&Semantic::Tangents).is_some() {
		same_count(Semantic::Tangents, tangents.len())?;
	}
	for (n, set) in (0..).zip(&tex_coords) {
		same_count(Semantic::TexCoords(n), set.len())?;
	}
	for (n, set) in (0..).zip(&colors) {
		same_count(Semantic::Colors(n), set.len())?;
	}
	for (n, set) in (0..).zip(&joints) {
		same_count(Semantic::Joints(n), set.len())?;
	}
	for (n, set) in (0..).zip(&weights) {
		same_count(Semantic::Weights(n), set.len())?;
	}
	for (source, target) in primitive.targets.iter().zip(&targets) {
		for (name, values) in [("POSITION", &target.positions), ("NORMAL", &target.normals), ("TANGENT", &target.tangents)] {
			if source.contains_key(name) {
				same_count(Semantic::parse(name), values.len())?;
			}
		}
	}
	if let Some((position, &value)) = indices.iter().flatten().enumerate().find(|(_, v)| **v as usize >= n_vertices) {
		return Err(PrimitiveError::IndexOutOfRange { position, value, vertices: n_vertices });
	}

	Ok(PrimitiveData {
		mode: primitive.mode,
		material: primitive.material,
		variants: primitive.variant_mappings().to_vec(),
		positions, normals, tangents, tex_coords, colors, joints, weights, indices, n_vertices, targets,
	})
}

fn resolve_mesh_with(resolver: &Resolver<'_>, mesh: &Mesh) -> MeshData {
	MeshData {
		name: mesh.name.clone(),
		weights: mesh.weights.clone().unwrap_or_default(),
		primitives: mesh.primitives.iter().map(|p| resolve_primitive(resolver, p)).collect(),
	}
}

/// Resolves mesh `index`, a bad primitive does not stop its siblings.
pub fn resolve_mesh(resolver: &Resolver<'_>, index: usize) -> Result<MeshData, PrimitiveError> {
	let mesh = resolver.document().meshes.get(index).ok_or(PrimitiveError::MissingMesh(index))?;
	Ok(resolve_mesh_with(resolver, mesh))
}

fn mesh_diagnostics(index: usize, mesh: &MeshData) -> Vec<Diagnostic> {
	mesh.primitives.iter().enumerate()
		.filter_map(|(p, result)| result.as_ref().err().map(|e| e.diagnostic(index, p)))
		.collect()
}

/// Resolves every mesh of the document, reporting failed primitives in mesh order.
pub fn resolve_meshes(
	resolver: &Resolver<'_>,
	parallel: bool,
	sink: &mut dyn DiagnosticSink,
	cancel: &CancelToken,
) -> Result<Vec<MeshData>, Cancelled> {
	let meshes = &resolver.document().meshes;
	let resolve = |(i, mesh): (usize, &Mesh)| {
		if cancel.is_cancelled() {
			return None;
		}
		let data = resolve_mesh_with(resolver, mesh);
		let diagnostics = mesh_diagnostics(i, &data);
		Some((data, diagnostics))
	};
	let results: Vec<_> = if parallel {
		meshes.par_iter().enumerate().map(resolve).collect()
	} else {
		meshes.iter().enumerate().map(resolve).collect()
	};
	cancel.check("mesh resolution")?;

	let mut out = Vec::with_capacity(results.len());
	for (data, diagnostics) in results.into_iter().flatten() {
		for diagnostic in diagnostics {
			sink.emit(diagnostic);
		}
		out.push(data);
	}
	log::debug!("resolved {} meshes", out.len());
	Ok(out)
}
