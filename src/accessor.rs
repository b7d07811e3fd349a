//! Typed, bounds checked views over accessor data, including sparse patching.

use std::borrow::Cow;

use crate::{
	buffer::{Buffers, ViewError},
	diagnostics::{Code, Diagnostic, Severity},
	extensions::KHR_MESH_QUANTIZATION,
	json::{Accessor, AccessorSparse, AttributeType, ComponentType, ElementLayout, GltfDocument, Semantic},
};

/// Largest zero filled base an accessor without a buffer view may allocate.
pub const MAX_DENSE_LEN: usize = 1 << 30;

/// Fixed point integer to float conversion used for normalized accessors.
trait IntoF32Norm: Sized {
	fn into_norm(self) -> f32;
}

impl IntoF32Norm for u8 {
	fn into_norm(self) -> f32 {
		self as f32 / u8::MAX as f32
	}
}

impl IntoF32Norm for u16 {
	fn into_norm(self) -> f32 {
		self as f32 / u16::MAX as f32
	}
}

impl IntoF32Norm for u32 {
	fn into_norm(self) -> f32 {
		(self as f64 / u32::MAX as f64) as f32
	}
}

impl IntoF32Norm for i8 {
	fn into_norm(self) -> f32 {
		(self as f32 / i8::MAX as f32).max(-1.0)
	}
}

impl IntoF32Norm for i16 {
	fn into_norm(self) -> f32 {
		(self as f32 / i16::MAX as f32).max(-1.0)
	}
}

/// What an accessor is read for, which decides the type combinations it may have.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Usage {
	Index,
	Attribute(Semantic),
	AnimationInput,
	AnimationOutput,
	InverseBindMatrices,
	Generic,
}

impl std::fmt::Display for Usage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Usage::Index => f.write_str("indices"),
			Usage::Attribute(semantic) => write!(f, "{semantic} attribute"),
			Usage::AnimationInput => f.write_str("animation input"),
			Usage::AnimationOutput => f.write_str("animation output"),
			Usage::InverseBindMatrices => f.write_str("inverse bind matrices"),
			Usage::Generic => f.write_str("generic data"),
		}
	}
}

impl Usage {
	/// Whether two usages may share one accessor.
	pub fn is_compatible(&self, other: &Usage) -> bool {
		use Usage::*;
		match (self, other) {
			(Generic, _) | (_, Generic) => true,
			(Attribute(_), Attribute(_)) => true,
			(a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
		}
	}

	/// Checks the type, component type and normalization of `accessor` against this usage.
	///
	/// `quantized` widens the vertex attribute rules as `KHR_mesh_quantization` does.
	pub fn check(&self, index: usize, accessor: &Accessor, quantized: bool) -> Result<(), AccessorError> {
		use ComponentType::*;
		let ct = accessor.component_type;
		let norm = accessor.normalized;
		let ty = &accessor.ty;
		if accessor.layout().is_none() {
			return Err(self.invalid(index, accessor));
		}
		let allowed = match self {
			Usage::Index => {
				if *ty != AttributeType::Scalar {
					false
				} else if !ct.is_unsigned_int() || norm {
					return Err(AccessorError::IndexFormat { accessor: index, component_type: ct });
				} else {
					true
				}
			},
			Usage::Attribute(semantic) => match semantic {
				Semantic::Positions => *ty == AttributeType::Vec3 && (
					ct == F32 || (quantized && matches!(ct, I8 | U8 | I16 | U16))
				),
				Semantic::Normals => *ty == AttributeType::Vec3 && (
					ct == F32 || (quantized && norm && matches!(ct, I8 | I16))
				),
				Semantic::Tangents => *ty == AttributeType::Vec4 && (
					ct == F32 || (quantized && norm && matches!(ct, I8 | I16))
				),
				Semantic::TexCoords(_) => *ty == AttributeType::Vec2 && (
					ct == F32 || (norm && matches!(ct, U8 | U16)) || (quantized && matches!(ct, I8 | U8 | I16 | U16))
				),
				Semantic::Colors(_) => matches!(ty, AttributeType::Vec3 | AttributeType::Vec4) && (
					ct == F32 || (norm && matches!(ct, U8 | U16))
				),
				Semantic::Joints(_) => *ty == AttributeType::Vec4 && matches!(ct, U8 | U16) && !norm,
				Semantic::Weights(_) => *ty == AttributeType::Vec4 && (
					ct == F32 || (norm && matches!(ct, U8 | U16))
				),
				Semantic::Custom(_) => true,
			},
			Usage::AnimationInput => *ty == AttributeType::Scalar && ct == F32,
			Usage::AnimationOutput => ct == F32 || (norm && ct != U32),
			Usage::InverseBindMatrices => *ty == AttributeType::Mat4 && ct == F32,
			Usage::Generic => true,
		};
		if allowed {
			Ok(())
		} else {
			Err(self.invalid(index, accessor))
		}
	}

	fn invalid(&self, index: usize, accessor: &Accessor) -> AccessorError {
		AccessorError::InvalidType {
			accessor: index,
			component_type: accessor.component_type,
			ty: accessor.ty.clone(),
			normalized: accessor.normalized,
			usage: self.to_string(),
		}
	}
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AccessorError {
	#[error("accessor {0} does not exist")]
	Missing(usize),
	#[error("accessor {accessor} has type {component_type}/{ty} which is not allowed as {usage}")]
	InvalidType { accessor: usize, component_type: ComponentType, ty: AttributeType, normalized: bool, usage: String },
	#[error("accessor {accessor} has component type {component_type} which cannot hold indices")]
	IndexFormat { accessor: usize, component_type: ComponentType },
	#[error("accessor {accessor}: {source}")]
	View { accessor: usize, source: ViewError },
	#[error("accessor {accessor} needs {needed} bytes but its buffer view only has {available}")]
	OutOfBounds { accessor: usize, needed: usize, available: usize },
	#[error("accessor {accessor} has a stride of {stride} bytes which is smaller than its {size} byte elements")]
	StrideTooSmall { accessor: usize, stride: usize, size: usize },
	#[error("accessor {accessor} would need {len} bytes of zeroed data")]
	TooLarge { accessor: usize, len: usize },
	#[error("sparse accessor {accessor} is invalid: {reason}")]
	Sparse { accessor: usize, reason: String },
}

impl AccessorError {
	pub fn code(&self) -> Code {
		match self {
			AccessorError::Missing(_) => Code::MissingReference,
			AccessorError::InvalidType { .. } => Code::BufferMainInvalidType,
			AccessorError::IndexFormat { .. } => Code::IndexFormatInvalid,
			AccessorError::View { source, .. } => source.code(),
			AccessorError::OutOfBounds { .. } | AccessorError::StrideTooSmall { .. } | AccessorError::TooLarge { .. } => Code::AccessorOutOfBounds,
			AccessorError::Sparse { .. } => Code::SparseAccessor,
		}
	}

	pub fn accessor(&self) -> usize {
		match self {
			AccessorError::Missing(accessor)
			| AccessorError::InvalidType { accessor, .. }
			| AccessorError::IndexFormat { accessor, .. }
			| AccessorError::View { accessor, .. }
			| AccessorError::OutOfBounds { accessor, .. }
			| AccessorError::StrideTooSmall { accessor, .. }
			| AccessorError::TooLarge { accessor, .. }
			| AccessorError::Sparse { accessor, .. } => *accessor,
		}
	}

	/// Arguments for the template of [AccessorError::code], `who` names the referencing entity.
	pub fn args(&self, who: &str) -> Vec<String> {
		match self {
			AccessorError::Missing(accessor) => vec![who.to_string(), "accessor".to_string(), accessor.to_string()],
			AccessorError::InvalidType { accessor, component_type, ty, normalized, usage } => vec![
				accessor.to_string(),
				if *normalized { format!("normalized {component_type}") } else { component_type.to_string() },
				ty.to_string(),
				usage.clone(),
			],
			AccessorError::IndexFormat { accessor, component_type } => vec![accessor.to_string(), component_type.to_string()],
			AccessorError::View { accessor, source } => source.args(&format!("accessor {accessor}")),
			AccessorError::OutOfBounds { accessor, needed, available } => vec![accessor.to_string(), needed.to_string(), available.to_string()],
			AccessorError::StrideTooSmall { accessor, stride, size } => vec![accessor.to_string(), size.to_string(), stride.to_string()],
			AccessorError::TooLarge { accessor, len } => vec![accessor.to_string(), len.to_string(), MAX_DENSE_LEN.to_string()],
			AccessorError::Sparse { accessor, reason } => vec![accessor.to_string(), reason.clone()],
		}
	}

	pub fn diagnostic(&self, who: &str) -> Diagnostic {
		Diagnostic::new(Severity::Error, self.code(), self.args(who))
	}
}

/// Resolved data of one accessor.
///
/// Every element lies inside `data`, which is checked once when the view is made.
#[derive(Debug, Clone)]
pub struct AccessorView<'a> {
	data: Cow<'a, [u8]>,
	stride: usize,
	count: usize,
	layout: ElementLayout,
	component_type: ComponentType,
	normalized: bool,
}

impl<'a> AccessorView<'a> {
	pub fn len(&self) -> usize {
		self.count
	}

	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	pub fn stride(&self) -> usize {
		self.stride
	}

	pub fn layout(&self) -> ElementLayout {
		self.layout
	}

	pub fn component_type(&self) -> ComponentType {
		self.component_type
	}

	pub fn normalized(&self) -> bool {
		self.normalized
	}

	/// Number of components in an element.
	pub fn components(&self) -> usize {
		self.layout.components()
	}

	/// True if the sparse patch forced a dense copy.
	pub fn is_owned(&self) -> bool {
		matches!(self.data, Cow::Owned(_))
	}

	/// Raw bytes of element `i`, including any matrix column padding.
	pub fn element(&self, i: usize) -> Option<&[u8]> {
		if i >= self.count {
			return None;
		}
		let start = i.checked_mul(self.stride)?;
		self.data.get(start..start.checked_add(self.layout.size())?)
	}

	fn component_bytes(&self, i: usize, c: usize) -> Option<&[u8]> {
		if c >= self.layout.components() {
			return None;
		}
		let offset = self.layout.component_offset(c);
		self.element(i)?.get(offset..offset + self.layout.component_size)
	}

	/// Component `c` of element `i` as a float, mapping normalized integers into `[0, 1]` or `[-1, 1]`.
	pub fn read_f32(&self, i: usize, c: usize) -> Option<f32> {
		let b = self.component_bytes(i, c)?;
		let norm = self.normalized;
		Some(match self.component_type {
			ComponentType::I8 => {
				let v = i8::from_le_bytes([b[0]]);
				if norm { v.into_norm() } else { v as f32 }
			},
			ComponentType::U8 => if norm { b[0].into_norm() } else { b[0] as f32 },
			ComponentType::I16 => {
				let v = i16::from_le_bytes([b[0], b[1]]);
				if norm { v.into_norm() } else { v as f32 }
			},
			ComponentType::U16 => {
				let v = u16::from_le_bytes([b[0], b[1]]);
				if norm { v.into_norm() } else { v as f32 }
			},
			ComponentType::U32 => {
				let v = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
				if norm { v.into_norm() } else { v as f32 }
			},
			ComponentType::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
			ComponentType::Other(_) => return None,
		})
	}

	/// Component `c` of element `i` as an unsigned integer, [None] for floats and negative values.
	pub fn read_u32(&self, i: usize, c: usize) -> Option<u32> {
		let b = self.component_bytes(i, c)?;
		match self.component_type {
			ComponentType::U8 => Some(b[0] as u32),
			ComponentType::U16 => Some(u16::from_le_bytes([b[0], b[1]]) as u32),
			ComponentType::U32 => Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
			ComponentType::I8 => u32::try_from(i8::from_le_bytes([b[0]])).ok(),
			ComponentType::I16 => u32::try_from(i16::from_le_bytes([b[0], b[1]])).ok(),
			ComponentType::F32 | ComponentType::Other(_) => None,
		}
	}

	/// The first `N` components of element `i`, missing ones set to `fill`.
	pub fn read_vec_or<const N: usize>(&self, i: usize, fill: f32) -> Option<[f32; N]> {
		self.element(i)?;
		let mut out = [fill; N];
		for (c, v) in out.iter_mut().enumerate().take(self.components()) {
			*v = self.read_f32(i, c)?;
		}
		Some(out)
	}

	pub fn read_vec<const N: usize>(&self, i: usize) -> Option<[f32; N]> {
		self.read_vec_or(i, 0.0)
	}

	/// Every element as `N` floats.
	pub fn to_vecs<const N: usize>(&self, fill: f32) -> Vec<[f32; N]> {
		(0..self.count).filter_map(|i| self.read_vec_or(i, fill)).collect()
	}

	/// Every element as `N` unsigned integers, [None] if any component is not representable.
	pub fn to_uvecs<const N: usize>(&self) -> Option<Vec<[u32; N]>> {
		(0..self.count).map(|i| {
			let mut out = [0; N];
			for (c, v) in out.iter_mut().enumerate().take(self.components()) {
				*v = self.read_u32(i, c)?;
			}
			Some(out)
		}).collect()
	}

	/// Every component of every element, as floats.
	pub fn to_flat_f32(&self) -> Vec<f32> {
		let components = self.components();
		let mut out = Vec::with_capacity(self.count * components);
		for i in 0..self.count {
			for c in 0..components {
				out.push(self.read_f32(i, c).unwrap_or(0.0));
			}
		}
		out
	}

	/// Tightly packed copy of all elements, matrix padding included.
	pub fn to_bytes(&self) -> Vec<u8> {
		let size = self.layout.size();
		if self.stride == size {
			return self.data[..self.count * size].to_vec();
		}
		let mut out = Vec::with_capacity(self.count * size);
		for i in 0..self.count {
			if let Some(element) = self.element(i) {
				out.extend_from_slice(element);
			}
		}
		out
	}

	/// Zero copy view of the data as `T`.
	///
	/// Only succeeds when elements are tightly packed and the bytes happen to be aligned for `T`.
	/// The data is little endian, so this is only meaningful on little endian targets.
	pub fn as_slice<T: bytemuck::Pod>(&self) -> Option<&[T]> {
		if self.stride != self.layout.size() {
			return None;
		}
		bytemuck::try_cast_slice(&self.data[..self.count * self.stride]).ok()
	}
}

/// Resolves accessors of one document against its loaded buffers.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
	document: &'a GltfDocument,
	buffers: &'a Buffers<'a>,
	strict_sparse_order: bool,
	quantized: bool,
}

impl<'a> Resolver<'a> {
	pub fn new(document: &'a GltfDocument, buffers: &'a Buffers<'a>) -> Self {
		Self {
			document,
			buffers,
			strict_sparse_order: true,
			quantized: document.uses_extension(KHR_MESH_QUANTIZATION),
		}
	}

	/// Accept sparse indices in any order instead of requiring them to be strictly increasing.
	pub fn lenient_sparse_order(mut self) -> Self {
		self.strict_sparse_order = false;
		self
	}

	pub fn with_strict_sparse_order(mut self, strict: bool) -> Self {
		self.strict_sparse_order = strict;
		self
	}

	pub fn document(&self) -> &'a GltfDocument {
		self.document
	}

	pub fn buffers(&self) -> &'a Buffers<'a> {
		self.buffers
	}

	pub fn is_quantized(&self) -> bool {
		self.quantized
	}

	pub fn accessor(&self, index: usize) -> Result<&'a Accessor, AccessorError> {
		self.document.accessors.get(index).ok_or(AccessorError::Missing(index))
	}

	/// Resolves accessor `index` after checking it is allowed for `usage`.
	pub fn resolve_for(&self, index: usize, usage: &Usage) -> Result<AccessorView<'a>, AccessorError> {
		usage.check(index, self.accessor(index)?, self.quantized)?;
		self.resolve(index)
	}

	pub fn resolve(&self, index: usize) -> Result<AccessorView<'a>, AccessorError> {
		let accessor = self.accessor(index)?;
		let layout = accessor.layout().ok_or_else(|| Usage::Generic.invalid(index, accessor))?;
		let size = layout.size();

		let mut view = match accessor.buffer_view {
			Some(view_index) => {
				let bytes = self.buffers.view(self.document, view_index)
					.map_err(|source| AccessorError::View { accessor: index, source })?;
				let stride = self.document.buffer_views[view_index].stride().unwrap_or(size);
				if stride < size {
					return Err(AccessorError::StrideTooSmall { accessor: index, stride, size });
				}
				let needed = match accessor.count {
					0 => Some(0),
					n => (n - 1).checked_mul(stride).and_then(|v| v.checked_add(size)),
				}.and_then(|v| v.checked_add(accessor.byte_offset));
				let start = accessor.byte_offset;
				let data = needed.and_then(|end| bytes.get(start..end)).ok_or(AccessorError::OutOfBounds {
					accessor: index,
					needed: needed.unwrap_or(usize::MAX),
					available: bytes.len(),
				})?;
				AccessorView {
					data: Cow::Borrowed(data),
					stride,
					count: accessor.count,
					layout,
					component_type: accessor.component_type,
					normalized: accessor.normalized,
				}
			},
			None => {
				let len = accessor.count.checked_mul(size)
					.filter(|len| *len <= MAX_DENSE_LEN)
					.ok_or(AccessorError::TooLarge { accessor: index, len: accessor.count.saturating_mul(size) })?;
				AccessorView {
					data: Cow::Owned(vec![0; len]),
					stride: size,
					count: accessor.count,
					layout,
					component_type: accessor.component_type,
					normalized: accessor.normalized,
				}
			},
		};

		if let Some(sparse) = &accessor.sparse {
			self.apply_sparse(index, accessor, sparse, &mut view)?;
		}
		Ok(view)
	}

	fn apply_sparse(&self, index: usize, accessor: &Accessor, sparse: &AccessorSparse, view: &mut AccessorView<'a>) -> Result<(), AccessorError> {
		let fail = |reason: String| AccessorError::Sparse { accessor: index, reason };
		if sparse.count > accessor.count {
			return Err(fail(format!("{} overrides for only {} elements", sparse.count, accessor.count)));
		}
		let index_size = match sparse.indices.component_type {
			ComponentType::U8 => 1,
			ComponentType::U16 => 2,
			ComponentType::U32 => 4,
			other => return Err(fail(format!("indices have component type {other}"))),
		};
		let size = view.layout.size();

		let indices = self.sparse_bytes(sparse.indices.buffer_view, sparse.indices.byte_offset, sparse.count, index_size)
			.map_err(|reason| fail(format!("indices {reason}")))?;
		let values = self.sparse_bytes(sparse.values.buffer_view, sparse.values.byte_offset, sparse.count, size)
			.map_err(|reason| fail(format!("values {reason}")))?;

		let mut dense = view.to_bytes();
		let mut previous = None;
		for (i, (index_bytes, value)) in indices.chunks_exact(index_size).zip(values.chunks_exact(size)).enumerate() {
			let target = match index_size {
				1 => index_bytes[0] as usize,
				2 => u16::from_le_bytes([index_bytes[0], index_bytes[1]]) as usize,
				_ => u32::from_le_bytes([index_bytes[0], index_bytes[1], index_bytes[2], index_bytes[3]]) as usize,
			};
			if target >= accessor.count {
				return Err(fail(format!("index {i} points at element {target} of {}", accessor.count)));
			}
			if self.strict_sparse_order && previous.is_some_and(|p| target <= p) {
				return Err(fail(format!("index {i} ({target}) is not strictly increasing")));
			}
			previous = Some(target);
			dense[target * size..(target + 1) * size].copy_from_slice(value);
		}
		log::trace!("accessor {index}: patched {} of {} elements", sparse.count, accessor.count);
		view.data = Cow::Owned(dense);
		view.stride = size;
		Ok(())
	}

	// sparse index and value views are always tightly packed
	fn sparse_bytes(&self, view: usize, offset: usize, count: usize, size: usize) -> Result<&'a [u8], String> {
		let bytes = self.buffers.view(self.document, view).map_err(|e| e.to_string())?;
		let len = count.checked_mul(size).ok_or_else(|| "are too large".to_string())?;
		offset.checked_add(len)
			.and_then(|end| bytes.get(offset..end))
			.ok_or_else(|| format!("need {} bytes but buffer view {view} only has {}", offset.saturating_add(len), bytes.len()))
	}
}

/// Resolves one accessor with default settings.
pub fn resolve_accessor<'a>(document: &'a GltfDocument, buffers: &'a Buffers<'a>, index: usize) -> Result<AccessorView<'a>, AccessorError> {
	Resolver::new(document, buffers).resolve(index)
}
