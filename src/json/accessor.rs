use crate::{extensions::Extensions, util::align_up};
use super::{Extras, Unclassified};

gl_enum!(ComponentType {
	I8 = 5120,
	U8 = 5121,
	I16 = 5122,
	U16 = 5123,
	U32 = 5125,
	F32 = 5126,
});

impl ComponentType {
	/// Size of one component in bytes, [None] for unknown types.
	pub fn size(self) -> Option<usize> {
		match self {
			ComponentType::I8 | ComponentType::U8 => Some(1),
			ComponentType::I16 | ComponentType::U16 => Some(2),
			ComponentType::U32 | ComponentType::F32 => Some(4),
			ComponentType::Other(_) => None,
		}
	}

	pub fn is_unsigned_int(self) -> bool {
		matches!(self, ComponentType::U8 | ComponentType::U16 | ComponentType::U32)
	}

	pub fn gl_name(self) -> &'static str {
		match self {
			ComponentType::I8 => "BYTE",
			ComponentType::U8 => "UNSIGNED_BYTE",
			ComponentType::I16 => "SHORT",
			ComponentType::U16 => "UNSIGNED_SHORT",
			ComponentType::U32 => "UNSIGNED_INT",
			ComponentType::F32 => "FLOAT",
			ComponentType::Other(_) => "UNKNOWN",
		}
	}
}

impl std::fmt::Display for ComponentType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ComponentType::Other(v) => write!(f, "UNKNOWN({v})"),
			_ => f.write_str(self.gl_name()),
		}
	}
}

string_enum!(AttributeType {
	Scalar = "SCALAR",
	Vec2 = "VEC2",
	Vec3 = "VEC3",
	Vec4 = "VEC4",
	Mat2 = "MAT2",
	Mat3 = "MAT3",
	Mat4 = "MAT4",
});

impl AttributeType {
	/// `(columns, rows)`, vectors are a single column.
	pub fn shape(&self) -> Option<(usize, usize)> {
		match self {
			AttributeType::Scalar => Some((1, 1)),
			AttributeType::Vec2 => Some((1, 2)),
			AttributeType::Vec3 => Some((1, 3)),
			AttributeType::Vec4 => Some((1, 4)),
			AttributeType::Mat2 => Some((2, 2)),
			AttributeType::Mat3 => Some((3, 3)),
			AttributeType::Mat4 => Some((4, 4)),
			AttributeType::Other(_) => None,
		}
	}

	pub fn components(&self) -> Option<usize> {
		self.shape().map(|(columns, rows)| columns * rows)
	}

	pub fn is_matrix(&self) -> bool {
		matches!(self, AttributeType::Mat2 | AttributeType::Mat3 | AttributeType::Mat4)
	}
}

/// Byte layout of one accessor element.
///
/// Matrix columns start on 4 byte boundaries, so `MAT3` of bytes is 12 bytes and not 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLayout {
	pub component_size: usize,
	pub columns: usize,
	pub rows: usize,
	pub column_stride: usize,
}

impl ElementLayout {
	pub fn new(component_type: ComponentType, ty: &AttributeType) -> Option<Self> {
		let component_size = component_type.size()?;
		let (columns, rows) = ty.shape()?;
		let column_stride = if ty.is_matrix() {
			align_up(rows * component_size, 4)
		} else {
			rows * component_size
		};
		Some(Self { component_size, columns, rows, column_stride })
	}

	pub fn components(&self) -> usize {
		self.columns * self.rows
	}

	pub fn size(&self) -> usize {
		self.columns * self.column_stride
	}

	/// Byte offset of component `i` (column major) inside an element.
	pub fn component_offset(&self, i: usize) -> usize {
		(i / self.rows) * self.column_stride + (i % self.rows) * self.component_size
	}

	pub fn is_padded(&self) -> bool {
		self.column_stride != self.rows * self.component_size
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
	pub buffer_view: Option<usize>,
	#[serde(default)]
	pub byte_offset: usize,
	pub component_type: ComponentType,
	#[serde(default)]
	pub normalized: bool,
	pub count: usize,
	#[serde(rename = "type")]
	pub ty: AttributeType,
	pub min: Option<Vec<f64>>,
	pub max: Option<Vec<f64>>,
	pub sparse: Option<AccessorSparse>,
	pub name: Option<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

impl Accessor {
	pub fn layout(&self) -> Option<ElementLayout> {
		ElementLayout::new(self.component_type, &self.ty)
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessorSparse {
	pub count: usize,
	pub indices: SparseIndices,
	pub values: SparseValues,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseIndices {
	pub buffer_view: usize,
	#[serde(default)]
	pub byte_offset: usize,
	pub component_type: ComponentType,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseValues {
	pub buffer_view: usize,
	#[serde(default)]
	pub byte_offset: usize,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
	pub buffer: usize,
	#[serde(default)]
	pub byte_offset: usize,
	pub byte_length: usize,
	pub byte_stride: Option<usize>,
	pub target: Option<u32>,
	pub name: Option<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

impl BufferView {
	/// The stride if one was given, `0` counts as tightly packed.
	pub fn stride(&self) -> Option<usize> {
		self.byte_stride.filter(|s| *s > 0)
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
	pub uri: Option<String>,
	pub byte_length: usize,
	pub name: Option<String>,
	#[serde(default)]
	pub extensions: Extensions,
	#[serde(default)]
	pub extras: Extras,
	#[serde(flatten)]
	pub unclassified: Unclassified,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_component_type_is_kept() {
		assert_eq!(ComponentType::from(5126), ComponentType::F32);
		assert_eq!(ComponentType::from(5124), ComponentType::Other(5124));
		assert_eq!(ComponentType::Other(5124).raw(), 5124);
		assert_eq!(ComponentType::Other(5124).size(), None);
	}

	#[test]
	fn attribute_type_from_string() {
		assert_eq!(AttributeType::from("VEC3".to_string()), AttributeType::Vec3);
		assert_eq!(AttributeType::from("VEC5".to_string()), AttributeType::Other("VEC5".to_string()));
		assert_eq!(AttributeType::Mat4.to_string(), "MAT4");
	}

	#[test]
	fn matrix_columns_are_aligned() {
		let layout = ElementLayout::new(ComponentType::U8, &AttributeType::Mat3).unwrap();
		assert_eq!(layout.size(), 12);
		assert_eq!(layout.component_offset(3), 4);
		assert!(layout.is_padded());

		let layout = ElementLayout::new(ComponentType::I16, &AttributeType::Mat3).unwrap();
		assert_eq!(layout.size(), 24);

		let layout = ElementLayout::new(ComponentType::U8, &AttributeType::Mat2).unwrap();
		assert_eq!(layout.size(), 8);

		let layout = ElementLayout::new(ComponentType::F32, &AttributeType::Mat4).unwrap();
		assert_eq!(layout.size(), 64);
		assert!(!layout.is_padded());

		let layout = ElementLayout::new(ComponentType::U8, &AttributeType::Vec3).unwrap();
		assert_eq!(layout.size(), 3);
	}
}
