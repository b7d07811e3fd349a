//! Raw buffer bytes for a document: the embedded binary chunk, data uris and external files.

use std::{borrow::Cow, path::{Component, Path, PathBuf}};

use base64::Engine;

use crate::{
	config::ImportOptions,
	diagnostics::{Code, Diagnostic, DiagnosticSink, Severity},
	json::GltfDocument,
	util::{percent_decode, percent_decode_bytes, CancelToken, Cancelled},
};

/// Supplies the bytes behind external uris.
pub trait ByteSource: Send + Sync {
	fn request(&self, uri: &str) -> Result<Vec<u8>, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("uri \"{0}\" must not be absolute")]
	AbsoluteUri(String),
	#[error("uri \"{0}\" must not reference parent directories")]
	ParentDirUri(String),
	#[error("invalid uri \"{0}\"")]
	InvalidUri(String),
	#[error("invalid data uri: {0}")]
	InvalidDataUri(String),
	#[error("external uri \"{0}\" was not loaded")]
	Refused(String),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

impl SourceError {
	pub fn code(&self) -> Code {
		Code::BufferLoadFailed
	}
}

/// Reads uris as paths relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileSource {
	root: PathBuf,
}

impl FileSource {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// A source rooted at the directory containing `file`.
	pub fn beside(file: &Path) -> Self {
		Self::new(file.parent().map(Path::to_path_buf).unwrap_or_default())
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Maps `uri` to a path below the root without touching the filesystem.
	pub fn resolve(&self, uri: &str) -> Result<PathBuf, SourceError> {
		if uri.contains("://") {
			return Err(SourceError::InvalidUri(uri.to_string()));
		}
		let decoded = percent_decode(uri).ok_or_else(|| SourceError::InvalidUri(uri.to_string()))?;
		let path = PathBuf::from(&decoded);
		if path.is_absolute() || path.has_root() {
			return Err(SourceError::AbsoluteUri(decoded));
		}
		if path.components().any(|c| c == Component::ParentDir) {
			return Err(SourceError::ParentDirUri(decoded));
		}
		Ok(self.root.join(path))
	}
}

impl ByteSource for FileSource {
	fn request(&self, uri: &str) -> Result<Vec<u8>, SourceError> {
		let path = self.resolve(uri)?;
		log::trace!("reading {}", path.display());
		Ok(std::fs::read(path)?)
	}
}

/// Refuses every request, only embedded data and data uris load.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExternalSource;

impl ByteSource for NoExternalSource {
	fn request(&self, uri: &str) -> Result<Vec<u8>, SourceError> {
		Err(SourceError::Refused(uri.to_string()))
	}
}

/// Decoded contents of a `data:` uri.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
	pub mime_type: Option<String>,
	pub data: Vec<u8>,
}

pub fn is_data_uri(uri: &str) -> bool {
	uri.starts_with("data:")
}

/// Decodes `data:[<mime>][;base64],<payload>`.
pub fn decode_data_uri(uri: &str) -> Result<DataUri, SourceError> {
	let rest = uri.strip_prefix("data:").ok_or_else(|| SourceError::InvalidDataUri("missing data: prefix".to_string()))?;
	let (header, payload) = rest.split_once(',').ok_or_else(|| SourceError::InvalidDataUri("missing ','".to_string()))?;
	let (mime, is_base64) = match header.strip_suffix(";base64") {
		Some(mime) => (mime, true),
		None => (header, false),
	};
	let data = if is_base64 {
		base64::engine::general_purpose::STANDARD.decode(payload)
			.map_err(|e| SourceError::InvalidDataUri(e.to_string()))?
	} else {
		percent_decode_bytes(payload).ok_or_else(|| SourceError::InvalidDataUri("bad percent escape".to_string()))?
	};
	let mime_type = mime.split(';').next().filter(|m| !m.is_empty()).map(str::to_string);
	Ok(DataUri { mime_type, data })
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ViewError {
	#[error("buffer view {0} does not exist")]
	MissingView(usize),
	#[error("buffer {buffer} of buffer view {view} is not loaded")]
	BufferUnavailable { view: usize, buffer: usize },
	#[error("buffer view {view} (bytes {start}..{end}) lies outside buffer {buffer} of {len} bytes")]
	OutOfBounds { view: usize, start: usize, end: usize, buffer: usize, len: usize },
}

impl ViewError {
	pub fn code(&self) -> Code {
		match self {
			ViewError::MissingView(_) => Code::MissingReference,
			ViewError::BufferUnavailable { .. } => Code::BufferLoadFailed,
			ViewError::OutOfBounds { .. } => Code::BufferViewOutOfBounds,
		}
	}

	/// Diagnostic arguments, `who` names the entity that used the view.
	pub fn args(&self, who: &str) -> Vec<String> {
		match self {
			ViewError::MissingView(view) => vec![who.to_string(), "buffer view".to_string(), view.to_string()],
			ViewError::BufferUnavailable { buffer, .. } => vec![buffer.to_string(), format!("needed by {who}")],
			ViewError::OutOfBounds { view, start, end, buffer, len } => vec![
				view.to_string(), format!("bytes {start}..{end}"), buffer.to_string(), len.to_string(),
			],
		}
	}
}

/// Bytes of every buffer in a document, [None] where loading failed.
///
/// The embedded binary chunk is borrowed, everything else is owned.
#[derive(Debug, Clone, Default)]
pub struct Buffers<'a> {
	data: Vec<Option<Cow<'a, [u8]>>>,
}

impl<'a> Buffers<'a> {
	/// Loads every buffer of `document`.
	///
	/// Failures are reported to `sink` and leave that buffer empty so the rest can still resolve.
	pub fn load(
		document: &GltfDocument,
		bin: Option<&'a [u8]>,
		source: &dyn ByteSource,
		options: &ImportOptions,
		sink: &mut dyn DiagnosticSink,
		cancel: &CancelToken,
	) -> Result<Self, Cancelled> {
		let mut data = Vec::with_capacity(document.buffers.len());
		for (i, buffer) in document.buffers.iter().enumerate() {
			let loaded = match &buffer.uri {
				Some(uri) if is_data_uri(uri) => decode_data_uri(uri).map(|d| Cow::Owned(d.data)),
				Some(uri) if !options.load_external => Err(SourceError::Refused(uri.clone())),
				Some(uri) => source.request(uri).map(Cow::Owned),
				None => match bin {
					Some(bin) if i == 0 => Ok(Cow::Borrowed(bin)),
					_ => Err(SourceError::InvalidUri("buffer has no uri and there is no binary chunk for it".to_string())),
				},
			};
			match loaded {
				Ok(bytes) => {
					if bytes.len() < buffer.byte_length {
						sink.error(Code::BufferLoadFailed, vec![
							i.to_string(),
							format!("declares {} bytes but only {} are available", buffer.byte_length, bytes.len()),
						]);
					}
					log::trace!("buffer {i} loaded with {} bytes", bytes.len());
					data.push(Some(bytes));
				},
				Err(e) => {
					sink.emit(Diagnostic::new(Severity::Error, e.code(), vec![i.to_string(), e.to_string()]));
					data.push(None);
				},
			}
			cancel.check("buffer loading")?;
		}
		Ok(Self { data })
	}

	pub fn from_vecs(buffers: Vec<Vec<u8>>) -> Buffers<'static> {
		Buffers { data: buffers.into_iter().map(|b| Some(Cow::Owned(b))).collect() }
	}

	pub fn from_slices(buffers: &[&'a [u8]]) -> Self {
		Self { data: buffers.iter().map(|b| Some(Cow::Borrowed(*b))).collect() }
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&[u8]> {
		self.data.get(index)?.as_deref()
	}

	/// Copies any borrowed buffers so the result outlives the input bytes.
	pub fn into_owned(self) -> Buffers<'static> {
		Buffers {
			data: self.data.into_iter().map(|b| b.map(|b| Cow::Owned(b.into_owned()))).collect(),
		}
	}

	/// Bytes covered by buffer view `index`.
	///
	/// Views are bounded by the buffer's declared `byteLength`, so chunk padding and trailing bytes are never visible.
	pub fn view(&self, document: &GltfDocument, index: usize) -> Result<&[u8], ViewError> {
		let view = document.buffer_views.get(index).ok_or(ViewError::MissingView(index))?;
		let bytes = self.get(view.buffer).ok_or(ViewError::BufferUnavailable { view: index, buffer: view.buffer })?;
		let declared = document.buffers.get(view.buffer).map_or(bytes.len(), |b| b.byte_length);
		let bytes = &bytes[..bytes.len().min(declared)];
		let start = view.byte_offset;
		let out_of_bounds = || ViewError::OutOfBounds {
			view: index, start, end: start.saturating_add(view.byte_length), buffer: view.buffer, len: bytes.len(),
		};
		let end = start.checked_add(view.byte_length).ok_or_else(out_of_bounds)?;
		bytes.get(start..end).ok_or_else(out_of_bounds)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
	#[error("image {0} does not exist")]
	Missing(usize),
	#[error("image has neither a uri nor a buffer view")]
	NoData,
	#[error(transparent)]
	View(#[from] ViewError),
	#[error(transparent)]
	Source(#[from] SourceError),
}

impl ImageError {
	pub fn code(&self) -> Code {
		match self {
			ImageError::Missing(_) => Code::MissingReference,
			_ => Code::ImageLoadFailed,
		}
	}
}

/// Encoded image bytes, decoding is up to the caller.
#[derive(Debug, Clone)]
pub struct ImageData<'a> {
	pub bytes: Cow<'a, [u8]>,
	pub mime_type: Option<String>,
}

/// Looks up the encoded bytes of image `index`.
///
/// The mime type falls back to one guessed from the uri's file extension.
pub fn resolve_image<'a>(
	document: &GltfDocument,
	buffers: &'a Buffers<'_>,
	source: &dyn ByteSource,
	index: usize,
) -> Result<ImageData<'a>, ImageError> {
	let image = document.images.get(index).ok_or(ImageError::Missing(index))?;
	if let Some(view) = image.buffer_view {
		return Ok(ImageData { bytes: Cow::Borrowed(buffers.view(document, view)?), mime_type: image.mime_type.clone() });
	}
	let uri = image.uri.as_deref().ok_or(ImageError::NoData)?;
	if is_data_uri(uri) {
		let DataUri { mime_type, data } = decode_data_uri(uri)?;
		Ok(ImageData { bytes: Cow::Owned(data), mime_type: image.mime_type.clone().or(mime_type) })
	} else {
		Ok(ImageData {
			bytes: Cow::Owned(source.request(uri)?),
			mime_type: image.mime_type.clone().or_else(|| mime_from_extension(uri).map(str::to_string)),
		})
	}
}

fn mime_from_extension(uri: &str) -> Option<&'static str> {
	let ext = uri.rsplit_once('.')?.1.to_ascii_lowercase();
	Some(match ext.as_str() {
		"png" => "image/png",
		"jpg" | "jpeg" => "image/jpeg",
		"webp" => "image/webp",
		"ktx2" => "image/ktx2",
		_ => return None,
	})
}
