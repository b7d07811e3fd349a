//! A load session: bytes in, a document with resolved buffers and meshes out.

use std::{path::Path, time::Instant};

use crate::{
	accessor::{AccessorError, AccessorView, Resolver},
	animation::{resolve_animation, resolve_skin, AnimationData, AnimationError, SkinData},
	buffer::{Buffers, ByteSource, FileSource, NoExternalSource},
	config::ImportOptions,
	diagnostics::{Code, Diagnostic, DiagnosticSink, Severity},
	extensions::ExtensionRegistry,
	glb::{self, ContainerError},
	json::{parse_document_with, GltfDocument, JsonBackend, SerdeJsonBackend},
	mesh::{resolve_meshes, MeshData},
	util::{CancelToken, Cancelled},
	validate::{check_version, validate_document},
};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
	#[error("failed to read {path}: {source}")]
	Io { path: String, source: std::io::Error },
	#[error(transparent)]
	Container(#[from] ContainerError),
	#[error("invalid glTF json: {0}")]
	Json(String),
	#[error("unsupported glTF version \"{0}\"")]
	UnsupportedVersion(String),
	#[error("import was cancelled during {0}")]
	Cancelled(&'static str),
}

impl From<Cancelled> for ImportError {
	fn from(c: Cancelled) -> Self {
		ImportError::Cancelled(c.0)
	}
}

impl ImportError {
	pub fn code(&self) -> Code {
		match self {
			ImportError::Io { .. } => Code::None,
			ImportError::Container(e) => e.code(),
			ImportError::Json(_) => Code::JsonParsingFailed,
			ImportError::UnsupportedVersion(_) => Code::GltfUnsupportedVersion,
			ImportError::Cancelled(_) => Code::Cancelled,
		}
	}
}

/// Everything a successful import produced.
#[derive(Debug)]
pub struct Import<'a> {
	pub document: GltfDocument,
	pub buffers: Buffers<'a>,
	/// Empty unless [ImportOptions::resolve_meshes] was set.
	pub meshes: Vec<MeshData>,
	strict_sparse_order: bool,
}

impl<'a> Import<'a> {
	pub fn resolver(&self) -> Resolver<'_> {
		Resolver::new(&self.document, &self.buffers).with_strict_sparse_order(self.strict_sparse_order)
	}

	pub fn accessor(&self, index: usize) -> Result<AccessorView<'_>, AccessorError> {
		self.resolver().resolve(index)
	}

	pub fn animation(&self, index: usize) -> Result<AnimationData, AnimationError> {
		resolve_animation(&self.resolver(), index)
	}

	pub fn skin(&self, index: usize) -> Result<SkinData, AnimationError> {
		resolve_skin(&self.resolver(), index)
	}

	pub fn into_owned(self) -> Import<'static> {
		Import {
			document: self.document,
			buffers: self.buffers.into_owned(),
			meshes: self.meshes,
			strict_sparse_order: self.strict_sparse_order,
		}
	}
}

/// Runs load sessions with a fixed set of options and collaborators.
pub struct Importer<'r> {
	options: ImportOptions,
	registry: &'r ExtensionRegistry,
	backend: Box<dyn JsonBackend>,
	source: Option<Box<dyn ByteSource>>,
}

impl<'r> Importer<'r> {
	pub fn new(registry: &'r ExtensionRegistry) -> Self {
		Self {
			options: ImportOptions::default(),
			registry,
			backend: Box::new(SerdeJsonBackend),
			source: None,
		}
	}

	pub fn with_options(mut self, options: ImportOptions) -> Self {
		self.options = options;
		self
	}

	pub fn with_backend(mut self, backend: impl JsonBackend + 'static) -> Self {
		self.backend = Box::new(backend);
		self
	}

	/// Supplier for external uris, without one only embedded data and data uris load.
	pub fn with_source(mut self, source: impl ByteSource + 'static) -> Self {
		self.source = Some(Box::new(source));
		self
	}

	pub fn options(&self) -> &ImportOptions {
		&self.options
	}

	/// Imports a `.glb` container or `.gltf` json text.
	pub fn import<'a>(&self, bytes: &'a [u8], sink: &mut dyn DiagnosticSink, cancel: &CancelToken) -> Result<Import<'a>, ImportError> {
		match &self.source {
			Some(source) => self.import_with(bytes, source.as_ref(), sink, cancel),
			None => self.import_with(bytes, &NoExternalSource, sink, cancel),
		}
	}

	/// Reads and imports `path`, loading external uris relative to it unless a source was set.
	pub fn import_file(&self, path: &Path, sink: &mut dyn DiagnosticSink, cancel: &CancelToken) -> Result<Import<'static>, ImportError> {
		let bytes = std::fs::read(path).map_err(|source| {
			let error = ImportError::Io { path: path.display().to_string(), source };
			sink.error(error.code(), vec![error.to_string()]);
			error
		})?;
		let import = match &self.source {
			Some(source) => self.import_with(&bytes, source.as_ref(), sink, cancel)?,
			None => self.import_with(&bytes, &FileSource::beside(path), sink, cancel)?,
		};
		Ok(import.into_owned())
	}

	fn import_with<'a>(
		&self,
		bytes: &'a [u8],
		source: &dyn ByteSource,
		sink: &mut dyn DiagnosticSink,
		cancel: &CancelToken,
	) -> Result<Import<'a>, ImportError> {
		let start = Instant::now();
		let result = self.run(bytes, source, sink, cancel);
		match &result {
			Ok(import) => log::debug!(
				"imported {} meshes from {} bytes in {:.2?}", import.meshes.len(), bytes.len(), start.elapsed(),
			),
			Err(ImportError::Cancelled(stage)) => {
				sink.warn(Code::Cancelled, vec![stage.to_string()]);
			},
			Err(_) => {},
		}
		result
	}

	fn run<'a>(
		&self,
		bytes: &'a [u8],
		source: &dyn ByteSource,
		sink: &mut dyn DiagnosticSink,
		cancel: &CancelToken,
	) -> Result<Import<'a>, ImportError> {
		let (text, bin) = if glb::is_binary(bytes) {
			let container = glb::read_container_with_limit(bytes, self.options.max_container_len).map_err(|e| {
				sink.emit(Diagnostic::new(Severity::Error, e.code(), container_args(&e)));
				ImportError::from(e)
			})?;
			log::debug!("glb container with {} bytes of json and {:?} bytes of binary", container.json.len(), container.bin.map(<[u8]>::len));
			(container.json, container.bin)
		} else {
			let text = std::str::from_utf8(bytes).map_err(|e| {
				let msg = format!("not a glb container and not utf-8 text: {e}");
				sink.error(Code::JsonParsingFailed, vec![msg.clone()]);
				ImportError::Json(msg)
			})?;
			(text, None)
		};
		cancel.check("container read")?;

		let document = parse_document_with(self.backend.as_ref(), text, self.registry).map_err(|msg| {
			sink.error(Code::JsonParsingFailed, vec![msg.clone()]);
			ImportError::Json(msg)
		})?;
		cancel.check("json parse")?;

		if !check_version(&document, sink) {
			return Err(ImportError::UnsupportedVersion(document.asset.version.clone()));
		}

		let buffers = Buffers::load(&document, bin, source, &self.options, sink, cancel)?;

		let resolver = Resolver::new(&document, &buffers).with_strict_sparse_order(self.options.strict_sparse_order);
		if self.options.validate {
			validate_document(&resolver, self.registry, &mut SkipVersion(&mut *sink));
		}
		let meshes = if self.options.resolve_meshes {
			resolve_meshes(&resolver, self.options.parallel, sink, cancel)?
		} else {
			Vec::new()
		};

		Ok(Import { document, buffers, meshes, strict_sparse_order: self.options.strict_sparse_order })
	}
}

// the version was already checked before buffers were loaded
struct SkipVersion<'s>(&'s mut dyn DiagnosticSink);

impl DiagnosticSink for SkipVersion<'_> {
	fn emit(&mut self, diagnostic: Diagnostic) {
		if diagnostic.code != Code::GltfUnsupportedVersion {
			self.0.emit(diagnostic);
		}
	}
}

fn container_args(e: &ContainerError) -> Vec<String> {
	match e {
		ContainerError::ChunkIncomplete { index, declared, remaining } => vec![index.to_string(), declared.to_string(), remaining.to_string()],
		ContainerError::Truncated { expected, actual } => vec!["container".to_string(), expected.to_string(), actual.to_string()],
		ContainerError::VersionUnsupported(version) => vec![version.to_string()],
		ContainerError::TooLarge { declared, limit } => vec![declared.to_string(), limit.to_string()],
		ContainerError::NotBinary | ContainerError::MissingJson(_) | ContainerError::InvalidUtf8 => vec![e.to_string()],
	}
}

#[cfg(test)]
mod tests {
	use crate::diagnostics::DiagnosticLog;
	use super::*;

	#[test]
	fn plain_json_import() {
		let registry = ExtensionRegistry::khronos();
		let json = br#"{
			"asset": {"version": "2.0"},
			"buffers": [{"uri": "data:;base64,AAAAAAAAAAAAAAAA", "byteLength": 12}],
			"bufferViews": [{"buffer": 0, "byteLength": 12}],
			"accessors": [{"bufferView": 0, "componentType": 5126, "count": 1, "type": "VEC3"}],
			"meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}]
		}"#;
		let mut log = DiagnosticLog::new();
		let import = Importer::new(&registry).import(json, &mut log, &CancelToken::new()).unwrap();
		assert!(log.is_empty(), "{:?}", log);
		assert_eq!(import.meshes.len(), 1);
		assert_eq!(import.accessor(0).unwrap().to_vecs::<3>(0.0), vec![[0.0; 3]]);
	}

	#[test]
	fn garbage_is_reported() {
		let registry = ExtensionRegistry::new();
		let mut log = DiagnosticLog::new();
		let result = Importer::new(&registry).import(b"garbage", &mut log, &CancelToken::new());
		assert!(matches!(result, Err(ImportError::Json(_))));
		assert_eq!(log.with_code(Code::JsonParsingFailed).count(), 1);
		let result = Importer::new(&registry).import(&[0xff, 0xfe, 0x00], &mut log, &CancelToken::new());
		assert!(matches!(result, Err(ImportError::Json(_))));
	}

	#[test]
	fn wrong_version_stops_the_import() {
		let registry = ExtensionRegistry::new();
		let mut log = DiagnosticLog::new();
		let result = Importer::new(&registry).import(br#"{"asset": {"version": "1.0"}}"#, &mut log, &CancelToken::new());
		assert!(matches!(result, Err(ImportError::UnsupportedVersion(v)) if v == "1.0"));
		assert_eq!(log.len(), 1);
	}

	#[test]
	fn cancelled_before_parse() {
		let registry = ExtensionRegistry::new();
		let mut log = DiagnosticLog::new();
		let cancel = CancelToken::new();
		cancel.cancel();
		let result = Importer::new(&registry).import(br#"{"asset": {"version": "2.0"}}"#, &mut log, &cancel);
		assert!(matches!(result, Err(ImportError::Cancelled("container read"))));
		assert_eq!(log.with_code(Code::Cancelled).count(), 1);
	}

	#[test]
	fn options_are_respected() {
		let registry = ExtensionRegistry::new();
		let options = ImportOptions { resolve_meshes: false, validate: false, ..Default::default() };
		let json = br#"{
			"asset": {"version": "2.0"},
			"meshes": [{"primitives": [{"attributes": {"POSITION": 7}}]}]
		}"#;
		let mut log = DiagnosticLog::new();
		let import = Importer::new(&registry).with_options(options).import(json, &mut log, &CancelToken::new()).unwrap();
		assert!(import.meshes.is_empty());
		assert!(log.is_empty());
	}
}
