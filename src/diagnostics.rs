use strum_macros::{Display, EnumIter, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Severity {
	Info, Warning, Error,
}

impl Severity {
	pub fn log_level(self) -> log::Level {
		match self {
			Severity::Info => log::Level::Info,
			Severity::Warning => log::Level::Warn,
			Severity::Error => log::Level::Error,
		}
	}
}

/// Every kind of problem the importer can report.
///
/// Each code has a message template with positional `{0}`, `{1}`, .. slots.
/// [Code::None] has no template, its arguments are concatenated as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum Code {
	None,
	NotBinary,
	ChunkIncomplete,
	ContainerTooLarge,
	GltfUnsupportedVersion,
	JsonParsingFailed,
	BufferLoadFailed,
	BufferViewOutOfBounds,
	BufferMainInvalidType,
	AccessorOutOfBounds,
	AccessorInconsistentUsage,
	SparseAccessor,
	IndexFormatInvalid,
	MissingReference,
	ExtensionUnsupported,
	PackageMissing,
	ImageLoadFailed,
	AnimationInvalid,
	PrimitiveInvalid,
	Cancelled,
}

impl Code {
	pub fn template(self) -> Option<&'static str> {
		Some(match self {
			Code::None => return None,
			Code::NotBinary => "data is not a glTF-binary container: {0}",
			Code::ChunkIncomplete => "chunk {0} declares {1} bytes but only {2} remain",
			Code::ContainerTooLarge => "container declares {0} bytes which exceeds the limit of {1}",
			Code::GltfUnsupportedVersion => "unsupported glTF version \"{0}\", only version 2 is supported",
			Code::JsonParsingFailed => "failed to parse glTF json: {0}",
			Code::BufferLoadFailed => "buffer {0} could not be loaded: {1}",
			Code::BufferViewOutOfBounds => "buffer view {0} ({1}) lies outside buffer {2} of {3} bytes",
			Code::BufferMainInvalidType => "accessor {0} has type {1}/{2} which is not allowed as {3}",
			Code::AccessorOutOfBounds => "accessor {0} needs {1} bytes but its buffer view only has {2}",
			Code::AccessorInconsistentUsage => "accessor {0} is used both as {1} and as {2}",
			Code::SparseAccessor => "sparse accessor {0} is invalid: {1}",
			Code::IndexFormatInvalid => "accessor {0} has component type {1} which cannot hold indices",
			Code::MissingReference => "{0} references {1} {2} which does not exist",
			Code::ExtensionUnsupported => "extension {0} is not supported, {1}",
			Code::PackageMissing => "extension {0} needs a decoder that is not available, {1}",
			Code::ImageLoadFailed => "image {0} could not be loaded: {1}",
			Code::AnimationInvalid => "{0} is invalid: {1}",
			Code::PrimitiveInvalid => "{0} is invalid: {1}",
			Code::Cancelled => "import was cancelled during {0}",
		})
	}

	pub fn name(self) -> &'static str {
		self.into()
	}
}

/// Fills `{n}` slots in the template for `code` with `args`.
///
/// Slots with no matching argument are left untouched.
pub fn format_message(code: Code, args: &[String]) -> String {
	format_with_template(code.template(), args)
}

fn format_with_template(template: Option<&str>, args: &[String]) -> String {
	let Some(template) = template else {
		return args.concat();
	};
	let mut out = String::with_capacity(template.len() + args.iter().map(String::len).sum::<usize>());
	let mut rest = template;
	while let Some(start) = rest.find('{') {
		out.push_str(&rest[..start]);
		let after = &rest[start+1..];
		let slot = after.find('}').and_then(|end| {
			after[..end].parse::<usize>().ok().map(|i| (i, end))
		});
		match slot {
			Some((i, end)) if i < args.len() => {
				out.push_str(&args[i]);
				rest = &after[end+1..];
			},
			_ => {
				out.push('{');
				rest = after;
			},
		}
	}
	out.push_str(rest);
	out
}

/// A single reported problem.
///
/// Arguments are kept separate from the message so hosts can render them with their own templates.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
	pub severity: Severity,
	pub code: Code,
	pub args: Vec<String>,
}

impl Diagnostic {
	pub fn new(severity: Severity, code: Code, args: Vec<String>) -> Self {
		Self { severity, code, args }
	}

	pub fn message(&self) -> String {
		format_message(self.code, &self.args)
	}

	/// Formats using a host supplied template lookup, falling back to the builtin template.
	pub fn message_with(&self, templates: impl Fn(Code) -> Option<&'static str>) -> String {
		format_with_template(templates(self.code).or(self.code.template()), &self.args)
	}
}

impl std::fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}] {}: {}", self.severity, self.code, self.message())
	}
}

/// Receives diagnostics while a document is loaded.
pub trait DiagnosticSink {
	fn emit(&mut self, diagnostic: Diagnostic);

	fn info(&mut self, code: Code, args: Vec<String>) {
		self.emit(Diagnostic::new(Severity::Info, code, args));
	}

	fn warn(&mut self, code: Code, args: Vec<String>) {
		self.emit(Diagnostic::new(Severity::Warning, code, args));
	}

	fn error(&mut self, code: Code, args: Vec<String>) {
		self.emit(Diagnostic::new(Severity::Error, code, args));
	}
}

impl DiagnosticSink for Vec<Diagnostic> {
	fn emit(&mut self, diagnostic: Diagnostic) {
		self.push(diagnostic);
	}
}

/// Collects diagnostics so they can be shown after an import.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticLog {
	messages: Vec<Diagnostic>,
}

impl DiagnosticLog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
		self.messages.iter()
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}

	pub fn has_errors(&self) -> bool {
		self.messages.iter().any(|d| d.severity == Severity::Error)
	}

	pub fn with_code(&self, code: Code) -> impl Iterator<Item = &Diagnostic> {
		self.messages.iter().filter(move |d| d.code == code)
	}

	pub fn into_vec(self) -> Vec<Diagnostic> {
		self.messages
	}
}

impl DiagnosticSink for DiagnosticLog {
	fn emit(&mut self, diagnostic: Diagnostic) {
		self.messages.push(diagnostic);
	}
}

/// Forwards every diagnostic to the `log` facade as soon as it arrives.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
	fn emit(&mut self, diagnostic: Diagnostic) {
		log::log!(target: "isopod_gltf", diagnostic.severity.log_level(), "{}: {}", diagnostic.code, diagnostic.message());
	}
}
