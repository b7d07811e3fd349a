//! Reading glTF 2.0 assets: the `.glb` container, the json document and the binary data behind it.
//!
//! The usual entry point is [Importer], which runs a whole load session and reports problems to a
//! [DiagnosticSink]. The pieces it is made of can be used on their own as well.

pub mod glb;
pub mod json;
pub mod extensions;
pub mod buffer;
pub mod accessor;
pub mod mesh;
pub mod animation;
pub mod validate;
pub mod diagnostics;
pub mod config;
pub mod import;
pub mod util;

pub use bytemuck;
pub use glam;

pub use accessor::{resolve_accessor, AccessorError, AccessorView, Resolver, Usage};
pub use animation::{resolve_animation, resolve_skin, AnimationData, AnimationError, ChannelData, SkinData};
pub use buffer::{resolve_image, Buffers, ByteSource, FileSource, ImageData, NoExternalSource, SourceError};
pub use config::ImportOptions;
pub use diagnostics::{Code, Diagnostic, DiagnosticLog, DiagnosticSink, LogSink, Severity};
pub use extensions::{ExtensionInstance, ExtensionRegistry, Extensions};
pub use glb::{read_container, Container, ContainerError};
pub use import::{Import, ImportError, Importer};
pub use json::{parse_document, GltfDocument};
pub use mesh::{resolve_mesh, resolve_meshes, MeshData, PrimitiveData, PrimitiveError};
pub use util::CancelToken;
