//! Splitting of `.glb` files into their json and binary chunks.

use crate::{diagnostics::Code, util::{align_up, read_u32_le}};

pub const MAGIC: u32 = 0x46546C67;
pub const VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = 0x4E4F534A;
pub const CHUNK_BIN: u32 = 0x004E4942;

pub const HEADER_LEN: usize = 12;
pub const CHUNK_HEADER_LEN: usize = 8;

/// Largest declared container length accepted by [read_container].
pub const DEFAULT_MAX_CONTAINER_LEN: u64 = 1 << 30;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContainerError {
	#[error("missing glTF magic number")]
	NotBinary,
	#[error("container is truncated, expected {expected} bytes but got {actual}")]
	Truncated { expected: usize, actual: usize },
	#[error("unsupported container version {0}, only version 2 is supported")]
	VersionUnsupported(u32),
	#[error("container declares {declared} bytes which exceeds the limit of {limit}")]
	TooLarge { declared: u64, limit: u64 },
	#[error("chunk {index} declares {declared} bytes but only {remaining} remain")]
	ChunkIncomplete { index: usize, declared: u64, remaining: usize },
	#[error("first chunk must be json, found chunk type {0:#010x}")]
	MissingJson(u32),
	#[error("json chunk is not valid utf-8")]
	InvalidUtf8,
}

impl ContainerError {
	pub fn code(&self) -> Code {
		match self {
			ContainerError::NotBinary | ContainerError::MissingJson(_) | ContainerError::InvalidUtf8 => Code::NotBinary,
			ContainerError::Truncated { .. } | ContainerError::ChunkIncomplete { .. } => Code::ChunkIncomplete,
			ContainerError::VersionUnsupported(_) => Code::GltfUnsupportedVersion,
			ContainerError::TooLarge { .. } => Code::ContainerTooLarge,
		}
	}
}

/// The pieces of a glTF-binary container.
///
/// Both borrow from the input, nothing is copied.
#[derive(Debug, Clone, Copy)]
pub struct Container<'a> {
	pub version: u32,
	pub json: &'a str,
	pub bin: Option<&'a [u8]>,
}

/// Returns true if `bytes` starts with the glTF-binary magic number.
pub fn is_binary(bytes: &[u8]) -> bool {
	read_u32_le(bytes, 0) == Some(MAGIC)
}

pub fn read_container(bytes: &[u8]) -> Result<Container<'_>, ContainerError> {
	read_container_with_limit(bytes, DEFAULT_MAX_CONTAINER_LEN)
}

/// Splits a `.glb` into its json text and optional binary chunk.
///
/// Chunks after the json chunk with unknown types are skipped, only the first `BIN` chunk is used.
pub fn read_container_with_limit(bytes: &[u8], max_len: u64) -> Result<Container<'_>, ContainerError> {
	let magic = read_u32_le(bytes, 0).ok_or(ContainerError::NotBinary)?;
	if magic != MAGIC {
		return Err(ContainerError::NotBinary);
	}
	let (version, length) = match (read_u32_le(bytes, 4), read_u32_le(bytes, 8)) {
		(Some(version), Some(length)) => (version, length),
		_ => return Err(ContainerError::Truncated { expected: HEADER_LEN, actual: bytes.len() }),
	};
	if version != VERSION {
		return Err(ContainerError::VersionUnsupported(version));
	}
	if length as u64 > max_len {
		return Err(ContainerError::TooLarge { declared: length as u64, limit: max_len });
	}
	let length = length as usize;
	if length > bytes.len() {
		return Err(ContainerError::Truncated { expected: length, actual: bytes.len() });
	}
	if length < HEADER_LEN {
		return Err(ContainerError::Truncated { expected: HEADER_LEN, actual: length });
	}

	// anything past the declared length is ignored
	let data = &bytes[..length];
	let mut offset = HEADER_LEN;
	let mut json = None;
	let mut bin = None;
	let mut index = 0;
	while offset < data.len() {
		let remaining = data.len() - offset;
		let (chunk_len, chunk_ty) = match (read_u32_le(data, offset), read_u32_le(data, offset + 4)) {
			(Some(chunk_len), Some(chunk_ty)) => (chunk_len, chunk_ty),
			_ => return Err(ContainerError::ChunkIncomplete { index, declared: CHUNK_HEADER_LEN as u64, remaining }),
		};
		let start = offset + CHUNK_HEADER_LEN;
		let available = data.len() - start;
		if chunk_len as usize > available {
			return Err(ContainerError::ChunkIncomplete { index, declared: chunk_len as u64, remaining: available });
		}
		let chunk = &data[start..start + chunk_len as usize];
		log::trace!("glb chunk {index}: type {chunk_ty:#010x}, {chunk_len} bytes");

		if index == 0 {
			if chunk_ty != CHUNK_JSON {
				return Err(ContainerError::MissingJson(chunk_ty));
			}
			json = Some(std::str::from_utf8(chunk).map_err(|_| ContainerError::InvalidUtf8)?);
		} else if chunk_ty == CHUNK_BIN && bin.is_none() {
			bin = Some(chunk);
		}

		offset = align_up(start + chunk_len as usize, 4);
		index += 1;
	}

	let json = json.ok_or(ContainerError::ChunkIncomplete { index: 0, declared: CHUNK_HEADER_LEN as u64, remaining: 0 })?;
	Ok(Container {
		version,
		// writers pad the json chunk with spaces
		json: json.trim_end_matches(|c: char| c == ' ' || c == '\0'),
		bin,
	})
}
