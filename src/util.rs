use std::sync::{atomic::{AtomicBool, Ordering}, Arc};

pub const fn align_up(v: usize, multiple: usize) -> usize {
	if multiple == 0 {
		v
	} else {
		let remainder = v % multiple;
		if remainder == 0 {
			v
		} else {
			v + multiple - remainder
		}
	}
}

/// Reads a little endian `u32` at `offset`, or [None] if it would run past the end of `bytes`.
pub fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
	let end = offset.checked_add(4)?;
	let chunk = bytes.get(offset..end)?;
	Some(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

/// Decodes `%XX` escapes into raw bytes.
///
/// Returns [None] if a `%` is not followed by two hex digits.
pub fn percent_decode_bytes(s: &str) -> Option<Vec<u8>> {
	let bytes = s.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' {
			let hi = hex_digit(*bytes.get(i + 1)?)?;
			let lo = hex_digit(*bytes.get(i + 2)?)?;
			out.push(hi << 4 | lo);
			i += 3;
		} else {
			out.push(bytes[i]);
			i += 1;
		}
	}
	Some(out)
}

/// Decodes `%XX` escapes in a uri, [None] if they are malformed or the result is not utf-8.
pub fn percent_decode(s: &str) -> Option<String> {
	String::from_utf8(percent_decode_bytes(s)?).ok()
}

fn hex_digit(b: u8) -> Option<u8> {
	match b {
		b'0'..=b'9' => Some(b - b'0'),
		b'a'..=b'f' => Some(b - b'a' + 10),
		b'A'..=b'F' => Some(b - b'A' + 10),
		_ => None,
	}
}

/// A shared flag used to abort a load session between stages.
///
/// Cloning gives another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
	flag: Arc<AtomicBool>,
}

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.flag.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.flag.load(Ordering::Relaxed)
	}

	/// Fails with [Cancelled] naming `stage` if the flag is set.
	pub fn check(&self, stage: &'static str) -> Result<(), Cancelled> {
		if self.is_cancelled() {
			log::debug!("load cancelled during {stage}");
			Err(Cancelled(stage))
		} else {
			Ok(())
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cancelled during {0}")]
pub struct Cancelled(pub &'static str);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn align_up_rounds_to_multiple() {
		assert_eq!(align_up(0, 4), 0);
		assert_eq!(align_up(1, 4), 4);
		assert_eq!(align_up(4, 4), 4);
		assert_eq!(align_up(7, 0), 7);
	}

	#[test]
	fn read_u32_le_stays_in_bounds() {
		let bytes = [0x67, 0x6C, 0x54, 0x46, 0x01];
		assert_eq!(read_u32_le(&bytes, 0), Some(0x46546C67));
		assert_eq!(read_u32_le(&bytes, 2), None);
		assert_eq!(read_u32_le(&bytes, usize::MAX), None);
	}

	#[test]
	fn percent_decode_handles_escapes() {
		assert_eq!(percent_decode("my%20mesh.bin").as_deref(), Some("my mesh.bin"));
		assert_eq!(percent_decode("plain.bin").as_deref(), Some("plain.bin"));
		assert_eq!(percent_decode("bad%2"), None);
		assert_eq!(percent_decode("bad%zz"), None);
		assert_eq!(percent_decode("bad%+1"), None);
		assert_eq!(percent_decode("bad%-1x"), None);
		assert_eq!(percent_decode("%ff"), None);
	}

	#[test]
	fn percent_decode_keeps_binary() {
		assert_eq!(percent_decode_bytes("%00%FFa%7f"), Some(vec![0x00, 0xff, b'a', 0x7f]));
		assert_eq!(percent_decode_bytes("%+1"), None);
		assert_eq!(percent_decode_bytes("%f"), None);
	}

	#[test]
	fn cancel_token_is_shared_between_clones() {
		let token = CancelToken::new();
		let other = token.clone();
		assert!(!other.is_cancelled());
		token.cancel();
		assert!(other.is_cancelled());
		assert_eq!(other.check("buffers"), Err(Cancelled("buffers")));
	}
}
