//! Document identifiers: 12 bytes rendered as 24 lowercase hex characters.
//!
//! Layout: 4-byte big-endian seconds since the epoch, 5 bytes chosen once per
//! process, 3-byte wrapping counter. Ids generated by one process sort in
//! creation order.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use crate::error::AppError;

pub const ID_LEN: usize = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId([u8; 12]);

fn process_bytes() -> &'static [u8; 5] {
    static BYTES: OnceLock<[u8; 5]> = OnceLock::new();
    BYTES.get_or_init(|| {
        let seed = uuid::Uuid::new_v4();
        let mut out = [0u8; 5];
        out.copy_from_slice(&seed.as_bytes()[..5]);
        out
    })
}

fn counter() -> &'static AtomicU32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    COUNTER.get_or_init(|| {
        let seed = uuid::Uuid::new_v4();
        let b = seed.as_bytes();
        AtomicU32::new(u32::from_be_bytes([0, b[5], b[6], b[7]]))
    })
}

impl DocumentId {
    pub fn generate() -> Self {
        let secs = chrono::Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let count = counter().fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process_bytes());
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        DocumentId(bytes)
    }

    /// Accepts exactly 24 hex digits in either case.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != ID_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 12];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            bytes[i] = (hex_val(chunk[0]) << 4) | hex_val(chunk[1]);
        }
        Some(DocumentId(bytes))
    }
}

fn hex_val(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl FromStr for DocumentId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentId::parse(s).ok_or(AppError::InvalidId)
    }
}
