// Event records and their owned payloads
use serde::{Deserialize, Serialize};

use crate::{BusError, Result};

/// Kind of data carried by an event payload.
///
/// The kind is a hint for consumers; the bus never checks it against the
/// payload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PayloadKind {
    /// No data, or data the consumer interprets on its own
    #[default]
    Undefined,
    /// Signed integer; the payload size gives the precision
    SignedInt,
    /// Unsigned integer; the payload size gives the precision
    UnsignedInt,
    /// UTF-8 text, optionally NUL terminated
    String,
}

/// Owned, kind-tagged byte blob attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    kind: PayloadKind,
    bytes: Vec<u8>,
}

impl Payload {
    /// Copies `data` into a new payload.
    ///
    /// Fails with [`BusError::PayloadCopyFailure`] when the copy cannot be
    /// allocated.
    pub fn copy_from(kind: PayloadKind, data: &[u8]) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(data.len())
            .map_err(|_| BusError::PayloadCopyFailure { size: data.len() })?;
        bytes.extend_from_slice(data);
        Ok(Self { kind, bytes })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn signed(value: i64) -> Self {
        Self {
            kind: PayloadKind::SignedInt,
            bytes: value.to_ne_bytes().to_vec(),
        }
    }

    pub fn unsigned(value: u64) -> Self {
        Self {
            kind: PayloadKind::UnsignedInt,
            bytes: value.to_ne_bytes().to_vec(),
        }
    }

    pub fn text(value: &str) -> Self {
        Self {
            kind: PayloadKind::String,
            bytes: value.as_bytes().to_vec(),
        }
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reads a signed integer of 1, 2, 4 or 8 bytes.
    ///
    /// Returns `None` when the kind is not [`PayloadKind::SignedInt`] or the
    /// size is not one of the supported widths.
    pub fn as_signed(&self) -> Option<i64> {
        if self.kind != PayloadKind::SignedInt {
            return None;
        }
        let b = self.bytes.as_slice();
        match b.len() {
            1 => Some(i8::from_ne_bytes([b[0]]) as i64),
            2 => Some(i16::from_ne_bytes(b.try_into().ok()?) as i64),
            4 => Some(i32::from_ne_bytes(b.try_into().ok()?) as i64),
            8 => Some(i64::from_ne_bytes(b.try_into().ok()?)),
            _ => None,
        }
    }

    /// Reads an unsigned integer of 1, 2, 4 or 8 bytes.
    pub fn as_unsigned(&self) -> Option<u64> {
        if self.kind != PayloadKind::UnsignedInt {
            return None;
        }
        let b = self.bytes.as_slice();
        match b.len() {
            1 => Some(b[0] as u64),
            2 => Some(u16::from_ne_bytes(b.try_into().ok()?) as u64),
            4 => Some(u32::from_ne_bytes(b.try_into().ok()?) as u64),
            8 => Some(u64::from_ne_bytes(b.try_into().ok()?)),
            _ => None,
        }
    }

    /// Reads the payload as text, dropping one trailing NUL if present.
    pub fn as_str(&self) -> Option<&str> {
        if self.kind != PayloadKind::String {
            return None;
        }
        let b = self.bytes.strip_suffix(&[0]).unwrap_or(&self.bytes);
        std::str::from_utf8(b).ok()
    }
}

/// One enqueued event.
///
/// Owned by its queue until dispatched, then dropped as soon as the handler
/// returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub uuid: u64,
    pub event_type: u32,
    pub payload: Payload,
}

impl Event {
    pub fn payload_kind(&self) -> PayloadKind {
        self.payload.kind()
    }

    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }
}
