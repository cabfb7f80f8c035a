//! Tag dispatch for uplink payloads.
//!
//! A payload is a run of `[channel_id][channel_type][payload]` records. The
//! walk reads one tag at a time, hands the cursor to the first handler whose
//! pattern matches, and stops quietly at the first tag no handler claims.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::reader::ByteReader;
use crate::value_map::{ValueMap, ValueMode};

/// Flat decode result; repeating groups live under array-valued keys.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPattern {
    /// Exact `(channel_id, channel_type)` pair.
    Exact(u8, u8),
    /// Any channel type on this channel id; the handler switches on the
    /// type byte itself (downlink echo frames).
    Channel(u8),
}

impl TagPattern {
    pub fn matches(&self, channel_id: u8, channel_type: u8) -> bool {
        match *self {
            TagPattern::Exact(id, ty) => id == channel_id && ty == channel_type,
            TagPattern::Channel(id) => id == channel_id,
        }
    }

    fn intersects(&self, other: &TagPattern) -> bool {
        match (*self, *other) {
            (TagPattern::Exact(a, b), TagPattern::Exact(c, d)) => a == c && b == d,
            (TagPattern::Exact(a, _), TagPattern::Channel(c))
            | (TagPattern::Channel(c), TagPattern::Exact(a, _)) => a == c,
            (TagPattern::Channel(a), TagPattern::Channel(c)) => a == c,
        }
    }
}

/// Per-tag view handed to a field decoder.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext {
    pub mode: ValueMode,
    pub channel_id: u8,
    pub channel_type: u8,
    /// Offset of the tag's first byte.
    pub tag_offset: usize,
}

impl DecodeContext {
    pub fn present(&self, map: &ValueMap, code: impl Into<i64>) -> Value {
        map.present(self.mode, code.into())
    }
}

/// What the walk does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub type FieldDecoder = fn(&mut ByteReader<'_>, &DecodeContext, &mut Record) -> Result<Flow>;

/// Called for an unclaimed tag instead of stopping silently. Receives the
/// whole payload so it can look back at the tag bytes.
pub type Fallback = fn(&[u8], &DecodeContext, &mut Record) -> Result<()>;

#[derive(Clone, Copy)]
pub struct FieldHandler {
    pub pattern: TagPattern,
    pub name: &'static str,
    pub decode: FieldDecoder,
}

impl FieldHandler {
    pub const fn exact(channel_id: u8, channel_type: u8, name: &'static str, decode: FieldDecoder) -> Self {
        Self {
            pattern: TagPattern::Exact(channel_id, channel_type),
            name,
            decode,
        }
    }

    pub const fn channel(channel_id: u8, name: &'static str, decode: FieldDecoder) -> Self {
        Self {
            pattern: TagPattern::Channel(channel_id),
            name,
            decode,
        }
    }
}

/// Walk `bytes` against `handlers` (first match wins) and return the
/// accumulated record.
pub fn walk(
    bytes: &[u8],
    handlers: &[FieldHandler],
    mode: ValueMode,
    fallback: Option<Fallback>,
) -> Result<Record> {
    let mut reader = ByteReader::new(bytes);
    let mut record = Record::new();

    while !reader.is_empty() {
        let tag_offset = reader.position();
        let channel_id = reader.u8()?;
        let channel_type = reader.u8()?;
        let ctx = DecodeContext {
            mode,
            channel_id,
            channel_type,
            tag_offset,
        };

        let Some(handler) = handlers
            .iter()
            .find(|h| h.pattern.matches(channel_id, channel_type))
        else {
            match fallback {
                Some(fallback) => {
                    tracing::debug!(channel_id, channel_type, offset = tag_offset, "unclaimed tag, using fallback");
                    fallback(bytes, &ctx, &mut record)?;
                }
                None => {
                    tracing::debug!(channel_id, channel_type, offset = tag_offset, "unknown tag, stop decoding");
                }
            }
            break;
        };

        tracing::debug!(
            channel_id,
            channel_type,
            field = handler.name,
            offset = tag_offset,
            "dispatching tag"
        );
        if (handler.decode)(&mut reader, &ctx, &mut record)? == Flow::Stop {
            break;
        }
    }

    Ok(record)
}

/// Pairs of handler names whose patterns can claim the same tag. A sound
/// table returns an empty list.
pub fn overlapping(handlers: &[FieldHandler]) -> Vec<(&'static str, &'static str)> {
    let mut out = Vec::new();
    for (i, a) in handlers.iter().enumerate() {
        for b in &handlers[i + 1..] {
            if a.pattern.intersects(&b.pattern) {
                out.push((a.name, b.name));
            }
        }
    }
    out
}

/// Append to the ordered sequence stored under `key`.
pub fn push_entry(record: &mut Record, key: &str, entry: Value) {
    match record
        .entry(key)
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(items) => items.push(entry),
        slot => *slot = Value::Array(vec![entry]),
    }
}

pub fn set(record: &mut Record, key: impl Into<String>, value: impl Into<Value>) {
    record.insert(key.into(), value.into());
}

/// Fixed-point field scaled by its wire divisor.
pub fn scaled(raw: impl Into<f64>, divisor: f64) -> Value {
    Value::from(raw.into() / divisor)
}
