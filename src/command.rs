//! Downlink command encoding: field validation helpers and the
//! declaration-order command table walk.

use serde_json::{Map, Value};

use crate::dispatch::Record;
use crate::error::{CodecError, Result};
use crate::value_map::{integral, ValueMap, ValueMode, YES_NO};
use crate::writer::BufferWriter;

/// Value found under a command key (or nested inside one), together with
/// its dotted path for error reporting.
#[derive(Debug, Clone)]
pub struct Field<'a> {
    path: String,
    value: &'a Value,
    mode: ValueMode,
    index: u8,
}

impl<'a> Field<'a> {
    pub fn new(path: impl Into<String>, value: &'a Value, mode: ValueMode) -> Self {
        Self {
            path: path.into(),
            value,
            mode,
            index: 0,
        }
    }

    pub fn with_index(mut self, index: u8) -> Self {
        self.index = index;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn mode(&self) -> ValueMode {
        self.mode
    }

    /// Channel/valve/rule index the command key carries (`valve_2_pulse` -> 2).
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn invalid(&self, domain: impl Into<String>) -> CodecError {
        CodecError::invalid(self.path.clone(), domain)
    }

    pub fn object(&self) -> Result<&'a Map<String, Value>> {
        self.value.as_object().ok_or_else(|| self.invalid("an object"))
    }

    pub fn array(&self) -> Result<&'a [Value]> {
        self.value
            .as_array()
            .map(|items| items.as_slice())
            .ok_or_else(|| self.invalid("an array"))
    }

    pub fn has(&self, name: &str) -> bool {
        self.value.get(name).is_some()
    }

    /// Nested member, `None` when absent.
    pub fn child(&self, name: &str) -> Result<Option<Field<'a>>> {
        let obj = self.object()?;
        Ok(obj.get(name).map(|value| Field {
            path: format!("{}.{}", self.path, name),
            value,
            mode: self.mode,
            index: self.index,
        }))
    }

    pub fn require(&self, name: &str) -> Result<Field<'a>> {
        self.child(name)?.ok_or_else(|| {
            CodecError::invalid(format!("{}.{}", self.path, name), "present")
        })
    }

    pub fn item(&self, position: usize, value: &'a Value) -> Field<'a> {
        Field {
            path: format!("{}[{}]", self.path, position),
            value,
            mode: self.mode,
            index: self.index,
        }
    }

    pub fn number(&self) -> Result<f64> {
        self.value.as_f64().ok_or_else(|| self.invalid("a number"))
    }

    pub fn integer(&self) -> Result<i64> {
        integral(self.value).ok_or_else(|| self.invalid("an integer"))
    }

    pub fn int_in(&self, min: i64, max: i64) -> Result<i64> {
        match integral(self.value) {
            Some(n) if (min..=max).contains(&n) => Ok(n),
            _ => Err(self.invalid(format!("an integer in range [{}, {}]", min, max))),
        }
    }

    pub fn u8(&self) -> Result<u8> {
        self.int_in(0, i64::from(u8::MAX)).map(|n| n as u8)
    }

    pub fn u16(&self) -> Result<u16> {
        self.int_in(0, i64::from(u16::MAX)).map(|n| n as u16)
    }

    pub fn u32(&self) -> Result<u32> {
        self.int_in(0, i64::from(u32::MAX)).map(|n| n as u32)
    }

    pub fn i16(&self) -> Result<i16> {
        self.int_in(i64::from(i16::MIN), i64::from(i16::MAX))
            .map(|n| n as i16)
    }

    pub fn u16_in(&self, min: u16, max: u16) -> Result<u16> {
        self.int_in(i64::from(min), i64::from(max)).map(|n| n as u16)
    }

    pub fn u32_in(&self, min: u32, max: u32) -> Result<u32> {
        self.int_in(i64::from(min), i64::from(max)).map(|n| n as u32)
    }

    /// Validate against `map` in the active mode and return the wire code.
    pub fn code(&self, map: &ValueMap) -> Result<u8> {
        map.to_code(self.mode, self.value)
            .and_then(|code| u8::try_from(code).ok())
            .ok_or_else(|| self.invalid(map.domain(self.mode)))
    }

    /// Wide variant of [`Field::code`] for tables with codes beyond a byte.
    pub fn code_i64(&self, map: &ValueMap) -> Result<i64> {
        map.to_code(self.mode, self.value)
            .ok_or_else(|| self.invalid(map.domain(self.mode)))
    }

    /// Plain numeric set (not mode dependent).
    pub fn one_of(&self, allowed: &[i64]) -> Result<i64> {
        match integral(self.value) {
            Some(n) if allowed.contains(&n) => Ok(n),
            _ => {
                let parts: Vec<String> = allowed.iter().map(|n| n.to_string()).collect();
                Err(self.invalid(format!("one of {}", parts.join(", "))))
            }
        }
    }

    pub fn str(&self) -> Result<&'a str> {
        self.value.as_str().ok_or_else(|| self.invalid("a string"))
    }

    /// `true` for yes, `false` for no.
    pub fn yes(&self) -> Result<bool> {
        Ok(self.code(&YES_NO)? == 1)
    }
}

/// A fixed command that is sent only when the value is "yes"; "no" emits
/// nothing.
pub fn trigger(field: &Field<'_>, frame: &[u8]) -> Result<Vec<u8>> {
    if field.yes()? {
        Ok(frame.to_vec())
    } else {
        Ok(Vec::new())
    }
}

/// Pack present members of an object into one bit each. Absent members
/// leave their bit at zero.
pub fn bitfield(field: &Field<'_>, members: &[(&str, u32)], map: &ValueMap) -> Result<u32> {
    let mut data = 0u32;
    for (name, bit) in members {
        if let Some(member) = field.child(name)? {
            if member.code(map)? == 1 {
                data |= 1 << bit;
            }
        }
    }
    Ok(data)
}

/// `[prefix..][u8 code]`, the shape of most single-byte settings.
pub fn setting(field: &Field<'_>, prefix: &[u8], map: &ValueMap) -> Result<Vec<u8>> {
    let code = field.code(map)?;
    let mut w = BufferWriter::with_capacity(prefix.len() + 1);
    w.bytes(prefix).u8(code);
    Ok(w.into_bytes())
}

/// Parse a string of exactly `chars` hex digits (`[0-9A-F]` when
/// `uppercase_only`).
pub fn hex_bytes(field: &Field<'_>, chars: usize, uppercase_only: bool) -> Result<Vec<u8>> {
    let text = field.str()?;
    let digits_ok = text.chars().all(|c| {
        c.is_ascii_digit() || ('A'..='F').contains(&c) || (!uppercase_only && ('a'..='f').contains(&c))
    });
    let domain = if uppercase_only {
        format!("a {}-character hex string [0-9A-F]", chars)
    } else {
        format!("a {}-character hex string", chars)
    };
    if text.len() != chars || !digits_ok {
        return Err(field.invalid(domain));
    }
    hex::decode(text).map_err(|_| field.invalid(domain))
}

pub type FieldBuilder = fn(&Field<'_>) -> Result<Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKey {
    Exact(&'static str),
    /// `{prefix}{n}{suffix}` for n in `first..=last`, visited in ascending n.
    Series {
        prefix: &'static str,
        suffix: &'static str,
        first: u8,
        last: u8,
    },
}

impl CommandKey {
    fn claims(&self, key: &str) -> bool {
        match *self {
            CommandKey::Exact(k) => k == key,
            CommandKey::Series {
                prefix,
                suffix,
                first,
                last,
            } => key
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(suffix))
                .and_then(|n| n.parse::<u8>().ok())
                .map(|n| (first..=last).contains(&n))
                .unwrap_or(false),
        }
    }
}

/// One entry of a product's command table.
#[derive(Clone, Copy)]
pub struct CommandField {
    pub key: CommandKey,
    pub index: u8,
    pub build: FieldBuilder,
}

impl CommandField {
    pub const fn new(key: &'static str, build: FieldBuilder) -> Self {
        Self {
            key: CommandKey::Exact(key),
            index: 0,
            build,
        }
    }

    pub const fn indexed(key: &'static str, index: u8, build: FieldBuilder) -> Self {
        Self {
            key: CommandKey::Exact(key),
            index,
            build,
        }
    }

    pub const fn series(
        prefix: &'static str,
        suffix: &'static str,
        first: u8,
        last: u8,
        build: FieldBuilder,
    ) -> Self {
        Self {
            key: CommandKey::Series {
                prefix,
                suffix,
                first,
                last,
            },
            index: 0,
            build,
        }
    }
}

/// Encode every recognized key of `command` in table order.
///
/// Unrecognized keys are ignored. The first invalid field aborts the whole
/// call and nothing is returned for the fields built before it.
pub fn encode(fields: &[CommandField], command: &Record, mode: ValueMode) -> Result<Vec<u8>> {
    let mut out = BufferWriter::new();

    for entry in fields {
        match entry.key {
            CommandKey::Exact(key) => {
                if let Some(value) = command.get(key) {
                    let field = Field::new(key, value, mode).with_index(entry.index);
                    emit(&mut out, entry, &field)?;
                }
            }
            CommandKey::Series {
                prefix,
                suffix,
                first,
                last,
            } => {
                for n in first..=last {
                    let key = format!("{}{}{}", prefix, n, suffix);
                    if let Some(value) = command.get(&key) {
                        let field = Field::new(key, value, mode).with_index(n);
                        emit(&mut out, entry, &field)?;
                    }
                }
            }
        }
    }

    for key in command.keys() {
        if !fields.iter().any(|f| f.key.claims(key)) {
            tracing::debug!(key = %key, "ignoring unrecognized command key");
        }
    }

    Ok(out.into_bytes())
}

fn emit(out: &mut BufferWriter, entry: &CommandField, field: &Field<'_>) -> Result<()> {
    let bytes = (entry.build)(field)?;
    tracing::debug!(key = field.path(), len = bytes.len(), "encoded command field");
    out.bytes(&bytes);
    Ok(())
}
