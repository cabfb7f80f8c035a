//! Append-only little-endian accumulator used by the downlink builders.

/// Growable downlink buffer. Builders validate their input first and only
/// then append, so a rejected field never leaves partial bytes behind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferWriter {
    buf: Vec<u8>,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn i8(&mut self, value: i8) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u16_le(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i16_le(&mut self, value: i16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32_le(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i32_le(&mut self, value: i32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Exactly `len` bytes: the text truncated or zero padded.
    pub fn ascii_padded(&mut self, text: &str, len: usize) -> &mut Self {
        let raw = text.as_bytes();
        for i in 0..len {
            self.buf.push(raw.get(i).copied().unwrap_or(0));
        }
        self
    }

    /// Two command bytes, low byte first (`"abcd"` -> `cd ab`).
    pub fn d2d_command(&mut self, code: [u8; 2]) -> &mut Self {
        self.buf.push(code[1]);
        self.buf.push(code[0]);
        self
    }

    /// Zero fill up to `len` bytes total.
    pub fn pad_to(&mut self, len: usize) -> &mut Self {
        if self.buf.len() < len {
            self.buf.resize(len, 0);
        }
        self
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
