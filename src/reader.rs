//! Little-endian byte cursor and the field formatters shared by the uplink
//! decoders.

use crate::error::{CodecError, Result};

/// Bounds-checked little-endian cursor over an uplink payload.
///
/// Every read fails with [`CodecError::TruncatedInput`] instead of yielding
/// a short or zero-filled value. Child readers created with [`ByteReader::sub`]
/// keep reporting offsets relative to the whole payload.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            base: 0,
        }
    }

    /// Absolute offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if available < n {
            return Err(CodecError::TruncatedInput {
                offset: self.position(),
                needed: n,
                available,
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Consume the next `n` bytes and return a reader bounded to them.
    pub fn sub(&mut self, n: usize) -> Result<ByteReader<'a>> {
        let base = self.position();
        let buf = self.take(n)?;
        Ok(ByteReader { buf, pos: 0, base })
    }

    /// Consume everything that is left.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn i8(&mut self) -> Result<i8> {
        Ok(self.u8()? as i8)
    }

    pub fn u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn i16_le(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    pub fn u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn i32_le(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    /// IEEE-754 single precision, decoded by hand from the bit pattern.
    pub fn f32_le(&mut self) -> Result<f64> {
        Ok(float32_from_bits(self.u32_le()?))
    }
}

/// Sign, exponent and mantissa decode of a binary32 value. A zero exponent
/// takes the subnormal path (no implicit leading bit).
pub fn float32_from_bits(bits: u32) -> f64 {
    let sign = if bits >> 31 == 0 { 1.0 } else { -1.0 };
    let exponent = ((bits >> 23) & 0xff) as i32;
    let mantissa = if exponent == 0 {
        (bits & 0x7f_ffff) << 1
    } else {
        (bits & 0x7f_ffff) | 0x80_0000
    };
    sign * f64::from(mantissa) * 2f64.powi(exponent - 150)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `v{major}.{minor}` from the two nibbles of one byte.
pub fn protocol_version(byte: u8) -> String {
    format!("v{}.{}", byte >> 4, byte & 0x0f)
}

pub fn hardware_version(bytes: [u8; 2]) -> String {
    format!("v{}.{}", bytes[0], bytes[1] >> 4)
}

pub fn firmware_version(bytes: [u8; 2]) -> String {
    format!("v{}.{}", bytes[0], bytes[1])
}

pub fn tsl_version(bytes: [u8; 2]) -> String {
    firmware_version(bytes)
}

pub fn serial_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn ascii(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Like [`ascii`] but null bytes are treated as padding and dropped.
pub fn ascii_skip_nul(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

/// D2D command codes travel low byte first and are shown high byte first.
pub fn d2d_command(bytes: [u8; 2]) -> String {
    hex::encode([bytes[1], bytes[0]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_reads_apply_twos_complement() {
        let mut r = ByteReader::new(&[0xff, 0x9c, 0xff, 0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(r.i8().unwrap(), -1);
        assert_eq!(r.i16_le().unwrap(), -100);
        assert_eq!(r.i32_le().unwrap(), -2);
        assert!(r.is_empty());
    }

    #[test]
    fn reading_past_end_is_truncated_input() {
        let mut r = ByteReader::new(&[0x01, 0x02, 0x03]);
        r.u8().unwrap();
        let err = r.u32_le().unwrap_err();
        assert_eq!(
            err,
            CodecError::TruncatedInput {
                offset: 1,
                needed: 4,
                available: 2
            }
        );
        // a failed read does not move the cursor
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn sub_reader_reports_absolute_offsets() {
        let mut r = ByteReader::new(&[0xaa, 0xbb, 0x01, 0x02]);
        r.skip(2).unwrap();
        let mut body = r.sub(2).unwrap();
        assert_eq!(body.u8().unwrap(), 0x01);
        let err = body.u16_le().unwrap_err();
        assert_eq!(
            err,
            CodecError::TruncatedInput {
                offset: 3,
                needed: 2,
                available: 1
            }
        );
        assert!(r.is_empty());
    }

    #[test]
    fn float_decode_matches_ieee754() {
        assert_eq!(float32_from_bits(0x3f80_0000), 1.0);
        assert_eq!(float32_from_bits(0xc120_0000), -10.0);
        assert_eq!(float32_from_bits(0x4049_0fdb), f64::from(std::f32::consts::PI));
        assert_eq!(float32_from_bits(0), 0.0);
    }

    #[test]
    fn float_decode_handles_subnormals() {
        // smallest positive subnormal: 2^-149
        assert_eq!(float32_from_bits(0x0000_0001), 2f64.powi(-149));
        assert_eq!(
            float32_from_bits(0x0040_0000),
            f64::from(f32::from_bits(0x0040_0000))
        );
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(f64::from(std::f32::consts::PI)), 3.14);
        assert_eq!(round2(-2.71828), -2.72);
    }

    #[test]
    fn version_formatters_split_bytes_per_field() {
        assert_eq!(protocol_version(0x14), "v1.4");
        assert_eq!(hardware_version([0x01, 0x40]), "v1.4");
        assert_eq!(firmware_version([0x01, 0x14]), "v1.20");
        assert_eq!(tsl_version([0x02, 0x00]), "v2.0");
    }

    #[test]
    fn text_helpers() {
        assert_eq!(serial_hex(&[0x67, 0x49, 0xd3, 0x8b, 0x21, 0x17, 0x00, 0x0a]), "6749d38b2117000a");
        assert_eq!(ascii(b"ab\0c"), "ab\0c");
        assert_eq!(ascii_skip_nul(b"ab\0c\0"), "abc");
        assert_eq!(d2d_command([0x34, 0x12]), "1234");
    }
}
