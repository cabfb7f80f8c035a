//! Calling conventions of the network servers that host payload codecs.
//!
//! Every entry point delegates to the product decoder/encoder; the port
//! arguments are accepted for signature compatibility and not inspected.

use serde_json::{json, Value};

use crate::dispatch::Record;
use crate::error::{CodecError, Result};
use crate::product::{DownlinkEncoder, UplinkDecoder};

/// ChirpStack v4: `{"bytes": [..], "fPort": n}` -> `{"data": record}`.
pub fn decode_uplink(decoder: &dyn UplinkDecoder, input: &Value) -> Result<Value> {
    let bytes = byte_array(input.get("bytes"))?;
    let record = decoder.decode(&bytes)?;
    Ok(json!({ "data": Value::Object(record) }))
}

/// ChirpStack v3 `Decode(fPort, bytes)`.
pub fn decode_v3(decoder: &dyn UplinkDecoder, _f_port: u8, bytes: &[u8]) -> Result<Record> {
    decoder.decode(bytes)
}

/// The Things Network `Decoder(bytes, port)`.
pub fn decode_ttn(decoder: &dyn UplinkDecoder, bytes: &[u8], _port: u8) -> Result<Record> {
    decoder.decode(bytes)
}

/// ChirpStack v4: `{"data": command}` -> `{"bytes": [..]}`.
pub fn encode_downlink(encoder: &dyn DownlinkEncoder, input: &Value) -> Result<Value> {
    let command = input
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| CodecError::invalid("data", "an object"))?;
    let bytes = encoder.encode(command)?;
    Ok(json!({ "bytes": bytes }))
}

/// ChirpStack v3 `Encode(fPort, obj)`.
pub fn encode_v3(encoder: &dyn DownlinkEncoder, _f_port: u8, command: &Record) -> Result<Vec<u8>> {
    encoder.encode(command)
}

/// The Things Network `Encoder(obj, port)`.
pub fn encode_ttn(encoder: &dyn DownlinkEncoder, command: &Record, _port: u8) -> Result<Vec<u8>> {
    encoder.encode(command)
}

fn byte_array(value: Option<&Value>) -> Result<Vec<u8>> {
    let invalid = || CodecError::invalid("bytes", "an array of integers in range [0, 255]");
    value
        .and_then(Value::as_array)
        .ok_or_else(invalid)?
        .iter()
        .map(|b| {
            b.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(invalid)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::product::Product;

    #[test]
    fn rejects_non_byte_arrays() {
        let decoder = Product::Am300.decoder(CodecConfig::default()).unwrap();
        for input in [json!({}), json!({ "bytes": "0175" }), json!({ "bytes": [1, 256] })] {
            let err = decode_uplink(decoder.as_ref(), &input).unwrap_err();
            assert_eq!(err.field(), Some("bytes"), "input {}", input);
        }
    }
}
