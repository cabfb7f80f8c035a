use serde_json::{Map, Value};

use crate::config::CodecConfig;
use crate::dispatch::{push_entry, scaled, set, walk, DecodeContext, FieldHandler, Flow, Record};
use crate::error::Result;
use crate::header;
use crate::product::{Product, UplinkDecoder};
use crate::reader::ByteReader;
use crate::value_map::{ValueMap, ON_OFF};

const DEVICE_STATUS: ValueMap = ValueMap::new(&[(0, "offline"), (1, "online")]);
const PIR: ValueMap = ValueMap::new(&[(0, "idle"), (1, "trigger")]);

/// Uplink decoder for the AM307 (v2) indoor ambience monitor.
#[derive(Debug, Clone, Default)]
pub struct Am307Decoder {
    config: CodecConfig,
}

impl Am307Decoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Record> {
        walk(bytes, HANDLERS, self.config.value_mode, None)
    }
}

impl UplinkDecoder for Am307Decoder {
    fn product(&self) -> Product {
        Product::Am300
    }

    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        Am307Decoder::decode(self, bytes)
    }
}

pub(crate) const HANDLERS: &[FieldHandler] = &[
    FieldHandler::exact(0xff, 0x01, "ipso_version", header::ipso_version),
    FieldHandler::exact(0xff, 0x09, "hardware_version", header::hardware_version),
    FieldHandler::exact(0xff, 0x0a, "firmware_version", header::firmware_version),
    FieldHandler::exact(0xff, 0x0b, "device_status", device_status),
    FieldHandler::exact(0xff, 0x0f, "lorawan_class", header::lorawan_class),
    FieldHandler::exact(0xff, 0x16, "sn", header::serial_number),
    FieldHandler::exact(0xff, 0xff, "tsl_version", header::tsl_version),
    FieldHandler::exact(0x01, 0x75, "battery", battery),
    FieldHandler::exact(0x03, 0x67, "temperature", temperature),
    FieldHandler::exact(0x04, 0x68, "humidity", humidity),
    FieldHandler::exact(0x05, 0x00, "pir", pir),
    FieldHandler::exact(0x06, 0xcb, "light_level", light_level),
    FieldHandler::exact(0x07, 0x7d, "co2", co2),
    FieldHandler::exact(0x08, 0x7d, "tvoc", tvoc_iaq),
    FieldHandler::exact(0x08, 0xe6, "tvoc", tvoc_ugm3),
    FieldHandler::exact(0x09, 0x73, "pressure", pressure),
    FieldHandler::exact(0x0e, 0x01, "buzzer_status", buzzer_status),
    FieldHandler::exact(0x20, 0xce, "history", history_iaq),
    FieldHandler::exact(0x21, 0xce, "history", history_ugm3),
];

fn device_status(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "device_status", ctx.present(&DEVICE_STATUS, r.u8()?));
    Ok(Flow::Continue)
}

fn battery(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "battery", r.u8()?);
    Ok(Flow::Continue)
}

fn temperature(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "temperature", scaled(r.i16_le()?, 10.0));
    Ok(Flow::Continue)
}

fn humidity(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "humidity", scaled(r.u8()?, 2.0));
    Ok(Flow::Continue)
}

fn pir(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "pir", ctx.present(&PIR, r.u8()?));
    Ok(Flow::Continue)
}

fn light_level(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "light_level", r.u8()?);
    Ok(Flow::Continue)
}

fn co2(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "co2", r.u16_le()?);
    Ok(Flow::Continue)
}

fn tvoc_iaq(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "tvoc", scaled(r.u16_le()?, 100.0));
    Ok(Flow::Continue)
}

fn tvoc_ugm3(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "tvoc", r.u16_le()?);
    Ok(Flow::Continue)
}

fn pressure(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "pressure", scaled(r.u16_le()?, 10.0));
    Ok(Flow::Continue)
}

fn buzzer_status(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "buzzer_status", ctx.present(&ON_OFF, r.u8()?));
    Ok(Flow::Continue)
}

fn history_iaq(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    history_entry(r, ctx, out, true)
}

fn history_ugm3(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    history_entry(r, ctx, out, false)
}

// 16 bytes; the two variants differ only in the tvoc unit
fn history_entry(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record, tvoc_iaq: bool) -> Result<Flow> {
    let mut body = r.sub(16)?;
    let mut entry = Map::new();
    set(&mut entry, "timestamp", body.u32_le()?);
    set(&mut entry, "temperature", scaled(body.i16_le()?, 10.0));
    set(&mut entry, "humidity", scaled(body.u16_le()?, 2.0));
    set(&mut entry, "pir", ctx.present(&PIR, body.u8()?));
    set(&mut entry, "light_level", body.u8()?);
    set(&mut entry, "co2", body.u16_le()?);
    let tvoc = body.u16_le()?;
    if tvoc_iaq {
        set(&mut entry, "tvoc", scaled(tvoc, 100.0));
    } else {
        set(&mut entry, "tvoc", tvoc);
    }
    set(&mut entry, "pressure", scaled(body.u16_le()?, 10.0));
    push_entry(out, "history", Value::Object(entry));
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::overlapping;

    #[test]
    fn tag_table_has_no_overlaps() {
        assert!(overlapping(HANDLERS).is_empty());
    }
}
