use serde_json::{Map, Value};

use crate::config::CodecConfig;
use crate::dispatch::{push_entry, set, walk, DecodeContext, Fallback, FieldHandler, Flow, Record};
use crate::error::Result;
use crate::header;
use crate::product::{Product, UplinkDecoder};
use crate::reader::{self, ByteReader};
use crate::value_map::{ValueMap, ON_OFF};

const READ_STATUS: ValueMap = ValueMap::new(&[(0, "normal"), (1, "read error")]);
const ALARM_TYPE: ValueMap = ValueMap::new(&[
    (0, "normal"),
    (1, "threshold alarm"),
    (2, "threshold release alarm"),
    (3, "mutation alarm"),
]);
const MUTATION_ALARM: u8 = 3;
const READ_ERROR: u8 = 1;

/// Uplink decoder for the UC100 Modbus to LoRaWAN converter.
#[derive(Debug, Clone, Default)]
pub struct Uc100Decoder {
    config: CodecConfig,
}

impl Uc100Decoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Record> {
        let fallback: Option<Fallback> = if self.config.custom_message_fallback {
            Some(custom_message)
        } else {
            None
        };
        walk(bytes, HANDLERS, self.config.value_mode, fallback)
    }
}

impl UplinkDecoder for Uc100Decoder {
    fn product(&self) -> Product {
        Product::Uc100
    }

    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        Uc100Decoder::decode(self, bytes)
    }
}

pub(crate) const HANDLERS: &[FieldHandler] = &[
    FieldHandler::exact(0xff, 0x01, "ipso_version", header::ipso_version),
    FieldHandler::exact(0xff, 0x09, "hardware_version", header::hardware_version),
    FieldHandler::exact(0xff, 0x0a, "firmware_version", header::firmware_version),
    FieldHandler::exact(0xff, 0xff, "tsl_version", header::tsl_version),
    FieldHandler::exact(0xff, 0x16, "sn", header::serial_number),
    FieldHandler::exact(0xff, 0x0f, "lorawan_class", header::lorawan_class),
    FieldHandler::exact(0xff, 0xfe, "reset_event", header::reset_event),
    FieldHandler::exact(0xff, 0x0b, "device_status", header::device_on),
    FieldHandler::exact(0xff, 0x19, "modbus", modbus_value),
    FieldHandler::exact(0xff, 0x15, "modbus_read_error", modbus_read_error),
    FieldHandler::exact(0xff, 0xee, "modbus_alarm", modbus_alarm),
    FieldHandler::exact(0xf9, 0x5f, "modbus_mutation", modbus_mutation),
    FieldHandler::exact(0x20, 0xce, "history", modbus_history),
    FieldHandler::exact(0x20, 0xcd, "history", custom_message_history),
];

fn channel_key(chn: u8) -> String {
    format!("modbus_chn_{}", u16::from(chn) + 1)
}

/// Value of a live reading; `data_def` is sign in bit 7, data type in bits
/// 0..6. Types the firmware does not document skip `data_length` bytes.
fn live_value(r: &mut ByteReader<'_>, ctx: &DecodeContext, data_length: u8, data_def: u8) -> Result<Option<Value>> {
    let signed = data_def & 0x80 != 0;
    let value = match data_def & 0x7f {
        0 | 1 => ctx.present(&ON_OFF, r.u8()?),
        2 | 3 => register16(r, signed)?,
        4 | 6 => register32(r, signed)?,
        8..=11 => {
            let mut slot = r.sub(4)?;
            register16(&mut slot, signed)?
        }
        5 | 7 => Value::from(reader::round2(r.f32_le()?)),
        other => {
            tracing::debug!(data_type = other, data_length, "skipping undocumented modbus data type");
            r.skip(usize::from(data_length))?;
            return Ok(None);
        }
    };
    Ok(Some(value))
}

fn register16(r: &mut ByteReader<'_>, signed: bool) -> Result<Value> {
    Ok(if signed {
        Value::from(r.i16_le()?)
    } else {
        Value::from(r.u16_le()?)
    })
}

fn register32(r: &mut ByteReader<'_>, signed: bool) -> Result<Value> {
    Ok(if signed {
        Value::from(r.i32_le()?)
    } else {
        Value::from(r.u32_le()?)
    })
}

fn modbus_value(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let key = channel_key(r.u8()?);
    let data_length = r.u8()?;
    let data_def = r.u8()?;
    if let Some(value) = live_value(r, ctx, data_length, data_def)? {
        set(out, key, value);
    }
    Ok(Flow::Continue)
}

fn modbus_read_error(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let key = channel_key(r.u8()?);
    set(out, format!("{}_alarm", key), ctx.present(&READ_STATUS, READ_ERROR));
    Ok(Flow::Continue)
}

fn modbus_alarm(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let chn_def = r.u8()?;
    let data_length = r.u8()?;
    let data_def = r.u8()?;
    let key = channel_key(chn_def & 0x3f);

    set(out, format!("{}_alarm", key), ctx.present(&ALARM_TYPE, chn_def >> 6));
    if let Some(value) = live_value(r, ctx, data_length, data_def)? {
        set(out, key, value);
    }
    Ok(Flow::Continue)
}

fn modbus_mutation(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut body = r.sub(7)?;
    let chn_def = body.u8()?;
    let key = channel_key(chn_def & 0x3f);
    if chn_def >> 6 == MUTATION_ALARM {
        body.skip(2)?;
        set(out, format!("{}_alarm", key), ctx.present(&ALARM_TYPE, MUTATION_ALARM));
        set(out, format!("{}_mutation", key), reader::round2(body.f32_le()?));
    }
    Ok(Flow::Continue)
}

/// 10 bytes: timestamp, channel, data_def (sign bit 7, type bits 2..6,
/// read status bit 1), then a 4-byte value slot.
fn modbus_history(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut body = r.sub(10)?;
    let timestamp = body.u32_le()?;
    let key = channel_key(body.u8()?);
    let data_def = body.u8()?;
    let mut slot = body.sub(4)?;

    let signed = data_def & 0x80 != 0;
    let read_ok = (data_def >> 1) & 0x01 == 1;

    let mut entry = Map::new();
    set(&mut entry, "timestamp", timestamp);
    if !read_ok {
        set(&mut entry, format!("{}_alarm", key), ctx.present(&READ_STATUS, READ_ERROR));
    } else {
        match (data_def >> 2) & 0x1f {
            0 | 1 => set(&mut entry, key, ctx.present(&ON_OFF, slot.u8()?)),
            2 | 3 | 14 | 15 | 4..=7 | 16..=19 => set(&mut entry, key, register32(&mut slot, signed)?),
            8 | 9 | 20 | 21 => set(&mut entry, key, register16(&mut slot, signed)?),
            10..=13 | 22..=25 => set(&mut entry, key, reader::round2(slot.f32_le()?)),
            other => tracing::debug!(data_type = other, "undocumented modbus history type"),
        }
    }
    push_entry(out, "history", Value::Object(entry));
    Ok(Flow::Continue)
}

fn custom_message_history(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let timestamp = r.u32_le()?;
    let len = r.u8()?;
    let message = reader::ascii(r.take(usize::from(len))?);

    let mut entry = Map::new();
    set(&mut entry, "timestamp", timestamp);
    set(&mut entry, "custom_message", message);
    push_entry(out, "history", Value::Object(entry));
    Ok(Flow::Continue)
}

/// Everything from the unclaimed tag to the end is a free-form message.
fn custom_message(bytes: &[u8], ctx: &DecodeContext, out: &mut Record) -> Result<()> {
    let tail = bytes.get(ctx.tag_offset..).unwrap_or_default();
    set(out, "custom_message", reader::ascii(tail));
    Ok(())
}
