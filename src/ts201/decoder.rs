use serde_json::{Map, Value};

use crate::config::CodecConfig;
use crate::dispatch::{push_entry, scaled, set, walk, DecodeContext, FieldHandler, Flow, Record};
use crate::error::Result;
use crate::header;
use crate::product::{Product, UplinkDecoder};
use crate::reader::{self, ByteReader};
use crate::value_map::ValueMap;

use super::response::{downlink_response, extended_response};

const SENSOR_TYPE: ValueMap = ValueMap::new(&[(1, "DS18B20"), (2, "SHT4X")]);
const SENSOR_SHT4X: u8 = 2;
const ALARM_TYPE: ValueMap = ValueMap::new(&[
    (0, "threshold alarm release"),
    (1, "threshold alarm"),
    (2, "mutation alarm"),
]);
const SENSOR_STATUS: ValueMap = ValueMap::new(&[(0, "read error"), (1, "out of range")]);
const DATA_STATUS: ValueMap = ValueMap::new(&[(0, "normal"), (1, "read error"), (2, "out of range")]);
const HISTORY_EVENT: ValueMap = ValueMap::new(&[
    (1, "periodic"),
    (2, "temperature alarm (threshold or mutation)"),
    (3, "temperature alarm release"),
    (4, "humidity alarm (threshold or mutation)"),
    (5, "humidity alarm release"),
]);

/// Uplink decoder for the TS201 (v2) temperature and humidity sensor.
#[derive(Debug, Clone, Default)]
pub struct Ts201Decoder {
    config: CodecConfig,
}

impl Ts201Decoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Record> {
        walk(bytes, HANDLERS, self.config.value_mode, None)
    }
}

impl UplinkDecoder for Ts201Decoder {
    fn product(&self) -> Product {
        Product::Ts201
    }

    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        Ts201Decoder::decode(self, bytes)
    }
}

// The two whole-channel entries stay last so exact tags win.
pub(crate) const HANDLERS: &[FieldHandler] = &[
    FieldHandler::exact(0xff, 0x01, "ipso_version", header::ipso_version),
    FieldHandler::exact(0xff, 0x09, "hardware_version", header::hardware_version),
    FieldHandler::exact(0xff, 0x0a, "firmware_version", header::firmware_version),
    FieldHandler::exact(0xff, 0xff, "tsl_version", header::tsl_version),
    FieldHandler::exact(0xff, 0x16, "sn", header::serial_number),
    FieldHandler::exact(0xff, 0x0f, "lorawan_class", header::lorawan_class),
    FieldHandler::exact(0xff, 0xfe, "reset_event", header::reset_event),
    FieldHandler::exact(0xff, 0x0b, "device_status", header::device_on),
    FieldHandler::exact(0x01, 0x75, "battery", battery),
    FieldHandler::exact(0x03, 0x67, "temperature", temperature),
    FieldHandler::exact(0x04, 0x68, "humidity", humidity),
    FieldHandler::exact(0xff, 0xa0, "sensor_id", sensor_id),
    FieldHandler::exact(0x83, 0x67, "temperature_threshold_alarm", temperature_threshold_alarm),
    FieldHandler::exact(0x84, 0x68, "humidity_threshold_alarm", humidity_threshold_alarm),
    FieldHandler::exact(0x93, 0x67, "temperature_mutation_alarm", temperature_mutation_alarm),
    FieldHandler::exact(0x94, 0x68, "humidity_mutation_alarm", humidity_mutation_alarm),
    FieldHandler::exact(0xb3, 0x67, "temperature_sensor_status", temperature_sensor_status),
    FieldHandler::exact(0xb4, 0x68, "humidity_sensor_status", humidity_sensor_status),
    FieldHandler::exact(0x20, 0xce, "history", history),
    FieldHandler::channel(0xfe, "downlink_response", downlink_response),
    FieldHandler::channel(0xf8, "downlink_response_ext", extended_response),
];

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

/// `idx << 4 | type`, then the probe's 8-byte serial.
fn sensor_id(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let data = r.u8()?;
    let prefix = format!("sensor_{}", data >> 4);
    set(out, format!("{}_type", prefix), ctx.present(&SENSOR_TYPE, data & 0x0f));
    set(out, format!("{}_sn", prefix), reader::serial_hex(r.take(8)?));
    Ok(Flow::Continue)
}

// Alarm frames record an event and also refresh the scalar reading.
fn event(out: &mut Record, reading: &str, entry: Map<String, Value>) {
    if let Some(value) = entry.get(reading) {
        set(out, reading, value.clone());
    }
    push_entry(out, "event", Value::Object(entry));
}

fn temperature_threshold_alarm(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut entry = Map::new();
    set(&mut entry, "temperature", scaled(r.i16_le()?, 10.0));
    set(&mut entry, "temperature_alarm", ctx.present(&ALARM_TYPE, r.u8()?));
    event(out, "temperature", entry);
    Ok(Flow::Continue)
}

fn humidity_threshold_alarm(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut entry = Map::new();
    set(&mut entry, "humidity", scaled(r.u8()?, 2.0));
    set(&mut entry, "humidity_alarm", ctx.present(&ALARM_TYPE, r.u8()?));
    event(out, "humidity", entry);
    Ok(Flow::Continue)
}

fn temperature_mutation_alarm(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut entry = Map::new();
    set(&mut entry, "temperature", scaled(r.i16_le()?, 10.0));
    set(&mut entry, "temperature_mutation", scaled(r.i16_le()?, 10.0));
    set(&mut entry, "temperature_alarm", ctx.present(&ALARM_TYPE, r.u8()?));
    event(out, "temperature", entry);
    Ok(Flow::Continue)
}

fn humidity_mutation_alarm(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut entry = Map::new();
    set(&mut entry, "humidity", scaled(r.u8()?, 2.0));
    set(&mut entry, "humidity_mutation", scaled(r.u8()?, 10.0));
    set(&mut entry, "humidity_alarm", ctx.present(&ALARM_TYPE, r.u8()?));
    event(out, "humidity", entry);
    Ok(Flow::Continue)
}

fn temperature_sensor_status(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut entry = Map::new();
    set(&mut entry, "temperature_sensor_status", ctx.present(&SENSOR_STATUS, r.u8()?));
    push_entry(out, "event", Value::Object(entry));
    Ok(Flow::Continue)
}

fn humidity_sensor_status(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut entry = Map::new();
    set(&mut entry, "humidity_sensor_status", ctx.present(&SENSOR_STATUS, r.u8()?));
    push_entry(out, "event", Value::Object(entry));
    Ok(Flow::Continue)
}

/// 9 bytes. Humidity is only meaningful for SHT4X probes.
fn history(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut body = r.sub(9)?;
    let timestamp = body.u32_le()?;
    let sensor_type = body.u8()?;
    let temperature = body.i16_le()?;
    let humidity = body.u8()?;
    let flags = body.u8()?;
    let sht4x = sensor_type == SENSOR_SHT4X;

    let mut event = Map::new();
    set(&mut event, "event_type", ctx.present(&HISTORY_EVENT, flags & 0x0f));
    if sht4x {
        set(&mut event, "humidity_sensor_status", ctx.present(&DATA_STATUS, (flags >> 4) & 0x03));
    }
    set(&mut event, "temperature_sensor_status", ctx.present(&DATA_STATUS, (flags >> 6) & 0x03));

    let mut entry = Map::new();
    set(&mut entry, "timestamp", timestamp);
    set(&mut entry, "sensor_type", ctx.present(&SENSOR_TYPE, sensor_type));
    set(&mut entry, "event", Value::Object(event));
    set(&mut entry, "temperature", scaled(temperature, 10.0));
    if sht4x {
        set(&mut entry, "humidity", scaled(humidity, 2.0));
    }
    push_entry(out, "history", Value::Object(entry));
    Ok(Flow::Continue)
}
