//! Device echoes of downlink commands.
//!
//! `fe xx` carries the applied value only. `f8 xx` appends a result byte;
//! on a non-zero result the value is dropped and `<name>_result` is
//! reported instead.

use serde_json::{Map, Value};

use crate::dispatch::{scaled, set, DecodeContext, Flow, Record};
use crate::error::Result;
use crate::reader::{self, ByteReader};
use crate::value_map::{ValueMap, ENABLE};

const RESULT: ValueMap = ValueMap::new(&[(0, "success"), (1, "forbidden"), (2, "invalid parameter")]);
const CONDITION: ValueMap = ValueMap::new(&[(1, "below"), (2, "above"), (3, "between"), (4, "outside")]);
const D2D_EVENT: ValueMap = ValueMap::new(&[
    (1, "temperature threshold alarm"),
    (2, "temperature threshold alarm release"),
    (3, "temperature mutation alarm"),
    (4, "humidity threshold alarm"),
    (5, "humidity threshold alarm release"),
    (6, "humidity mutation alarm"),
]);

const THRESHOLD_TEMPERATURE: u8 = 0x01;
const MUTATION_TEMPERATURE: u8 = 0x02;
const THRESHOLD_HUMIDITY: u8 = 0x03;
const MUTATION_HUMIDITY: u8 = 0x04;

pub(super) fn downlink_response(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    match ctx.channel_type {
        0x02 => set(out, "collection_interval", r.u16_le()?),
        0x35 => set(out, "d2d_key", reader::serial_hex(r.take(8)?)),
        0x68 => set(out, "history_enable", ctx.present(&ENABLE, r.u8()?)),
        0x8e => {
            r.skip(1)?;
            set(out, "report_interval", r.u16_le()?);
        }
        0xea => {
            let data = r.u8()?;
            let value = r.i16_le()?;
            let mut calibration = Map::new();
            set(&mut calibration, "enable", ctx.present(&ENABLE, (data >> 7) & 0x01));
            if data & 0x01 == 0 {
                set(&mut calibration, "calibration_value", scaled(value, 10.0));
                set(out, "temperature_calibrate", Value::Object(calibration));
            } else {
                set(&mut calibration, "calibration_value", scaled(value, 2.0));
                set(out, "humidity_calibrate", Value::Object(calibration));
            }
        }
        0xf2 => set(out, "alarm_count", r.u16_le()?),
        0xf5 => set(out, "threshold_alarm_enable", ctx.present(&ENABLE, r.u8()?)),
        other => {
            tracing::debug!(channel_type = other, offset = ctx.tag_offset, "unknown downlink response, stop decoding");
            return Ok(Flow::Stop);
        }
    }
    Ok(Flow::Continue)
}

pub(super) fn extended_response(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    match ctx.channel_type {
        0x0b => {
            let mut body = r.sub(8)?;
            let data_type = body.u8()?;
            let condition = ctx.present(&CONDITION, body.u8()?);
            let max = body.array::<2>()?;
            let min = body.array::<2>()?;
            let enable = ctx.present(&ENABLE, body.u8()?);
            let result = body.u8()?;

            let (name, max, min) = match data_type {
                THRESHOLD_TEMPERATURE => (
                    "temperature_threshold_config",
                    scaled(i16::from_le_bytes(max), 10.0),
                    scaled(i16::from_le_bytes(min), 10.0),
                ),
                THRESHOLD_HUMIDITY => (
                    "humidity_threshold_config",
                    scaled(u16::from_le_bytes(max), 2.0),
                    scaled(u16::from_le_bytes(min), 2.0),
                ),
                _ => return acknowledge(out, ctx, "threshold_config", result, None),
            };
            let mut config = Map::new();
            set(&mut config, "condition", condition);
            set(&mut config, "max", max);
            set(&mut config, "min", min);
            set(&mut config, "enable", enable);
            acknowledge_as(out, ctx, "threshold_config", name, result, Value::Object(config))
        }
        0x0c => {
            let mut body = r.sub(5)?;
            let data_type = body.u8()?;
            let threshold = body.u16_le()?;
            let enable = ctx.present(&ENABLE, body.u8()?);
            let result = body.u8()?;

            let (name, threshold) = match data_type {
                MUTATION_TEMPERATURE => ("temperature_mutation_config", scaled(threshold, 10.0)),
                MUTATION_HUMIDITY => ("humidity_mutation_config", scaled(threshold, 2.0)),
                _ => return acknowledge(out, ctx, "mutation_config", result, None),
            };
            let mut config = Map::new();
            set(&mut config, "threshold", threshold);
            set(&mut config, "enable", enable);
            acknowledge_as(out, ctx, "mutation_config", name, result, Value::Object(config))
        }
        0x0d => {
            let mut body = r.sub(4)?;
            let mut config = Map::new();
            set(&mut config, "enable", ctx.present(&ENABLE, body.u8()?));
            set(&mut config, "interval", body.u16_le()?);
            let result = body.u8()?;
            acknowledge(out, ctx, "retransmit_config", result, Some(Value::Object(config)))
        }
        0x0e => {
            let mut body = r.sub(3)?;
            let interval = body.u16_le()?;
            let result = body.u8()?;
            acknowledge_as(out, ctx, "resend_config", "resend_interval", result, interval.into())
        }
        0x31 => {
            let mut body = r.sub(2)?;
            let sensor = body.u8()?;
            let result = body.u8()?;
            acknowledge(out, ctx, "fetch_sensor_id", result, Some(sensor.into()))
        }
        0x32 => {
            let mut body = r.sub(4)?;
            body.skip(2)?;
            let times = body.u8()?;
            let result = body.u8()?;
            acknowledge(out, ctx, "ack_retry_times", result, Some(times.into()))
        }
        0x63 => {
            let mut body = r.sub(5)?;
            let mut config = Map::new();
            set(&mut config, "d2d_uplink_enable", ctx.present(&ENABLE, body.u8()?));
            set(&mut config, "lora_uplink_enable", ctx.present(&ENABLE, body.u8()?));
            let sensors = body.u16_le()?;
            set(
                &mut config,
                "sensor_data_config",
                flags(ctx, u32::from(sensors), &[("temperature", 0), ("humidity", 1)]),
            );
            let result = body.u8()?;
            acknowledge(out, ctx, "uplink_config", result, Some(Value::Object(config)))
        }
        0x66 => {
            let mut body = r.sub(2)?;
            let enable = ctx.present(&ENABLE, body.u8()?);
            let result = body.u8()?;
            acknowledge(out, ctx, "d2d_enable", result, Some(enable))
        }
        0x69 => {
            let mut body = r.sub(2)?;
            let buttons = flags(ctx, u32::from(body.u8()?), &[("power", 0), ("report", 1)]);
            let result = body.u8()?;
            acknowledge(out, ctx, "button_lock_config", result, Some(buttons))
        }
        0x6a => {
            let mut body = r.sub(2)?;
            let enable = ctx.present(&ENABLE, body.u8()?);
            let result = body.u8()?;
            acknowledge_as(out, ctx, "led_indicator_config", "led_indicator_enable", result, enable)
        }
        0x96 => {
            let mut body = r.sub(9)?;
            let mut config = Map::new();
            set(&mut config, "event", ctx.present(&D2D_EVENT, body.u8()?));
            set(&mut config, "enable", ctx.present(&ENABLE, body.u8()?));
            set(&mut config, "lora_uplink_enable", ctx.present(&ENABLE, body.u8()?));
            set(&mut config, "d2d_cmd", reader::serial_hex(body.take(2)?));
            body.skip(2)?;
            let result = body.u8()?;
            acknowledge(out, ctx, "d2d_master_config", result, Some(Value::Object(config)))
        }
        other => {
            tracing::debug!(channel_type = other, offset = ctx.tag_offset, "unknown extended downlink response, stop decoding");
            set(out, "unknown_downlink_response", ctx.present(&RESULT, other));
            Ok(Flow::Stop)
        }
    }
}

/// Report `value` under `name` on success, `<name>_result` otherwise.
fn acknowledge(out: &mut Record, ctx: &DecodeContext, name: &str, result: u8, value: Option<Value>) -> Result<Flow> {
    if result != 0 {
        set(out, format!("{}_result", name), ctx.present(&RESULT, result));
    } else if let Some(value) = value {
        set(out, name, value);
    }
    Ok(Flow::Continue)
}

// For echoes whose value key differs from the command name.
fn acknowledge_as(
    out: &mut Record,
    ctx: &DecodeContext,
    name: &str,
    value_key: &str,
    result: u8,
    value: Value,
) -> Result<Flow> {
    if result != 0 {
        set(out, format!("{}_result", name), ctx.present(&RESULT, result));
    } else {
        set(out, value_key, value);
    }
    Ok(Flow::Continue)
}

fn flags(ctx: &DecodeContext, value: u32, members: &[(&str, u32)]) -> Value {
    let mut data = Map::new();
    for (name, bit) in members {
        set(&mut data, *name, ctx.present(&ENABLE, (value >> bit) & 0x01));
    }
    Value::Object(data)
}
