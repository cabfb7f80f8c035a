use serde_json::{Map, Value};

use crate::config::CodecConfig;
use crate::dispatch::{push_entry, set, walk, DecodeContext, FieldHandler, Flow, Record};
use crate::error::Result;
use crate::header;
use crate::product::{Product, UplinkDecoder};
use crate::reader::{self, ByteReader};
use crate::value_map::{ValueMap, ENABLE, ON_OFF};

const VALVE_STATUS: ValueMap = ValueMap::new(&[(0, "close"), (1, "open")]);
const DELAY_CONTROL_RESULT: ValueMap = ValueMap::new(&[(0, "success"), (1, "failed")]);
const SENSOR_STATUS: ValueMap = ValueMap::new(&[(1, "sensor error")]);
const VALVE_MODE: ValueMap = ValueMap::new(&[(0, "counter"), (1, "gpio")]);
const CONDITION_TYPE: ValueMap = ValueMap::new(&[
    (0, "none"),
    (1, "time condition"),
    (2, "d2d condition"),
    (3, "time and pulse threshold condition"),
    (4, "pulse threshold condition"),
]);
const REPEAT_TYPE: ValueMap = ValueMap::new(&[(0, "monthly"), (1, "daily"), (2, "weekly")]);
const REPEAT_WEEKLY: u8 = 2;
const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// A valve status byte of 0xff reports the outcome of a delayed command.
const DELAY_CONTROL_MARKER: u8 = 0xff;

/// Uplink decoder for the UC51x solenoid valve controllers.
#[derive(Debug, Clone, Default)]
pub struct Uc51xDecoder {
    config: CodecConfig,
}

impl Uc51xDecoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Record> {
        walk(bytes, HANDLERS, self.config.value_mode, None)
    }
}

impl UplinkDecoder for Uc51xDecoder {
    fn product(&self) -> Product {
        Product::Uc51x
    }

    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        Uc51xDecoder::decode(self, bytes)
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
    FieldHandler::exact(0x01, 0x75, "battery", battery),
    FieldHandler::exact(0x03, 0x01, "valve_1", valve_1),
    FieldHandler::exact(0x05, 0x01, "valve_2", valve_2),
    FieldHandler::exact(0x04, 0xc8, "valve_1_pulse", valve_1_pulse),
    FieldHandler::exact(0x06, 0xc8, "valve_2_pulse", valve_2_pulse),
    FieldHandler::exact(0x07, 0x01, "gpio_1", gpio_1),
    FieldHandler::exact(0x08, 0x01, "gpio_2", gpio_2),
    FieldHandler::exact(0x09, 0x7b, "pressure", pressure),
    FieldHandler::exact(0xb9, 0x7b, "pressure_sensor_status", pressure_sensor_status),
    FieldHandler::exact(0xff, 0x12, "custom_message", custom_message),
    FieldHandler::exact(0x20, 0xce, "history", valve_history),
    FieldHandler::exact(0x21, 0xce, "history", pressure_history),
    FieldHandler::exact(0xfe, 0x53, "rules", rule),
];

fn battery(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "battery", r.u8()?);
    Ok(Flow::Continue)
}

fn valve_status(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record, valve: u8) -> Result<Flow> {
    let value = r.u8()?;
    if value == DELAY_CONTROL_MARKER {
        set(
            out,
            format!("valve_{}_result", valve),
            ctx.present(&DELAY_CONTROL_RESULT, 1),
        );
    } else {
        set(out, format!("valve_{}", valve), ctx.present(&VALVE_STATUS, value));
    }
    Ok(Flow::Continue)
}

fn valve_1(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    valve_status(r, ctx, out, 1)
}

fn valve_2(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    valve_status(r, ctx, out, 2)
}

fn valve_1_pulse(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "valve_1_pulse", r.u32_le()?);
    Ok(Flow::Continue)
}

fn valve_2_pulse(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "valve_2_pulse", r.u32_le()?);
    Ok(Flow::Continue)
}

fn gpio_1(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "gpio_1", ctx.present(&ON_OFF, r.u8()?));
    Ok(Flow::Continue)
}

fn gpio_2(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "gpio_2", ctx.present(&ON_OFF, r.u8()?));
    Ok(Flow::Continue)
}

fn pressure(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "pressure", r.u16_le()?);
    Ok(Flow::Continue)
}

fn pressure_sensor_status(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "pressure_sensor_status", ctx.present(&SENSOR_STATUS, r.u8()?));
    Ok(Flow::Continue)
}

/// Runs to the end of the payload.
fn custom_message(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "custom_message", reader::ascii_skip_nul(r.rest()));
    Ok(Flow::Continue)
}

fn valve_history(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut body = r.sub(9)?;
    let timestamp = body.u32_le()?;
    let flags = body.u8()?;
    let pulse = body.u32_le()?;

    let status = flags & 0x01;
    let mode = (flags >> 1) & 0x01;
    let gpio = (flags >> 2) & 0x01;
    let valve = if (flags >> 4) & 0x01 == 0 { 1 } else { 2 };

    let mut entry = Map::new();
    set(&mut entry, "timestamp", timestamp);
    set(&mut entry, "mode", ctx.present(&VALVE_MODE, mode));
    set(&mut entry, format!("valve_{}", valve), ctx.present(&VALVE_STATUS, status));
    if mode == 0 {
        set(&mut entry, format!("gpio_{}", valve), ctx.present(&ON_OFF, gpio));
    } else {
        set(&mut entry, format!("valve_{}_pulse", valve), pulse);
    }
    push_entry(out, "history", Value::Object(entry));
    Ok(Flow::Continue)
}

fn pressure_history(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut body = r.sub(6)?;
    let mut entry = Map::new();
    set(&mut entry, "timestamp", body.u32_le()?);
    set(&mut entry, "pressure", body.u16_le()?);
    push_entry(out, "history", Value::Object(entry));
    Ok(Flow::Continue)
}

/// Rule engine report: index, enabled, 13-byte condition block, 13-byte
/// action block.
fn rule(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    let mut body = r.sub(28)?;
    let mut entry = Map::new();
    set(&mut entry, "index", body.u8()?);
    set(&mut entry, "enabled", ctx.present(&ENABLE, body.u8()?));

    let condition_type = body.u8()?;
    let condition = rule_condition(condition_type, body.sub(12)?, ctx)?;
    set(&mut entry, "condition", Value::Object(condition));

    let action_type = body.u8()?;
    let action = rule_action(action_type, body.sub(12)?, ctx)?;
    set(&mut entry, "action", Value::Object(action));

    push_entry(out, "rules", Value::Object(entry));
    Ok(Flow::Continue)
}

fn rule_condition(kind: u8, mut r: ByteReader<'_>, ctx: &DecodeContext) -> Result<Map<String, Value>> {
    let mut condition = Map::new();
    match kind {
        0x00 => {
            set(&mut condition, "type", ctx.present(&CONDITION_TYPE, kind));
        }
        0x01 => {
            set(&mut condition, "type", ctx.present(&CONDITION_TYPE, kind));
            set(&mut condition, "start_time", r.u32_le()?);
            set(&mut condition, "end_time", r.u32_le()?);
            set(&mut condition, "repeat_enabled", ctx.present(&ENABLE, r.u8()?));
            let repeat_type = r.u8()?;
            set(&mut condition, "repeat_type", ctx.present(&REPEAT_TYPE, repeat_type));
            let repeat_value = r.u16_le()?;
            if repeat_type == REPEAT_WEEKLY {
                let mut days = Map::new();
                for (bit, day) in WEEKDAYS.iter().enumerate() {
                    set(&mut days, *day, ctx.present(&ENABLE, (repeat_value >> bit) & 0x01));
                }
                set(&mut condition, "repeat_time", Value::Object(days));
            } else {
                set(&mut condition, "repeat_step", repeat_value);
            }
        }
        0x02 => {
            set(&mut condition, "type", ctx.present(&CONDITION_TYPE, kind));
            set(&mut condition, "d2d_command", reader::d2d_command(r.array()?));
        }
        0x03 => {
            set(&mut condition, "type", ctx.present(&CONDITION_TYPE, kind));
            set(&mut condition, "valve_index", r.u8()?);
            set(&mut condition, "duration_time", r.u16_le()?);
            set(&mut condition, "pulse_threshold", r.u32_le()?);
        }
        0x04 => {
            set(&mut condition, "type", ctx.present(&CONDITION_TYPE, kind));
            set(&mut condition, "valve_index", r.u8()?);
            set(&mut condition, "pulse_threshold", r.u32_le()?);
        }
        other => {
            tracing::debug!(condition_type = other, "unrecognized rule condition type");
        }
    }
    Ok(condition)
}

fn rule_action(kind: u8, mut r: ByteReader<'_>, ctx: &DecodeContext) -> Result<Map<String, Value>> {
    let mut action = Map::new();
    match kind {
        0x00 => {
            set(&mut action, "type", "none");
        }
        0x01 | 0x02 => {
            set(&mut action, "type", "valve_action");
            set(&mut action, "valve_index", r.u8()?);
            set(&mut action, "valve_status", ctx.present(&VALVE_STATUS, r.u8()?));
            set(&mut action, "time_enabled", ctx.present(&ENABLE, r.u8()?));
            set(&mut action, "duration_time", r.u32_le()?);
            set(&mut action, "pulse_enabled", ctx.present(&ENABLE, r.u8()?));
            set(&mut action, "pulse_threshold", r.u32_le()?);
        }
        0x03 => match r.u8()? {
            sub @ (0x01 | 0x02) => {
                set(&mut action, "type", "device_status_report");
                set(&mut action, "valve_index", sub);
            }
            0x03 => {
                set(&mut action, "type", "custom_message_report");
                set(&mut action, "text", reader::ascii_skip_nul(r.take(8)?));
            }
            other => {
                tracing::debug!(report_type = other, "unrecognized rule report type");
            }
        },
        other => {
            tracing::debug!(action_type = other, "unrecognized rule action type");
        }
    }
    Ok(action)
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
