use crate::command::{bitfield, encode, hex_bytes, setting, trigger, CommandField, Field};
use crate::config::CodecConfig;
use crate::dispatch::Record;
use crate::error::Result;
use crate::product::{DownlinkEncoder, Product};
use crate::value_map::{ValueMap, ENABLE, YES_NO};
use crate::writer::BufferWriter;

/// Condition and action blocks are a type byte plus 12 data bytes.
const RULE_BLOCK_LEN: usize = 13;

const TIMEZONE: ValueMap = ValueMap::new(&[
    (-720, "UTC-12"),
    (-660, "UTC-11"),
    (-600, "UTC-10"),
    (-570, "UTC-9:30"),
    (-540, "UTC-9"),
    (-480, "UTC-8"),
    (-420, "UTC-7"),
    (-360, "UTC-6"),
    (-300, "UTC-5"),
    (-240, "UTC-4"),
    (-210, "UTC-3:30"),
    (-180, "UTC-3"),
    (-120, "UTC-2"),
    (-60, "UTC-1"),
    (0, "UTC"),
    (60, "UTC+1"),
    (120, "UTC+2"),
    (180, "UTC+3"),
    (210, "UTC+3:30"),
    (240, "UTC+4"),
    (270, "UTC+4:30"),
    (300, "UTC+5"),
    (330, "UTC+5:30"),
    (345, "UTC+5:45"),
    (360, "UTC+6"),
    (390, "UTC+6:30"),
    (420, "UTC+7"),
    (480, "UTC+8"),
    (540, "UTC+9"),
    (570, "UTC+9:30"),
    (600, "UTC+10"),
    (630, "UTC+10:30"),
    (660, "UTC+11"),
    (720, "UTC+12"),
    (765, "UTC+12:45"),
    (780, "UTC+13"),
    (840, "UTC+14"),
]);
const VALVE_TYPE: ValueMap = ValueMap::new(&[(0, "2-way ball valve"), (1, "3-way ball valve")]);
const STALL_STRATEGY: ValueMap = ValueMap::new(&[(0, "close"), (1, "keep")]);
const FILTER_MODE: ValueMap = ValueMap::new(&[(0, "hardware"), (1, "software")]);
const CONDITION_TYPE: ValueMap = ValueMap::new(&[
    (0, "none"),
    (1, "time"),
    (2, "d2d"),
    (3, "time or pulse threshold"),
    (4, "pulse threshold"),
    (5, "pressure threshold"),
]);
const REPEAT_MODE: ValueMap = ValueMap::new(&[(0, "monthly"), (1, "daily"), (2, "weekly")]);
const REPEAT_WEEKLY: u8 = 2;
const VALVE_STRATEGY: ValueMap = ValueMap::new(&[
    (0, "always"),
    (1, "valve 1 open"),
    (2, "valve 2 open"),
    (3, "valve 1 open or valve 2 open"),
]);
const THRESHOLD_COMPARISON: ValueMap = ValueMap::new(&[
    (0, "none"),
    (1, "less than"),
    (2, "greater than"),
    (3, "between"),
    (4, "outside"),
]);
const ACTION_TYPE: ValueMap = ValueMap::new(&[
    (0, "none"),
    (1, "em valve control"),
    (2, "valve control"),
    (3, "report"),
]);
const REPORT_TYPE: ValueMap = ValueMap::new(&[
    (0, "valve 1"),
    (1, "valve 2"),
    (2, "custom message"),
    (3, "pressure threshold alarm"),
]);

const WEEKDAYS: &[(&str, u32)] = &[
    ("monday", 0),
    ("tuesday", 1),
    ("wednesday", 2),
    ("thursday", 3),
    ("friday", 4),
    ("saturday", 5),
    ("sunday", 6),
];
const RULES: &[(&str, u32)] = &[
    ("rule_1", 0),
    ("rule_2", 1),
    ("rule_3", 2),
    ("rule_4", 3),
    ("rule_5", 4),
    ("rule_6", 5),
    ("rule_7", 6),
    ("rule_8", 7),
    ("rule_9", 8),
    ("rule_10", 9),
    ("rule_11", 10),
    ("rule_12", 11),
    ("rule_13", 12),
    ("rule_14", 13),
    ("rule_15", 14),
    ("rule_16", 15),
];

/// Downlink encoder for the UC521 smart valve controller.
#[derive(Debug, Clone, Default)]
pub struct Uc521Encoder {
    config: CodecConfig,
}

impl Uc521Encoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn encode(&self, command: &Record) -> Result<Vec<u8>> {
        encode(COMMANDS, command, self.config.value_mode)
    }
}

impl DownlinkEncoder for Uc521Encoder {
    fn product(&self) -> Product {
        Product::Uc521
    }

    fn encode(&self, command: &Record) -> Result<Vec<u8>> {
        Uc521Encoder::encode(self, command)
    }
}

pub(crate) const COMMANDS: &[CommandField] = &[
    CommandField::new("reboot", reboot),
    CommandField::new("report_status", report_status),
    CommandField::new("report_interval", report_interval),
    CommandField::new("collection_interval", collection_interval),
    CommandField::new("timezone", timezone),
    CommandField::series("valve_", "_task", 1, 2, valve_task),
    CommandField::series("valve_", "_pulse", 1, 2, valve_pulse),
    CommandField::series("clear_valve_", "_pulse", 1, 2, clear_valve_pulse),
    CommandField::series("valve_", "_config", 1, 2, valve_config),
    CommandField::new("valve_filter_config", valve_filter_config),
    CommandField::series("pressure_", "_calibration_config", 1, 2, pressure_calibration_config),
    CommandField::indexed("batch_read_rules", 0x00, batch_read_rules),
    CommandField::indexed("batch_enable_rules", 0x01, batch_enable_rules),
    CommandField::indexed("batch_remove_rules", 0x02, batch_remove_rules),
    CommandField::series("rule_", "_enable", 1, 16, rule_enable),
    CommandField::series("rule_", "_remove", 1, 16, rule_remove),
    CommandField::new("rules_config", rules_config),
    CommandField::new("query_rule_config", query_rule_config),
];

fn reboot(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x10, 0xff])
}

fn report_status(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x28, 0xff])
}

/// Minutes.
fn report_interval(field: &Field<'_>) -> Result<Vec<u8>> {
    let interval = field.u16_in(1, 1440)?;
    let mut w = BufferWriter::with_capacity(5);
    w.u8(0xff).u8(0x8e).u8(0x00).u16_le(interval);
    Ok(w.into_bytes())
}

/// One frame per pressure sensor present in the object.
fn collection_interval(field: &Field<'_>) -> Result<Vec<u8>> {
    let mut w = BufferWriter::new();
    for (name, index) in [("pressure_1", 1u8), ("pressure_2", 2u8)] {
        if let Some(sensor) = field.child(name)? {
            let interval = sensor.u16_in(10, 64800)?;
            w.u8(0xff).u8(0xbb).u8(index).u16_le(interval);
        }
    }
    Ok(w.into_bytes())
}

/// Minutes east of UTC, restricted to the offsets the device knows.
fn timezone(field: &Field<'_>) -> Result<Vec<u8>> {
    let minutes = field.code_i64(&TIMEZONE)? as i16;
    let mut w = BufferWriter::with_capacity(4);
    w.u8(0xff).u8(0xbd).i16_le(minutes);
    Ok(w.into_bytes())
}

fn valve_task(field: &Field<'_>) -> Result<Vec<u8>> {
    let task_id = match field.child("task_id")? {
        Some(id) => id.u8()?,
        None => 0,
    };
    let opening = field.require("valve_opening")?.int_in(0, 100)? as u8;
    let time = field.child("time")?.map(|f| f.u16()).transpose()?;
    let pulse = field.child("pulse")?.map(|f| f.u32()).transpose()?;

    let mut flags = field.index() - 1;
    if time.is_some() {
        flags |= 1 << 7;
    }
    if pulse.is_some() {
        flags |= 1 << 6;
    }

    let mut w = BufferWriter::with_capacity(11);
    w.u8(0xf9).u8(0x19).u8(flags).u8(task_id).u8(opening);
    if let Some(time) = time {
        w.u16_le(time);
    }
    if let Some(pulse) = pulse {
        w.u32_le(pulse);
    }
    Ok(w.into_bytes())
}

fn valve_pulse(field: &Field<'_>) -> Result<Vec<u8>> {
    let pulse = field.u32()?;
    let mut w = BufferWriter::with_capacity(7);
    w.u8(0xff).u8(0x92).u8(field.index()).u32_le(pulse);
    Ok(w.into_bytes())
}

fn clear_valve_pulse(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x4e, field.index(), 0x00])
}

fn valve_config(field: &Field<'_>) -> Result<Vec<u8>> {
    let valve_type = field.require("type")?.code(&VALVE_TYPE)?;
    let auto_calibration = field.require("auto_calibration_enable")?.code(&ENABLE)?;
    let report_after_calibration = field.require("report_after_calibration_enable")?.code(&ENABLE)?;
    let stall_strategy = field.require("stall_strategy")?.code(&STALL_STRATEGY)?;

    let flags = ((field.index() - 1) << 7)
        | (valve_type << 6)
        | (auto_calibration << 5)
        | (report_after_calibration << 4)
        | (stall_strategy << 3);

    let mut w = BufferWriter::with_capacity(11);
    w.u8(0xf9)
        .u8(0x1a)
        .u8(flags)
        .u8(field.require("open_time_1")?.u8()?)
        .u8(field.require("open_time_2")?.u8()?)
        .u16_le(field.require("stall_current")?.u16()?)
        .u16_le(field.require("stall_time")?.u16()?)
        .u8(field.require("protect_time")?.u8()?)
        .u8(field.require("delay_time")?.u8()?);
    Ok(w.into_bytes())
}

fn valve_filter_config(field: &Field<'_>) -> Result<Vec<u8>> {
    let mode = field.require("mode")?.code(&FILTER_MODE)?;
    let time = field.require("time")?.u16()?;
    let mut w = BufferWriter::with_capacity(6);
    w.u8(0xff).u8(0x52).u8(0x00).u8(mode).u16_le(time);
    Ok(w.into_bytes())
}

fn pressure_calibration_config(field: &Field<'_>) -> Result<Vec<u8>> {
    let enable = field.require("enable")?.code(&ENABLE)?;
    let calibration = field.require("calibration")?.i16()?;
    let mut w = BufferWriter::with_capacity(6);
    w.u8(0xf9).u8(0x5b).u8(field.index()).u8(enable).i16_le(calibration);
    Ok(w.into_bytes())
}

// `ff 4b <op> u16`, one bit per rule.
fn rule_mask(field: &Field<'_>, map: &ValueMap) -> Result<Vec<u8>> {
    let mask = bitfield(field, RULES, map)? as u16;
    let mut w = BufferWriter::with_capacity(5);
    w.u8(0xff).u8(0x4b).u8(field.index()).u16_le(mask);
    Ok(w.into_bytes())
}

fn batch_read_rules(field: &Field<'_>) -> Result<Vec<u8>> {
    rule_mask(field, &YES_NO)
}

fn batch_enable_rules(field: &Field<'_>) -> Result<Vec<u8>> {
    rule_mask(field, &ENABLE)
}

fn batch_remove_rules(field: &Field<'_>) -> Result<Vec<u8>> {
    rule_mask(field, &YES_NO)
}

fn rule_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    let code = field.code(&YES_NO)?;
    Ok(vec![0xff, 0x4b, 0x03, field.index(), code])
}

fn rule_remove(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x4b, 0x04, field.index(), 0x00])
}

fn rules_config(field: &Field<'_>) -> Result<Vec<u8>> {
    let mut w = BufferWriter::new();
    for (position, value) in field.array()?.iter().enumerate() {
        w.bytes(&rule_config(&field.item(position, value))?);
    }
    Ok(w.into_bytes())
}

/// `ff 55 index enable condition[13] action[13]`.
fn rule_config(rule: &Field<'_>) -> Result<Vec<u8>> {
    let index = rule.require("index")?.int_in(1, 16)? as u8;
    let enable = rule.require("enable")?.code(&ENABLE)?;
    let condition = rule_condition(&rule.require("condition")?)?;
    let action = rule_action(&rule.require("action")?)?;

    let mut w = BufferWriter::with_capacity(4 + 2 * RULE_BLOCK_LEN);
    w.u8(0xff)
        .u8(0x55)
        .u8(index)
        .u8(enable)
        .bytes(&condition)
        .bytes(&action);
    Ok(w.into_bytes())
}

fn rule_condition(condition: &Field<'_>) -> Result<Vec<u8>> {
    let kind = condition.require("type")?.code(&CONDITION_TYPE)?;
    let mut w = BufferWriter::with_capacity(RULE_BLOCK_LEN);
    w.u8(kind);
    match kind {
        0x01 => {
            w.u32_le(condition.require("start_time")?.u32()?)
                .u32_le(condition.require("end_time")?.u32()?)
                .u8(condition.require("repeat_enable")?.code(&ENABLE)?);
            let repeat_mode = condition.require("repeat_mode")?.code(&REPEAT_MODE)?;
            w.u8(repeat_mode);
            if repeat_mode == REPEAT_WEEKLY {
                let days = bitfield(&condition.require("repeat_week")?, WEEKDAYS, &ENABLE)?;
                w.u16_le(days as u16);
            } else {
                w.u16_le(condition.require("repeat_step")?.u16()?);
            }
        }
        0x02 => {
            let code = match condition.child("d2d_command")? {
                Some(command) => {
                    let bytes = hex_bytes(&command, 4, false)?;
                    [bytes[0], bytes[1]]
                }
                None => [0x00, 0x00],
            };
            w.d2d_command(code);
        }
        0x03 => {
            w.u8(valve_index(condition)?)
                .u16_le(condition.require("duration")?.u16()?)
                .u32_le(condition.require("pulse_threshold")?.u32()?);
        }
        0x04 => {
            w.u8(valve_index(condition)?)
                .u32_le(condition.require("pulse_threshold")?.u32()?);
        }
        0x05 => {
            w.u8(valve_index(condition)?)
                .u8(condition.require("valve_strategy")?.code(&VALVE_STRATEGY)?)
                .u8(condition.require("condition_type")?.code(&THRESHOLD_COMPARISON)?)
                .u16_le(condition.require("min_threshold")?.u16()?)
                .u16_le(condition.require("max_threshold")?.u16()?);
        }
        _ => {}
    }
    w.pad_to(RULE_BLOCK_LEN);
    Ok(w.into_bytes())
}

fn rule_action(action: &Field<'_>) -> Result<Vec<u8>> {
    let kind = action.require("type")?.code(&ACTION_TYPE)?;
    let mut w = BufferWriter::with_capacity(RULE_BLOCK_LEN);
    w.u8(kind);
    match kind {
        0x01 | 0x02 => {
            w.u8(valve_index(action)?)
                .u8(action.require("valve_opening")?.int_in(0, 100)? as u8)
                .u8(action.require("time_enable")?.code(&ENABLE)?)
                .u32_le(action.require("duration")?.u32()?)
                .u8(action.require("pulse_enable")?.code(&ENABLE)?)
                .u32_le(action.require("pulse_threshold")?.u32()?);
        }
        0x03 => {
            let report_type = action.require("report_type")?.code(&REPORT_TYPE)?;
            let content = match action.child("report_content")? {
                Some(content) => content.str()?,
                None => "",
            };
            w.u8(report_type)
                .ascii_padded(content, 8)
                .u8(0x00)
                .u8(action.require("report_counts")?.u8()?)
                .u8(action.require("threshold_release_enable")?.code(&ENABLE)?);
        }
        _ => {}
    }
    w.pad_to(RULE_BLOCK_LEN);
    Ok(w.into_bytes())
}

fn valve_index(block: &Field<'_>) -> Result<u8> {
    Ok(block.require("valve_index")?.int_in(1, 2)? as u8)
}

fn query_rule_config(field: &Field<'_>) -> Result<Vec<u8>> {
    let index = field.require("index")?.int_in(1, 16)? as u8;
    Ok(vec![0xff, 0x53, index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_map::ValueMode;
    use serde_json::json;

    fn named(v: serde_json::Value) -> Result<Vec<u8>> {
        let cmd = v.as_object().cloned().unwrap();
        Uc521Encoder::new(CodecConfig::new(ValueMode::Named)).encode(&cmd)
    }

    #[test]
    fn condition_and_action_blocks_are_padded() {
        let out = named(json!({
            "rules_config": [{
                "index": 1,
                "enable": "enable",
                "condition": { "type": "none" },
                "action": { "type": "none" },
            }]
        }))
        .unwrap();
        assert_eq!(out.len(), 30);
        assert_eq!(&out[..4], &[0xff, 0x55, 0x01, 0x01]);
        assert!(out[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn d2d_condition_defaults_to_zero_command() {
        let out = named(json!({
            "rules_config": [{
                "index": 2,
                "enable": "disable",
                "condition": { "type": "d2d" },
                "action": { "type": "none" },
            }]
        }))
        .unwrap();
        assert_eq!(&out[4..7], &[0x02, 0x00, 0x00]);
    }

    #[test]
    fn valve_task_flags_follow_optional_members() {
        let out = named(json!({ "valve_2_task": { "valve_opening": 50, "pulse": 10 } })).unwrap();
        assert_eq!(out, vec![0xf9, 0x19, 0x41, 0x00, 0x32, 0x0a, 0x00, 0x00, 0x00]);
    }
}
