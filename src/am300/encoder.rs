use crate::command::{bitfield, encode, setting, trigger, CommandField, Field};
use crate::config::CodecConfig;
use crate::dispatch::Record;
use crate::error::Result;
use crate::product::{DownlinkEncoder, Product};
use crate::value_map::{ValueMap, ENABLE, YES_NO};
use crate::writer::BufferWriter;

const TIME_SYNC: ValueMap = ValueMap::new(&[(0, "disable"), (2, "enable")]);
const TVOC_UNIT: ValueMap = ValueMap::new(&[(0, "iaq"), (1, "ug/m3")]);
const CO2_CALIBRATION_MODE: ValueMap = ValueMap::new(&[
    (0, "factory"),
    (1, "abc"),
    (2, "manual"),
    (3, "background"),
    (4, "zero"),
]);
const CO2_CALIBRATION_MANUAL: u8 = 2;
const LED_INDICATOR_MODE: ValueMap = ValueMap::new(&[(0, "off"), (1, "on"), (2, "blink")]);

const SCREEN_ELEMENTS: &[(&str, u32)] = &[
    ("temperature", 0),
    ("humidity", 1),
    ("co2", 2),
    ("light", 3),
    ("tvoc", 4),
    ("smile", 5),
    ("letter", 6),
    ("pm2_5", 7),
    ("pm10", 8),
    ("hcho", 9),
    ("o3", 10),
];
const CHILD_LOCK_BUTTONS: &[(&str, u32)] = &[("off_button", 0), ("on_button", 1), ("collection_button", 2)];

/// Downlink encoder for the AM300 family (AM307/AM308/AM319 v2).
#[derive(Debug, Clone, Default)]
pub struct Am300Encoder {
    config: CodecConfig,
}

impl Am300Encoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn encode(&self, command: &Record) -> Result<Vec<u8>> {
        encode(COMMANDS, command, self.config.value_mode)
    }
}

impl DownlinkEncoder for Am300Encoder {
    fn product(&self) -> Product {
        Product::Am300
    }

    fn encode(&self, command: &Record) -> Result<Vec<u8>> {
        Am300Encoder::encode(self, command)
    }
}

pub(crate) const COMMANDS: &[CommandField] = &[
    CommandField::new("reboot", reboot),
    CommandField::new("stop_buzzer", stop_buzzer),
    CommandField::new("query_status", query_status),
    CommandField::new("report_interval", report_interval),
    CommandField::new("time_sync_enable", time_sync_enable),
    CommandField::new("timezone", timezone),
    CommandField::new("tvoc_unit", tvoc_unit),
    CommandField::new("pm2_5_collection_interval", pm2_5_collection_interval),
    CommandField::new("co2_abc_calibration_enable", co2_abc_calibration_enable),
    CommandField::new("co2_calibration_enable", co2_calibration_enable),
    CommandField::new("co2_calibration_settings", co2_calibration_settings),
    CommandField::new("buzzer_enable", buzzer_enable),
    CommandField::new("led_indicator_mode", led_indicator_mode),
    CommandField::new("screen_display_enable", screen_display_enable),
    CommandField::new("screen_display_alarm_enable", screen_display_alarm_enable),
    CommandField::new("screen_display_pattern", screen_display_pattern),
    CommandField::new("screen_display_element_settings", screen_display_element_settings),
    CommandField::new("child_lock_settings", child_lock_settings),
];

fn reboot(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x10, 0xff])
}

fn stop_buzzer(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x3d, 0xff])
}

fn query_status(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x2c, 0xff])
}

/// Seconds.
fn report_interval(field: &Field<'_>) -> Result<Vec<u8>> {
    let interval = field.u16_in(10, 64800)?;
    let mut w = BufferWriter::with_capacity(4);
    w.u8(0xff).u8(0x3a).u16_le(interval);
    Ok(w.into_bytes())
}

fn time_sync_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x3b], &TIME_SYNC)
}

/// Tenths of an hour, UTC+8 -> 80.
fn timezone(field: &Field<'_>) -> Result<Vec<u8>> {
    let tz = field.i16()?;
    let mut w = BufferWriter::with_capacity(4);
    w.u8(0xff).u8(0x17).i16_le(tz);
    Ok(w.into_bytes())
}

fn tvoc_unit(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x2f], &TVOC_UNIT)
}

/// AM308 only.
fn pm2_5_collection_interval(field: &Field<'_>) -> Result<Vec<u8>> {
    let interval = field.u16()?;
    let mut w = BufferWriter::with_capacity(4);
    w.u8(0xff).u8(0x65).u16_le(interval);
    Ok(w.into_bytes())
}

/// AM319 only.
fn co2_abc_calibration_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x39], &YES_NO)
}

fn co2_calibration_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0xf4], &YES_NO)
}

/// Manual mode carries a target value, every other mode is mode-only.
fn co2_calibration_settings(field: &Field<'_>) -> Result<Vec<u8>> {
    let mode = field.require("mode")?.code(&CO2_CALIBRATION_MODE)?;
    if mode == CO2_CALIBRATION_MANUAL {
        let value = field.require("value")?.i16()?;
        let mut w = BufferWriter::with_capacity(5);
        w.u8(0xff).u8(0x1a).u8(mode).i16_le(value);
        Ok(w.into_bytes())
    } else {
        Ok(vec![0xff, 0x1a, mode])
    }
}

fn buzzer_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x3e], &ENABLE)
}

fn led_indicator_mode(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x2e], &LED_INDICATOR_MODE)
}

fn screen_display_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x2d], &ENABLE)
}

fn screen_display_alarm_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x66], &ENABLE)
}

fn screen_display_pattern(field: &Field<'_>) -> Result<Vec<u8>> {
    let pattern = field.one_of(&[1, 2, 3])?;
    Ok(vec![0xff, 0x3c, pattern as u8])
}

// Only the low byte of the element mask fits the frame.
fn screen_display_element_settings(field: &Field<'_>) -> Result<Vec<u8>> {
    let data = bitfield(field, SCREEN_ELEMENTS, &ENABLE)?;
    Ok(vec![0xff, 0xf0, (data & 0xff) as u8])
}

fn child_lock_settings(field: &Field<'_>) -> Result<Vec<u8>> {
    let data = bitfield(field, CHILD_LOCK_BUTTONS, &ENABLE)?;
    Ok(vec![0xff, 0x25, data as u8])
}
