use crate::command::{encode, hex_bytes, setting, trigger, CommandField, Field};
use crate::config::CodecConfig;
use crate::dispatch::Record;
use crate::error::Result;
use crate::product::{DownlinkEncoder, Product};
use crate::value_map::{ValueMap, ENABLE};
use crate::writer::BufferWriter;

const SYNC_TIME_TYPE: ValueMap = ValueMap::new(&[(1, "v1.0.2"), (2, "v1.0.3"), (3, "v1.1.0")]);
const PULSE_FILTER_MODE: ValueMap = ValueMap::new(&[(1, "hardware"), (2, "software")]);

/// Downlink encoder for the UC51x solenoid valve controllers.
#[derive(Debug, Clone, Default)]
pub struct Uc51xEncoder {
    config: CodecConfig,
}

impl Uc51xEncoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn encode(&self, command: &Record) -> Result<Vec<u8>> {
        encode(COMMANDS, command, self.config.value_mode)
    }
}

impl DownlinkEncoder for Uc51xEncoder {
    fn product(&self) -> Product {
        Product::Uc51x
    }

    fn encode(&self, command: &Record) -> Result<Vec<u8>> {
        Uc51xEncoder::encode(self, command)
    }
}

pub(crate) const COMMANDS: &[CommandField] = &[
    CommandField::new("reboot", reboot),
    CommandField::new("report_status", report_status),
    CommandField::new("sync_time", sync_time),
    CommandField::new("collection_interval", collection_interval),
    CommandField::new("report_interval", report_interval),
    CommandField::new("clear_history_data", clear_history_data),
    CommandField::new("history_enable", history_enable),
    CommandField::new("retransmit_enable", retransmit_enable),
    CommandField::indexed("retransmit_interval", 0, retransmit_interval),
    CommandField::indexed("resend_interval", 1, retransmit_interval),
    CommandField::new("timezone", timezone),
    CommandField::new("sync_time_type", sync_time_type),
    CommandField::new("d2d_key", d2d_key),
    CommandField::new("d2d_enable", d2d_enable),
    CommandField::new("response_enable", response_enable),
    CommandField::new("class_a_response_time", class_a_response_time),
    CommandField::series("valve_", "_pulse", 1, 2, valve_pulse),
    CommandField::new("pulse_filter_config", pulse_filter_config),
    CommandField::new("gpio_jitter_time", gpio_jitter_time),
    CommandField::new("valve_power_supply_config", valve_power_supply_config),
    CommandField::new("pressure_calibration", pressure_calibration),
];

fn reboot(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x10, 0xff])
}

fn report_status(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x28, 0xff])
}

fn sync_time(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x4a, 0x00])
}

fn collection_interval(field: &Field<'_>) -> Result<Vec<u8>> {
    let interval = field.u16_in(10, 64800)?;
    let mut w = BufferWriter::with_capacity(4);
    w.u8(0xff).u8(0x02).u16_le(interval);
    Ok(w.into_bytes())
}

fn report_interval(field: &Field<'_>) -> Result<Vec<u8>> {
    let interval = field.u16_in(10, 64800)?;
    let mut w = BufferWriter::with_capacity(4);
    w.u8(0xff).u8(0x03).u16_le(interval);
    Ok(w.into_bytes())
}

fn clear_history_data(field: &Field<'_>) -> Result<Vec<u8>> {
    trigger(field, &[0xff, 0x27, 0xff])
}

fn history_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x68], &ENABLE)
}

fn retransmit_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x69], &ENABLE)
}

/// Shared by retransmit (sub-command 0) and resend (sub-command 1).
fn retransmit_interval(field: &Field<'_>) -> Result<Vec<u8>> {
    let interval = field.u16_in(30, 1200)?;
    let mut w = BufferWriter::with_capacity(5);
    w.u8(0xff).u8(0x6a).u8(field.index()).u16_le(interval);
    Ok(w.into_bytes())
}

/// Hours, half-hour offsets allowed; sent as tenths of an hour.
fn timezone(field: &Field<'_>) -> Result<Vec<u8>> {
    let tz = field.number().ok().filter(|tz| (-12.0..=14.0).contains(tz));
    let tz = tz.ok_or_else(|| field.invalid("a number in range [-12, 14]"))?;
    let mut w = BufferWriter::with_capacity(4);
    w.u8(0xff).u8(0x17).i16_le((tz * 10.0).round() as i16);
    Ok(w.into_bytes())
}

fn sync_time_type(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x3b], &SYNC_TIME_TYPE)
}

fn d2d_key(field: &Field<'_>) -> Result<Vec<u8>> {
    let key = hex_bytes(field, 16, true)?;
    let mut w = BufferWriter::with_capacity(10);
    w.u8(0xff).u8(0x35).bytes(&key);
    Ok(w.into_bytes())
}

fn d2d_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0x84], &ENABLE)
}

fn response_enable(field: &Field<'_>) -> Result<Vec<u8>> {
    setting(field, &[0xff, 0xf3], &ENABLE)
}

fn class_a_response_time(field: &Field<'_>) -> Result<Vec<u8>> {
    let seconds = field.u32_in(0, 64800)?;
    let mut w = BufferWriter::with_capacity(6);
    w.u8(0xff).u8(0x1e).u32_le(seconds);
    Ok(w.into_bytes())
}

fn valve_pulse(field: &Field<'_>) -> Result<Vec<u8>> {
    let pulse = field.u32()?;
    let mut w = BufferWriter::with_capacity(7);
    w.u8(0xff).u8(0x92).u8(field.index()).u32_le(pulse);
    Ok(w.into_bytes())
}

fn pulse_filter_config(field: &Field<'_>) -> Result<Vec<u8>> {
    let mode = field.require("mode")?.code(&PULSE_FILTER_MODE)?;
    let time = field.require("time")?.u16()?;
    let mut w = BufferWriter::with_capacity(6);
    w.u8(0xff).u8(0x52).u8(0x00).u8(mode).u16_le(time);
    Ok(w.into_bytes())
}

fn gpio_jitter_time(field: &Field<'_>) -> Result<Vec<u8>> {
    Ok(vec![0xff, 0x46, field.u8()?])
}

fn valve_power_supply_config(field: &Field<'_>) -> Result<Vec<u8>> {
    let counts = field.require("counts")?.int_in(1, 5)? as u8;
    let control_pulse_time = field.require("control_pulse_time")?.u16_in(20, 1000)?;
    let power_time = field.require("power_time")?.u16_in(500, 10000)?;
    let mut w = BufferWriter::with_capacity(7);
    w.u8(0xff)
        .u8(0x4f)
        .u8(counts)
        .u16_le(control_pulse_time)
        .u16_le(power_time);
    Ok(w.into_bytes())
}

fn pressure_calibration(field: &Field<'_>) -> Result<Vec<u8>> {
    let enable = field.require("enable")?.code(&ENABLE)?;
    let value = field.require("calibration_value")?.i16()?;
    let mut w = BufferWriter::with_capacity(5);
    w.u8(0xff).u8(0xab).u8(enable).i16_le(value);
    Ok(w.into_bytes())
}
