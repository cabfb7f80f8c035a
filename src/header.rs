//! Device information tags (`0xff` channel) that every product reports with
//! the same layout.

use crate::dispatch::{set, DecodeContext, Flow, Record};
use crate::error::Result;
use crate::reader::{self, ByteReader};
use crate::value_map::{LORAWAN_CLASS, ON_OFF, RESET_EVENT};

pub fn ipso_version(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "ipso_version", reader::protocol_version(r.u8()?));
    Ok(Flow::Continue)
}

pub fn hardware_version(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "hardware_version", reader::hardware_version(r.array()?));
    Ok(Flow::Continue)
}

pub fn firmware_version(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "firmware_version", reader::firmware_version(r.array()?));
    Ok(Flow::Continue)
}

pub fn tsl_version(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "tsl_version", reader::tsl_version(r.array()?));
    Ok(Flow::Continue)
}

pub fn serial_number(r: &mut ByteReader<'_>, _ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "sn", reader::serial_hex(r.take(8)?));
    Ok(Flow::Continue)
}

pub fn lorawan_class(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    set(out, "lorawan_class", ctx.present(&LORAWAN_CLASS, r.u8()?));
    Ok(Flow::Continue)
}

/// The tag itself is the event; its payload byte is not interpreted.
pub fn reset_event(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    r.skip(1)?;
    set(out, "reset_event", ctx.present(&RESET_EVENT, 1));
    Ok(Flow::Continue)
}

/// Power-on report: always "on", payload byte ignored.
pub fn device_on(r: &mut ByteReader<'_>, ctx: &DecodeContext, out: &mut Record) -> Result<Flow> {
    r.skip(1)?;
    set(out, "device_status", ctx.present(&ON_OFF, 1));
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{walk, FieldHandler};
    use crate::value_map::ValueMode;
    use serde_json::json;

    const TABLE: &[FieldHandler] = &[
        FieldHandler::exact(0xff, 0x01, "ipso_version", ipso_version),
        FieldHandler::exact(0xff, 0x09, "hardware_version", hardware_version),
        FieldHandler::exact(0xff, 0x0a, "firmware_version", firmware_version),
        FieldHandler::exact(0xff, 0xff, "tsl_version", tsl_version),
        FieldHandler::exact(0xff, 0x16, "sn", serial_number),
        FieldHandler::exact(0xff, 0x0f, "lorawan_class", lorawan_class),
        FieldHandler::exact(0xff, 0xfe, "reset_event", reset_event),
        FieldHandler::exact(0xff, 0x0b, "device_status", device_on),
    ];

    #[test]
    fn power_on_frame_named() {
        let bytes = [
            0xff, 0x0b, 0xff, 0xff, 0x01, 0x01, 0xff, 0x16, 0x67, 0x49, 0xd3, 0x8b, 0x21, 0x17,
            0x00, 0x0a, 0xff, 0x09, 0x01, 0x00, 0xff, 0x0a, 0x01, 0x14, 0xff, 0x0f, 0x00, 0xff,
            0xff, 0x01, 0x01, 0xff, 0xfe, 0x00,
        ];
        let rec = walk(&bytes, TABLE, ValueMode::Named, None).unwrap();
        assert_eq!(
            serde_json::Value::Object(rec),
            json!({
                "device_status": "on",
                "ipso_version": "v0.1",
                "sn": "6749d38b2117000a",
                "hardware_version": "v1.0",
                "firmware_version": "v1.20",
                "lorawan_class": "Class A",
                "tsl_version": "v1.1",
                "reset_event": "reset",
            })
        );
    }

    #[test]
    fn constant_tags_in_raw_mode() {
        let rec = walk(&[0xff, 0xfe, 0x00, 0xff, 0x0b, 0x00], TABLE, ValueMode::Raw, None).unwrap();
        assert_eq!(rec.get("reset_event"), Some(&json!(1)));
        assert_eq!(rec.get("device_status"), Some(&json!(1)));
    }
}
