use milesight_codec::{Am300Encoder, Am307Decoder, CodecConfig, CodecError, Record, ValueMode};
use serde_json::{json, Value};

fn decode(mode: ValueMode, payload: &str) -> Result<Record, CodecError> {
    let bytes = hex::decode(payload).expect("test payload is hex");
    Am307Decoder::new(CodecConfig::new(mode)).decode(&bytes)
}

fn encode(mode: ValueMode, command: Value) -> Result<Vec<u8>, CodecError> {
    let command = command.as_object().cloned().expect("command is an object");
    Am300Encoder::new(CodecConfig::new(mode)).encode(&command)
}

#[test]
fn single_temperature_tag_is_scaled() {
    let rec = decode(ValueMode::Raw, "03670a00").unwrap();
    assert_eq!(Value::Object(rec), json!({ "temperature": 1.0 }));
}

#[test]
fn periodic_report_raw_and_named() {
    let payload = concat!(
        "01755c",   // battery
        "03670a01", // temperature
        "046879",   // humidity
        "050001",   // pir
        "06cb02",   // light level
        "077d5104", // co2
        "087d1900", // tvoc (iaq)
        "09737c27", // pressure
        "0e0100",   // buzzer
    );

    let raw = decode(ValueMode::Raw, payload).unwrap();
    assert_eq!(
        Value::Object(raw),
        json!({
            "battery": 92,
            "temperature": 26.6,
            "humidity": 60.5,
            "pir": 1,
            "light_level": 2,
            "co2": 1105,
            "tvoc": 0.25,
            "pressure": 1010.8,
            "buzzer_status": 0,
        })
    );

    let named = decode(ValueMode::Named, payload).unwrap();
    assert_eq!(named.get("pir"), Some(&json!("trigger")));
    assert_eq!(named.get("buzzer_status"), Some(&json!("off")));
}

#[test]
fn tvoc_unit_depends_on_channel_type() {
    let rec = decode(ValueMode::Raw, "08e67800").unwrap();
    assert_eq!(rec.get("tvoc"), Some(&json!(120)));
}

#[test]
fn device_status_uses_offline_online_labels() {
    let rec = decode(ValueMode::Named, "ff0b00").unwrap();
    assert_eq!(rec.get("device_status"), Some(&json!("offline")));
}

#[test]
fn history_records_append_in_wire_order() {
    let payload = concat!(
        "20ce", "00f15365", "fa00", "6400", "00", "03", "f401", "6400", "7427",
        "21ce", "2cf25365", "9cff", "5000", "01", "00", "5802", "7800", "1027",
    );
    let rec = decode(ValueMode::Raw, payload).unwrap();
    assert_eq!(
        rec.get("history"),
        Some(&json!([
            {
                "timestamp": 1700000000u32,
                "temperature": 25.0,
                "humidity": 50.0,
                "pir": 0,
                "light_level": 3,
                "co2": 500,
                "tvoc": 1.0,
                "pressure": 1010.0,
            },
            {
                "timestamp": 1700000300u32,
                "temperature": -10.0,
                "humidity": 40.0,
                "pir": 1,
                "light_level": 0,
                "co2": 600,
                "tvoc": 120,
                "pressure": 1000.0,
            },
        ]))
    );
}

#[test]
fn unknown_leading_tag_yields_empty_record() {
    for garbage in ["9999", "99990102030405", "0202ffff"] {
        let rec = decode(ValueMode::Raw, garbage).unwrap();
        assert!(rec.is_empty(), "payload {} decoded to {:?}", garbage, rec);
    }
}

#[test]
fn decoding_stops_at_first_unknown_tag() {
    let rec = decode(ValueMode::Raw, "017564aabb0367").unwrap();
    assert_eq!(Value::Object(rec), json!({ "battery": 100 }));
}

#[test]
fn truncated_field_is_an_error() {
    let err = decode(ValueMode::Raw, "03670a").unwrap_err();
    assert!(err.is_truncated(), "unexpected error {:?}", err);
    assert_eq!(
        err,
        CodecError::TruncatedInput {
            offset: 2,
            needed: 2,
            available: 1
        }
    );
}

#[test]
fn lone_trailing_byte_is_truncated() {
    let err = decode(ValueMode::Raw, "01756403").unwrap_err();
    assert!(err.is_truncated(), "unexpected error {:?}", err);
}

#[test]
fn reboot_sentinel() {
    assert!(encode(ValueMode::Raw, json!({ "reboot": 0 })).unwrap().is_empty());
    assert_eq!(encode(ValueMode::Raw, json!({ "reboot": 1 })).unwrap(), vec![0xff, 0x10, 0xff]);
    assert_eq!(encode(ValueMode::Named, json!({ "reboot": "yes" })).unwrap(), vec![0xff, 0x10, 0xff]);
}

#[test]
fn report_interval_out_of_range_names_the_field() {
    let err = encode(ValueMode::Raw, json!({ "report_interval": 5 })).unwrap_err();
    assert_eq!(err.field(), Some("report_interval"));
    assert_eq!(err.to_string(), "report_interval must be an integer in range [10, 64800]");

    let ok = encode(ValueMode::Raw, json!({ "report_interval": 600 })).unwrap();
    assert_eq!(ok, vec![0xff, 0x3a, 0x58, 0x02]);
}

#[test]
fn screen_element_bitfield_sets_only_present_members() {
    let out = encode(
        ValueMode::Raw,
        json!({ "screen_display_element_settings": { "temperature": 1, "humidity": 1 } }),
    )
    .unwrap();
    assert_eq!(out, vec![0xff, 0xf0, 0x03]);

    let out = encode(
        ValueMode::Named,
        json!({ "screen_display_element_settings": { "co2": "enable", "tvoc": "disable" } }),
    )
    .unwrap();
    assert_eq!(out, vec![0xff, 0xf0, 0x04]);
}

#[test]
fn manual_co2_calibration_requires_a_value() {
    let out = encode(ValueMode::Raw, json!({ "co2_calibration_settings": { "mode": 2, "value": 400 } })).unwrap();
    assert_eq!(out, vec![0xff, 0x1a, 0x02, 0x90, 0x01]);

    let out = encode(ValueMode::Named, json!({ "co2_calibration_settings": { "mode": "abc" } })).unwrap();
    assert_eq!(out, vec![0xff, 0x1a, 0x01]);

    let err = encode(ValueMode::Raw, json!({ "co2_calibration_settings": { "mode": 2 } })).unwrap_err();
    assert_eq!(err.to_string(), "co2_calibration_settings.value must be present");
}

#[test]
fn named_mode_rejects_codes_and_lists_labels() {
    let err = encode(ValueMode::Named, json!({ "time_sync_enable": 2 })).unwrap_err();
    assert_eq!(err.to_string(), "time_sync_enable must be one of disable, enable");

    let out = encode(ValueMode::Named, json!({ "time_sync_enable": "enable" })).unwrap();
    assert_eq!(out, vec![0xff, 0x3b, 0x02]);
}

#[test]
fn commands_follow_declaration_order() {
    let out = encode(
        ValueMode::Raw,
        json!({
            "child_lock_settings": { "off_button": 1, "collection_button": 1 },
            "timezone": -40,
            "reboot": 1,
        }),
    )
    .unwrap();
    assert_eq!(out, vec![0xff, 0x10, 0xff, 0xff, 0x17, 0xd8, 0xff, 0xff, 0x25, 0x05]);
}

#[test]
fn first_invalid_field_discards_everything() {
    let err = encode(ValueMode::Raw, json!({ "reboot": 1, "screen_display_pattern": 4 })).unwrap_err();
    assert_eq!(err.field(), Some("screen_display_pattern"));
    assert_eq!(err.to_string(), "screen_display_pattern must be one of 1, 2, 3");
}
