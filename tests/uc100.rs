use milesight_codec::{CodecConfig, CodecError, Record, Uc100Decoder, ValueMode};
use serde_json::{json, Value};

fn decode_with(config: CodecConfig, payload: &str) -> Result<Record, CodecError> {
    let bytes = hex::decode(payload).expect("test payload is hex");
    Uc100Decoder::new(config).decode(&bytes)
}

fn named(payload: &str) -> Result<Record, CodecError> {
    decode_with(CodecConfig::new(ValueMode::Named), payload)
}

#[test]
fn signed_register_and_float_values() {
    let rec = named(concat!(
        "ff19", "00", "02", "82", "f6ff",     // chn 1, signed 16-bit
        "ff19", "01", "04", "05", "c3f54840", // chn 2, float
    ))
    .unwrap();
    assert_eq!(
        Value::Object(rec),
        json!({ "modbus_chn_1": -10, "modbus_chn_2": 3.14 })
    );
}

#[test]
fn coil_value_follows_mode() {
    let payload = "ff1902010001";
    assert_eq!(named(payload).unwrap().get("modbus_chn_3"), Some(&json!("on")));
    let raw = decode_with(CodecConfig::new(ValueMode::Raw), payload).unwrap();
    assert_eq!(raw.get("modbus_chn_3"), Some(&json!(1)));
}

#[test]
fn read_error_and_threshold_alarm() {
    let rec = named(concat!("ff15", "02", "ffee", "41", "01", "00", "01")).unwrap();
    assert_eq!(
        Value::Object(rec),
        json!({
            "modbus_chn_3_alarm": "read error",
            "modbus_chn_2_alarm": "threshold alarm",
            "modbus_chn_2": "on",
        })
    );
}

#[test]
fn mutation_alarm_carries_the_change() {
    let rec = named(concat!("f95f", "c0", "0000", "00002040")).unwrap();
    assert_eq!(
        Value::Object(rec),
        json!({ "modbus_chn_1_alarm": "mutation alarm", "modbus_chn_1_mutation": 2.5 })
    );

    // Other alarm kinds on this tag still consume the 7-byte body.
    let rec = named(concat!("f95f", "40", "0000", "00002040", "ff1500")).unwrap();
    assert_eq!(Value::Object(rec), json!({ "modbus_chn_1_alarm": "read error" }));
}

#[test]
fn history_entries_in_wire_order() {
    let rec = named(concat!(
        "20ce", "00f15365", "00", "22", "2c010000", // 16-bit register, read ok
        "20ce", "2cf25365", "01", "20", "00000000", // read failed
        "20cd", "58f35365", "05", "68656c6c6f",
    ))
    .unwrap();
    assert_eq!(
        rec.get("history"),
        Some(&json!([
            { "timestamp": 1700000000u32, "modbus_chn_1": 300 },
            { "timestamp": 1700000300u32, "modbus_chn_2_alarm": "read error" },
            { "timestamp": 1700000600u32, "custom_message": "hello" },
        ]))
    );
}

#[test]
fn unknown_tag_stops_without_fallback() {
    let rec = named(concat!("ff15", "00", "6869")).unwrap();
    assert_eq!(Value::Object(rec), json!({ "modbus_chn_1_alarm": "read error" }));
}

#[test]
fn fallback_turns_the_tail_into_a_message() {
    let config = CodecConfig::new(ValueMode::Named).with_custom_message_fallback(true);
    let rec = decode_with(config, concat!("ff15", "00", "6869")).unwrap();
    assert_eq!(
        Value::Object(rec),
        json!({ "modbus_chn_1_alarm": "read error", "custom_message": "hi" })
    );
}

#[test]
fn truncated_history_entry_is_an_error() {
    let err = named(concat!("20ce", "00f15365", "00", "22", "2c01")).unwrap_err();
    assert!(err.is_truncated(), "unexpected error {:?}", err);
}
