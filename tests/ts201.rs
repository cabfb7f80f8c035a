use milesight_codec::{CodecConfig, CodecError, Product, Record, Ts201Decoder, ValueMode};
use serde_json::{json, Value};

fn decode_in(mode: ValueMode, payload: &str) -> Result<Record, CodecError> {
    let bytes = hex::decode(payload).expect("test payload is hex");
    Ts201Decoder::new(CodecConfig::new(mode)).decode(&bytes)
}

fn named(payload: &str) -> Result<Record, CodecError> {
    decode_in(ValueMode::Named, payload)
}

#[test]
fn periodic_report() {
    let rec = named(concat!("017564", "03670f01", "046850")).unwrap();
    assert_eq!(
        Value::Object(rec),
        json!({ "battery": 100, "temperature": 27.1, "humidity": 40.0 })
    );
}

#[test]
fn sensor_id_is_prefixed_by_probe_index() {
    let rec = named(concat!("ffa0", "12", "6749d38b2117000a")).unwrap();
    assert_eq!(
        Value::Object(rec),
        json!({ "sensor_1_type": "SHT4X", "sensor_1_sn": "6749d38b2117000a" })
    );

    let raw = decode_in(ValueMode::Raw, concat!("ffa0", "01", "0000000000000001")).unwrap();
    assert_eq!(raw.get("sensor_0_type"), Some(&json!(1)));
}

#[test]
fn alarms_append_events_and_refresh_readings() {
    let rec = named(concat!(
        "8367", "2c01", "01",         // temperature threshold
        "9367", "2c01", "3200", "02", // temperature mutation
        "8468", "50", "00",           // humidity threshold release
        "b367", "00",                 // probe read error
    ))
    .unwrap();
    assert_eq!(rec.get("temperature"), Some(&json!(30.0)));
    assert_eq!(rec.get("humidity"), Some(&json!(40.0)));
    assert_eq!(
        rec.get("event"),
        Some(&json!([
            { "temperature": 30.0, "temperature_alarm": "threshold alarm" },
            { "temperature": 30.0, "temperature_mutation": 5.0, "temperature_alarm": "mutation alarm" },
            { "humidity": 40.0, "humidity_alarm": "threshold alarm release" },
            { "temperature_sensor_status": "read error" },
        ]))
    );
}

#[test]
fn history_humidity_only_for_sht4x() {
    let rec = named(concat!(
        "20ce", "00f15365", "02", "fa00", "50", "01",
        "20ce", "2cf25365", "01", "9cff", "00", "42",
    ))
    .unwrap();
    assert_eq!(
        rec.get("history"),
        Some(&json!([
            {
                "timestamp": 1700000000u32,
                "sensor_type": "SHT4X",
                "event": {
                    "event_type": "periodic",
                    "humidity_sensor_status": "normal",
                    "temperature_sensor_status": "normal",
                },
                "temperature": 25.0,
                "humidity": 40.0,
            },
            {
                "timestamp": 1700000300u32,
                "sensor_type": "DS18B20",
                "event": {
                    "event_type": "temperature alarm (threshold or mutation)",
                    "temperature_sensor_status": "read error",
                },
                "temperature": -10.0,
            },
        ]))
    );
}

#[test]
fn downlink_echoes() {
    let rec = named(concat!(
        "fe02", "3c00",
        "fe8e", "00", "0a00",
        "feea", "81", "0a00",
        "feea", "80", "ecff",
        "fef5", "01",
    ))
    .unwrap();
    assert_eq!(
        Value::Object(rec),
        json!({
            "collection_interval": 60,
            "report_interval": 10,
            "humidity_calibrate": { "enable": "enable", "calibration_value": 5.0 },
            "temperature_calibrate": { "enable": "enable", "calibration_value": -2.0 },
            "threshold_alarm_enable": "enable",
        })
    );
}

#[test]
fn unknown_echo_type_stops_decoding() {
    let rec = named(concat!("fe02", "3c00", "fe77", "017564")).unwrap();
    assert_eq!(Value::Object(rec), json!({ "collection_interval": 60 }));
}

#[test]
fn extended_echo_reports_value_or_result() {
    let rec = named(concat!(
        "f80b", "01", "02", "2c01", "6400", "01", "00",
        "f80d", "01", "3c00", "01",
        "f80e", "2c01", "00",
        "f863", "01", "00", "0300", "00",
        "f869", "02", "00",
    ))
    .unwrap();
    assert_eq!(
        Value::Object(rec),
        json!({
            "temperature_threshold_config": {
                "condition": "above",
                "max": 30.0,
                "min": 10.0,
                "enable": "enable",
            },
            "retransmit_config_result": "forbidden",
            "resend_interval": 300,
            "uplink_config": {
                "d2d_uplink_enable": "enable",
                "lora_uplink_enable": "disable",
                "sensor_data_config": { "temperature": "enable", "humidity": "enable" },
            },
            "button_lock_config": { "power": "disable", "report": "enable" },
        })
    );
}

#[test]
fn failed_threshold_echo_drops_the_value() {
    let rec = named(concat!("f80b", "03", "01", "c800", "6400", "01", "02")).unwrap();
    assert_eq!(
        Value::Object(rec),
        json!({ "threshold_config_result": "invalid parameter" })
    );
}

#[test]
fn unknown_extended_echo_is_recorded_and_stops() {
    let rec = named(concat!("f899", "017564")).unwrap();
    assert_eq!(Value::Object(rec), json!({ "unknown_downlink_response": "unknown" }));

    let raw = decode_in(ValueMode::Raw, "f899").unwrap();
    assert_eq!(raw.get("unknown_downlink_response"), Some(&json!(0x99)));
}

#[test]
fn no_downlink_encoder() {
    assert!(Product::Ts201.encoder(CodecConfig::default()).is_none());
    assert_eq!(CodecConfig::for_product(Product::Ts201).value_mode, ValueMode::Named);
}
