//! UC100 Modbus to LoRaWAN converter (uplink only).

mod decoder;

pub use decoder::Uc100Decoder;
