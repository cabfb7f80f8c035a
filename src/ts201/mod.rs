//! TS201 (v2) temperature and humidity sensor (uplink only).

mod decoder;
mod response;

pub use decoder::Ts201Decoder;
