//! AM300 series (v2) indoor ambience monitors.
//!
//! The AM307 uplink decoder and the downlink encoder shared by the
//! AM307/AM308/AM319.

mod decoder;
mod encoder;

pub use decoder::Am307Decoder;
pub use encoder::Am300Encoder;
