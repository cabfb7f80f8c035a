//! UC521 smart valve controller (downlink only).

mod encoder;

pub use encoder::Uc521Encoder;
