//! UC51x solenoid valve controllers.

mod decoder;
mod encoder;

pub use decoder::Uc51xDecoder;
pub use encoder::Uc51xEncoder;
