//! Payload codecs for Milesight LoRaWAN devices.
//!
//! Uplink decoders turn the device's tag/value byte stream into a JSON-like
//! record; downlink encoders validate a command object and produce the
//! device's configuration frames.

pub mod adapter;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod header;
pub mod product;
pub mod reader;
pub mod value_map;
pub mod writer;

pub mod am300;
pub mod ts201;
pub mod uc100;
pub mod uc51x;
pub mod uc521;

pub use am300::{Am300Encoder, Am307Decoder};
pub use config::{CodecConfig, ConfigFile};
pub use dispatch::Record;
pub use error::CodecError;
pub use product::{DownlinkEncoder, Product, UplinkDecoder};
pub use ts201::Ts201Decoder;
pub use uc100::Uc100Decoder;
pub use uc51x::{Uc51xDecoder, Uc51xEncoder};
pub use uc521::Uc521Encoder;
pub use value_map::ValueMode;
