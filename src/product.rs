//! Product registry and the decoder/encoder seams.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::am300::{Am300Encoder, Am307Decoder};
use crate::config::CodecConfig;
use crate::dispatch::Record;
use crate::error::Result;
use crate::ts201::Ts201Decoder;
use crate::uc100::Uc100Decoder;
use crate::uc51x::{Uc51xDecoder, Uc51xEncoder};
use crate::uc521::Uc521Encoder;
use crate::value_map::ValueMode;

/// Turns one uplink payload into a result record.
pub trait UplinkDecoder: Send + Sync {
    fn product(&self) -> Product;
    fn decode(&self, bytes: &[u8]) -> Result<Record>;
}

/// Turns one command object into downlink bytes.
pub trait DownlinkEncoder: Send + Sync {
    fn product(&self) -> Product;
    fn encode(&self, command: &Record) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    /// AM307 / AM308 / AM319 (v2)
    #[value(name = "am300")]
    Am300,
    #[value(name = "uc51x")]
    Uc51x,
    #[value(name = "uc521")]
    Uc521,
    #[value(name = "uc100")]
    Uc100,
    #[value(name = "ts201")]
    Ts201,
}

impl Product {
    pub const ALL: [Product; 5] = [
        Product::Am300,
        Product::Uc51x,
        Product::Uc521,
        Product::Uc100,
        Product::Ts201,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Product::Am300 => "am300",
            Product::Uc51x => "uc51x",
            Product::Uc521 => "uc521",
            Product::Uc100 => "uc100",
            Product::Ts201 => "ts201",
        }
    }

    /// Value mode the vendor's stock tooling ships with for this product.
    pub fn default_value_mode(&self) -> ValueMode {
        match self {
            Product::Am300 | Product::Uc51x => ValueMode::Raw,
            Product::Uc521 | Product::Uc100 | Product::Ts201 => ValueMode::Named,
        }
    }

    /// `None` for downlink-only products.
    pub fn decoder(&self, config: CodecConfig) -> Option<Box<dyn UplinkDecoder>> {
        match self {
            Product::Am300 => Some(Box::new(Am307Decoder::new(config))),
            Product::Uc51x => Some(Box::new(Uc51xDecoder::new(config))),
            Product::Uc100 => Some(Box::new(Uc100Decoder::new(config))),
            Product::Ts201 => Some(Box::new(Ts201Decoder::new(config))),
            Product::Uc521 => None,
        }
    }

    /// `None` for uplink-only products.
    pub fn encoder(&self, config: CodecConfig) -> Option<Box<dyn DownlinkEncoder>> {
        match self {
            Product::Am300 => Some(Box::new(Am300Encoder::new(config))),
            Product::Uc51x => Some(Box::new(Uc51xEncoder::new(config))),
            Product::Uc521 => Some(Box::new(Uc521Encoder::new(config))),
            Product::Uc100 | Product::Ts201 => None,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Product {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Product::ALL
            .iter()
            .copied()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| format!("unknown product '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_product_names() {
        assert_eq!("UC51x".parse::<Product>().unwrap(), Product::Uc51x);
        assert_eq!(" ts201 ".parse::<Product>().unwrap(), Product::Ts201);
        assert!("am400".parse::<Product>().is_err());
    }

    #[test]
    fn directions_available_per_product() {
        let with_decoder: Vec<Product> = Product::ALL
            .iter()
            .copied()
            .filter(|p| p.decoder(CodecConfig::default()).is_some())
            .collect();
        assert_eq!(with_decoder, vec![Product::Am300, Product::Uc51x, Product::Uc100, Product::Ts201]);

        let with_encoder: Vec<Product> = Product::ALL
            .iter()
            .copied()
            .filter(|p| p.encoder(CodecConfig::default()).is_some())
            .collect();
        assert_eq!(with_encoder, vec![Product::Am300, Product::Uc51x, Product::Uc521]);
    }

    #[test]
    fn boxed_codecs_report_their_product() {
        for product in Product::ALL {
            let cfg = CodecConfig::for_product(product);
            if let Some(d) = product.decoder(cfg) {
                assert_eq!(d.product(), product);
            }
            if let Some(e) = product.encoder(cfg) {
                assert_eq!(e.product(), product);
            }
        }
    }
}
