use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::product::Product;
use crate::value_map::ValueMode;

/// Environment variable that overrides the configured value mode.
pub const VALUE_MODE_ENV: &str = "MILESIGHT_CODEC_VALUE_MODE";

/// Construction-time settings of a decoder or encoder.
///
/// Fixed for the lifetime of the codec instance; two instances with
/// different modes can coexist in one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodecConfig {
    pub value_mode: ValueMode,
    /// UC100 only: surface an unrecognized tail as `custom_message`
    /// instead of stopping at the unknown tag.
    pub custom_message_fallback: bool,
}

impl CodecConfig {
    pub fn new(value_mode: ValueMode) -> Self {
        Self {
            value_mode,
            custom_message_fallback: false,
        }
    }

    /// Defaults matching each product's stock payload tooling.
    pub fn for_product(product: Product) -> Self {
        Self::new(product.default_value_mode())
    }

    pub fn with_custom_message_fallback(mut self, enabled: bool) -> Self {
        self.custom_message_fallback = enabled;
        self
    }
}

/// On-disk configuration. Every key is optional; absent keys fall back to
/// the product defaults.
///
/// ```toml
/// value_mode = "named"
/// custom_message_fallback = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub value_mode: Option<ValueMode>,
    pub custom_message_fallback: Option<bool>,
}

impl ConfigFile {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let cfg: ConfigFile = toml::from_str(s).context("invalid codec configuration")?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .with_context(|| format!("failed to read codec config file: {}", p.display()))?;
        let cfg = Self::from_toml_str(&s)
            .with_context(|| format!("failed to parse codec config file: {}", p.display()))?;
        tracing::info!(path = %p.display(), value_mode = ?cfg.value_mode, "loaded codec config");
        Ok(cfg)
    }

    pub fn resolve(&self, product: Product) -> CodecConfig {
        let mut cfg = CodecConfig::for_product(product);
        if let Some(mode) = self.value_mode {
            cfg.value_mode = mode;
        }
        if let Some(fallback) = self.custom_message_fallback {
            if product != Product::Uc100 && fallback {
                tracing::warn!(product = %product, "custom_message_fallback only applies to uc100");
            }
            cfg.custom_message_fallback = fallback;
        }
        cfg
    }
}

/// Value mode from [`VALUE_MODE_ENV`], ignoring (with a warning) values
/// that do not parse.
pub fn value_mode_from_env() -> Option<ValueMode> {
    let raw = std::env::var(VALUE_MODE_ENV).ok()?;
    match raw.parse::<ValueMode>() {
        Ok(mode) => Some(mode),
        Err(e) => {
            tracing::warn!(var = VALUE_MODE_ENV, value = %raw, error = %e, "ignoring invalid value mode override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_product_defaults() {
        let cfg = ConfigFile::from_toml_str("").unwrap();
        assert_eq!(cfg.resolve(Product::Am300).value_mode, ValueMode::Raw);
        assert_eq!(cfg.resolve(Product::Ts201).value_mode, ValueMode::Named);
        assert!(!cfg.resolve(Product::Uc100).custom_message_fallback);
    }

    #[test]
    fn file_values_override_defaults() {
        let cfg = ConfigFile::from_toml_str("value_mode = \"raw\"\ncustom_message_fallback = true\n").unwrap();
        let uc100 = cfg.resolve(Product::Uc100);
        assert_eq!(uc100.value_mode, ValueMode::Raw);
        assert!(uc100.custom_message_fallback);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(ConfigFile::from_toml_str("value_mode = \"pretty\"").is_err());
    }

    #[test]
    fn default_config_file_loads() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("default_codec.toml");
        let cfg = ConfigFile::load(&path).expect("load default_codec.toml");
        assert_eq!(cfg.value_mode, None);
        assert_eq!(cfg.custom_message_fallback, Some(false));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ConfigFile::load("/nonexistent/codec.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/codec.toml"));
    }
}
