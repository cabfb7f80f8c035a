//! Code/label tables and the raw-vs-named presentation switch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How enumerated fields are presented.
///
/// `Raw` surfaces (and expects) the numeric wire code, `Named` the
/// descriptive label. Fixed for the lifetime of a decoder or encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    #[default]
    Raw,
    Named,
}

impl std::str::FromStr for ValueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(ValueMode::Raw),
            "named" => Ok(ValueMode::Named),
            other => Err(format!("unknown value mode '{}' (expected raw or named)", other)),
        }
    }
}

/// Label used for codes that have no entry in a table.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Static `(code, label)` table in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueMap {
    entries: &'static [(i64, &'static str)],
}

impl ValueMap {
    pub const fn new(entries: &'static [(i64, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &'static [(i64, &'static str)] {
        self.entries
    }

    pub fn label(&self, code: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }

    pub fn code_of(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(code, _)| *code)
    }

    /// Decode-side presentation of a wire code.
    pub fn present(&self, mode: ValueMode, code: i64) -> Value {
        match mode {
            ValueMode::Raw => Value::from(code),
            ValueMode::Named => Value::from(self.label(code).unwrap_or(UNKNOWN_LABEL)),
        }
    }

    /// Values an encoder accepts for this table.
    pub fn legal_values(&self, mode: ValueMode) -> Vec<Value> {
        self.entries
            .iter()
            .map(|(code, label)| match mode {
                ValueMode::Raw => Value::from(*code),
                ValueMode::Named => Value::from(*label),
            })
            .collect()
    }

    /// Human readable domain, e.g. `one of 0, 1` or `one of no, yes`.
    pub fn domain(&self, mode: ValueMode) -> String {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(code, label)| match mode {
                ValueMode::Raw => code.to_string(),
                ValueMode::Named => (*label).to_string(),
            })
            .collect();
        format!("one of {}", parts.join(", "))
    }

    /// Encode-side transform: validate `value` against the table and return
    /// its wire code, or `None` when it is not a legal value in `mode`.
    pub fn to_code(&self, mode: ValueMode, value: &Value) -> Option<i64> {
        match mode {
            ValueMode::Raw => {
                let code = integral(value)?;
                self.label(code).map(|_| code)
            }
            ValueMode::Named => self.code_of(value.as_str()?),
        }
    }
}

/// Integer view of a JSON number, accepting floats with no fractional part.
pub(crate) fn integral(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

pub const YES_NO: ValueMap = ValueMap::new(&[(0, "no"), (1, "yes")]);
pub const ENABLE: ValueMap = ValueMap::new(&[(0, "disable"), (1, "enable")]);
pub const ON_OFF: ValueMap = ValueMap::new(&[(0, "off"), (1, "on")]);
pub const LORAWAN_CLASS: ValueMap = ValueMap::new(&[
    (0, "Class A"),
    (1, "Class B"),
    (2, "Class C"),
    (3, "Class CtoB"),
]);
pub const RESET_EVENT: ValueMap = ValueMap::new(&[(0, "normal"), (1, "reset")]);
