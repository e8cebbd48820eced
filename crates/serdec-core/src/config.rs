use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::BIT_DEPTH_HINT_RANGE;
use crate::error::{Result, SerError};
use crate::io::store::StoreKind;

/// Options applied when opening a SER file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Bit depth to use instead of the header's. Only 8..=16 is honoured.
    pub bit_depth_hint: Option<u32>,
    /// Sample frames at open time to correct a mis-declared depth (>8-bit only).
    pub infer_pixel_depth: bool,
    pub store: StoreKind,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            bit_depth_hint: None,
            infer_pixel_depth: true,
            store: StoreKind::default(),
        }
    }
}

impl DecoderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        match self.bit_depth_hint {
            Some(hint) if !BIT_DEPTH_HINT_RANGE.contains(&hint) => Err(SerError::Config(format!(
                "bit_depth_hint must be between {} and {}, got {hint}",
                BIT_DEPTH_HINT_RANGE.start(),
                BIT_DEPTH_HINT_RANGE.end()
            ))),
            _ => Ok(()),
        }
    }
}
