// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Factory configuration

use cffu_core::Extraction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a [`FactoryConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Behaviour switches for a `CffuFactory`
///
/// ```toml
/// forbid_obtrude = true
/// extraction = "derived"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryConfig {
    /// Reject `obtrude_value` / `obtrude_exception` on every `Cffu` of the factory
    pub forbid_obtrude: bool,
    /// State extraction strategy; the process-wide selection when unset
    pub extraction: Option<Extraction>,
}

impl FactoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forbid_obtrude(mut self, forbid: bool) -> Self {
        self.forbid_obtrude = forbid;
        self
    }

    pub fn with_extraction(mut self, extraction: Extraction) -> Self {
        self.extraction = Some(extraction);
        self
    }

    /// Parse a configuration from TOML content
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// The strategy to use, resolving an unset value to the process-wide one
    pub fn extraction(&self) -> Extraction {
        self.extraction.unwrap_or_else(Extraction::selected)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
