use super::{DEFAULT_CODE_PREFIX, DEFAULT_CODE_WIDTH, DEFAULT_RETRY_BUDGET};
use crate::code::{CodeFormat, MAX_SUFFIX_DIGITS};
use crate::error::{ConfigError, Error};
use serde::Deserialize;
use std::fmt::Display;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AllocatorConfig {
    #[serde(default = "AllocatorConfig::default_prefix")]
    pub prefix: String,

    /// Minimum number of suffix digits. Larger suffixes grow past this width.
    #[serde(default = "AllocatorConfig::default_width")]
    pub width: usize,

    /// Maximum number of candidate generations before allocation fails
    #[serde(default = "AllocatorConfig::default_retry_budget")]
    pub retry_budget: u32,

    #[serde(default)]
    pub mode: AllocationMode,
}

///
/// How a new record gets its code.
///
/// `PreCheck` computes a candidate, re-checks it and then inserts, relying on the
/// unique constraint as the backstop.
/// `Serialized` computes the candidate and inserts it in one transaction holding a
/// lock scoped to the prefix.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMode {
    // Serde does not seem to have a case insensitive option. alias is clunky, but better than custom de/serialisers
    #[default]
    #[serde(alias = "PreCheck", alias = "precheck", alias = "PRECHECK")]
    PreCheck,
    #[serde(alias = "Serialized", alias = "serialized", alias = "SERIALIZED")]
    Serialized,
}

impl Display for AllocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AllocationMode::PreCheck => "precheck",
            AllocationMode::Serialized => "serialized",
        };
        write!(f, "{s}")
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorConfig {
            prefix: AllocatorConfig::default_prefix(),
            width: AllocatorConfig::default_width(),
            retry_budget: AllocatorConfig::default_retry_budget(),
            mode: AllocationMode::default(),
        }
    }
}

impl AllocatorConfig {
    pub fn default_prefix() -> String {
        DEFAULT_CODE_PREFIX.to_string()
    }

    pub const fn default_width() -> usize {
        DEFAULT_CODE_WIDTH
    }

    pub const fn default_retry_budget() -> u32 {
        DEFAULT_RETRY_BUDGET
    }

    pub fn format(&self) -> CodeFormat {
        CodeFormat::new(&self.prefix, self.width)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.prefix.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "allocator.prefix".to_string(),
                value: self.prefix.to_owned(),
            }
            .into());
        }

        if self.width == 0 || self.width > MAX_SUFFIX_DIGITS {
            return Err(ConfigError::InvalidParameter {
                name: "allocator.width".to_string(),
                value: self.width.to_string(),
            }
            .into());
        }

        if self.retry_budget == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "allocator.retry_budget".to_string(),
                value: self.retry_budget.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
