//! Error codes baked into generated unwind paths.
//!
//! Each failure the generated forward call can detect maps to one errno
//! symbol. Templates reference the mapping through `@ERRNO_<CONDITION>@`
//! placeholders so the table can be tested and overridden without touching
//! template text.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCondition {
    /// `this`, the handle, or the handle's inode is NULL.
    MissingInput,
    /// `this->private` carries no translator configuration.
    MissingConfig,
    /// `dht2_local_init` failed.
    AllocationFailed,
    /// The addressed inode has a null GFID.
    MissingGfid,
    /// No subvolume could be resolved for the GFID.
    ResolutionFailed,
}

impl FailureCondition {
    pub const ALL: [FailureCondition; 5] = [
        FailureCondition::MissingInput,
        FailureCondition::MissingConfig,
        FailureCondition::AllocationFailed,
        FailureCondition::MissingGfid,
        FailureCondition::ResolutionFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCondition::MissingInput => "missing_input",
            FailureCondition::MissingConfig => "missing_config",
            FailureCondition::AllocationFailed => "allocation_failed",
            FailureCondition::MissingGfid => "missing_gfid",
            FailureCondition::ResolutionFailed => "resolution_failed",
        }
    }

    /// Placeholder name (without `@` delimiters) used in templates.
    pub fn placeholder(&self) -> &'static str {
        match self {
            FailureCondition::MissingInput => "ERRNO_MISSING_INPUT",
            FailureCondition::MissingConfig => "ERRNO_MISSING_CONFIG",
            FailureCondition::AllocationFailed => "ERRNO_ALLOCATION_FAILED",
            FailureCondition::MissingGfid => "ERRNO_MISSING_GFID",
            FailureCondition::ResolutionFailed => "ERRNO_RESOLUTION_FAILED",
        }
    }

    pub fn from_placeholder(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cond| cond.placeholder() == name)
    }

    fn default_code(&self) -> &'static str {
        match self {
            FailureCondition::AllocationFailed => "ENOMEM",
            FailureCondition::MissingInput
            | FailureCondition::MissingConfig
            | FailureCondition::MissingGfid
            | FailureCondition::ResolutionFailed => "EINVAL",
        }
    }
}

/// Condition → errno symbol table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorPolicy {
    codes: BTreeMap<FailureCondition, String>,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        let codes = FailureCondition::ALL
            .into_iter()
            .map(|cond| (cond, cond.default_code().to_string()))
            .collect();
        Self { codes }
    }
}

impl ErrorPolicy {
    /// Defaults with the given entries replaced.
    pub fn with_overrides(overrides: &BTreeMap<FailureCondition, String>) -> Result<Self> {
        let mut policy = Self::default();
        for (cond, code) in overrides {
            policy.set(*cond, code)?;
        }
        Ok(policy)
    }

    pub fn set(&mut self, condition: FailureCondition, code: &str) -> Result<()> {
        validate_errno_symbol(code)
            .map_err(|err| err.context(format!("error code for {}", condition.as_str())))?;
        self.codes.insert(condition, code.to_string());
        Ok(())
    }

    pub fn code(&self, condition: FailureCondition) -> &str {
        self.codes
            .get(&condition)
            .map(String::as_str)
            .unwrap_or_else(|| condition.default_code())
    }
}

fn validate_errno_symbol(code: &str) -> Result<()> {
    let Some(rest) = code.strip_prefix('E') else {
        bail!("errno symbol must start with 'E', got '{code}'");
    };
    if rest.is_empty()
        || !rest
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        bail!("errno symbol must match ^E[A-Z0-9]+$, got '{code}'");
    }
    Ok(())
}
