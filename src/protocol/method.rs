//! Core cog-management methods exposed by the bot.
//!
//! | Method | Params | Result |
//! |--------|--------|--------|
//! | `CORE__LOAD` | `[[name, ...]]` | `{loaded_packages, failed_packages}` |
//! | `CORE__UNLOAD` | `[[name, ...]]` | `{unloaded_packages}` |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::CogName;

// ============================================================================
// CogMethod
// ============================================================================

/// Cog-management calls understood by the bot's RPC server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CogMethod {
    /// Load the named cogs.
    Load(Vec<CogName>),
    /// Unload the named cogs.
    Unload(Vec<CogName>),
}

impl CogMethod {
    /// Wire name of the load method.
    pub const LOAD: &'static str = "CORE__LOAD";

    /// Wire name of the unload method.
    pub const UNLOAD: &'static str = "CORE__UNLOAD";

    /// Returns the wire method name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Load(_) => Self::LOAD,
            Self::Unload(_) => Self::UNLOAD,
        }
    }

    /// Returns the positional params: a single list holding every name.
    #[must_use]
    pub fn params(&self) -> Vec<Value> {
        let names = match self {
            Self::Load(names) | Self::Unload(names) => names,
        };
        let names = names
            .iter()
            .map(|name| Value::String(name.as_str().to_owned()))
            .collect();
        vec![Value::Array(names)]
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Result of `CORE__LOAD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoadReport {
    /// Packages the bot loaded.
    #[serde(default)]
    pub loaded_packages: Vec<String>,

    /// Packages the bot failed to load.
    #[serde(default)]
    pub failed_packages: Vec<String>,
}

impl LoadReport {
    /// Decodes a `CORE__LOAD` result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the result has the wrong shape.
    pub fn from_result(result: &Value) -> Result<Self> {
        decode_report(CogMethod::LOAD, result)
    }

    /// Checks that `cog` was loaded and nothing failed.
    ///
    /// Reported failures take precedence over a missing confirmation.
    ///
    /// # Errors
    ///
    /// - [`Error::LoadReportedFailures`] if `failed_packages` is non-empty
    /// - [`Error::LoadNotConfirmed`] if `cog` is absent from `loaded_packages`
    pub fn confirm(&self, cog: &CogName, raw: &Value) -> Result<()> {
        if !self.failed_packages.is_empty() {
            return Err(Error::load_reported_failures(
                cog.clone(),
                self.failed_packages.clone(),
            ));
        }
        if !self.loaded_packages.iter().any(|name| cog == name) {
            return Err(Error::load_not_confirmed(cog.clone(), raw.clone()));
        }
        Ok(())
    }
}

/// Result of `CORE__UNLOAD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UnloadReport {
    /// Packages the bot unloaded.
    #[serde(default)]
    pub unloaded_packages: Vec<String>,
}

impl UnloadReport {
    /// Decodes a `CORE__UNLOAD` result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the result has the wrong shape.
    pub fn from_result(result: &Value) -> Result<Self> {
        decode_report(CogMethod::UNLOAD, result)
    }

    /// Checks that `cog` was unloaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnloadNotConfirmed`] if `cog` is absent from
    /// `unloaded_packages`.
    pub fn confirm(&self, cog: &CogName, raw: &Value) -> Result<()> {
        if self.unloaded_packages.iter().any(|name| cog == name) {
            Ok(())
        } else {
            Err(Error::unload_not_confirmed(cog.clone(), raw.clone()))
        }
    }
}

/// A `null` result decodes as an empty report.
fn decode_report<T>(method: &str, result: &Value) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if result.is_null() {
        return Ok(T::default());
    }
    T::deserialize(result)
        .map_err(|e| Error::protocol(format!("Unexpected {method} result shape ({e}): {result}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn alpha() -> CogName {
        CogName::new("alpha").expect("valid")
    }

    #[test]
    fn test_method_names_and_params() {
        let load = CogMethod::Load(vec![alpha()]);
        assert_eq!(load.name(), "CORE__LOAD");
        assert_eq!(load.params(), vec![json!(["alpha"])]);

        let unload = CogMethod::Unload(vec![alpha()]);
        assert_eq!(unload.name(), "CORE__UNLOAD");
        assert_eq!(unload.params(), vec![json!(["alpha"])]);
    }

    #[test]
    fn test_load_confirmed() {
        let raw = json!({"loaded_packages": ["alpha"], "failed_packages": []});
        let report = LoadReport::from_result(&raw).expect("decode");
        assert!(report.confirm(&alpha(), &raw).is_ok());
    }

    #[test]
    fn test_load_failures_take_precedence() {
        let raw = json!({"loaded_packages": [], "failed_packages": ["alpha"]});
        let report = LoadReport::from_result(&raw).expect("decode");

        match report.confirm(&alpha(), &raw) {
            Err(Error::LoadReportedFailures { cog, failed }) => {
                assert_eq!(cog, alpha());
                assert_eq!(failed, vec!["alpha".to_string()]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_load_failures_even_when_loaded() {
        let raw = json!({"loaded_packages": ["alpha"], "failed_packages": ["beta"]});
        let report = LoadReport::from_result(&raw).expect("decode");
        assert!(matches!(
            report.confirm(&alpha(), &raw),
            Err(Error::LoadReportedFailures { .. })
        ));
    }

    #[test]
    fn test_load_not_confirmed() {
        let raw = json!({"loaded_packages": ["beta"], "failed_packages": []});
        let report = LoadReport::from_result(&raw).expect("decode");
        assert!(matches!(
            report.confirm(&alpha(), &raw),
            Err(Error::LoadNotConfirmed { .. })
        ));
    }

    #[test]
    fn test_null_result_is_empty_report() {
        let report = LoadReport::from_result(&Value::Null).expect("decode");
        assert_eq!(report, LoadReport::default());
        assert!(matches!(
            report.confirm(&alpha(), &Value::Null),
            Err(Error::LoadNotConfirmed { .. })
        ));
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let report = UnloadReport::from_result(&json!({})).expect("decode");
        assert!(report.unloaded_packages.is_empty());
    }

    #[test]
    fn test_wrong_shape_is_protocol_error() {
        assert!(matches!(
            LoadReport::from_result(&json!("loaded")),
            Err(Error::Protocol { .. })
        ));
        assert!(matches!(
            UnloadReport::from_result(&json!({"unloaded_packages": "alpha"})),
            Err(Error::Protocol { .. })
        ));
    }

    #[test]
    fn test_unload_confirmation() {
        let raw = json!({"unloaded_packages": ["alpha"]});
        let report = UnloadReport::from_result(&raw).expect("decode");
        assert!(report.confirm(&alpha(), &raw).is_ok());

        let raw = json!({"unloaded_packages": []});
        let report = UnloadReport::from_result(&raw).expect("decode");
        assert!(matches!(
            report.confirm(&alpha(), &raw),
            Err(Error::UnloadNotConfirmed { .. })
        ));
    }
}
