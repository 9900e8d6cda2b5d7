//! Store configuration
//!
//! Layered the usual way: defaults, then a TOML file, then `KEYREACH_*`
//! environment variables, then validation.
//!
//! ```toml
//! default_credential_mask = "0x3f010000"
//! default_keyring_mask = "0x3f010000"
//! max_description_len = 4096
//! max_payload_len = 32767
//! mutation_policy = "permissive"
//! ```

mod validation;

pub use validation::{ConfigValidator, ValidationError, ValidationResult};

use crate::{Capability, KeyringError, PermissionMask, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "KEYREACH_";

/// Upper bound accepted for any configured length
pub const MAX_LENGTH_LIMIT: usize = 1 << 20;

/// Who may add keys to, or link into, a keyring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPolicy {
    /// Any existing keyring may be targeted
    #[default]
    Permissive,
    /// `add` needs `write` on the target keyring; `link` needs `link` on the
    /// child and `write` on the parent
    RequireWrite,
}

impl fmt::Display for MutationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationPolicy::Permissive => f.write_str("permissive"),
            MutationPolicy::RequireWrite => f.write_str("require_write"),
        }
    }
}

impl FromStr for MutationPolicy {
    type Err = KeyringError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "permissive" => Ok(MutationPolicy::Permissive),
            "require_write" => Ok(MutationPolicy::RequireWrite),
            other => Err(KeyringError::invalid(format!(
                "unknown mutation policy '{other}'"
            ))),
        }
    }
}

/// Configuration for a graph store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Mask applied to credentials added without one
    pub default_credential_mask: PermissionMask,
    /// Mask applied to keyrings created without one
    pub default_keyring_mask: PermissionMask,
    /// Longest accepted description, in bytes
    pub max_description_len: usize,
    /// Largest accepted payload, in bytes
    pub max_payload_len: usize,
    /// Policy checked by session-level mutations
    pub mutation_policy: MutationPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_credential_mask: PermissionMask::default(),
            default_keyring_mask: PermissionMask::default(),
            max_description_len: 4096,
            max_payload_len: 32767,
            mutation_policy: MutationPolicy::Permissive,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KeyringError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded store configuration");
        Ok(config)
    }

    /// Apply `KEYREACH_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `KEYREACH_*` overrides from an arbitrary variable source
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(field) = key.strip_prefix(ENV_PREFIX) {
                self.set_from_string(&field.to_lowercase(), &value)?;
            }
        }
        self.validate()
    }

    /// Set a single field from its string form
    ///
    /// Unknown keys are ignored so unrelated `KEYREACH_*` variables do not
    /// break startup.
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "default_credential_mask" => self.default_credential_mask = value.parse()?,
            "default_keyring_mask" => self.default_keyring_mask = value.parse()?,
            "max_description_len" => self.max_description_len = parse_len(key, value)?,
            "max_payload_len" => self.max_payload_len = parse_len(key, value)?,
            "mutation_policy" => self.mutation_policy = value.parse()?,
            other => {
                tracing::trace!(key = other, "Ignoring unknown configuration override");
                return Ok(());
            }
        }
        tracing::debug!(key, value, "Applied configuration override");
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let possessor_can_view = |mask: &PermissionMask| mask.possessor().contains(Capability::View);
        let mut validator = ConfigValidator::new();
        validator
            .range(
                "max_description_len",
                self.max_description_len as u64,
                1,
                MAX_LENGTH_LIMIT as u64,
            )
            .range(
                "max_payload_len",
                self.max_payload_len as u64,
                1,
                MAX_LENGTH_LIMIT as u64,
            )
            .custom(
                "default_credential_mask",
                &self.default_credential_mask,
                possessor_can_view,
                "possessor class must include view",
            )
            .custom(
                "default_keyring_mask",
                &self.default_keyring_mask,
                possessor_can_view,
                "possessor class must include view",
            );
        validator.result().map_err(KeyringError::from)
    }
}

fn parse_len(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| KeyringError::invalid(format!("{key}: '{value}' is not a length: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_credential_mask.bits(), 0x3f01_0000);
        assert_eq!(config.mutation_policy, MutationPolicy::Permissive);
    }

    #[test]
    fn test_parse_toml() {
        let config = StoreConfig::from_toml_str(
            r#"
            default_credential_mask = "0x3f030000"
            max_payload_len = 64
            mutation_policy = "require_write"
            "#,
        )
        .unwrap();
        assert!(config.default_credential_mask.owner().contains(Capability::Read));
        assert_eq!(config.max_payload_len, 64);
        assert_eq!(config.max_description_len, 4096);
        assert_eq!(config.mutation_policy, MutationPolicy::RequireWrite);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = StoreConfig::from_toml_str("quota = 10").unwrap_err();
        assert_matches!(err, KeyringError::Config { .. });
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = StoreConfig::from_toml_str("max_payload_len = 0").unwrap_err();
        assert_matches!(err, KeyringError::Invalid { .. });

        let err =
            StoreConfig::from_toml_str(r#"default_keyring_mask = "0x3e010000""#).unwrap_err();
        assert_matches!(err, KeyringError::Invalid { ref message } if message.contains("view"));

        let err = StoreConfig::from_toml_str(r#"default_keyring_mask = "0x3f010001""#).unwrap_err();
        assert_matches!(err, KeyringError::Config { .. });
    }

    #[test]
    fn test_merge_with_vars() {
        let mut config = StoreConfig::default();
        config
            .merge_with_vars(vec![
                ("KEYREACH_MAX_DESCRIPTION_LEN".to_string(), "128".to_string()),
                ("KEYREACH_MUTATION_POLICY".to_string(), "require_write".to_string()),
                ("KEYREACH_UNRELATED".to_string(), "x".to_string()),
                ("HOME".to_string(), "/root".to_string()),
            ])
            .unwrap();
        assert_eq!(config.max_description_len, 128);
        assert_eq!(config.mutation_policy, MutationPolicy::RequireWrite);
    }

    #[test]
    fn test_merge_with_vars_rejects_bad_value() {
        let mut config = StoreConfig::default();
        let err = config
            .merge_with_vars(vec![(
                "KEYREACH_MAX_PAYLOAD_LEN".to_string(),
                "lots".to_string(),
            )])
            .unwrap_err();
        assert_matches!(err, KeyringError::Invalid { .. });
    }

    #[test]
    #[serial_test::serial]
    fn test_merge_with_process_env() {
        std::env::set_var("KEYREACH_DEFAULT_CREDENTIAL_MASK", "0x3f3f0000");
        let mut config = StoreConfig::default();
        let result = config.merge_with_env();
        std::env::remove_var("KEYREACH_DEFAULT_CREDENTIAL_MASK");

        result.unwrap();
        assert!(config
            .default_credential_mask
            .owner()
            .contains(Capability::SetAttr));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_description_len = 32").unwrap();
        let config = StoreConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.max_description_len, 32);

        let missing = file.path().with_extension("absent");
        assert_matches!(
            StoreConfig::load_from_file(&missing),
            Err(KeyringError::Config { .. })
        );
    }
}
