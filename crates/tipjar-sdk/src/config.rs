use std::path::Path;

use serde::{Deserialize, Serialize};
use tipjar_registry::RefPolicy;
use tipjar_types::AssetKind;

use crate::error::{SdkError, SdkResult};

/// Settings for one [`TipJar`](crate::TipJar) instance.
///
/// Every field has a default, so an empty TOML document is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipJarConfig {
    /// Address grammar enforced on payout addresses.
    pub asset: AssetKind,
    /// Accepted external reference prefixes. Empty accepts any reference.
    pub ref_prefixes: Vec<String>,
    /// Allow substring matching when an exact lookup misses.
    pub fuzzy_resolution: bool,
    /// Also validate tip sender/recipient addresses against `asset`.
    pub strict_addresses: bool,
    pub default_top_limit: usize,
}

impl Default for TipJarConfig {
    fn default() -> Self {
        Self {
            asset: AssetKind::default(),
            ref_prefixes: Vec::new(),
            fuzzy_resolution: true,
            strict_addresses: false,
            default_top_limit: 10,
        }
    }
}

impl TipJarConfig {
    pub fn from_toml_str(input: &str) -> SdkResult<Self> {
        toml::from_str(input).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn ref_policy(&self) -> RefPolicy {
        RefPolicy::with_prefixes(self.ref_prefixes.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config() {
        let c = TipJarConfig::default();
        assert_eq!(c.asset, AssetKind::Stacks);
        assert!(c.ref_prefixes.is_empty());
        assert!(c.fuzzy_resolution);
        assert!(!c.strict_addresses);
        assert_eq!(c.default_top_limit, 10);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = TipJarConfig::from_toml_str(
            r#"
            asset = "bitcoin"
            ref_prefixes = ["https://soundcloud.com/"]
            "#,
        )
        .unwrap();
        assert_eq!(c.asset, AssetKind::Bitcoin);
        assert_eq!(c.ref_policy(), RefPolicy::soundcloud());
        assert!(c.fuzzy_resolution);
        assert_eq!(c.default_top_limit, 10);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = TipJarConfig::from_toml_str("asset = \"dogecoin\"").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strict_addresses = true\ndefault_top_limit = 3").unwrap();

        let c = TipJarConfig::load(file.path()).unwrap();
        assert!(c.strict_addresses);
        assert_eq!(c.default_top_limit, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TipJarConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, SdkError::Io(_)));
    }
}
