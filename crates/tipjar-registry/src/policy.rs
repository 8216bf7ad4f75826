//! External reference validation.
//!
//! Valid references:
//! - Must be non-empty
//! - Must not contain whitespace
//! - Must start with one of the allowed prefixes, when any are configured

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Prefix for SoundCloud profile and track links.
pub const SOUNDCLOUD_PREFIX: &str = "https://soundcloud.com/";

/// Rules an external reference must satisfy before it can be registered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefPolicy {
    /// Accepted reference prefixes. Empty means any reference is accepted.
    #[serde(default)]
    pub allowed_prefixes: Vec<String>,
}

impl RefPolicy {
    /// Accept any non-empty reference.
    pub fn any() -> Self {
        Self::default()
    }

    /// Accept only `https://soundcloud.com/...` references.
    pub fn soundcloud() -> Self {
        Self::with_prefixes([SOUNDCLOUD_PREFIX])
    }

    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate a reference, returning `Ok(())` if it may be registered.
    ///
    /// # Examples
    ///
    /// ```
    /// use tipjar_registry::RefPolicy;
    ///
    /// let policy = RefPolicy::soundcloud();
    /// assert!(policy.validate("https://soundcloud.com/dj-kewl").is_ok());
    /// assert!(policy.validate("https://example.com/dj-kewl").is_err());
    /// assert!(RefPolicy::any().validate("").is_err());
    /// ```
    pub fn validate(&self, external_ref: &str) -> Result<()> {
        if external_ref.is_empty() {
            return Err(invalid(external_ref, "reference must not be empty"));
        }

        if external_ref.chars().any(char::is_whitespace) {
            return Err(invalid(external_ref, "reference must not contain whitespace"));
        }

        if !self.allowed_prefixes.is_empty()
            && !self
                .allowed_prefixes
                .iter()
                .any(|prefix| external_ref.starts_with(prefix.as_str()))
        {
            return Err(invalid(
                external_ref,
                format!("must start with one of: {}", self.allowed_prefixes.join(", ")),
            ));
        }

        Ok(())
    }
}

fn invalid(external_ref: &str, reason: impl Into<String>) -> RegistryError {
    RegistryError::InvalidExternalRef {
        external_ref: external_ref.to_string(),
        reason: reason.into(),
    }
}
