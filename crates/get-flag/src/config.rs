//! Key file locations.
//!
//! There is deliberately no runtime configuration: `get-flag` usually runs
//! setuid, so it reads neither arguments nor environment variables. The
//! templates below are fixed at build time and may be overridden only by
//! setting `FLAGS_KEY_UID_FILE` / `FLAGS_KEY_FALLBACK_FILE` when compiling.
//! Tests construct [`KeyPaths`] directly.

use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, FlagError};

/// Placeholder in the principal template that is replaced by the effective uid.
pub const UID_PLACEHOLDER: &str = "{uid}";

/// Longest key file path accepted, in bytes.
pub const MAX_PATH_LEN: usize = 511;

const BUILTIN_PRINCIPAL_TEMPLATE: &str = match option_env!("FLAGS_KEY_UID_FILE") {
    Some(template) => template,
    None => "/etc/flags/{uid}.key",
};

const BUILTIN_FALLBACK: &str = match option_env!("FLAGS_KEY_FALLBACK_FILE") {
    Some(path) => path,
    None => "/etc/flags/default.key",
};

/// Where to look for key files.
///
/// UID-specific files come first so several identical setuid binaries owned by
/// different users can each carry their own challenge key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    /// Path template containing exactly one [`UID_PLACEHOLDER`].
    pub principal_template: String,
    /// Shared key file used when no uid-specific one is accessible.
    pub fallback: PathBuf,
}

impl KeyPaths {
    /// The compiled-in locations, validated.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Config`] if the build-time overrides are malformed.
    pub fn builtin() -> Result<Self, FlagError> {
        Self::new(BUILTIN_PRINCIPAL_TEMPLATE, BUILTIN_FALLBACK)
    }

    /// Build and validate a path configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Config`] if the template does not contain exactly
    /// one `{uid}`, if either path is relative, or if the fallback is too long.
    pub fn new(
        principal_template: impl Into<String>,
        fallback: impl Into<PathBuf>,
    ) -> Result<Self, FlagError> {
        let paths = Self {
            principal_template: principal_template.into(),
            fallback: fallback.into(),
        };
        paths.validate()?;
        Ok(paths)
    }

    fn validate(&self) -> Result<(), FlagError> {
        let placeholders = self.principal_template.matches(UID_PLACEHOLDER).count();
        if placeholders != 1 {
            return Err(config_error(format!(
                "principal template must contain exactly one {UID_PLACEHOLDER}, found {placeholders}"
            )));
        }
        if !Path::new(&self.principal_template).is_absolute() {
            return Err(config_error("principal template must be an absolute path"));
        }
        if !self.fallback.is_absolute() {
            return Err(config_error("fallback path must be absolute"));
        }
        if self.fallback.as_os_str().len() > MAX_PATH_LEN {
            return Err(config_error(format!(
                "fallback path exceeds {MAX_PATH_LEN} bytes"
            )));
        }
        Ok(())
    }

    /// The key file path for effective uid `uid`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::PathTooLong`] if the formatted path exceeds
    /// [`MAX_PATH_LEN`] bytes.
    pub fn principal_path(&self, uid: u32) -> Result<PathBuf, FlagError> {
        let path = self
            .principal_template
            .replacen(UID_PLACEHOLDER, &uid.to_string(), 1);
        if path.len() > MAX_PATH_LEN {
            return Err(FlagError::new(ErrorKind::PathTooLong(uid)));
        }
        Ok(PathBuf::from(path))
    }
}

#[track_caller]
fn config_error(msg: impl Into<String>) -> FlagError {
    FlagError::new(ErrorKind::Config(msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defaults() {
        let paths = KeyPaths::builtin().unwrap();
        if option_env!("FLAGS_KEY_UID_FILE").is_none() {
            assert_eq!(paths.principal_template, "/etc/flags/{uid}.key");
        }
        if option_env!("FLAGS_KEY_FALLBACK_FILE").is_none() {
            assert_eq!(paths.fallback, PathBuf::from("/etc/flags/default.key"));
        }
    }

    #[test]
    fn principal_path_formats_uid() {
        let paths = KeyPaths::new("/etc/flags/{uid}.key", "/etc/flags/default.key").unwrap();
        assert_eq!(
            paths.principal_path(1003).unwrap(),
            PathBuf::from("/etc/flags/1003.key")
        );
        assert_eq!(
            paths.principal_path(0).unwrap(),
            PathBuf::from("/etc/flags/0.key")
        );
    }

    #[test]
    fn rejects_missing_placeholder() {
        let err = KeyPaths::new("/etc/flags/key", "/etc/flags/default.key").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config(_)));
    }

    #[test]
    fn rejects_repeated_placeholder() {
        assert!(KeyPaths::new("/etc/{uid}/{uid}.key", "/etc/flags/default.key").is_err());
    }

    #[test]
    fn rejects_relative_paths() {
        assert!(KeyPaths::new("flags/{uid}.key", "/etc/flags/default.key").is_err());
        assert!(KeyPaths::new("/etc/flags/{uid}.key", "default.key").is_err());
    }

    #[test]
    fn rejects_overlong_principal_path() {
        let template = format!("/{}/{{uid}}.key", "a".repeat(MAX_PATH_LEN));
        let paths = KeyPaths::new(template, "/etc/flags/default.key").unwrap();
        let err = paths.principal_path(1000).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::PathTooLong(1000)));
    }
}
