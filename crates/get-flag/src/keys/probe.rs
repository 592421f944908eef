//! Effective-identity file probing.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use tracing::debug;

/// Decides whether a candidate key file may be used.
#[cfg_attr(test, mockall::automock)]
pub trait AccessProbe {
    /// Returns `true` if `path` exists as far as the probing identity can tell.
    fn accessible(&self, path: &Path) -> bool;
}

/// Probes with `faccessat(AT_FDCWD, path, F_OK, AT_EACCESS)`.
///
/// The check runs with the *effective* uid/gid. When `get-flag` is setuid, the
/// invoking (real) user may not even be allowed to see that the key directory
/// contains a file, so a real-id check (`access(2)`, or
/// [`Path::exists`] after dropping privileges) would report every key as
/// missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectiveAccess;

impl AccessProbe for EffectiveAccess {
    fn accessible(&self, path: &Path) -> bool {
        let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
            debug!(path = %path.display(), "key path contains an interior NUL");
            return false;
        };
        // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
        let rc = unsafe {
            libc::faccessat(libc::AT_FDCWD, c_path.as_ptr(), libc::F_OK, libc::AT_EACCESS)
        };
        if rc != 0 {
            debug!(
                path = %path.display(),
                error = %io::Error::last_os_error(),
                "key file not accessible"
            );
        }
        rc == 0
    }
}

/// The process's effective uid.
pub fn effective_uid() -> u32 {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_file_is_accessible() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(EffectiveAccess.accessible(file.path()));
    }

    #[test]
    fn missing_file_is_not_accessible() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!EffectiveAccess.accessible(&dir.path().join("1000.key")));
    }

    #[test]
    fn interior_nul_is_not_accessible() {
        assert!(!EffectiveAccess.accessible(Path::new("/etc/flags/\0.key")));
    }
}
