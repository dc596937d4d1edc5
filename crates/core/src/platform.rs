//! Platform detection and host path normalization
//!
//! Docker on Windows expects bind-mount sources in POSIX form. Absolute
//! Windows paths are rewritten by dropping the first `:`, turning every `\`
//! into `/`, and prefixing `/`, so `C:\Users\me` becomes `/C/Users/me`.
//! Paths on every other platform pass through untouched.

use tracing::{debug, instrument};

/// Host platform families that affect path handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Native Windows
    Windows,
    /// Linux, macOS and other Unix-like hosts
    Unix,
}

impl Platform {
    /// Detect the current platform
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Whether host paths must be rewritten before mounting
    pub fn needs_path_conversion(self) -> bool {
        matches!(self, Platform::Windows)
    }
}

/// Normalize a host path for use in a volume mount on `platform`
#[instrument(level = "trace")]
pub fn normalize_host_path(path: &str, platform: Platform) -> String {
    if platform.needs_path_conversion() && is_windows_absolute(path) {
        let converted = format!("/{}", path.replacen(':', "", 1).replace('\\', "/"));
        debug!("Converted host path '{}' to '{}'", path, converted);
        converted
    } else {
        path.to_string()
    }
}

/// Absolute-path test using Windows rules, independent of the build target
///
/// A path is absolute when it starts with a separator (rooted or UNC) or with
/// a drive letter followed by `:` and a separator.
fn is_windows_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    match bytes {
        [b'/' | b'\\', ..] => true,
        [drive, b':', b'/' | b'\\', ..] => drive.is_ascii_alphabetic(),
        _ => false,
    }
}
