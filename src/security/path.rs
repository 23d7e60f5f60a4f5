//! Mapping request paths onto the served directory.
//!
//! The request path is percent-decoded and lexically cleaned, then joined with
//! the root. Containment is decided on the absolute, normalized forms of both
//! paths: the target must sit under the root component-wise. Symlinks are not
//! followed.

use std::io;
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Why a request path could not be mapped inside the root.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("request path is not valid UTF-8 after decoding")]
    Decode,
    #[error("request path contains a NUL byte")]
    Nul,
    #[error("request path escapes the root directory")]
    OutsideRoot,
    #[error("failed to resolve root directory: {0}")]
    Root(#[source] io::Error),
    #[error("failed to resolve file path: {0}")]
    Target(#[source] io::Error),
}

/// A request path resolved against the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute path of the root directory.
    pub root: PathBuf,
    /// Absolute path of the requested entry.
    pub absolute: PathBuf,
    /// `absolute` relative to `root`; empty for the root itself.
    pub relative: PathBuf,
    /// The percent-decoded request path, before cleaning.
    pub requested: String,
}

/// Resolves the URI path `request_path` under `root`.
pub fn resolve(root: &Path, request_path: &str) -> Result<ResolvedPath, PathError> {
    let decoded = percent_decode_str(request_path)
        .decode_utf8()
        .map_err(|_| PathError::Decode)?;
    if decoded.contains('\0') {
        return Err(PathError::Nul);
    }

    // Cleaned as a relative path so leading `..` survive to the containment
    // check instead of being silently clamped.
    let cleaned = clean(Path::new(decoded.trim_start_matches('/')));

    let root_abs = std::path::absolute(root)
        .map(|p| clean(&p))
        .map_err(PathError::Root)?;
    let target_abs = std::path::absolute(root.join(&cleaned))
        .map(|p| clean(&p))
        .map_err(PathError::Target)?;

    let relative = target_abs
        .strip_prefix(&root_abs)
        .map_err(|_| PathError::OutsideRoot)?
        .to_path_buf();
    if relative.components().next() == Some(Component::ParentDir) {
        return Err(PathError::OutsideRoot);
    }

    Ok(ResolvedPath {
        root: root_abs,
        absolute: target_abs,
        relative,
        requested: decoded.into_owned(),
    })
}

/// Lexical normalization: drops `.` and empty segments and folds `..` into
/// the preceding segment. `..` directly under a root is discarded; leading
/// `..` of a relative path are kept.
pub fn clean(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}
