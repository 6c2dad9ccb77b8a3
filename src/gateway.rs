//! Path Authorization Gateway
//!
//! Every filesystem-touching operation calls [`PathGateway::assert_allowed`]
//! first. The check reads the current config snapshot on every call, so a
//! reload that removes a root takes effect on the next request.

use crate::config::ConfigHandle;
use crate::error::ApiError;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Authorizes paths against the configured root folders.
#[derive(Debug, Clone)]
pub struct PathGateway {
    config: ConfigHandle,
}

impl PathGateway {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }

    /// True iff `path` is a configured root or a strict descendant of one.
    pub fn is_allowed(&self, path: &Path) -> bool {
        if !path.is_absolute() {
            debug!(path = %path.display(), "Path is not absolute");
            return false;
        }

        if has_traversal(path) {
            debug!(path = %path.display(), "Path contains traversal segments");
            return false;
        }

        let config = self.config.snapshot();

        if config.folders.iter().any(|root| is_same_path(root, path)) {
            debug!(path = %path.display(), "Path is a configured root");
            return true;
        }

        if config.folders.iter().any(|root| is_sub_path(root, path)) {
            return true;
        }

        debug!(path = %path.display(), "Path is not in the config");
        false
    }

    /// Fail with `PathNotAllowed` unless [`is_allowed`](Self::is_allowed).
    pub fn assert_allowed(&self, path: &Path) -> Result<(), ApiError> {
        if self.is_allowed(path) {
            Ok(())
        } else {
            Err(ApiError::PathNotAllowed(path.to_path_buf()))
        }
    }

    /// True iff `path` is exactly one of the configured roots.
    pub fn is_top_level(&self, path: &Path) -> bool {
        self.config
            .snapshot()
            .folders
            .iter()
            .any(|root| is_same_path(root, path))
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }
}

/// Resolve `.` and `..` lexically, without touching the filesystem.
///
/// `..` at the root stays at the root, as path resolution does.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// True when the parent as written differs from the parent after resolution.
pub fn has_traversal(path: &Path) -> bool {
    let literal_parent = path.parent().map(|p| p.components().collect::<PathBuf>());
    let resolved = normalize_lexically(path);
    let resolved_parent = resolved.parent().map(Path::to_path_buf);
    literal_parent != resolved_parent
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
}

pub fn is_same_path(a: &Path, b: &Path) -> bool {
    normalize_lexically(a) == normalize_lexically(b)
}

/// True iff `child` is strictly below `parent`.
///
/// The relative path from parent to child must be non-empty, must not start
/// with `..`, and must not be absolute.
pub fn is_sub_path(parent: &Path, child: &Path) -> bool {
    let parent = normalize_lexically(parent);
    let child = normalize_lexically(child);
    let Ok(relative) = child.strip_prefix(&parent) else {
        return false;
    };
    if relative.as_os_str().is_empty() {
        return false;
    }
    !matches!(relative.components().next(), Some(Component::ParentDir)) && !relative.is_absolute()
}
