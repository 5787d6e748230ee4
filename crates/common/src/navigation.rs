//! Navigation inside the access scope.
//!
//! [`NavigationState`] owns the current prefix. It only moves after a listing
//! succeeds, and every requested prefix is clamped to the scope root first, so
//! nothing outside the granted prefix is ever listed or displayed.

use object_store::ObjectStore;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::listing::{list_folder, ListingResult};
use crate::scope::AccessScope;

pub const ROOT_LABEL: &str = "Root";

/// One clickable breadcrumb segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    /// Prefix to load when this crumb is selected
    pub prefix: String,
}

#[derive(Debug, Clone)]
pub struct NavigationState {
    scope: AccessScope,
    current_prefix: String,
}

impl NavigationState {
    pub fn new(scope: AccessScope) -> Self {
        let current_prefix = scope.root_prefix().to_string();
        Self {
            scope,
            current_prefix,
        }
    }

    pub fn scope(&self) -> &AccessScope {
        &self.scope
    }

    pub fn current_prefix(&self) -> &str {
        &self.current_prefix
    }

    /// Load `prefix` (clamped to the scope) and make it current on success.
    ///
    /// On failure the current prefix is left as it was.
    pub async fn load_folder(
        &mut self,
        store: &dyn ObjectStore,
        prefix: &str,
    ) -> Result<ListingResult> {
        let target = self.scope.clamp(prefix);
        if target != prefix {
            debug!(requested = prefix, clamped = %target, "prefix clamped to scope");
        }

        let listing = list_folder(store, &target).await?;
        self.current_prefix = target;
        Ok(listing)
    }

    /// Jump back to the scope root without listing (reconnect).
    pub fn reset(&mut self) {
        self.current_prefix = self.scope.root_prefix().to_string();
    }

    /// Parent of the current prefix, never above the root.
    pub fn parent(&self) -> String {
        let trimmed = self.current_prefix.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) => self.scope.clamp(&trimmed[..=idx]),
            None => self.scope.root_prefix().to_string(),
        }
    }

    /// Turn a user-typed path into a prefix.
    ///
    /// Paths that already start with the root are taken as keys; anything else
    /// is relative to the root. `..` escapes are clamped like any other prefix.
    pub fn resolve_path(&self, path: &str) -> String {
        let path = path.trim();
        let root = self.scope.root_prefix();
        let mut key = path.to_string();
        if !key.ends_with('/') {
            key.push('/');
        }
        if key.starts_with(root) {
            return self.scope.clamp(&key);
        }

        let relative = path.trim_matches('/');
        if relative.is_empty() {
            return root.to_string();
        }
        self.scope.clamp(&format!("{}{}", root, relative))
    }

    /// Root crumb followed by one crumb per segment below the root.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let root = self.scope.root_prefix();
        let mut crumbs = vec![Breadcrumb {
            label: ROOT_LABEL.to_string(),
            prefix: root.to_string(),
        }];

        let relative = self
            .current_prefix
            .strip_prefix(root)
            .unwrap_or_default();
        let mut path = root.to_string();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            path.push_str(segment);
            path.push('/');
            crumbs.push(Breadcrumb {
                label: segment.to_string(),
                prefix: path.clone(),
            });
        }
        crumbs
    }
}

/// Name to show for a folder entry listed under `current_prefix`.
pub fn folder_display_name(folder: &str, current_prefix: &str) -> String {
    let name = folder
        .strip_prefix(current_prefix)
        .unwrap_or(folder)
        .trim_end_matches('/');
    if name.is_empty() {
        folder.to_string()
    } else {
        name.to_string()
    }
}

/// Name to show for a file entry listed under `current_prefix`.
pub fn file_display_name(key: &str, current_prefix: &str) -> String {
    match key.strip_prefix(current_prefix) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => key.rsplit('/').next().unwrap_or(key).to_string(),
    }
}
