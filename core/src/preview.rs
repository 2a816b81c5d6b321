//! Revocable preview URLs for the selected video.
//!
//! A [`PreviewHandle`] is a scoped resource: the session acquires one when a
//! file is accepted and hands it back through [`PreviewRegistry::release`]
//! on replacement or reset. Dropping a handle does not release it. The shell
//! serves `preview://` requests by resolving the id in the URL against the
//! registry, so a released handle stops resolving immediately.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::types::{MediaFile, MediaSource};

/// URL prefix used on platforms where custom schemes are served directly.
pub const DEFAULT_PREVIEW_BASE: &str = "preview://localhost";

/// Content the shell streams back for a live preview.
#[derive(Debug, Clone)]
pub struct PreviewSource {
    pub source: MediaSource,
    pub mime: String,
}

/// Live reference to a previewable file. Not `Clone`: exactly one owner
/// releases it.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    id: u64,
    url: String,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    live: HashMap<u64, PreviewSource>,
}

/// Shared table of live previews. Cloning shares the same table.
#[derive(Clone)]
pub struct PreviewRegistry {
    base_url: Arc<str>,
    state: Arc<Mutex<RegistryState>>,
}

impl PreviewRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            state: Arc::new(Mutex::new(RegistryState::default())),
        }
    }

    pub fn acquire(&self, file: &MediaFile) -> PreviewHandle {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(
            id,
            PreviewSource {
                source: file.source().clone(),
                mime: file.declared_mime().to_string(),
            },
        );
        debug!("Acquired preview {} for {}", id, file.name());
        PreviewHandle {
            id,
            url: format!("{}/{}", self.base_url, id),
        }
    }

    /// Revoke a handle. Returns false if it was already gone.
    pub fn release(&self, handle: PreviewHandle) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = state.live.remove(&handle.id).is_some();
        if removed {
            debug!("Released preview {}", handle.id);
        } else {
            warn!("Preview {} released twice", handle.id);
        }
        removed
    }

    pub fn resolve(&self, id: u64) -> Option<PreviewSource> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.live.get(&id).cloned()
    }

    /// Resolve the path component of a preview request, e.g. `/3`.
    pub fn resolve_path(&self, path: &str) -> Option<PreviewSource> {
        let id = path.trim_matches('/').parse::<u64>().ok()?;
        self.resolve(id)
    }

    pub fn live_count(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.live.len()
    }
}

impl Default for PreviewRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_BASE)
    }
}
