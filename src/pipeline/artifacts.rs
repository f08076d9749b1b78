//! Revocable artifact handles and the session that owns them.
//!
//! Rendered guides and spoken summaries are held in an [`ArtifactStore`] and
//! referenced by [`ArtifactHandle`].  A handle stays valid until it is
//! revoked; [`StudySession`] revokes superseded handles whenever a newer
//! result is installed and revokes everything on drop, so repeated runs
//! never accumulate artifacts.

use std::collections::HashMap;

use crate::stage::{Artifact, StudyMaterial};

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// Opaque reference to an artifact in an [`ArtifactStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactHandle(u64);

#[derive(Debug, Default)]
pub struct ArtifactStore {
    next_id: u64,
    live: HashMap<ArtifactHandle, Artifact>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, artifact: Artifact) -> ArtifactHandle {
        self.next_id += 1;
        let handle = ArtifactHandle(self.next_id);
        log::debug!(
            "artifacts: issued {handle:?} for {} ({} bytes)",
            artifact.filename,
            artifact.bytes.len()
        );
        self.live.insert(handle, artifact);
        handle
    }

    /// `None` once the handle has been revoked.
    pub fn get(&self, handle: ArtifactHandle) -> Option<&Artifact> {
        self.live.get(&handle)
    }

    /// Release the artifact.  Returns `false` if it was already gone.
    pub fn revoke(&mut self, handle: ArtifactHandle) -> bool {
        let removed = self.live.remove(&handle).is_some();
        if removed {
            log::debug!("artifacts: revoked {handle:?}");
        }
        removed
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

// ---------------------------------------------------------------------------
// PipelineResult
// ---------------------------------------------------------------------------

/// Outcome of one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub material: StudyMaterial,
    /// The rendered study guide.
    pub guide: ArtifactHandle,
    /// Spoken summary or its text fallback; `None` when there was no
    /// summary to speak.
    pub audio: Option<ArtifactHandle>,
}

impl PipelineResult {
    fn handles(&self) -> impl Iterator<Item = ArtifactHandle> {
        std::iter::once(self.guide).chain(self.audio)
    }
}

// ---------------------------------------------------------------------------
// StudySession
// ---------------------------------------------------------------------------

/// Owns the artifact store and the result currently on display.
#[derive(Debug, Default)]
pub struct StudySession {
    store: ArtifactStore,
    current: Option<PipelineResult>,
}

impl StudySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the orchestrator writes new artifacts into.
    pub fn store_mut(&mut self) -> &mut ArtifactStore {
        &mut self.store
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Make `result` current, revoking the handles of the result it replaces.
    pub fn install(&mut self, result: PipelineResult) {
        if let Some(previous) = self.current.replace(result) {
            for handle in previous.handles() {
                self.store.revoke(handle);
            }
        }
    }

    pub fn current(&self) -> Option<&PipelineResult> {
        self.current.as_ref()
    }

    pub fn artifact(&self, handle: ArtifactHandle) -> Option<&Artifact> {
        self.store.get(handle)
    }

    /// Revoke every handle, current or orphaned.
    pub fn clear(&mut self) {
        self.current = None;
        let handles: Vec<ArtifactHandle> = self.store.live.keys().copied().collect();
        for handle in handles {
            self.store.revoke(handle);
        }
    }
}

impl Drop for StudySession {
    fn drop(&mut self) {
        self.clear();
    }
}
