//! CPU subchunk mesher: face culling, ambient occlusion and smooth light.
#![forbid(unsafe_code)]

mod backend;
mod build;
pub mod shade;

pub use backend::{NullBackend, RenderBackend, upload_chunk};
pub use build::{SubchunkMesh, build_subchunk, can_render_face, rebuild_subchunk};

use strata_blocks::BlockRegistry;
use strata_chunk::{ChunkId, ChunkStore};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshOptions {
    /// Per-vertex AO and averaged light; otherwise one light sample per face.
    pub smooth_lighting: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            smooth_lighting: true,
        }
    }
}

/// Outcome of one [`process_chunk_updates`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkUpdate {
    pub rebuilt: usize,
    /// Work was done and the dirty queue is now empty: the chunk buffers
    /// need merging.
    pub needs_merge: bool,
}

/// Rebuilds up to `max` dirty subchunks of chunk `id`, oldest first.
pub fn process_chunk_updates(
    store: &mut ChunkStore,
    reg: &BlockRegistry,
    id: ChunkId,
    max: usize,
    opts: MeshOptions,
) -> ChunkUpdate {
    let mut rebuilt = 0;
    while rebuilt < max {
        let Some(index) = store.get_mut(id).and_then(|c| c.pop_update()) else {
            break;
        };
        rebuild_subchunk(store, reg, id, index, opts);
        rebuilt += 1;
    }
    let drained = store.get(id).is_some_and(|c| c.pending_updates() == 0);
    ChunkUpdate {
        rebuilt,
        needs_merge: rebuilt > 0 && drained,
    }
}
