use strata_chunk::{Chunk, ChunkCoord, PackedVertex};

/// Receiver of merged chunk buffers. GPU handles live on the other side.
pub trait RenderBackend {
    fn upload_opaque(&mut self, coord: ChunkCoord, vertices: &[PackedVertex]);
    fn upload_translucent(&mut self, coord: ChunkCoord, vertices: &[PackedVertex]);
    /// The chunk left residency; drop anything held for it.
    fn release(&mut self, _coord: ChunkCoord) {}
}

/// Backend that keeps only counters, for headless runs and tests.
#[derive(Default, Debug, Clone)]
pub struct NullBackend {
    pub uploads: usize,
    pub releases: usize,
    pub opaque_vertices: usize,
    pub translucent_vertices: usize,
}

impl RenderBackend for NullBackend {
    fn upload_opaque(&mut self, _coord: ChunkCoord, vertices: &[PackedVertex]) {
        self.uploads += 1;
        self.opaque_vertices += vertices.len();
    }

    fn upload_translucent(&mut self, _coord: ChunkCoord, vertices: &[PackedVertex]) {
        self.translucent_vertices += vertices.len();
    }

    fn release(&mut self, _coord: ChunkCoord) {
        self.releases += 1;
    }
}

/// Concatenates the chunk's subchunk buffers and hands both results to the
/// backend.
pub fn upload_chunk(chunk: &mut Chunk, backend: &mut dyn RenderBackend) {
    chunk.update_mesh();
    backend.upload_opaque(chunk.coord, &chunk.mesh);
    backend.upload_translucent(chunk.coord, &chunk.translucent_mesh);
    let (opaque, translucent) = chunk.quad_counts();
    log::debug!(
        target: "perf",
        "mesh_merge cx={} cz={} opaque_quads={} translucent_quads={}",
        chunk.coord.cx,
        chunk.coord.cz,
        opaque,
        translucent
    );
}
