//! Chunk storage, coordinates, packed vertices, and the chunk arena.
#![forbid(unsafe_code)]

mod chunk;
pub mod coords;
pub mod light;
mod store;
pub mod vertex;

pub use chunk::{Chunk, Subchunk};
pub use coords::{
    BlockPos, CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_VOLUME, CHUNK_WIDTH, ChunkCoord, LocalPos,
    SUBCHUNK_COUNT, SUBCHUNK_HEIGHT, SUBCHUNK_LENGTH, SUBCHUNK_WIDTH, SUBCHUNKS_X, SUBCHUNKS_Y,
    SUBCHUNKS_Z, chunk_pos, local_pos,
};
pub use store::{ChunkId, ChunkStore};
pub use vertex::{PackedVertex, VertexAttrs};
