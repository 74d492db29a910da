use std::collections::VecDeque;

use strata_blocks::{AIR, BlockId, Face};

use crate::coords::{
    BlockPos, CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_VOLUME, CHUNK_WIDTH, ChunkCoord, LocalPos,
    SUBCHUNK_COUNT, SUBCHUNK_HEIGHT, SUBCHUNK_LENGTH, SUBCHUNK_WIDTH, SUBCHUNKS_X, SUBCHUNKS_Y,
    SUBCHUNKS_Z, subchunk_index,
};
use crate::light;
use crate::store::ChunkId;
use crate::vertex::PackedVertex;

/// A 16^3 mesh cell. Buffers are rebuilt wholesale by the mesher.
#[derive(Clone, Debug, Default)]
pub struct Subchunk {
    /// Position in the chunk's subchunk grid.
    pub grid: (usize, usize, usize),
    pub mesh: Vec<PackedVertex>,
    pub translucent_mesh: Vec<PackedVertex>,
}

impl Subchunk {
    /// Chunk-local voxel at this subchunk's minimum corner.
    #[inline]
    pub fn origin(&self) -> LocalPos {
        LocalPos::new(
            self.grid.0 * SUBCHUNK_WIDTH,
            self.grid.1 * SUBCHUNK_HEIGHT,
            self.grid.2 * SUBCHUNK_LENGTH,
        )
    }
}

#[derive(Clone, Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    blocks: Vec<BlockId>,
    light: Vec<u8>,
    pub subchunks: Vec<Subchunk>,
    update_queue: VecDeque<usize>,
    queued: [bool; SUBCHUNK_COUNT],
    /// Set by any block write; cleared by a successful save.
    pub modified: bool,
    pub(crate) neighbors: [Option<ChunkId>; 6],
    /// Concatenated subchunk buffers, refreshed by [`Chunk::update_mesh`].
    pub mesh: Vec<PackedVertex>,
    pub translucent_mesh: Vec<PackedVertex>,
}

impl Chunk {
    pub fn new(coord: ChunkCoord) -> Self {
        let mut subchunks = Vec::with_capacity(SUBCHUNK_COUNT);
        for sy in 0..SUBCHUNKS_Y {
            for sz in 0..SUBCHUNKS_Z {
                for sx in 0..SUBCHUNKS_X {
                    debug_assert_eq!(subchunk_index(sx, sy, sz), subchunks.len());
                    subchunks.push(Subchunk {
                        grid: (sx, sy, sz),
                        ..Default::default()
                    });
                }
            }
        }
        Chunk {
            coord,
            blocks: vec![AIR; CHUNK_VOLUME],
            light: vec![0; CHUNK_VOLUME],
            subchunks,
            update_queue: VecDeque::with_capacity(SUBCHUNK_COUNT),
            queued: [false; SUBCHUNK_COUNT],
            modified: false,
            neighbors: [None; 6],
            mesh: Vec::new(),
            translucent_mesh: Vec::new(),
        }
    }

    /// Builds a chunk from blocks in [`LocalPos::index`] order, padding or
    /// truncating to the chunk volume.
    pub fn from_blocks(coord: ChunkCoord, mut blocks: Vec<BlockId>) -> Self {
        blocks.resize(CHUNK_VOLUME, AIR);
        let mut c = Chunk::new(coord);
        c.blocks = blocks;
        c
    }

    #[inline]
    pub fn origin(&self) -> BlockPos {
        self.coord.origin()
    }

    #[inline]
    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.in_height_range() && pos.chunk() == self.coord
    }

    #[inline]
    pub fn block(&self, l: LocalPos) -> BlockId {
        self.blocks[l.index()]
    }

    /// Stores `id` and returns the previous value. Does not touch `modified`.
    #[inline]
    pub fn set_block(&mut self, l: LocalPos, id: BlockId) -> BlockId {
        std::mem::replace(&mut self.blocks[l.index()], id)
    }

    #[inline]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    #[inline]
    pub fn is_all_air(&self) -> bool {
        self.blocks.iter().all(|&b| b == AIR)
    }

    #[inline]
    pub fn block_light(&self, l: LocalPos) -> u8 {
        light::block_nibble(self.light[l.index()])
    }

    #[inline]
    pub fn set_block_light(&mut self, l: LocalPos, level: u8) {
        let i = l.index();
        self.light[i] = light::with_block(self.light[i], level);
    }

    #[inline]
    pub fn skylight(&self, l: LocalPos) -> u8 {
        light::sky_nibble(self.light[l.index()])
    }

    #[inline]
    pub fn set_skylight(&mut self, l: LocalPos, level: u8) {
        let i = l.index();
        self.light[i] = light::with_sky(self.light[i], level);
    }

    #[inline]
    pub fn raw_light(&self, l: LocalPos) -> u8 {
        self.light[l.index()]
    }

    #[inline]
    pub fn neighbor(&self, face: Face) -> Option<ChunkId> {
        self.neighbors[face.index()]
    }

    /// Queues subchunk `index` for rebuild unless it is already queued.
    pub fn queue_subchunk(&mut self, index: usize) {
        if index < SUBCHUNK_COUNT && !self.queued[index] {
            self.queued[index] = true;
            self.update_queue.push_back(index);
        }
    }

    /// Marks the subchunk holding `l` dirty, plus any subchunk across a seam
    /// that `l` touches.
    pub fn update_at_position(&mut self, l: LocalPos) {
        let sx = l.x / SUBCHUNK_WIDTH;
        let sy = l.y / SUBCHUNK_HEIGHT;
        let sz = l.z / SUBCHUNK_LENGTH;
        let (lx, ly, lz) = (l.x % SUBCHUNK_WIDTH, l.y % SUBCHUNK_HEIGHT, l.z % SUBCHUNK_LENGTH);

        self.queue_subchunk(subchunk_index(sx, sy, sz));
        if lx == SUBCHUNK_WIDTH - 1 && sx + 1 < SUBCHUNKS_X {
            self.queue_subchunk(subchunk_index(sx + 1, sy, sz));
        }
        if lx == 0 && sx > 0 {
            self.queue_subchunk(subchunk_index(sx - 1, sy, sz));
        }
        if ly == SUBCHUNK_HEIGHT - 1 && sy + 1 < SUBCHUNKS_Y {
            self.queue_subchunk(subchunk_index(sx, sy + 1, sz));
        }
        if ly == 0 && sy > 0 {
            self.queue_subchunk(subchunk_index(sx, sy - 1, sz));
        }
        if lz == SUBCHUNK_LENGTH - 1 && sz + 1 < SUBCHUNKS_Z {
            self.queue_subchunk(subchunk_index(sx, sy, sz + 1));
        }
        if lz == 0 && sz > 0 {
            self.queue_subchunk(subchunk_index(sx, sy, sz - 1));
        }
    }

    /// Replaces the dirty queue with every subchunk.
    pub fn update_subchunk_meshes(&mut self) {
        self.update_queue.clear();
        self.queued = [false; SUBCHUNK_COUNT];
        for i in 0..SUBCHUNK_COUNT {
            self.queue_subchunk(i);
        }
    }

    pub fn pop_update(&mut self) -> Option<usize> {
        let i = self.update_queue.pop_front()?;
        self.queued[i] = false;
        Some(i)
    }

    #[inline]
    pub fn pending_updates(&self) -> usize {
        self.update_queue.len()
    }

    /// Concatenates every subchunk's buffers into the chunk-level buffers.
    pub fn update_mesh(&mut self) {
        let opaque_len: usize = self.subchunks.iter().map(|s| s.mesh.len()).sum();
        let translucent_len: usize = self.subchunks.iter().map(|s| s.translucent_mesh.len()).sum();
        self.mesh.clear();
        self.translucent_mesh.clear();
        self.mesh.reserve(opaque_len);
        self.translucent_mesh.reserve(translucent_len);
        for s in &self.subchunks {
            self.mesh.extend_from_slice(&s.mesh);
            self.translucent_mesh.extend_from_slice(&s.translucent_mesh);
        }
    }

    #[inline]
    pub fn quad_counts(&self) -> (usize, usize) {
        (self.mesh.len() / 4, self.translucent_mesh.len() / 4)
    }
}

/// Local position on the far side of a horizontal chunk border.
#[inline]
pub(crate) fn mirror_across(l: LocalPos, face: Face) -> LocalPos {
    match face {
        Face::PosX => LocalPos::new(0, l.y, l.z),
        Face::NegX => LocalPos::new(CHUNK_WIDTH - 1, l.y, l.z),
        Face::PosZ => LocalPos::new(l.x, l.y, 0),
        Face::NegZ => LocalPos::new(l.x, l.y, CHUNK_LENGTH - 1),
        Face::PosY => LocalPos::new(l.x, 0, l.z),
        Face::NegY => LocalPos::new(l.x, CHUNK_HEIGHT - 1, l.z),
    }
}
