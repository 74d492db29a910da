use strata_blocks::{AIR, BlockId, BlockRegistry};
use strata_chunk::{CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_WIDTH, Chunk, ChunkCoord, LocalPos};

/// Produces chunks that have never been written to disk.
pub trait TerrainGenerator {
    fn generate(&self, coord: ChunkCoord) -> Chunk;
}

/// Layered flat world: stone below 60, dirt up to 63, grass at 64.
#[derive(Clone, Copy, Debug)]
pub struct FlatGenerator {
    stone: BlockId,
    dirt: BlockId,
    grass: BlockId,
}

pub const DIRT_LEVEL: usize = 60;
pub const SURFACE_LEVEL: usize = 64;

impl FlatGenerator {
    pub fn new(reg: &BlockRegistry) -> Self {
        Self {
            stone: reg.id_by_name("stone").unwrap_or(1),
            dirt: reg.id_by_name("dirt").unwrap_or(3),
            grass: reg.id_by_name("grass").unwrap_or(2),
        }
    }

    fn layer(&self, y: usize) -> BlockId {
        if y < DIRT_LEVEL {
            self.stone
        } else if y < SURFACE_LEVEL {
            self.dirt
        } else if y == SURFACE_LEVEL {
            self.grass
        } else {
            AIR
        }
    }
}

impl TerrainGenerator for FlatGenerator {
    fn generate(&self, coord: ChunkCoord) -> Chunk {
        let mut chunk = Chunk::new(coord);
        for y in 0..=SURFACE_LEVEL.min(CHUNK_HEIGHT - 1) {
            let id = self.layer(y);
            for z in 0..CHUNK_LENGTH {
                for x in 0..CHUNK_WIDTH {
                    chunk.set_block(LocalPos::new(x, y, z), id);
                }
            }
        }
        chunk.modified = true;
        chunk
    }
}
