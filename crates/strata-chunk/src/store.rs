use hashbrown::HashMap;
use strata_blocks::{AIR, BlockId, BlockRegistry, Face};

use crate::chunk::{Chunk, mirror_across};
use crate::coords::{BlockPos, CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_WIDTH, ChunkCoord, LocalPos};
use crate::light::MAX_LIGHT;

/// Handle into [`ChunkStore`]. Valid until the chunk is removed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChunkId(u32);

impl ChunkId {
    #[inline]
    fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Arena of resident chunks keyed by coordinate.
///
/// Each chunk caches the ids of its six neighbors. Links are written on both
/// sides inside [`ChunkStore::insert`] and cleared on both sides inside
/// [`ChunkStore::remove`], so a link from A to B across `face` always has a
/// matching link from B to A across `face.opposite()`.
#[derive(Default, Debug)]
pub struct ChunkStore {
    slots: Vec<Option<Chunk>>,
    free: Vec<u32>,
    index: HashMap<ChunkCoord, ChunkId>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn id_of(&self, coord: ChunkCoord) -> Option<ChunkId> {
        self.index.get(&coord).copied()
    }

    #[inline]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.index.contains_key(&coord)
    }

    #[inline]
    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.slots.get(id.slot()).and_then(|s| s.as_ref())
    }

    #[inline]
    pub fn get_mut(&mut self, id: ChunkId) -> Option<&mut Chunk> {
        self.slots.get_mut(id.slot()).and_then(|s| s.as_mut())
    }

    #[inline]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.id_of(coord).and_then(|id| self.get(id))
    }

    #[inline]
    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.id_of(coord).and_then(move |id| self.get_mut(id))
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.index.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChunkId, &Chunk)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|c| (ChunkId(i as u32), c)))
    }

    /// Makes `chunk` resident and links it with every resident neighbor.
    /// An existing chunk at the same coordinate is replaced in place and
    /// keeps its links.
    pub fn insert(&mut self, mut chunk: Chunk) -> ChunkId {
        let coord = chunk.coord;
        if let Some(id) = self.id_of(coord) {
            if let Some(slot) = self.slots[id.slot()].as_mut() {
                chunk.neighbors = slot.neighbors;
                *slot = chunk;
            }
            return id;
        }

        chunk.neighbors = [None; 6];
        let id = match self.free.pop() {
            Some(i) => {
                self.slots[i as usize] = Some(chunk);
                ChunkId(i)
            }
            None => {
                self.slots.push(Some(chunk));
                ChunkId((self.slots.len() - 1) as u32)
            }
        };
        self.index.insert(coord, id);

        for face in Face::ALL {
            let Some(nid) = self.id_of(coord.neighbor(face)) else {
                continue;
            };
            if let Some(c) = self.get_mut(id) {
                c.neighbors[face.index()] = Some(nid);
            }
            if let Some(n) = self.get_mut(nid) {
                n.neighbors[face.opposite().index()] = Some(id);
            }
        }
        id
    }

    /// Removes a chunk, clearing the links that point at it.
    pub fn remove(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        let id = self.index.remove(&coord)?;
        let mut chunk = self.slots[id.slot()].take()?;
        for face in Face::ALL {
            if let Some(nid) = chunk.neighbors[face.index()].take() {
                if let Some(n) = self.get_mut(nid) {
                    n.neighbors[face.opposite().index()] = None;
                }
            }
        }
        self.free.push(id.0);
        Some(chunk)
    }

    #[inline]
    pub fn neighbor_of(&self, id: ChunkId, face: Face) -> Option<ChunkId> {
        self.get(id).and_then(|c| c.neighbor(face))
    }

    /// Checks that every link is mirrored, points at the adjacent coordinate,
    /// and that every resident adjacent pair is linked.
    pub fn links_are_consistent(&self) -> bool {
        for (id, c) in self.iter() {
            for face in Face::ALL {
                let expected = self.id_of(c.coord.neighbor(face));
                if c.neighbor(face) != expected {
                    return false;
                }
                if let Some(nid) = expected {
                    if self.neighbor_of(nid, face.opposite()) != Some(id) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Resolves the chunk for `target`, trying `from` itself and its direct
    /// neighbors before the coordinate map.
    #[inline]
    pub fn resolve(&self, from: ChunkId, target: ChunkCoord) -> Option<ChunkId> {
        if let Some(c) = self.get(from) {
            if c.coord == target {
                return Some(from);
            }
            for nid in c.neighbors.iter().flatten() {
                if self.get(*nid).is_some_and(|n| n.coord == target) {
                    return Some(*nid);
                }
            }
        }
        self.id_of(target)
    }

    /// Chunk and local position for an in-height world position.
    #[inline]
    pub fn locate(&self, pos: BlockPos) -> Option<(ChunkId, LocalPos)> {
        if !pos.in_height_range() {
            return None;
        }
        self.id_of(pos.chunk()).map(|id| (id, pos.local()))
    }

    #[inline]
    pub fn locate_from(&self, from: ChunkId, pos: BlockPos) -> Option<(ChunkId, LocalPos)> {
        if !pos.in_height_range() {
            return None;
        }
        self.resolve(from, pos.chunk()).map(|id| (id, pos.local()))
    }

    /// Block id at `pos`; air when the chunk is absent or Y is out of range.
    pub fn block_at(&self, pos: BlockPos) -> BlockId {
        self.locate(pos)
            .and_then(|(id, l)| self.get(id).map(|c| c.block(l)))
            .unwrap_or(AIR)
    }

    /// Block light at `pos`; dark when the chunk is absent.
    pub fn block_light_at(&self, pos: BlockPos) -> u8 {
        self.locate(pos)
            .and_then(|(id, l)| self.get(id).map(|c| c.block_light(l)))
            .unwrap_or(0)
    }

    /// Skylight at `pos`. Above the world and in absent chunks the sky is open.
    pub fn skylight_at(&self, pos: BlockPos) -> u8 {
        if pos.y >= CHUNK_HEIGHT as i32 {
            return MAX_LIGHT;
        }
        if pos.y < 0 {
            return 0;
        }
        self.locate(pos)
            .and_then(|(id, l)| self.get(id).map(|c| c.skylight(l)))
            .unwrap_or(MAX_LIGHT)
    }

    #[inline]
    pub fn block_cached(&self, from: ChunkId, pos: BlockPos) -> BlockId {
        self.locate_from(from, pos)
            .and_then(|(id, l)| self.get(id).map(|c| c.block(l)))
            .unwrap_or(AIR)
    }

    #[inline]
    pub fn light_cached(&self, from: ChunkId, pos: BlockPos) -> u8 {
        self.locate_from(from, pos)
            .and_then(|(id, l)| self.get(id).map(|c| c.block_light(l)))
            .unwrap_or(0)
    }

    #[inline]
    pub fn skylight_cached(&self, from: ChunkId, pos: BlockPos) -> u8 {
        if pos.y >= CHUNK_HEIGHT as i32 {
            return MAX_LIGHT;
        }
        if pos.y < 0 {
            return 0;
        }
        self.locate_from(from, pos)
            .and_then(|(id, l)| self.get(id).map(|c| c.skylight(l)))
            .unwrap_or(MAX_LIGHT)
    }

    #[inline]
    pub fn is_opaque_cached(&self, reg: &BlockRegistry, from: ChunkId, pos: BlockPos) -> bool {
        reg.is_opaque(self.block_cached(from, pos))
    }

    /// Flags the subchunks of horizontally adjacent chunks that share a
    /// border with local voxel `l` of chunk `id`.
    pub fn update_border_neighbors(&mut self, id: ChunkId, l: LocalPos) {
        let mut touched = [None; 2];
        if l.x == 0 {
            touched[0] = Some(Face::NegX);
        }
        if l.x == CHUNK_WIDTH - 1 {
            touched[0] = Some(Face::PosX);
        }
        if l.z == 0 {
            touched[1] = Some(Face::NegZ);
        }
        if l.z == CHUNK_LENGTH - 1 {
            touched[1] = Some(Face::PosZ);
        }
        for face in touched.into_iter().flatten() {
            if let Some(nid) = self.neighbor_of(id, face) {
                if let Some(n) = self.get_mut(nid) {
                    n.update_at_position(mirror_across(l, face));
                }
            }
        }
    }
}
