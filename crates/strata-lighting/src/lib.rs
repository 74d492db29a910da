//! Block-light and skylight flood fill over resident chunks.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use strata_blocks::{AIR, BlockRegistry, Face};
use strata_chunk::light::MAX_LIGHT;
use strata_chunk::{
    BlockPos, CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_WIDTH, ChunkId, ChunkStore, LocalPos,
};


/// World position and the light level it carries.
pub type LightNode = (BlockPos, u8);

/// Pending flood-fill work. Entries are transient and never persisted.
#[derive(Default, Debug)]
pub struct LightQueues {
    pub block_increase: VecDeque<LightNode>,
    pub block_decrease: VecDeque<LightNode>,
    pub sky_increase: VecDeque<LightNode>,
    pub sky_decrease: VecDeque<LightNode>,
}

impl LightQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.block_increase.len()
            + self.block_decrease.len()
            + self.sky_increase.len()
            + self.sky_decrease.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.block_increase.clear();
        self.block_decrease.clear();
        self.sky_increase.clear();
        self.sky_decrease.clear();
    }
}

/// Number of queue entries a propagation call may pop.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Budget {
    Unbounded,
    Steps(usize),
}

impl Budget {
    #[inline]
    fn limit(self) -> usize {
        match self {
            Budget::Unbounded => usize::MAX,
            Budget::Steps(n) => n,
        }
    }

    #[inline]
    fn spend(self, used: usize) -> Budget {
        match self {
            Budget::Unbounded => Budget::Unbounded,
            Budget::Steps(n) => Budget::Steps(n.saturating_sub(used)),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Channel {
    Block,
    Sky,
}

/// Borrowed view over the chunk arena and queues for one lighting pass.
pub struct Lighting<'a> {
    pub store: &'a mut ChunkStore,
    pub reg: &'a BlockRegistry,
    pub queues: &'a mut LightQueues,
    /// Flag touched subchunks (and seam neighbors) for remeshing.
    pub mark_dirty: bool,
}

impl<'a> Lighting<'a> {
    pub fn new(
        store: &'a mut ChunkStore,
        reg: &'a BlockRegistry,
        queues: &'a mut LightQueues,
        mark_dirty: bool,
    ) -> Self {
        Self {
            store,
            reg,
            queues,
            mark_dirty,
        }
    }

    #[inline]
    fn read(&self, ch: Channel, id: ChunkId, l: LocalPos) -> u8 {
        match self.store.get(id) {
            Some(c) => match ch {
                Channel::Block => c.block_light(l),
                Channel::Sky => c.skylight(l),
            },
            None => 0,
        }
    }

    #[inline]
    fn write(&mut self, ch: Channel, id: ChunkId, l: LocalPos, level: u8) {
        let mark = self.mark_dirty;
        if let Some(c) = self.store.get_mut(id) {
            match ch {
                Channel::Block => c.set_block_light(l, level),
                Channel::Sky => c.set_skylight(l, level),
            }
            if mark {
                c.update_at_position(l);
            }
        }
        if mark {
            self.store.update_border_neighbors(id, l);
        }
    }

    #[inline]
    fn opaque(&self, id: ChunkId, l: LocalPos) -> bool {
        self.store
            .get(id)
            .is_some_and(|c| self.reg.is_opaque(c.block(l)))
    }

    /// Pops block-light increase entries, raising darker see-through
    /// neighbors to `level - 1`.
    pub fn propagate_block_increase(&mut self, budget: Budget) -> usize {
        let limit = budget.limit();
        let mut steps = 0;
        while steps < limit {
            let Some((pos, level)) = self.queues.block_increase.pop_front() else {
                break;
            };
            steps += 1;
            let Some(from) = self.store.id_of(pos.chunk()) else {
                continue;
            };
            for face in Face::ALL {
                let n = pos.step(face);
                let Some((nid, nl)) = self.store.locate_from(from, n) else {
                    continue;
                };
                if self.opaque(nid, nl) {
                    continue;
                }
                if self.read(Channel::Block, nid, nl) + 2 <= level {
                    self.write(Channel::Block, nid, nl, level - 1);
                    self.queues.block_increase.push_back((n, level - 1));
                }
            }
        }
        steps
    }

    /// Pops block-light decrease entries, clearing light that came from the
    /// removed level and re-queueing brighter neighbors for refill.
    pub fn propagate_block_decrease(&mut self, budget: Budget) -> usize {
        let limit = budget.limit();
        let mut steps = 0;
        while steps < limit {
            let Some((pos, level)) = self.queues.block_decrease.pop_front() else {
                break;
            };
            steps += 1;
            let Some(from) = self.store.id_of(pos.chunk()) else {
                continue;
            };
            for face in Face::ALL {
                let n = pos.step(face);
                let Some((nid, nl)) = self.store.locate_from(from, n) else {
                    continue;
                };
                let current = self.read(Channel::Block, nid, nl);
                if current == 0 {
                    continue;
                }
                if current < level {
                    self.write(Channel::Block, nid, nl, 0);
                    self.queues.block_decrease.push_back((n, current));
                    let emission = self
                        .store
                        .get(nid)
                        .map_or(0, |c| self.reg.emission(c.block(nl)));
                    if emission > 0 {
                        self.write(Channel::Block, nid, nl, emission);
                        self.queues.block_increase.push_back((n, emission));
                    }
                } else {
                    self.queues.block_increase.push_back((n, current));
                }
            }
        }
        steps
    }

    /// Pops skylight increase entries. Light moving straight down through air
    /// or glass keeps its level; every other hop costs one.
    pub fn propagate_sky_increase(&mut self, budget: Budget) -> usize {
        let limit = budget.limit();
        let mut steps = 0;
        while steps < limit {
            let Some((pos, level)) = self.queues.sky_increase.pop_front() else {
                break;
            };
            steps += 1;
            let from = self.store.id_of(pos.chunk());
            for face in Face::ALL {
                let n = pos.step(face);
                let located = match from {
                    Some(from) => self.store.locate_from(from, n),
                    None => self.store.locate(n),
                };
                let Some((nid, nl)) = located else {
                    continue;
                };
                let Some(block) = self.store.get(nid).map(|c| c.block(nl)) else {
                    continue;
                };
                if self.reg.is_opaque(block) {
                    continue;
                }
                let decay = if face == Face::NegY && (block == AIR || self.reg.is_glass(block)) {
                    0
                } else {
                    1
                };
                let lit = level.saturating_sub(decay);
                if lit > 0 && lit > self.read(Channel::Sky, nid, nl) {
                    self.write(Channel::Sky, nid, nl, lit);
                    self.queues.sky_increase.push_back((n, lit));
                }
            }
        }
        steps
    }

    /// Pops skylight decrease entries. Voxels directly below a cleared voxel
    /// are always cleared; brighter side neighbors are re-queued for refill.
    pub fn propagate_sky_decrease(&mut self, budget: Budget) -> usize {
        let limit = budget.limit();
        let mut steps = 0;
        while steps < limit {
            let Some((pos, level)) = self.queues.sky_decrease.pop_front() else {
                break;
            };
            steps += 1;
            let Some(from) = self.store.id_of(pos.chunk()) else {
                continue;
            };
            for face in Face::ALL {
                let n = pos.step(face);
                let Some((nid, nl)) = self.store.locate_from(from, n) else {
                    continue;
                };
                let current = self.read(Channel::Sky, nid, nl);
                if current == 0 {
                    continue;
                }
                if face == Face::NegY || current < level {
                    self.write(Channel::Sky, nid, nl, 0);
                    self.queues.sky_decrease.push_back((n, current));
                } else {
                    self.queues.sky_increase.push_back((n, current));
                }
            }
        }
        steps
    }

    /// Runs all four passes under one shared budget. Increase passes only run
    /// once their channel's decrease queue is empty.
    pub fn run(&mut self, budget: Budget) -> usize {
        let mut used = self.propagate_block_decrease(budget);
        if self.queues.block_decrease.is_empty() {
            used += self.propagate_block_increase(budget.spend(used));
        }
        used += self.propagate_sky_decrease(budget.spend(used));
        if self.queues.sky_decrease.is_empty() {
            used += self.propagate_sky_increase(budget.spend(used));
        }
        used
    }

    /// Sets block light at `pos` and floods outward.
    pub fn increase_light(&mut self, pos: BlockPos, level: u8) {
        let Some((id, l)) = self.store.locate(pos) else {
            return;
        };
        let level = level.min(MAX_LIGHT);
        self.write(Channel::Block, id, l, level);
        self.queues.block_increase.push_back((pos, level));
        self.propagate_block_increase(Budget::Unbounded);
    }

    /// Clears block light at `pos` and everything that depended on it, then
    /// refills from surviving sources.
    pub fn decrease_light(&mut self, pos: BlockPos) {
        let Some((id, l)) = self.store.locate(pos) else {
            return;
        };
        let old = self.read(Channel::Block, id, l);
        self.write(Channel::Block, id, l, 0);
        self.queues.block_decrease.push_back((pos, old));
        self.propagate_block_decrease(Budget::Unbounded);
        self.propagate_block_increase(Budget::Unbounded);
    }

    /// Clears skylight at `pos` and everything that depended on it, then
    /// refills.
    pub fn decrease_skylight(&mut self, pos: BlockPos) {
        let Some((id, l)) = self.store.locate(pos) else {
            return;
        };
        let old = self.read(Channel::Sky, id, l);
        self.write(Channel::Sky, id, l, 0);
        self.queues.sky_decrease.push_back((pos, old));
        self.propagate_sky_decrease(Budget::Unbounded);
        self.propagate_sky_increase(Budget::Unbounded);
    }

    /// Sunlight was cut off at `pos`: clears the lit run below it in one walk,
    /// then lets the general passes settle the edges.
    pub fn strip_sky_column(&mut self, pos: BlockPos) {
        let Some((id, l)) = self.store.locate(pos) else {
            return;
        };
        let old = self.read(Channel::Sky, id, l);
        self.write(Channel::Sky, id, l, 0);
        self.queues.sky_decrease.push_back((pos, old));
        for y in (0..l.y).rev() {
            let below = LocalPos::new(l.x, y, l.z);
            if self.opaque(id, below) {
                break;
            }
            let lit = self.read(Channel::Sky, id, below);
            if lit == 0 {
                break;
            }
            self.write(Channel::Sky, id, below, 0);
            self.queues
                .sky_decrease
                .push_back((BlockPos::new(pos.x, y as i32, pos.z), lit));
        }
        self.propagate_sky_decrease(Budget::Unbounded);
        self.propagate_sky_increase(Budget::Unbounded);
    }

    /// Seeds increase entries from every resident neighbor of a voxel that
    /// just became see-through. Above the world counts as open sky.
    pub fn refill_from_neighbors(&mut self, pos: BlockPos) {
        for face in Face::ALL {
            let n = pos.step(face);
            if n.y >= CHUNK_HEIGHT as i32 {
                self.queues.sky_increase.push_back((n, MAX_LIGHT));
                continue;
            }
            let Some((nid, nl)) = self.store.locate(n) else {
                continue;
            };
            let block = self.read(Channel::Block, nid, nl);
            if block > 0 {
                self.queues.block_increase.push_back((n, block));
            }
            let sky = self.read(Channel::Sky, nid, nl);
            if sky > 0 {
                self.queues.sky_increase.push_back((n, sky));
            }
        }
    }

    /// Column-wise sunlight for a freshly resident chunk: 15 above the
    /// topmost opaque voxel of each column, 0 from there down.
    ///
    /// Only sunlit voxels that can still raise something are queued: those
    /// beside a taller in-chunk column, and border voxels facing a resident
    /// neighbor.
    pub fn init_skylight(&mut self, id: ChunkId) {
        let Some(chunk) = self.store.get(id) else {
            return;
        };
        let coord = chunk.coord;
        let mut heights = [[-1i32; CHUNK_LENGTH]; CHUNK_WIDTH];
        for (x, column) in heights.iter_mut().enumerate() {
            for (z, h) in column.iter_mut().enumerate() {
                *h = (0..CHUNK_HEIGHT)
                    .rev()
                    .find(|&y| self.reg.is_opaque(chunk.block(LocalPos::new(x, y, z))))
                    .map_or(-1, |y| y as i32);
            }
        }
        let open = [
            (Face::NegX, self.store.neighbor_of(id, Face::NegX).is_some()),
            (Face::PosX, self.store.neighbor_of(id, Face::PosX).is_some()),
            (Face::NegZ, self.store.neighbor_of(id, Face::NegZ).is_some()),
            (Face::PosZ, self.store.neighbor_of(id, Face::PosZ).is_some()),
        ];

        let Some(chunk) = self.store.get_mut(id) else {
            return;
        };
        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_LENGTH {
                let h = heights[x][z];
                for y in 0..CHUNK_HEIGHT {
                    let level = if y as i32 > h { MAX_LIGHT } else { 0 };
                    chunk.set_skylight(LocalPos::new(x, y, z), level);
                }
            }
        }

        let origin = coord.origin();
        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_LENGTH {
                let on_border = open.iter().any(|&(face, resident)| {
                    resident
                        && match face {
                            Face::NegX => x == 0,
                            Face::PosX => x == CHUNK_WIDTH - 1,
                            Face::NegZ => z == 0,
                            _ => z == CHUNK_LENGTH - 1,
                        }
                });
                let mut tallest_side = -1;
                for (dx, dz) in [(-1i32, 0i32), (1, 0), (0, -1), (0, 1)] {
                    let nx = x as i32 + dx;
                    let nz = z as i32 + dz;
                    if (0..CHUNK_WIDTH as i32).contains(&nx) && (0..CHUNK_LENGTH as i32).contains(&nz)
                    {
                        tallest_side = tallest_side.max(heights[nx as usize][nz as usize]);
                    }
                }
                let top = if on_border {
                    CHUNK_HEIGHT as i32 - 1
                } else {
                    tallest_side
                };
                for y in (heights[x][z] + 1)..=top {
                    self.queues.sky_increase.push_back((
                        origin.offset(x as i32, y, z as i32),
                        MAX_LIGHT,
                    ));
                }
            }
        }
    }

    /// Pulls skylight and block light in across the four horizontal borders
    /// from resident neighbors.
    pub fn stitch_borders(&mut self, id: ChunkId) {
        let Some(coord) = self.store.get(id).map(|c| c.coord) else {
            return;
        };
        for face in [Face::NegX, Face::PosX, Face::NegZ, Face::PosZ] {
            let Some(nid) = self.store.neighbor_of(id, face) else {
                continue;
            };
            for y in 0..CHUNK_HEIGHT {
                for i in 0..CHUNK_WIDTH.max(CHUNK_LENGTH) {
                    let (mine, theirs) = match face {
                        Face::NegX if i < CHUNK_LENGTH => {
                            (LocalPos::new(0, y, i), LocalPos::new(CHUNK_WIDTH - 1, y, i))
                        }
                        Face::PosX if i < CHUNK_LENGTH => {
                            (LocalPos::new(CHUNK_WIDTH - 1, y, i), LocalPos::new(0, y, i))
                        }
                        Face::NegZ if i < CHUNK_WIDTH => {
                            (LocalPos::new(i, y, 0), LocalPos::new(i, y, CHUNK_LENGTH - 1))
                        }
                        Face::PosZ if i < CHUNK_WIDTH => {
                            (LocalPos::new(i, y, CHUNK_LENGTH - 1), LocalPos::new(i, y, 0))
                        }
                        _ => continue,
                    };
                    if self.opaque(id, mine) {
                        continue;
                    }
                    let pos = mine.to_world(coord);
                    for ch in [Channel::Sky, Channel::Block] {
                        let outside = self.read(ch, nid, theirs);
                        let inside = self.read(ch, id, mine);
                        if outside > 1 && outside - 1 > inside {
                            self.write(ch, id, mine, outside - 1);
                            let queue = match ch {
                                Channel::Sky => &mut self.queues.sky_increase,
                                Channel::Block => &mut self.queues.block_increase,
                            };
                            queue.push_back((pos, outside - 1));
                        }
                    }
                }
            }
        }
    }

    /// Lights every emitting block in the chunk at its emission level.
    pub fn seed_emitters(&mut self, id: ChunkId) {
        let Some(chunk) = self.store.get(id) else {
            return;
        };
        let coord = chunk.coord;
        let mut found = Vec::new();
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_LENGTH {
                for x in 0..CHUNK_WIDTH {
                    let l = LocalPos::new(x, y, z);
                    let emission = self.reg.emission(chunk.block(l));
                    if emission > chunk.block_light(l) {
                        found.push((l, emission));
                    }
                }
            }
        }
        for (l, emission) in found {
            self.write(Channel::Block, id, l, emission);
            self.queues
                .block_increase
                .push_back((l.to_world(coord), emission));
        }
    }
}
