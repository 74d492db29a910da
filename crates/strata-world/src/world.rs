use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashSet;
use strata_blocks::{AIR, BlockId, BlockRegistry, Face};
use strata_chunk::light::MAX_LIGHT;
use strata_chunk::{
    BlockPos, CHUNK_LENGTH, CHUNK_WIDTH, Chunk, ChunkCoord, ChunkId, ChunkStore, PackedVertex,
};
use strata_geom::{Aabb, Vec3};
use strata_lighting::{Budget, LightQueues, Lighting};
use strata_mesh_cpu::{NullBackend, RenderBackend, process_chunk_updates, upload_chunk};

use crate::clock::DayClock;
use crate::config::EngineConfig;

/// Work done by one [`World::tick`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub subchunks_rebuilt: usize,
    pub chunks_merged: usize,
    pub light_steps: usize,
}

/// Resident chunks plus everything needed to keep their light and meshes
/// current.
pub struct World {
    reg: Arc<BlockRegistry>,
    config: EngineConfig,
    store: ChunkStore,
    queues: LightQueues,
    /// Far to near after [`World::prepare_rendering`].
    visible: Vec<ChunkCoord>,
    build_queue: VecDeque<ChunkCoord>,
    queued_builds: HashSet<ChunkCoord>,
    clock: DayClock,
    elapsed: f64,
    backend: Box<dyn RenderBackend>,
}

impl World {
    pub fn new(reg: Arc<BlockRegistry>, config: EngineConfig) -> Self {
        let clock = DayClock::new(config.day_length_ticks);
        Self {
            reg,
            config,
            store: ChunkStore::new(),
            queues: LightQueues::new(),
            visible: Vec::new(),
            build_queue: VecDeque::new(),
            queued_builds: HashSet::new(),
            clock,
            elapsed: 0.0,
            backend: Box::new(NullBackend::default()),
        }
    }

    pub fn with_backend(mut self, backend: Box<dyn RenderBackend>) -> Self {
        self.backend = backend;
        self
    }

    #[inline]
    pub fn registry(&self) -> &BlockRegistry {
        &self.reg
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut ChunkStore {
        &mut self.store
    }

    #[inline]
    pub fn clock(&self) -> &DayClock {
        &self.clock
    }

    #[inline]
    pub fn daylight(&self) -> f32 {
        self.clock.daylight()
    }

    /// Seconds of `dt` fed to [`World::tick`] so far.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[inline]
    pub fn get_block(&self, pos: BlockPos) -> BlockId {
        self.store.block_at(pos)
    }

    #[inline]
    pub fn get_light(&self, pos: BlockPos) -> u8 {
        self.store.block_light_at(pos)
    }

    #[inline]
    pub fn get_skylight(&self, pos: BlockPos) -> u8 {
        self.store.skylight_at(pos)
    }

    #[inline]
    pub fn is_opaque_block(&self, pos: BlockPos) -> bool {
        self.reg.is_opaque(self.get_block(pos))
    }

    /// Writes one voxel and relights around it. Returns whether anything
    /// changed.
    pub fn set_block(&mut self, pos: BlockPos, id: BlockId) -> bool {
        if !pos.in_height_range() {
            return false;
        }
        if id != AIR && self.reg.get(id).is_none() {
            log::warn!("rejecting unregistered block id {id} at {pos:?}");
            return false;
        }
        let coord = pos.chunk();
        let cid = match self.store.id_of(coord) {
            Some(cid) => cid,
            None if id == AIR => return false,
            None => {
                log::debug!("creating chunk {coord:?} for write at {pos:?}");
                self.add_chunk(Chunk::new(coord), true)
            }
        };
        let l = pos.local();
        let Some(chunk) = self.store.get_mut(cid) else {
            return false;
        };
        let old = chunk.block(l);
        if old == id {
            return false;
        }
        chunk.set_block(l, id);
        chunk.modified = true;
        chunk.update_at_position(l);
        self.store.update_border_neighbors(cid, l);
        self.relight(pos, id);
        true
    }

    /// Like [`World::set_block`], but refuses non-air blocks whose colliders
    /// would overlap `volume`. A refused write leaves the world untouched.
    pub fn try_set_block(&mut self, pos: BlockPos, id: BlockId, volume: &Aabb) -> bool {
        if id != AIR {
            if let Some(ty) = self.reg.get(id) {
                let at = pos.as_vec3();
                if ty
                    .colliders
                    .iter()
                    .any(|c| c.translated(at).intersects(volume))
                {
                    return false;
                }
            }
        }
        self.set_block(pos, id)
    }

    fn relight(&mut self, pos: BlockPos, id: BlockId) {
        let reg = Arc::clone(&self.reg);
        let opaque = reg.is_opaque(id);
        let emission = reg.emission(id);
        let block_light = self.store.block_light_at(pos);
        let sky = self.store.skylight_at(pos);
        let mut lit = Lighting::new(&mut self.store, &reg, &mut self.queues, true);

        if emission > 0 {
            if block_light > emission {
                lit.decrease_light(pos);
            }
            lit.increase_light(pos, emission);
        } else if block_light > 0 {
            lit.decrease_light(pos);
        }

        if opaque {
            if sky == MAX_LIGHT {
                lit.strip_sky_column(pos);
            } else if sky > 0 {
                lit.decrease_skylight(pos);
            }
        } else {
            lit.refill_from_neighbors(pos);
            lit.run(Budget::Unbounded);
        }
    }

    /// Inserts a chunk, lights it from its own columns, emitters and resident
    /// neighbors, and queues it and its neighbors for remeshing.
    ///
    /// With `eager` every pending light entry is drained before returning;
    /// otherwise the per-tick budget applies and the rest finishes in
    /// [`World::tick`].
    pub fn add_chunk(&mut self, chunk: Chunk, eager: bool) -> ChunkId {
        let coord = chunk.coord;
        let id = self.store.insert(chunk);
        let budget = if eager {
            Budget::Unbounded
        } else {
            Budget::Steps(self.config.light_steps_per_tick)
        };
        let mut lit = Lighting::new(&mut self.store, &self.reg, &mut self.queues, false);
        lit.init_skylight(id);
        lit.stitch_borders(id);
        lit.seed_emitters(id);
        lit.run(budget);

        if let Some(c) = self.store.get_mut(id) {
            c.update_subchunk_meshes();
        }
        for face in [Face::PosX, Face::NegX, Face::PosZ, Face::NegZ] {
            if let Some(n) = self
                .store
                .neighbor_of(id, face)
                .and_then(|nid| self.store.get_mut(nid))
            {
                n.update_subchunk_meshes();
            }
        }
        if !self.visible.contains(&coord) {
            self.visible.push(coord);
        }
        id
    }

    /// Drops a chunk from residency without saving it.
    pub fn remove_chunk(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        let chunk = self.store.remove(coord)?;
        self.visible.retain(|c| *c != coord);
        self.build_queue.retain(|c| *c != coord);
        self.queued_builds.remove(&coord);
        self.backend.release(coord);
        Some(chunk)
    }

    /// Advances the clock, merges one finished chunk, rebuilds a bounded
    /// number of dirty subchunks per visible chunk and spends the light
    /// budget.
    pub fn tick(&mut self, dt: f32) -> TickStats {
        let mut stats = TickStats::default();
        self.clock.step();
        self.elapsed += f64::from(dt);

        if let Some(coord) = self.build_queue.pop_front() {
            self.queued_builds.remove(&coord);
            if let Some(chunk) = self.store.chunk_mut(coord) {
                upload_chunk(chunk, self.backend.as_mut());
                stats.chunks_merged += 1;
            }
        }

        let opts = self.config.mesh_options();
        for i in 0..self.visible.len() {
            let coord = self.visible[i];
            let Some(id) = self.store.id_of(coord) else {
                continue;
            };
            let update =
                process_chunk_updates(&mut self.store, &self.reg, id, self.config.chunk_updates, opts);
            stats.subchunks_rebuilt += update.rebuilt;
            if update.needs_merge && self.queued_builds.insert(coord) {
                self.build_queue.push_back(coord);
            }
        }

        let mut lit = Lighting::new(&mut self.store, &self.reg, &mut self.queues, true);
        stats.light_steps = lit.run(Budget::Steps(self.config.light_steps_per_tick));
        stats
    }

    /// Rebuilds the visible list from resident chunks accepted by `in_view`,
    /// farthest first.
    pub fn prepare_rendering(&mut self, viewer: Vec3, in_view: impl Fn(ChunkCoord) -> bool) {
        let mut keyed: Vec<(f32, ChunkCoord)> = self
            .store
            .coords()
            .filter(|c| in_view(*c))
            .map(|c| {
                let o = c.origin();
                let dx = o.x as f32 + CHUNK_WIDTH as f32 / 2.0 - viewer.x;
                let dz = o.z as f32 + CHUNK_LENGTH as f32 / 2.0 - viewer.z;
                (dx * dx + dz * dz, c)
            })
            .collect();
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
        self.visible = keyed.into_iter().map(|(_, c)| c).collect();
    }

    #[inline]
    pub fn visible_chunks(&self) -> &[ChunkCoord] {
        &self.visible
    }

    /// Merged opaque and translucent buffers of a resident chunk.
    pub fn chunk_mesh(&self, coord: ChunkCoord) -> Option<(&[PackedVertex], &[PackedVertex])> {
        self.store
            .chunk(coord)
            .map(|c| (c.mesh.as_slice(), c.translucent_mesh.as_slice()))
    }

    #[inline]
    pub fn pending_light(&self) -> usize {
        self.queues.len()
    }

    #[inline]
    pub fn pending_builds(&self) -> usize {
        self.build_queue.len()
    }

    pub fn pending_subchunk_updates(&self) -> usize {
        self.store.iter().map(|(_, c)| c.pending_updates()).sum()
    }

    /// True once lighting, subchunk rebuilds and merges have all drained.
    pub fn is_settled(&self) -> bool {
        self.pending_light() == 0
            && self.pending_builds() == 0
            && self.pending_subchunk_updates() == 0
    }
}
