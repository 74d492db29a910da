use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use strata_chunk::{Chunk, ChunkCoord, chunk_pos};
use strata_geom::Vec3;
use strata_world::World;

use crate::error::SaveError;
use crate::generate::TerrainGenerator;
use crate::nbt;
use crate::region::{chunk_path, legacy_path};

/// Running totals since the save system was created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveStats {
    pub saved: usize,
    pub failed: usize,
    pub loaded: usize,
    pub legacy: usize,
    pub generated: usize,
}

/// Owns the on-disk layout and decides which chunks are resident around the
/// player.
pub struct SaveSystem {
    root: PathBuf,
    generator: Box<dyn TerrainGenerator>,
    pending: VecDeque<ChunkCoord>,
    queued: HashSet<ChunkCoord>,
    player_chunk: Option<ChunkCoord>,
    stats: SaveStats,
}

#[inline]
fn ring(a: ChunkCoord, b: ChunkCoord) -> i32 {
    (a.cx - b.cx).abs().max((a.cz - b.cz).abs())
}

#[inline]
fn manhattan(a: ChunkCoord, b: ChunkCoord) -> i32 {
    (a.cx - b.cx).abs() + (a.cz - b.cz).abs()
}

impl SaveSystem {
    pub fn new(root: impl Into<PathBuf>, generator: Box<dyn TerrainGenerator>) -> Self {
        Self {
            root: root.into(),
            generator,
            pending: VecDeque::new(),
            queued: HashSet::new(),
            player_chunk: None,
            stats: SaveStats::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> SaveStats {
        self.stats
    }

    /// Chunk positions still waiting for [`SaveSystem::stream_next`].
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn player_chunk(&self) -> Option<ChunkCoord> {
        self.player_chunk
    }

    /// Writes one resident chunk. Clears `modified` only on success.
    pub fn save_chunk(&mut self, world: &mut World, coord: ChunkCoord) -> bool {
        let Some(chunk) = world.store_mut().chunk_mut(coord) else {
            return false;
        };
        let path = chunk_path(&self.root, coord);
        match nbt::write_chunk_file(&path, chunk.blocks()) {
            Ok(()) => {
                chunk.modified = false;
                self.stats.saved += 1;
                log::debug!("saved chunk ({}, {}) to {}", coord.cx, coord.cz, path.display());
                true
            }
            Err(err) => {
                self.stats.failed += 1;
                log::warn!("failed to save chunk ({}, {}): {err}", coord.cx, coord.cz);
                false
            }
        }
    }

    /// Saves every modified resident chunk; returns how many were written.
    pub fn save_all(&mut self, world: &mut World) -> usize {
        let dirty: Vec<ChunkCoord> = world
            .store()
            .iter()
            .filter(|(_, c)| c.modified)
            .map(|(_, c)| c.coord)
            .collect();
        let saved = dirty
            .into_iter()
            .filter(|&coord| self.save_chunk(world, coord))
            .count();
        log::info!("saved {saved} chunks to {}", self.root.display());
        saved
    }

    fn read_current(&self, coord: ChunkCoord) -> Result<Option<Chunk>, SaveError> {
        let path = chunk_path(&self.root, coord);
        if !path.is_file() {
            return Ok(None);
        }
        let payload = nbt::read_payload(&path)?;
        if payload.is_empty() {
            return Ok(None);
        }
        let blocks = nbt::decode_blocks(&payload)?;
        Ok(Some(Chunk::from_blocks(coord, blocks)))
    }

    fn read_legacy(&self, coord: ChunkCoord) -> Result<Option<Chunk>, SaveError> {
        let path = legacy_path(&self.root, coord);
        if !path.is_file() {
            return Ok(None);
        }
        let raw = fs::read(&path)?;
        if raw.is_empty() {
            return Ok(None);
        }
        let mut chunk = Chunk::from_blocks(coord, nbt::decode_legacy(&raw));
        // rewritten in the current layout on the next save
        chunk.modified = true;
        Ok(Some(chunk))
    }

    /// Produces the chunk for `coord` from the current format, the legacy
    /// flat file, or the generator, in that order.
    pub fn read_chunk(&mut self, coord: ChunkCoord) -> Chunk {
        match self.read_current(coord) {
            Ok(Some(chunk)) => {
                self.stats.loaded += 1;
                return chunk;
            }
            Ok(None) => {}
            Err(err) => log::warn!("chunk ({}, {}) unreadable: {err}", coord.cx, coord.cz),
        }
        match self.read_legacy(coord) {
            Ok(Some(chunk)) => {
                self.stats.legacy += 1;
                log::info!("loaded legacy chunk ({}, {})", coord.cx, coord.cz);
                return chunk;
            }
            Ok(None) => {}
            Err(err) => log::warn!("legacy chunk ({}, {}) unreadable: {err}", coord.cx, coord.cz),
        }
        self.stats.generated += 1;
        self.generator.generate(coord)
    }

    /// Makes `coord` resident. Returns false when it already was.
    pub fn load_chunk(&mut self, world: &mut World, coord: ChunkCoord, eager: bool) -> bool {
        if world.store().contains(coord) {
            return false;
        }
        let chunk = self.read_chunk(coord);
        world.add_chunk(chunk, eager);
        true
    }

    /// Loads everything within `initial_radius` rings of the player now and
    /// queues the rest of the render distance, nearest first.
    pub fn load(&mut self, world: &mut World, player_pos: Vec3, initial_radius: i32) {
        let center = chunk_pos(player_pos);
        self.player_chunk = Some(center);
        let radius = world.config().render_distance.max(0);

        let mut offsets = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                offsets.push(center.offset(dx, 0, dz));
            }
        }
        offsets.sort_by_key(|&c| (manhattan(c, center), ring(c, center)));

        let mut eager = 0;
        for coord in offsets {
            if ring(coord, center) <= initial_radius {
                if self.load_chunk(world, coord, true) {
                    eager += 1;
                }
            } else {
                self.enqueue(world, coord);
            }
        }
        log::info!(
            "loaded {eager} chunks around ({}, {}), {} queued",
            center.cx,
            center.cz,
            self.pending.len()
        );
    }

    fn enqueue(&mut self, world: &World, coord: ChunkCoord) {
        if !world.store().contains(coord) && self.queued.insert(coord) {
            self.pending.push_back(coord);
        }
    }

    /// Loads up to `n` queued chunks with bounded lighting. Positions that
    /// drifted out of range are dropped without counting toward `n`.
    pub fn stream_next(&mut self, world: &mut World, n: usize) -> usize {
        let limit = world.config().unload_distance();
        let mut loaded = 0;
        while loaded < n {
            let Some(coord) = self.pending.pop_front() else {
                break;
            };
            self.queued.remove(&coord);
            if self.player_chunk.is_some_and(|p| ring(coord, p) > limit) {
                continue;
            }
            if self.load_chunk(world, coord, false) {
                loaded += 1;
            }
        }
        loaded
    }

    /// Re-centres streaming on the player. Returns true when the player
    /// entered a new chunk.
    pub fn update_streaming(&mut self, world: &mut World, player_pos: Vec3) -> bool {
        let center = chunk_pos(player_pos);
        if self.player_chunk == Some(center) {
            return false;
        }
        self.player_chunk = Some(center);

        let radius = world.config().render_distance.max(0);
        let r2 = i64::from(radius) * i64::from(radius);
        let mut wanted = Vec::new();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let coord = center.offset(dx, 0, dz);
                if coord.distance_sq(center) <= r2 {
                    wanted.push(coord);
                }
            }
        }
        wanted.sort_by_key(|&c| (c.distance_sq(center), ring(c, center)));
        for coord in wanted {
            self.enqueue(world, coord);
        }

        let limit = world.config().unload_distance();
        let far: Vec<ChunkCoord> = world
            .store()
            .coords()
            .filter(|&c| ring(c, center) > limit)
            .collect();
        let mut unloaded = 0;
        for coord in far {
            if self.unload_chunk(world, coord) {
                unloaded += 1;
            }
        }
        log::debug!(
            "player entered ({}, {}): {} queued, {unloaded} unloaded",
            center.cx,
            center.cz,
            self.pending.len()
        );
        true
    }

    /// Saves if modified, then drops the chunk. A chunk whose save fails
    /// stays resident.
    pub fn unload_chunk(&mut self, world: &mut World, coord: ChunkCoord) -> bool {
        let Some(modified) = world.store().chunk(coord).map(|c| c.modified) else {
            return false;
        };
        if modified && !self.save_chunk(world, coord) {
            return false;
        }
        world.remove_chunk(coord).is_some()
    }
}
