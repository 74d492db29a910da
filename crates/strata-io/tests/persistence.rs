use std::cell::Cell;
use std::fs;
use std::rc::Rc;
use std::sync::Arc;

use strata_blocks::{AIR, BlockRegistry};
use strata_chunk::{BlockPos, CHUNK_VOLUME, Chunk, ChunkCoord, LocalPos, PackedVertex};
use strata_geom::Vec3;
use strata_io::region::{chunk_path, legacy_path, staging_path};
use strata_io::{FlatGenerator, SaveSystem};
use strata_mesh_cpu::RenderBackend;
use strata_world::{EngineConfig, World};
use tempfile::TempDir;

const BLOCKS_TOML: &str = include_str!("../../../assets/blocks.toml");

fn registry() -> Arc<BlockRegistry> {
    Arc::new(BlockRegistry::from_toml_str(BLOCKS_TOML).unwrap())
}

fn world_with_radius(radius: i32) -> World {
    let config = EngineConfig {
        render_distance: radius,
        ..EngineConfig::default()
    };
    World::new(registry(), config)
}

fn saves(root: &std::path::Path, w: &World) -> SaveSystem {
    SaveSystem::new(root, Box::new(FlatGenerator::new(w.registry())))
}

struct CountingBackend {
    releases: Rc<Cell<usize>>,
}

impl RenderBackend for CountingBackend {
    fn upload_opaque(&mut self, _coord: ChunkCoord, _vertices: &[PackedVertex]) {}
    fn upload_translucent(&mut self, _coord: ChunkCoord, _vertices: &[PackedVertex]) {}
    fn release(&mut self, _coord: ChunkCoord) {
        self.releases.set(self.releases.get() + 1);
    }
}

#[test]
fn saved_blocks_come_back_identical() {
    let dir = TempDir::new().unwrap();
    let coord = ChunkCoord::column(-3, 5);
    let mut blocks = vec![AIR; CHUNK_VOLUME];
    for (i, b) in blocks.iter_mut().enumerate().step_by(97) {
        *b = (i % 3) as u8 + 1;
    }
    blocks[LocalPos::new(15, 127, 15).index()] = 255;
    let expected = blocks.clone();

    let mut w = world_with_radius(2);
    let mut save = saves(dir.path(), &w);
    w.add_chunk(Chunk::from_blocks(coord, blocks), true);
    assert!(save.save_chunk(&mut w, coord));
    assert!(!w.store().chunk(coord).unwrap().modified);

    let bytes = fs::read(chunk_path(dir.path(), coord)).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    let mut fresh = world_with_radius(2);
    let mut save = saves(dir.path(), &fresh);
    assert!(save.load_chunk(&mut fresh, coord, true));
    assert!(!save.load_chunk(&mut fresh, coord, true));
    let loaded = fresh.store().chunk(coord).unwrap();
    assert_eq!(loaded.blocks(), expected.as_slice());
    assert!(!loaded.modified);
    assert_eq!(save.stats().loaded, 1);
    assert_eq!(save.stats().generated, 0);
}

#[test]
fn all_air_chunk_is_valid_data() {
    let dir = TempDir::new().unwrap();
    let coord = ChunkCoord::column(0, 0);
    let mut w = world_with_radius(2);
    let mut save = saves(dir.path(), &w);
    w.add_chunk(Chunk::new(coord), true);
    assert!(save.save_chunk(&mut w, coord));

    let mut fresh = world_with_radius(2);
    let mut save = saves(dir.path(), &fresh);
    save.load_chunk(&mut fresh, coord, true);
    assert!(fresh.store().chunk(coord).unwrap().is_all_air());
    assert_eq!(save.stats().generated, 0);
    assert_eq!(fresh.get_skylight(BlockPos::new(4, 0, 4)), 15);
}

#[test]
fn unreadable_or_empty_files_fall_back_to_generation() {
    let dir = TempDir::new().unwrap();
    let corrupt = ChunkCoord::column(1, 1);
    let empty = ChunkCoord::column(2, 1);
    for (coord, data) in [(corrupt, b"not a chunk at all".to_vec()), (empty, Vec::new())] {
        let path = chunk_path(dir.path(), coord);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    let mut w = world_with_radius(2);
    let mut save = saves(dir.path(), &w);
    assert!(save.load_chunk(&mut w, corrupt, true));
    assert!(save.load_chunk(&mut w, empty, true));
    assert_eq!(save.stats().generated, 2);
    let grass = w.registry().id_by_name("grass").unwrap();
    assert_eq!(w.get_block(BlockPos::new(16, 64, 16)), grass);
    assert_eq!(w.get_block(BlockPos::new(33, 64, 17)), grass);
    assert!(w.store().chunk(corrupt).unwrap().modified);
}

#[test]
fn legacy_flat_file_is_read_and_marked_for_rewrite() {
    let dir = TempDir::new().unwrap();
    let coord = ChunkCoord::column(-1, 70);
    let mut raw = vec![0u8; CHUNK_VOLUME];
    // x = 2, y = 3, z = 4 with z fastest
    raw[2 * 16 * 128 + 3 * 16 + 4] = 1;
    fs::write(legacy_path(dir.path(), coord), raw).unwrap();

    let mut w = world_with_radius(2);
    let mut save = saves(dir.path(), &w);
    save.load_chunk(&mut w, coord, true);
    assert_eq!(save.stats().legacy, 1);
    let origin = coord.origin();
    assert_eq!(w.get_block(origin.offset(2, 3, 4)), 1);
    assert_eq!(w.get_block(origin.offset(4, 3, 2)), AIR);
    assert!(w.store().chunk(coord).unwrap().modified);

    assert!(save.save_chunk(&mut w, coord));
    assert!(chunk_path(dir.path(), coord).is_file());
}

#[test]
fn load_far_from_origin_centres_on_the_player() {
    let dir = TempDir::new().unwrap();
    let mut w = world_with_radius(2);
    let mut save = saves(dir.path(), &w);
    save.load(&mut w, Vec3::new(1000.0, 70.0, -1000.0), 1);

    let center = ChunkCoord::column(62, -63);
    assert_eq!(save.player_chunk(), Some(center));
    assert!(w.store().contains(center));
    assert!(!w.store().contains(ChunkCoord::column(0, 0)));
    assert_eq!(w.store().len(), 9);
    assert_eq!(save.pending(), 16);

    assert_eq!(save.stream_next(&mut w, 5), 5);
    assert_eq!(w.store().len(), 14);
    while save.stream_next(&mut w, 4) > 0 {}
    assert_eq!(w.store().len(), 25);
    assert_eq!(save.pending(), 0);
    assert!(!w.store().contains(ChunkCoord::column(0, 0)));
    assert!(w.store().links_are_consistent());
}

#[test]
fn streaming_queues_ahead_and_unloads_behind() {
    let dir = TempDir::new().unwrap();
    let releases = Rc::new(Cell::new(0));
    let mut w = world_with_radius(2).with_backend(Box::new(CountingBackend {
        releases: Rc::clone(&releases),
    }));
    let mut save = saves(dir.path(), &w);
    save.load(&mut w, Vec3::new(8.0, 70.0, 8.0), 2);
    assert_eq!(w.store().len(), 25);
    assert!(!save.update_streaming(&mut w, Vec3::new(12.0, 90.0, 3.0)));

    // ten chunks east: every resident chunk is past render distance + 3
    assert!(save.update_streaming(&mut w, Vec3::new(168.0, 70.0, 8.0)));
    assert_eq!(w.store().len(), 0);
    assert_eq!(releases.get(), 25);
    assert_eq!(save.stats().saved, 25);
    assert!(chunk_path(dir.path(), ChunkCoord::column(-2, 2)).is_file());
    // circular radius 2 holds 13 chunks
    assert_eq!(save.pending(), 13);

    while save.stream_next(&mut w, 8) > 0 {}
    assert_eq!(w.store().len(), 13);
    assert!(w.store().contains(ChunkCoord::column(10, 0)));
    assert!(!w.store().contains(ChunkCoord::column(12, 2)));

    // coming back reads the saved files instead of generating
    let generated = save.stats().generated;
    save.update_streaming(&mut w, Vec3::new(8.0, 70.0, 8.0));
    while save.stream_next(&mut w, 8) > 0 {}
    assert_eq!(save.stats().generated, generated);
    assert_eq!(save.stats().loaded, 13);
}

#[test]
fn stale_queue_entries_are_skipped() {
    let dir = TempDir::new().unwrap();
    let mut w = world_with_radius(2);
    let mut save = saves(dir.path(), &w);
    save.load(&mut w, Vec3::new(8.0, 70.0, 8.0), 0);
    assert_eq!(save.pending(), 24);
    save.update_streaming(&mut w, Vec3::new(8.0 + 16.0 * 30.0, 70.0, 8.0));
    while save.stream_next(&mut w, 100) > 0 {}
    assert!(w.store().coords().all(|c| (c.cx - 30).abs() <= 2 && c.cz.abs() <= 2));
    assert_eq!(w.store().len(), 13);
}

#[test]
fn failed_save_keeps_chunk_dirty_and_resident() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let mut w = world_with_radius(2);
    // the save root is a regular file, so no directory can be created under it
    let mut save = saves(blocker.path(), &w);
    let coord = ChunkCoord::column(0, 0);
    save.load_chunk(&mut w, coord, true);
    assert!(w.store().chunk(coord).unwrap().modified);

    assert!(!save.save_chunk(&mut w, coord));
    assert_eq!(save.stats().failed, 1);
    assert!(w.store().chunk(coord).unwrap().modified);
    assert!(!save.unload_chunk(&mut w, coord));
    assert!(w.store().contains(coord));
}

#[test]
fn save_all_writes_only_modified_chunks() {
    let dir = TempDir::new().unwrap();
    let mut w = world_with_radius(1);
    let mut save = saves(dir.path(), &w);
    save.load(&mut w, Vec3::new(0.5, 70.0, 0.5), 1);
    assert_eq!(save.save_all(&mut w), 9);
    assert_eq!(save.save_all(&mut w), 0);

    let stone = w.registry().id_by_name("stone").unwrap();
    assert!(w.set_block(BlockPos::new(3, 80, 3), stone));
    assert_eq!(save.save_all(&mut w), 1);
}

fn blocks_with_one_stone() -> Vec<u8> {
    let mut blocks = vec![AIR; CHUNK_VOLUME];
    blocks[LocalPos::new(3, 40, 9).index()] = 1;
    blocks
}

#[test]
fn gzip_without_trailer_still_loads_saved_blocks() {
    let dir = TempDir::new().unwrap();
    let coord = ChunkCoord::column(4, -7);
    let expected = blocks_with_one_stone();

    let mut w = world_with_radius(2);
    let mut save = saves(dir.path(), &w);
    w.add_chunk(Chunk::from_blocks(coord, expected.clone()), true);
    assert!(save.save_chunk(&mut w, coord));

    // crc32 and length footer lost, deflate body intact
    let path = chunk_path(dir.path(), coord);
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();

    let mut fresh = world_with_radius(2);
    let mut save = saves(dir.path(), &fresh);
    assert!(save.load_chunk(&mut fresh, coord, true));
    assert_eq!(save.stats().loaded, 1);
    assert_eq!(save.stats().generated, 0);
    let loaded = fresh.store().chunk(coord).unwrap();
    assert_eq!(loaded.blocks(), expected.as_slice());
    assert!(!loaded.modified);
}

#[test]
fn failed_write_leaves_previous_file_intact() {
    let dir = TempDir::new().unwrap();
    let coord = ChunkCoord::column(-2, 3);
    let expected = blocks_with_one_stone();

    let mut w = world_with_radius(2);
    let mut save = saves(dir.path(), &w);
    w.add_chunk(Chunk::from_blocks(coord, expected.clone()), true);
    assert!(save.save_chunk(&mut w, coord));

    let path = chunk_path(dir.path(), coord);
    let staging = staging_path(&path);
    // a directory in the way makes the staging write fail
    fs::create_dir(&staging).unwrap();
    let stone = w.registry().id_by_name("stone").unwrap();
    assert!(w.set_block(coord.origin().offset(0, 100, 0), stone));
    assert!(!save.save_chunk(&mut w, coord));
    assert_eq!(save.stats().failed, 1);
    assert!(w.store().chunk(coord).unwrap().modified);

    let mut fresh = world_with_radius(2);
    let mut reader = saves(dir.path(), &fresh);
    reader.load_chunk(&mut fresh, coord, true);
    assert_eq!(fresh.store().chunk(coord).unwrap().blocks(), expected.as_slice());

    fs::remove_dir(&staging).unwrap();
    assert!(save.save_chunk(&mut w, coord));
    assert!(!staging.exists());
    assert!(path.is_file());
}
