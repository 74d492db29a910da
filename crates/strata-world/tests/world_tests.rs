use std::sync::Arc;

use strata_blocks::{BlockId, BlockRegistry};
use strata_chunk::{BlockPos, Chunk, ChunkCoord, LocalPos};
use strata_geom::{Aabb, Vec3};
use strata_world::{EngineConfig, HIT_RANGE, HitRay, World};

const BLOCKS_TOML: &str = include_str!("../../../assets/blocks.toml");

fn registry() -> Arc<BlockRegistry> {
    Arc::new(BlockRegistry::from_toml_str(BLOCKS_TOML).unwrap())
}

fn world() -> World {
    World::new(registry(), EngineConfig::default())
}

fn id(w: &World, name: &str) -> BlockId {
    w.registry().id_by_name(name).unwrap()
}

fn floor_chunk(coord: ChunkCoord, top: usize, block: BlockId) -> Chunk {
    let mut c = Chunk::new(coord);
    for x in 0..16 {
        for z in 0..16 {
            for y in 0..=top {
                c.set_block(LocalPos::new(x, y, z), block);
            }
        }
    }
    c
}

fn settle(w: &mut World) {
    for _ in 0..200 {
        if w.is_settled() {
            return;
        }
        w.tick(0.05);
    }
    panic!("world did not settle");
}

#[test]
fn blocks_round_trip_at_negative_coordinates() {
    let mut w = world();
    let stone = id(&w, "stone");
    for pos in [
        BlockPos::new(-1, 10, -17),
        BlockPos::new(-16, 0, -16),
        BlockPos::new(33, 127, -1),
    ] {
        assert!(w.set_block(pos, stone));
        assert_eq!(w.get_block(pos), stone);
        assert!(w.store().contains(pos.chunk()));
    }
    assert!(w.store().contains(ChunkCoord::column(-1, -2)));
    assert_eq!(w.get_block(BlockPos::new(-2, 10, -17)), 0);
}

#[test]
fn writes_that_cannot_apply_are_dropped() {
    let mut w = world();
    let stone = id(&w, "stone");
    assert!(!w.set_block(BlockPos::new(0, 128, 0), stone));
    assert!(!w.set_block(BlockPos::new(0, -1, 0), stone));
    assert!(!w.set_block(BlockPos::new(0, 5, 0), 0));
    assert!(!w.set_block(BlockPos::new(0, 5, 0), 250));
    assert!(w.store().is_empty());

    assert!(w.set_block(BlockPos::new(0, 5, 0), stone));
    assert!(!w.set_block(BlockPos::new(0, 5, 0), stone));
    assert!(w.store().chunk(ChunkCoord::column(0, 0)).unwrap().modified);
}

#[test]
fn emitter_lights_neighbors_and_clears_on_removal() {
    let mut w = world();
    let glow = id(&w, "glowstone");
    let p = BlockPos::new(5, 70, 5);
    w.set_block(p, glow);
    assert_eq!(w.get_light(p), 15);
    for n in [p.offset(1, 0, 0), p.offset(0, 1, 0), p.offset(0, 0, -1)] {
        assert_eq!(w.get_light(n), 14);
    }
    assert_eq!(w.get_light(p.offset(3, 0, 0)), 12);

    w.set_block(p, 0);
    assert_eq!(w.get_light(p), 0);
    assert_eq!(w.get_light(p.offset(1, 0, 0)), 0);
    assert_eq!(w.get_light(p.offset(3, 0, 0)), 0);
    assert_eq!(w.pending_light(), 0);
}

#[test]
fn torch_emits_its_own_level_across_a_chunk_border() {
    let mut w = world();
    let torch = id(&w, "torch");
    w.add_chunk(Chunk::new(ChunkCoord::column(0, 0)), true);
    w.add_chunk(Chunk::new(ChunkCoord::column(1, 0)), true);
    let p = BlockPos::new(15, 20, 4);
    w.set_block(p, torch);
    assert_eq!(w.get_light(p), 14);
    assert_eq!(w.get_light(p.offset(1, 0, 0)), 13);
}

#[test]
fn placement_is_refused_inside_the_player() {
    let mut w = world();
    let stone = id(&w, "stone");
    let player = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 1.0));

    assert!(!w.try_set_block(BlockPos::new(0, 0, 0), stone, &player));
    assert!(!w.try_set_block(BlockPos::new(0, 1, 0), stone, &player));
    assert_eq!(w.get_block(BlockPos::new(0, 0, 0)), 0);
    assert!(w.store().is_empty());

    assert!(w.try_set_block(BlockPos::new(2, 0, 0), stone, &player));
    assert_eq!(w.get_block(BlockPos::new(2, 0, 0)), stone);
    // touching faces do not overlap
    assert!(w.try_set_block(BlockPos::new(1, 0, 0), stone, &player));
}

#[test]
fn colliderless_blocks_can_be_placed_inside_the_player() {
    let mut w = world();
    let rose = id(&w, "rose");
    let player = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 1.0));
    assert!(w.try_set_block(BlockPos::new(0, 0, 0), rose, &player));
}

#[test]
fn enclosed_chunk_is_dark_and_open_sky_is_lit() {
    let mut w = world();
    let stone = id(&w, "stone");
    let mut roofed = Chunk::new(ChunkCoord::column(0, 0));
    for x in 0..16 {
        for z in 0..16 {
            roofed.set_block(LocalPos::new(x, 90, z), stone);
        }
    }
    w.add_chunk(roofed, true);
    for y in [0, 45, 89] {
        assert_eq!(w.get_skylight(BlockPos::new(7, y, 7)), 0);
        assert_eq!(w.get_skylight(BlockPos::new(0, y, 15)), 0);
    }
    assert_eq!(w.get_skylight(BlockPos::new(7, 91, 7)), 15);

    assert_eq!(w.get_skylight(BlockPos::new(100, 70, -50)), 15);
    assert_eq!(w.get_skylight(BlockPos::new(100, 500, -50)), 15);
    assert_eq!(w.get_skylight(BlockPos::new(100, -1, -50)), 0);

    let grass = id(&w, "grass");
    w.add_chunk(floor_chunk(ChunkCoord::column(3, 3), 64, grass), true);
    assert_eq!(w.get_skylight(BlockPos::new(50, 65, 50)), 15);
    assert_eq!(w.get_skylight(BlockPos::new(50, 64, 50)), 0);
}

#[test]
fn covering_and_uncovering_a_sunlit_column() {
    let mut w = world();
    let stone = id(&w, "stone");
    w.add_chunk(Chunk::new(ChunkCoord::column(0, 0)), true);
    let p = BlockPos::new(8, 100, 8);

    w.set_block(p, stone);
    assert_eq!(w.get_skylight(p), 0);
    assert_eq!(w.get_skylight(p.offset(0, -1, 0)), 14);
    assert_eq!(w.get_skylight(BlockPos::new(8, 3, 8)), 14);
    assert_eq!(w.get_skylight(p.offset(0, 1, 0)), 15);

    w.set_block(p, 0);
    assert_eq!(w.get_skylight(p), 15);
    assert_eq!(w.get_skylight(BlockPos::new(8, 3, 8)), 15);
}

#[test]
fn leaves_dim_the_column_below_them() {
    let mut w = world();
    let stone = id(&w, "stone");
    let leaves = id(&w, "leaves");
    w.add_chunk(floor_chunk(ChunkCoord::column(0, 0), 10, stone), true);
    let roof = 40;
    for x in 4..=12 {
        for z in 4..=12 {
            w.set_block(BlockPos::new(x, roof, z), stone);
        }
    }
    assert_eq!(w.get_skylight(BlockPos::new(8, roof - 1, 8)), 10);
    w.set_block(BlockPos::new(8, roof, 8), leaves);
    assert_eq!(w.get_skylight(BlockPos::new(8, roof, 8)), 14);
    assert_eq!(w.get_skylight(BlockPos::new(8, 11, 8)), 14);
}

#[test]
fn tick_rebuilds_and_merges_visible_chunks() {
    let mut w = world();
    let stone = id(&w, "stone");
    w.add_chunk(floor_chunk(ChunkCoord::column(0, 0), 3, stone), true);
    assert_eq!(w.visible_chunks(), &[ChunkCoord::column(0, 0)]);
    assert_eq!(w.pending_subchunk_updates(), 8);

    let first = w.tick(0.05);
    assert_eq!(first.subchunks_rebuilt, 4);
    let second = w.tick(0.05);
    assert_eq!(second.subchunks_rebuilt, 4);
    assert_eq!(w.pending_builds(), 1);
    let third = w.tick(0.05);
    assert_eq!(third.chunks_merged, 1);
    assert!(w.is_settled());

    let (opaque, translucent) = w.chunk_mesh(ChunkCoord::column(0, 0)).unwrap();
    // top layer plus the four outer walls and the bottom
    let quads = 16 * 16 * 2 + 4 * 16 * 4;
    assert_eq!(opaque.len(), quads * 4);
    assert!(translucent.is_empty());
    assert!((w.elapsed() - 0.15).abs() < 1e-6);
}

#[test]
fn edits_dirty_their_subchunk_and_border_neighbors() {
    let mut w = world();
    let stone = id(&w, "stone");
    w.add_chunk(Chunk::new(ChunkCoord::column(0, 0)), true);
    w.add_chunk(Chunk::new(ChunkCoord::column(1, 0)), true);
    settle(&mut w);

    w.set_block(BlockPos::new(15, 40, 3), stone);
    let west = w.store().chunk(ChunkCoord::column(0, 0)).unwrap();
    let east = w.store().chunk(ChunkCoord::column(1, 0)).unwrap();
    assert!(west.pending_updates() >= 1);
    assert!(east.pending_updates() >= 1);
    assert!(!east.modified);
    settle(&mut w);
}

#[test]
fn prepare_rendering_filters_and_orders_far_to_near() {
    let mut w = world();
    for (x, z) in [(0, 0), (3, 0), (1, 1), (-5, 2)] {
        w.add_chunk(Chunk::new(ChunkCoord::column(x, z)), false);
    }
    w.prepare_rendering(Vec3::new(8.0, 70.0, 8.0), |c| c.cx != 1);
    assert_eq!(
        w.visible_chunks(),
        &[
            ChunkCoord::column(-5, 2),
            ChunkCoord::column(3, 0),
            ChunkCoord::column(0, 0)
        ]
    );
}

#[test]
fn removed_chunks_leave_every_list() {
    let mut w = world();
    w.add_chunk(Chunk::new(ChunkCoord::column(0, 0)), true);
    w.add_chunk(Chunk::new(ChunkCoord::column(0, 1)), true);
    assert!(w.remove_chunk(ChunkCoord::column(0, 1)).is_some());
    assert!(w.remove_chunk(ChunkCoord::column(0, 1)).is_none());
    assert_eq!(w.visible_chunks(), &[ChunkCoord::column(0, 0)]);
    assert!(w.store().links_are_consistent());
    assert_eq!(w.get_block(BlockPos::new(0, 0, 16)), 0);
}

#[test]
fn daylight_follows_the_tick_counter() {
    let cfg = EngineConfig {
        day_length_ticks: 4,
        ..EngineConfig::default()
    };
    let mut w = World::new(registry(), cfg);
    assert!((w.daylight() - 1.0).abs() < 1e-6);
    w.tick(10.0);
    w.tick(0.0);
    assert!((w.daylight() - strata_world::DAYLIGHT_MIN).abs() < 1e-6);
}

#[test]
fn hit_ray_reports_the_adjacent_solid_block() {
    let mut w = world();
    let stone = id(&w, "stone");
    w.set_block(BlockPos::new(1, 10, 0), stone);
    w.set_block(BlockPos::new(0, 10, 3), stone);

    let hit = HitRay::new(&w, (0.0, 0.0), Vec3::new(0.9, 10.5, 0.5))
        .cast(HIT_RANGE)
        .unwrap();
    assert_eq!(hit.block, BlockPos::new(1, 10, 0));
    assert_eq!(hit.previous, BlockPos::new(0, 10, 0));

    let mut ray = HitRay::new(&w, (std::f32::consts::FRAC_PI_2, 0.0), Vec3::new(0.5, 10.5, 0.5));
    let mut seen = None;
    let mut steps = 0;
    while !ray.step(|a, b| seen = Some((a, b))) {
        steps += 1;
        assert!(steps < 5);
    }
    assert_eq!(seen, Some((BlockPos::new(0, 10, 2), BlockPos::new(0, 10, 3))));
    assert!((ray.distance() - 1.5).abs() < 1e-4);
}

#[test]
fn hit_ray_gives_up_past_its_range() {
    let mut w = world();
    let stone = id(&w, "stone");
    w.set_block(BlockPos::new(9, 10, 0), stone);
    let ray = HitRay::new(&w, (0.0, 0.0), Vec3::new(0.5, 10.5, 0.5));
    assert!(ray.cast(HIT_RANGE).is_none());
    // looking straight up into open air
    let up = HitRay::new(&w, (0.0, std::f32::consts::FRAC_PI_2), Vec3::new(0.5, 10.5, 0.5));
    assert!(up.cast(HIT_RANGE).is_none());
}
