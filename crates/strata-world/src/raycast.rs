use strata_blocks::AIR;
use strata_chunk::BlockPos;
use strata_geom::Vec3;

use crate::world::World;

/// Reach of block targeting, in blocks.
pub const HIT_RANGE: f32 = 5.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RayHit {
    /// The solid block that stopped the ray.
    pub block: BlockPos,
    /// The last empty block before it; placement goes here.
    pub previous: BlockPos,
}

/// Voxel walk along a view ray, one block boundary per step.
pub struct HitRay<'w> {
    world: &'w World,
    dir: Vec3,
    block: BlockPos,
    step: [i32; 3],
    t_max: [f32; 3],
    t_delta: [f32; 3],
    distance: f32,
}

impl<'w> HitRay<'w> {
    /// `rotation` is (yaw, pitch) in radians.
    pub fn new(world: &'w World, rotation: (f32, f32), start: Vec3) -> Self {
        let (yaw, pitch) = rotation;
        let dir = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        let block = BlockPos::containing(start);
        let mut step = [0; 3];
        let mut t_max = [f32::INFINITY; 3];
        let mut t_delta = [f32::INFINITY; 3];
        for i in 0..3 {
            let d = dir.axis(i);
            let p = start.axis(i);
            let cell = p.floor();
            if d > 0.0 {
                step[i] = 1;
                t_delta[i] = 1.0 / d;
                t_max[i] = (cell + 1.0 - p) / d;
            } else if d < 0.0 {
                step[i] = -1;
                t_delta[i] = -1.0 / d;
                t_max[i] = (p - cell) / -d;
            }
        }
        Self {
            world,
            dir,
            block,
            step,
            t_max,
            t_delta,
            distance: 0.0,
        }
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.dir
    }

    #[inline]
    pub fn block(&self) -> BlockPos {
        self.block
    }

    /// Distance travelled along the ray so far.
    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    fn next_axis(&self) -> usize {
        let t = self.t_max;
        if t[0] <= t[1] && t[0] <= t[2] {
            0
        } else if t[1] <= t[2] {
            1
        } else {
            2
        }
    }

    /// Crosses into the next block. If it is solid, calls
    /// `on_hit(current, next)` and returns true without moving.
    pub fn step(&mut self, mut on_hit: impl FnMut(BlockPos, BlockPos)) -> bool {
        let axis = self.next_axis();
        let mut d = [0; 3];
        d[axis] = self.step[axis];
        let next = self.block.offset(d[0], d[1], d[2]);
        if self.world.get_block(next) != AIR {
            on_hit(self.block, next);
            return true;
        }
        self.distance = self.t_max[axis];
        self.t_max[axis] += self.t_delta[axis];
        self.block = next;
        false
    }

    /// Steps until something solid is hit within `max_distance`.
    pub fn cast(mut self, max_distance: f32) -> Option<RayHit> {
        let mut hit = None;
        while self.t_max[self.next_axis()] <= max_distance {
            if self.step(|previous, block| hit = Some(RayHit { block, previous })) {
                return hit;
            }
        }
        None
    }
}
