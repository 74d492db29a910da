//! Minimal geometry types for the voxel engine crates.
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };
    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 { self / len } else { self }
    }

    #[inline]
    pub fn floor(self) -> Vec3 {
        Vec3::new(self.x.floor(), self.y.floor(), self.z.floor())
    }

    /// Component by axis index (0 = x, 1 = y, 2 = z).
    #[inline]
    pub fn axis(self, i: usize) -> f32 {
        match i {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    #[inline]
    pub fn set_axis(&mut self, i: usize, v: f32) {
        match i {
            0 => self.x = v,
            1 => self.y = v,
            _ => self.z = v,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Axis-aligned box used for block colliders and entity volumes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The full block volume `[0, 1]^3`.
    #[inline]
    pub const fn unit() -> Self {
        Self::new(Vec3::ZERO, Vec3::ONE)
    }

    #[inline]
    pub fn translated(self, offset: Vec3) -> Aabb {
        Aabb::new(self.min + offset, self.max + offset)
    }

    /// Strict overlap on every axis; boxes that only touch do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        (self.max.x.min(other.max.x) - self.min.x.max(other.min.x)) > 0.0
            && (self.max.y.min(other.max.y) - self.min.y.max(other.min.y)) > 0.0
            && (self.max.z.min(other.max.z) - self.min.z.max(other.min.z)) > 0.0
    }

    /// Swept test of `self` moving by `velocity` against a static box.
    ///
    /// Returns the fraction of `velocity` travelled before contact and the
    /// contact normal. A step without contact yields `(1.0, Vec3::ZERO)`.
    pub fn collide(&self, other: &Aabb, velocity: Vec3) -> (f32, Vec3) {
        let no_hit = (1.0, Vec3::ZERO);
        let mut entry = [0.0f32; 3];
        let mut exit = [0.0f32; 3];
        for axis in 0..3 {
            let v = velocity.axis(axis);
            let (near, far) = if v > 0.0 {
                (
                    other.min.axis(axis) - self.max.axis(axis),
                    other.max.axis(axis) - self.min.axis(axis),
                )
            } else {
                (
                    other.max.axis(axis) - self.min.axis(axis),
                    other.min.axis(axis) - self.max.axis(axis),
                )
            };
            entry[axis] = sweep_time(near, v);
            exit[axis] = sweep_time(far, v);
        }

        if entry.iter().all(|&t| t < 0.0) || entry.iter().any(|&t| t > 1.0) {
            return no_hit;
        }
        let entry_time = entry[0].max(entry[1]).max(entry[2]);
        let exit_time = exit[0].min(exit[1]).min(exit[2]);
        if entry_time > exit_time {
            return no_hit;
        }

        let axis = (0..3)
            .find(|&a| entry[a] == entry_time)
            .unwrap_or(0);
        let mut normal = Vec3::ZERO;
        normal.set_axis(axis, -velocity.axis(axis).signum());
        (entry_time, normal)
    }
}

#[inline]
fn sweep_time(distance: f32, velocity: f32) -> f32 {
    if velocity == 0.0 {
        if distance > 0.0 {
            f32::NEG_INFINITY
        } else {
            f32::INFINITY
        }
    } else {
        distance / velocity
    }
}
