use strata_blocks::Face;
use strata_geom::Vec3;

pub const CHUNK_WIDTH: usize = 16;
pub const CHUNK_HEIGHT: usize = 128;
pub const CHUNK_LENGTH: usize = 16;
pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_HEIGHT * CHUNK_LENGTH;

pub const SUBCHUNK_WIDTH: usize = 16;
pub const SUBCHUNK_HEIGHT: usize = 16;
pub const SUBCHUNK_LENGTH: usize = 16;

pub const SUBCHUNKS_X: usize = CHUNK_WIDTH / SUBCHUNK_WIDTH;
pub const SUBCHUNKS_Y: usize = CHUNK_HEIGHT / SUBCHUNK_HEIGHT;
pub const SUBCHUNKS_Z: usize = CHUNK_LENGTH / SUBCHUNK_LENGTH;
pub const SUBCHUNK_COUNT: usize = SUBCHUNKS_X * SUBCHUNKS_Y * SUBCHUNKS_Z;

/// Chunk grid coordinate. Height is not chunked, so `cy` is 0 for every
/// resident chunk.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    #[inline]
    pub const fn column(cx: i32, cz: i32) -> Self {
        Self { cx, cy: 0, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }

    #[inline]
    pub fn neighbor(self, face: Face) -> Self {
        let (dx, dy, dz) = face.delta();
        self.offset(dx, dy, dz)
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx - other.cx);
        let dy = i64::from(self.cy - other.cy);
        let dz = i64::from(self.cz - other.cz);
        dx * dx + dy * dy + dz * dz
    }

    /// World position of local voxel (0, 0, 0).
    #[inline]
    pub fn origin(self) -> BlockPos {
        BlockPos::new(
            self.cx * CHUNK_WIDTH as i32,
            self.cy * CHUNK_HEIGHT as i32,
            self.cz * CHUNK_LENGTH as i32,
        )
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}

/// Integer world voxel position.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Voxel containing a floating-point world position.
    #[inline]
    pub fn containing(p: Vec3) -> Self {
        Self::new(p.x.floor() as i32, p.y.floor() as i32, p.z.floor() as i32)
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    #[inline]
    pub fn step(self, face: Face) -> Self {
        let (dx, dy, dz) = face.delta();
        self.offset(dx, dy, dz)
    }

    #[inline]
    pub fn in_height_range(self) -> bool {
        self.y >= 0 && self.y < CHUNK_HEIGHT as i32
    }

    #[inline]
    pub fn chunk(self) -> ChunkCoord {
        ChunkCoord::column(
            self.x.div_euclid(CHUNK_WIDTH as i32),
            self.z.div_euclid(CHUNK_LENGTH as i32),
        )
    }

    #[inline]
    pub fn local(self) -> LocalPos {
        LocalPos::new(
            self.x.rem_euclid(CHUNK_WIDTH as i32) as usize,
            self.y.rem_euclid(CHUNK_HEIGHT as i32) as usize,
            self.z.rem_euclid(CHUNK_LENGTH as i32) as usize,
        )
    }

    #[inline]
    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// Voxel position inside a chunk.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct LocalPos {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl LocalPos {
    #[inline]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn index(self) -> usize {
        (self.y * CHUNK_LENGTH + self.z) * CHUNK_WIDTH + self.x
    }

    /// Index of the subchunk holding this voxel.
    #[inline]
    pub fn subchunk(self) -> usize {
        subchunk_index(
            self.x / SUBCHUNK_WIDTH,
            self.y / SUBCHUNK_HEIGHT,
            self.z / SUBCHUNK_LENGTH,
        )
    }

    #[inline]
    pub fn to_world(self, chunk: ChunkCoord) -> BlockPos {
        chunk
            .origin()
            .offset(self.x as i32, self.y as i32, self.z as i32)
    }
}

#[inline]
pub(crate) fn subchunk_index(sx: usize, sy: usize, sz: usize) -> usize {
    (sy * SUBCHUNKS_Z + sz) * SUBCHUNKS_X + sx
}

/// Chunk holding world position `p`: exact floor division on X and Z.
#[inline]
pub fn chunk_pos(p: Vec3) -> ChunkCoord {
    ChunkCoord::column(
        (p.x / CHUNK_WIDTH as f32).floor() as i32,
        (p.z / CHUNK_LENGTH as f32).floor() as i32,
    )
}

/// Position of `p` inside its chunk, each axis wrapped to be non-negative.
#[inline]
pub fn local_pos(p: Vec3) -> LocalPos {
    BlockPos::containing(p).local()
}
