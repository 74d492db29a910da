//! Per-vertex ambient occlusion and smooth light sampling.

/// Offsets of the eight voxels ringing a face, relative to the voxel the face
/// looks into. Rows follow face order (+X, -X, +Y, -Y, +Z, -Z); columns run
/// top-left to bottom-right as seen from outside the face.
pub const FACE_RING: [[(i32, i32, i32); 8]; 6] = [
    [
        (0, 1, 1),
        (0, 1, 0),
        (0, 1, -1),
        (0, 0, 1),
        (0, 0, -1),
        (0, -1, 1),
        (0, -1, 0),
        (0, -1, -1),
    ],
    [
        (0, 1, -1),
        (0, 1, 0),
        (0, 1, 1),
        (0, 0, -1),
        (0, 0, 1),
        (0, -1, -1),
        (0, -1, 0),
        (0, -1, 1),
    ],
    [
        (1, 0, 1),
        (0, 0, 1),
        (-1, 0, 1),
        (1, 0, 0),
        (-1, 0, 0),
        (1, 0, -1),
        (0, 0, -1),
        (-1, 0, -1),
    ],
    [
        (-1, 0, 1),
        (0, 0, 1),
        (1, 0, 1),
        (-1, 0, 0),
        (1, 0, 0),
        (-1, 0, -1),
        (0, 0, -1),
        (1, 0, -1),
    ],
    [
        (-1, 1, 0),
        (0, 1, 0),
        (1, 1, 0),
        (-1, 0, 0),
        (1, 0, 0),
        (-1, -1, 0),
        (0, -1, 0),
        (1, -1, 0),
    ],
    [
        (1, 1, 0),
        (0, 1, 0),
        (-1, 1, 0),
        (1, 0, 0),
        (-1, 0, 0),
        (1, -1, 0),
        (0, -1, 0),
        (-1, -1, 0),
    ],
];

/// For each quad vertex: (edge, edge, corner) indices into a [`FACE_RING`] row.
pub const CORNERS: [[usize; 3]; 4] = [[1, 3, 0], [3, 6, 5], [4, 6, 7], [1, 4, 2]];

/// Corner darkening from the two edge voxels and the diagonal voxel.
#[inline]
pub fn ao_val(side1: bool, side2: bool, corner: bool) -> f32 {
    if side1 && side2 {
        return 0.25;
    }
    1.0 - (side1 as u8 + side2 as u8 + corner as u8) as f32 / 4.0
}

/// Averages the light of the four voxels sharing a vertex. Zero samples are
/// lifted to the dimmest lit sample first, unless the face's own voxel is
/// dark.
#[inline]
pub fn smooth(center: u8, a: u8, b: u8, c: u8) -> f32 {
    let mut samples = [center, a, b, c];
    if samples.contains(&0) {
        let floor = if center > 0 {
            samples.iter().copied().filter(|&v| v > 0).min().unwrap_or(0)
        } else {
            0
        };
        for v in &mut samples {
            *v = (*v).max(floor);
        }
    }
    samples.iter().map(|&v| v as f32).sum::<f32>() / 4.0
}
