use serde::{Deserialize, Serialize};
use strata_geom::{Aabb, Vec3};

use crate::face::Face;

/// Rendering and light behavior flags carried by every block type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlockFlags {
    /// Light passes through and neighbors' faces stay visible.
    pub transparent: bool,
    /// Full cube geometry: faces are culled against neighbors.
    pub is_cube: bool,
    /// Same-type neighbors hide the shared face; sunlight does not decay downward.
    pub glass: bool,
    /// Faces go to the blended buffer.
    pub translucent: bool,
}

impl BlockFlags {
    pub const CUBE: BlockFlags = BlockFlags {
        transparent: false,
        is_cube: true,
        glass: false,
        translucent: false,
    };
}

impl Default for BlockFlags {
    fn default() -> Self {
        BlockFlags::CUBE
    }
}

/// One quad of a block model in unit block space.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelFace {
    pub positions: [[f32; 3]; 4],
    pub uvs: [[f32; 2]; 4],
    pub shading: [f32; 4],
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub faces: Vec<ModelFace>,
}

impl Model {
    /// Anything other than the six-quad layout skips AO and smooth light.
    #[inline]
    pub fn is_complex(&self) -> bool {
        self.faces.len() != 6
    }
}

/// Named model presets selectable from the blocks config.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Cube,
    Plant,
    Leaves,
    Glass,
    Ladder,
    Liquid,
    Slab,
    Torch,
    Door,
    Flat,
    Soil,
    Crop,
    Cactus,
}

/// Geometry, flags and colliders produced by a preset.
#[derive(Clone, Debug)]
pub struct ModelPreset {
    pub flags: BlockFlags,
    pub model: Model,
    pub colliders: Vec<Aabb>,
}

const UV_FULL: [[f32; 2]; 4] = [[0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
const UV_HALF: [[f32; 2]; 4] = [[0.0, 0.5], [0.0, 0.0], [1.0, 0.0], [1.0, 0.5]];
const SOIL_SIDE_V: f32 = 0.9375;

const CUBE_SHADING: [f32; 6] = [0.6, 0.6, 1.0, 0.4, 0.8, 0.8];

// Quads are authored centered on the origin and shifted into 0..1 block space.
const CUBE_QUADS: [[f32; 12]; 6] = [
    [0.5, 0.5, 0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5],
    [-0.5, 0.5, -0.5, -0.5, -0.5, -0.5, -0.5, -0.5, 0.5, -0.5, 0.5, 0.5],
    [0.5, 0.5, 0.5, 0.5, 0.5, -0.5, -0.5, 0.5, -0.5, -0.5, 0.5, 0.5],
    [-0.5, -0.5, 0.5, -0.5, -0.5, -0.5, 0.5, -0.5, -0.5, 0.5, -0.5, 0.5],
    [-0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5, 0.5, 0.5, 0.5],
    [0.5, 0.5, -0.5, 0.5, -0.5, -0.5, -0.5, -0.5, -0.5, -0.5, 0.5, -0.5],
];

const PLANT_QUADS: [[f32; 12]; 4] = [
    [-0.3536, 0.5, 0.3536, -0.3536, -0.5, 0.3536, 0.3536, -0.5, -0.3536, 0.3536, 0.5, -0.3536],
    [-0.3536, 0.5, -0.3536, -0.3536, -0.5, -0.3536, 0.3536, -0.5, 0.3536, 0.3536, 0.5, 0.3536],
    [0.3536, 0.5, -0.3536, 0.3536, -0.5, -0.3536, -0.3536, -0.5, 0.3536, -0.3536, 0.5, 0.3536],
    [0.3536, 0.5, 0.3536, 0.3536, -0.5, 0.3536, -0.3536, -0.5, -0.3536, -0.3536, 0.5, -0.3536],
];

const TORCH_QUADS: [[f32; 12]; 6] = [
    [0.0625, 0.5, 0.5, 0.0625, -0.5, 0.5, 0.0625, -0.5, -0.5, 0.0625, 0.5, -0.5],
    [-0.0625, 0.5, -0.5, -0.0625, -0.5, -0.5, -0.0625, -0.5, 0.5, -0.0625, 0.5, 0.5],
    [0.5, 0.125, 0.5, 0.5, 0.125, -0.5, -0.5, 0.125, -0.5, -0.5, 0.125, 0.5],
    [-0.5, -0.5, 0.5, -0.5, -0.5, -0.5, 0.5, -0.5, -0.5, 0.5, -0.5, 0.5],
    [-0.5, 0.5, 0.0625, -0.5, -0.5, 0.0625, 0.5, -0.5, 0.0625, 0.5, 0.5, 0.0625],
    [0.5, 0.5, -0.0625, 0.5, -0.5, -0.0625, -0.5, -0.5, -0.0625, -0.5, 0.5, -0.0625],
];

const FLAT_QUADS: [[f32; 12]; 2] = [
    [0.5, -0.4375, 0.5, 0.5, -0.4375, -0.5, -0.5, -0.4375, -0.5, -0.5, -0.4375, 0.5],
    [-0.5, -0.4375, 0.5, -0.5, -0.4375, -0.5, 0.5, -0.4375, -0.5, 0.5, -0.4375, 0.5],
];

const CROP_QUADS: [[f32; 12]; 8] = [
    [0.25, 0.4375, 0.5, 0.25, -0.5625, 0.5, 0.25, -0.5625, -0.5, 0.25, 0.4375, -0.5],
    [0.25, 0.4375, -0.5, 0.25, -0.5625, -0.5, 0.25, -0.5625, 0.5, 0.25, 0.4375, 0.5],
    [-0.25, 0.4375, -0.5, -0.25, -0.5625, -0.5, -0.25, -0.5625, 0.5, -0.25, 0.4375, 0.5],
    [-0.25, 0.4375, 0.5, -0.25, -0.5625, 0.5, -0.25, -0.5625, -0.5, -0.25, 0.4375, -0.5],
    [-0.5, 0.4375, 0.25, -0.5, -0.5625, 0.25, 0.5, -0.5625, 0.25, 0.5, 0.4375, 0.25],
    [0.5, 0.4375, 0.25, 0.5, -0.5625, 0.25, -0.5, -0.5625, 0.25, -0.5, 0.4375, 0.25],
    [0.5, 0.4375, -0.25, 0.5, -0.5625, -0.25, -0.5, -0.5625, -0.25, -0.5, 0.4375, -0.25],
    [-0.5, 0.4375, -0.25, -0.5, -0.5625, -0.25, 0.5, -0.5625, -0.25, 0.5, 0.4375, -0.25],
];

fn quad(raw: &[f32; 12]) -> [[f32; 3]; 4] {
    let mut out = [[0.0; 3]; 4];
    for (i, v) in out.iter_mut().enumerate() {
        *v = [raw[i * 3] + 0.5, raw[i * 3 + 1] + 0.5, raw[i * 3 + 2] + 0.5];
    }
    out
}

fn default_shading(face: usize, count: usize) -> [f32; 4] {
    if count == 6 {
        [CUBE_SHADING[face]; 4]
    } else {
        [1.0; 4]
    }
}

fn build_model(quads: &[[f32; 12]], uv_for: impl Fn(usize) -> [[f32; 2]; 4]) -> Model {
    let count = quads.len();
    Model {
        faces: quads
            .iter()
            .enumerate()
            .map(|(i, q)| ModelFace {
                positions: quad(q),
                uvs: uv_for(i),
                shading: default_shading(i, count),
            })
            .collect(),
    }
}

/// Moves every vertex sitting at `from` on the Y axis to `to` (unit space).
fn lower_top(model: &mut Model, from: f32, to: f32) {
    for face in &mut model.faces {
        for p in &mut face.positions {
            if p[1] == from {
                p[1] = to;
            }
        }
    }
}

fn centered_box(min: [f32; 3], max: [f32; 3]) -> Aabb {
    Aabb::new(
        Vec3::new(min[0] + 0.5, min[1] + 0.5, min[2] + 0.5),
        Vec3::new(max[0] + 0.5, max[1] + 0.5, max[2] + 0.5),
    )
}

impl ModelKind {
    pub fn preset(self) -> ModelPreset {
        let see_through = BlockFlags {
            transparent: true,
            ..BlockFlags::CUBE
        };
        let partial = BlockFlags {
            transparent: true,
            is_cube: false,
            ..BlockFlags::CUBE
        };
        match self {
            ModelKind::Cube => ModelPreset {
                flags: BlockFlags::CUBE,
                model: build_model(&CUBE_QUADS, |_| UV_FULL),
                colliders: vec![Aabb::unit()],
            },
            ModelKind::Leaves => ModelPreset {
                flags: see_through,
                ..ModelKind::Cube.preset()
            },
            ModelKind::Glass => ModelPreset {
                flags: BlockFlags {
                    glass: true,
                    ..see_through
                },
                ..ModelKind::Cube.preset()
            },
            ModelKind::Ladder => ModelPreset {
                flags: partial,
                ..ModelKind::Cube.preset()
            },
            ModelKind::Plant => ModelPreset {
                flags: partial,
                model: build_model(&PLANT_QUADS, |_| UV_FULL),
                colliders: Vec::new(),
            },
            ModelKind::Liquid => {
                let mut model = build_model(&CUBE_QUADS, |_| UV_FULL);
                for face in &mut model.faces {
                    for p in &mut face.positions {
                        p[1] -= 0.125;
                    }
                }
                ModelPreset {
                    flags: BlockFlags {
                        transparent: true,
                        is_cube: true,
                        glass: true,
                        translucent: true,
                    },
                    model,
                    colliders: Vec::new(),
                }
            }
            ModelKind::Slab => {
                let mut model = build_model(&CUBE_QUADS, |i| {
                    if Face::from_index(i).is_some_and(|f| f.is_horizontal()) {
                        UV_HALF
                    } else {
                        UV_FULL
                    }
                });
                lower_top(&mut model, 1.0, 0.5);
                ModelPreset {
                    flags: partial,
                    model,
                    colliders: vec![centered_box([-0.5, -0.5, -0.5], [0.5, 0.0, 0.5])],
                }
            }
            ModelKind::Torch => ModelPreset {
                flags: partial,
                model: build_model(&TORCH_QUADS, |_| UV_FULL),
                colliders: Vec::new(),
            },
            ModelKind::Door => {
                let mut model = build_model(&CUBE_QUADS, |_| UV_FULL);
                for face in &mut model.faces {
                    for p in &mut face.positions {
                        p[2] = if p[2] > 0.5 { 0.6 } else { 0.4 };
                    }
                }
                ModelPreset {
                    flags: partial,
                    model,
                    colliders: vec![centered_box([-0.5, -0.5, -0.1], [0.5, 0.5, 0.1])],
                }
            }
            ModelKind::Flat => {
                let mut model = build_model(&FLAT_QUADS, |_| UV_FULL);
                model.faces[1].shading = [0.4; 4];
                ModelPreset {
                    flags: partial,
                    model,
                    colliders: Vec::new(),
                }
            }
            ModelKind::Soil => {
                let side_uv = [[0.0, SOIL_SIDE_V], [0.0, 0.0], [1.0, 0.0], [1.0, SOIL_SIDE_V]];
                let mut model = build_model(&CUBE_QUADS, |i| {
                    if Face::from_index(i).is_some_and(|f| f.is_horizontal()) {
                        side_uv
                    } else {
                        UV_FULL
                    }
                });
                lower_top(&mut model, 1.0, 0.9375);
                ModelPreset {
                    flags: partial,
                    model,
                    colliders: vec![centered_box([-0.5, -0.5, -0.5], [0.5, 0.4375, 0.5])],
                }
            }
            ModelKind::Crop => ModelPreset {
                flags: partial,
                model: build_model(&CROP_QUADS, |_| UV_FULL),
                colliders: Vec::new(),
            },
            ModelKind::Cactus => {
                let mut model = build_model(&CUBE_QUADS, |_| UV_FULL);
                let inset = 0.0625;
                for (i, face) in model.faces.iter_mut().enumerate() {
                    let axis = match Face::from_index(i) {
                        Some(Face::PosX | Face::NegX) => 0,
                        Some(Face::PosZ | Face::NegZ) => 2,
                        _ => continue,
                    };
                    for p in &mut face.positions {
                        p[axis] = if p[axis] > 0.5 { 1.0 - inset } else { inset };
                    }
                }
                ModelPreset {
                    flags: partial,
                    model,
                    colliders: vec![centered_box(
                        [-0.4375, -0.5, -0.4375],
                        [0.4375, 0.5, 0.4375],
                    )],
                }
            }
        }
    }
}
