use strata_blocks::{AIR, BlockId, BlockRegistry, BlockType, Face};
use strata_chunk::{
    BlockPos, ChunkId, ChunkStore, LocalPos, PackedVertex, SUBCHUNK_HEIGHT, SUBCHUNK_LENGTH,
    SUBCHUNK_WIDTH, VertexAttrs,
};

use crate::MeshOptions;
use crate::shade::{CORNERS, FACE_RING, ao_val, smooth};

/// Whether a cube face toward `neighbor` is visible.
#[inline]
pub fn can_render_face(reg: &BlockRegistry, block: BlockId, neighbor: BlockId) -> bool {
    if neighbor == AIR {
        return true;
    }
    if neighbor == block && reg.is_glass(block) {
        return false;
    }
    reg.get(neighbor).is_some_and(|t| t.flags.transparent)
}

/// Opaque and translucent vertex buffers for one subchunk.
#[derive(Default, Debug, Clone)]
pub struct SubchunkMesh {
    pub opaque: Vec<PackedVertex>,
    pub translucent: Vec<PackedVertex>,
}

struct FaceLight {
    shade: [f32; 4],
    block: [f32; 4],
    sky: [f32; 4],
}

impl FaceLight {
    fn flat(shade: [f32; 4], block: u8, sky: u8) -> Self {
        FaceLight {
            shade,
            block: [block as f32; 4],
            sky: [sky as f32; 4],
        }
    }
}

struct Mesher<'a> {
    store: &'a ChunkStore,
    reg: &'a BlockRegistry,
    from: ChunkId,
    opts: MeshOptions,
}

impl Mesher<'_> {
    fn flat_light(&self, pos: BlockPos, shade: [f32; 4]) -> FaceLight {
        FaceLight::flat(
            shade,
            self.store.light_cached(self.from, pos),
            self.store.skylight_cached(self.from, pos),
        )
    }

    fn cube_face_light(&self, face: usize, npos: BlockPos, shading: [f32; 4]) -> FaceLight {
        if !self.opts.smooth_lighting {
            return self.flat_light(npos, shading);
        }
        let mut solid = [false; 8];
        let mut block = [0u8; 8];
        let mut sky = [0u8; 8];
        for (i, &(dx, dy, dz)) in FACE_RING[face].iter().enumerate() {
            let p = npos.offset(dx, dy, dz);
            solid[i] = self.store.is_opaque_cached(self.reg, self.from, p);
            block[i] = self.store.light_cached(self.from, p);
            sky[i] = self.store.skylight_cached(self.from, p);
        }
        let center_block = self.store.light_cached(self.from, npos);
        let center_sky = self.store.skylight_cached(self.from, npos);
        let mut out = FaceLight::flat([1.0; 4], 0, 0);
        for (v, &[e1, e2, c]) in CORNERS.iter().enumerate() {
            out.shade[v] = ao_val(solid[e1], solid[e2], solid[c]);
            out.block[v] = smooth(center_block, block[e1], block[e2], block[c]);
            out.sky[v] = smooth(center_sky, sky[e1], sky[e2], sky[c]);
        }
        out
    }

    fn emit_block(&self, l: LocalPos, pos: BlockPos, ty: &BlockType, mesh: &mut SubchunkMesh) {
        let out = if ty.flags.translucent {
            &mut mesh.translucent
        } else {
            &mut mesh.opaque
        };
        let cube = ty.flags.is_cube && !ty.is_complex();
        for (fi, face) in ty.model.faces.iter().enumerate() {
            let light = if cube {
                let Some(dir) = Face::from_index(fi) else {
                    continue;
                };
                let npos = pos.step(dir);
                let neighbor = self.store.block_cached(self.from, npos);
                if !can_render_face(self.reg, ty.id, neighbor) {
                    continue;
                }
                self.cube_face_light(fi, npos, face.shading)
            } else {
                self.flat_light(pos, face.shading)
            };
            let layer = ty.layer(fi);
            for v in 0..4 {
                let p = face.positions[v];
                out.push(PackedVertex::pack(&VertexAttrs {
                    position: [l.x as f32 + p[0], l.y as f32 + p[1], l.z as f32 + p[2]],
                    uv: face.uvs[v],
                    layer,
                    shade: light.shade[v],
                    block_light: light.block[v],
                    skylight: light.sky[v],
                }));
            }
        }
    }
}

/// Meshes subchunk `index` of chunk `id`. Positions are chunk-local.
pub fn build_subchunk(
    store: &ChunkStore,
    reg: &BlockRegistry,
    id: ChunkId,
    index: usize,
    opts: MeshOptions,
) -> SubchunkMesh {
    let mut mesh = SubchunkMesh::default();
    let Some(chunk) = store.get(id) else {
        return mesh;
    };
    let Some(sub) = chunk.subchunks.get(index) else {
        return mesh;
    };
    let base = sub.origin();
    let mesher = Mesher {
        store,
        reg,
        from: id,
        opts,
    };
    for y in base.y..base.y + SUBCHUNK_HEIGHT {
        for z in base.z..base.z + SUBCHUNK_LENGTH {
            for x in base.x..base.x + SUBCHUNK_WIDTH {
                let l = LocalPos::new(x, y, z);
                let block = chunk.block(l);
                if block == AIR {
                    continue;
                }
                // unknown ids have no geometry
                let Some(ty) = reg.get(block) else {
                    continue;
                };
                mesher.emit_block(l, l.to_world(chunk.coord), ty, &mut mesh);
            }
        }
    }
    mesh
}

/// Rebuilds one subchunk in place.
pub fn rebuild_subchunk(
    store: &mut ChunkStore,
    reg: &BlockRegistry,
    id: ChunkId,
    index: usize,
    opts: MeshOptions,
) {
    let mesh = build_subchunk(store, reg, id, index, opts);
    if let Some(sub) = store.get_mut(id).and_then(|c| c.subchunks.get_mut(index)) {
        sub.mesh = mesh.opaque;
        sub.translucent_mesh = mesh.translucent;
    }
}
