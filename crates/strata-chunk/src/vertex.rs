//! Packed vertex layout shared by the mesher and render backends.
//!
//! Three 32-bit words per vertex:
//! - word 0: x (low 16 bits), y (high 16 bits), signed fixed point, 1/16 block
//! - word 1: z (low 16 bits), texture layer (high 16 bits)
//! - word 2: u, v (8 bits each, 1/128 units), shade (8 bits, 0..=255),
//!   block light (4 bits), skylight (4 bits)

pub const POSITION_SCALE: f32 = 16.0;
pub const UV_SCALE: f32 = 128.0;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct PackedVertex(pub [u32; 3]);

/// Unpacked vertex attributes, in chunk-local block units.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct VertexAttrs {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub layer: u16,
    pub shade: f32,
    pub block_light: f32,
    pub skylight: f32,
}

#[inline]
fn quantize_pos(v: f32) -> u32 {
    let q = (v * POSITION_SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    q as u16 as u32
}

#[inline]
fn dequantize_pos(bits: u32) -> f32 {
    (bits as u16 as i16) as f32 / POSITION_SCALE
}

#[inline]
fn quantize_unit(v: f32, scale: f32) -> u32 {
    (v * scale).round().clamp(0.0, 255.0) as u32
}

#[inline]
fn quantize_light(v: f32) -> u32 {
    v.round().clamp(0.0, 15.0) as u32
}

impl PackedVertex {
    pub fn pack(a: &VertexAttrs) -> Self {
        let w0 = quantize_pos(a.position[0]) | (quantize_pos(a.position[1]) << 16);
        let w1 = quantize_pos(a.position[2]) | ((a.layer as u32) << 16);
        let w2 = quantize_unit(a.uv[0], UV_SCALE)
            | (quantize_unit(a.uv[1], UV_SCALE) << 8)
            | (quantize_unit(a.shade, 255.0) << 16)
            | (quantize_light(a.block_light) << 24)
            | (quantize_light(a.skylight) << 28);
        PackedVertex([w0, w1, w2])
    }

    pub fn unpack(self) -> VertexAttrs {
        let [w0, w1, w2] = self.0;
        VertexAttrs {
            position: [
                dequantize_pos(w0 & 0xFFFF),
                dequantize_pos(w0 >> 16),
                dequantize_pos(w1 & 0xFFFF),
            ],
            uv: [
                (w2 & 0xFF) as f32 / UV_SCALE,
                ((w2 >> 8) & 0xFF) as f32 / UV_SCALE,
            ],
            layer: (w1 >> 16) as u16,
            shade: ((w2 >> 16) & 0xFF) as f32 / 255.0,
            block_light: self.block_light() as f32,
            skylight: self.skylight() as f32,
        }
    }

    #[inline]
    pub fn block_light(self) -> u8 {
        ((self.0[2] >> 24) & 0x0F) as u8
    }

    #[inline]
    pub fn skylight(self) -> u8 {
        (self.0[2] >> 28) as u8
    }
}
