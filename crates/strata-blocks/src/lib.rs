//! Block types, models, texture layers, and the block registry.
#![forbid(unsafe_code)]

pub mod config;
pub mod face;
pub mod model;
pub mod registry;
pub mod texture;

pub use face::Face;
pub use model::{BlockFlags, Model, ModelFace, ModelKind};
pub use registry::{BlockRegistry, BlockType};
pub use texture::TextureCatalog;

/// Per-voxel block index. `0` is air and never resolves to a type.
pub type BlockId = u8;

pub const AIR: BlockId = 0;
