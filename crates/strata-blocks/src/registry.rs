use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use strata_geom::{Aabb, Vec3};

use super::config::{BlockDef, BlocksConfig};
use super::model::{BlockFlags, Model, ModelKind};
use super::texture::{TextureCatalog, TextureLayer};
use super::{AIR, BlockId};

/// Face texture keys in increasing precedence, with the model faces each one covers.
const TEXTURE_KEYS: [(&str, &[usize]); 11] = [
    ("all", &[]),
    ("sides", &[0, 1, 4, 5]),
    ("x", &[0, 1]),
    ("y", &[2, 3]),
    ("z", &[4, 5]),
    ("right", &[0]),
    ("left", &[1]),
    ("top", &[2]),
    ("bottom", &[3]),
    ("front", &[4]),
    ("back", &[5]),
];

const MAX_LIGHT: u8 = 15;

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub flags: BlockFlags,
    pub emission: u8,
    pub model: Model,
    /// Collision boxes in unit block space.
    pub colliders: Vec<Aabb>,
    /// Texture layer per model face.
    pub face_layers: Vec<TextureLayer>,
}

impl BlockType {
    /// A block using `kind`'s geometry, flags and colliders, all faces on layer 0.
    pub fn new(id: BlockId, name: impl Into<String>, kind: ModelKind) -> Self {
        let preset = kind.preset();
        let faces = preset.model.faces.len();
        BlockType {
            id,
            name: name.into(),
            flags: preset.flags,
            emission: 0,
            model: preset.model,
            colliders: preset.colliders,
            face_layers: vec![0; faces],
        }
    }

    pub fn with_emission(mut self, level: u8) -> Self {
        self.emission = level.min(MAX_LIGHT);
        self
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        !self.flags.transparent
    }

    #[inline]
    pub fn is_complex(&self) -> bool {
        self.model.is_complex()
    }

    #[inline]
    pub fn layer(&self, face: usize) -> TextureLayer {
        self.face_layers.get(face).copied().unwrap_or(0)
    }
}

/// Immutable-after-load table of block types indexed by [`BlockId`].
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    pub textures: TextureCatalog,
    blocks: Vec<Option<BlockType>>,
    by_name: HashMap<String, BlockId>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            textures: TextureCatalog::new(),
            blocks: vec![None; BlockId::MAX as usize + 1],
            by_name: HashMap::new(),
        }
    }

    /// Adds a type under its own id. Id 0 and duplicates are rejected.
    pub fn register(&mut self, ty: BlockType) -> Result<BlockId, Box<dyn Error>> {
        let id = ty.id;
        if id == AIR {
            return Err(format!("block '{}' cannot use id 0 (air)", ty.name).into());
        }
        if let Some(existing) = &self.blocks[id as usize] {
            return Err(format!(
                "block id {} used by both '{}' and '{}'",
                id, existing.name, ty.name
            )
            .into());
        }
        if self.by_name.contains_key(&ty.name) {
            return Err(format!("duplicate block name '{}'", ty.name).into());
        }
        self.by_name.insert(ty.name.clone(), id);
        self.blocks[id as usize] = Some(ty);
        Ok(id)
    }

    /// Resolves a non-air id. Air and unregistered ids yield `None`.
    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        if id == AIR {
            return None;
        }
        self.blocks[id as usize].as_ref()
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
        self.blocks.iter().flatten()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Blocks light and hides neighbor faces. Air and unknown ids are not opaque.
    #[inline]
    pub fn is_opaque(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|t| !t.flags.transparent)
    }

    #[inline]
    pub fn is_transparent(&self, id: BlockId) -> bool {
        !self.is_opaque(id)
    }

    #[inline]
    pub fn is_glass(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|t| t.flags.glass)
    }

    #[inline]
    pub fn emission(&self, id: BlockId) -> u8 {
        self.get(id).map_or(0, |t| t.emission)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(toml_str)?;
        Self::from_configs(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_configs(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = BlockRegistry::new();
        for def in cfg.blocks {
            let ty = compile_block(&mut reg.textures, def)?;
            reg.register(ty)?;
        }
        Ok(reg)
    }
}

fn compile_block(textures: &mut TextureCatalog, def: BlockDef) -> Result<BlockType, Box<dyn Error>> {
    let mut ty = BlockType::new(def.id, def.name, def.model);
    if let Some(t) = def.transparent {
        ty.flags.transparent = t;
    }
    if let Some(g) = def.glass {
        ty.flags.glass = g;
    }
    if let Some(t) = def.translucent {
        ty.flags.translucent = t;
    }
    if let Some(level) = def.emission {
        if level > MAX_LIGHT {
            return Err(format!("block '{}' emission {} exceeds {}", ty.name, level, MAX_LIGHT).into());
        }
        ty.emission = level;
    }
    if let Some(cols) = def.colliders {
        ty.colliders = cols
            .into_iter()
            .map(|c| {
                Aabb::new(
                    Vec3::new(c.min[0], c.min[1], c.min[2]),
                    Vec3::new(c.max[0], c.max[1], c.max[2]),
                )
            })
            .collect();
    }
    for key in def.textures.keys() {
        if !TEXTURE_KEYS.iter().any(|(k, _)| k == key) {
            return Err(format!("block '{}' has unknown texture key '{}'", ty.name, key).into());
        }
    }
    let face_count = ty.face_layers.len();
    for (key, faces) in TEXTURE_KEYS {
        let Some(name) = def.textures.get(key) else {
            continue;
        };
        let layer = textures.intern(name);
        if key == "all" {
            ty.face_layers.iter_mut().for_each(|l| *l = layer);
            continue;
        }
        for &face in faces.iter().filter(|&&f| f < face_count) {
            ty.face_layers[face] = layer;
        }
    }
    Ok(ty)
}
