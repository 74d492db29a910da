use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::ModelKind;

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct BlockDef {
    pub id: u8,
    pub name: String,
    #[serde(default)]
    pub model: ModelKind,
    #[serde(default)]
    pub transparent: Option<bool>,
    #[serde(default)]
    pub glass: Option<bool>,
    #[serde(default)]
    pub translucent: Option<bool>,
    /// Block-light level emitted by this block (0..=15).
    #[serde(default)]
    pub emission: Option<u8>,
    /// Replaces the model's collision boxes (unit block space).
    #[serde(default)]
    pub colliders: Option<Vec<ColliderDef>>,
    /// Face texture keys: all, sides, x, y, z, right, left, top, bottom, front, back.
    #[serde(default)]
    pub textures: HashMap<String, String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct ColliderDef {
    pub min: [f32; 3],
    pub max: [f32; 3],
}
