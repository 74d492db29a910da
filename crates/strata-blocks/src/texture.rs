use std::collections::HashMap;

/// Texture-array layer index.
pub type TextureLayer = u16;

#[derive(Clone, Debug)]
pub struct Texture {
    pub layer: TextureLayer,
    pub name: String,
}

/// Assigns texture-array layers to texture names in first-use order.
#[derive(Default, Clone, Debug)]
pub struct TextureCatalog {
    pub textures: Vec<Texture>,
    pub by_name: HashMap<String, TextureLayer>,
}

impl TextureCatalog {
    pub fn new() -> Self {
        Self {
            textures: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Returns the existing layer for `name` or appends a new one.
    pub fn intern(&mut self, name: &str) -> TextureLayer {
        if let Some(layer) = self.by_name.get(name) {
            return *layer;
        }
        let layer = self.textures.len() as TextureLayer;
        self.by_name.insert(name.to_string(), layer);
        self.textures.push(Texture {
            layer,
            name: name.to_string(),
        });
        layer
    }

    pub fn get_layer(&self, name: &str) -> Option<TextureLayer> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, layer: TextureLayer) -> Option<&Texture> {
        self.textures.get(layer as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
