use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use strata_mesh_cpu::MeshOptions;

/// Engine tunables. Every field falls back to its default when absent from
/// the TOML source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Streaming radius, in chunks.
    pub render_distance: i32,
    /// Dirty subchunks rebuilt per visible chunk per tick.
    pub chunk_updates: usize,
    /// Light queue entries processed per tick.
    pub light_steps_per_tick: usize,
    pub smooth_lighting: bool,
    pub day_length_ticks: u64,
    /// Extra chunks past `render_distance` before a chunk is unloaded.
    pub unload_margin: i32,
    pub save_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_distance: 8,
            chunk_updates: 4,
            light_steps_per_tick: 4096,
            smooth_lighting: true,
            day_length_ticks: 36_000,
            unload_margin: 3,
            save_dir: PathBuf::from("save"),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    #[inline]
    pub fn mesh_options(&self) -> MeshOptions {
        MeshOptions {
            smooth_lighting: self.smooth_lighting,
        }
    }

    #[inline]
    pub fn unload_distance(&self) -> i32 {
        self.render_distance + self.unload_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let cfg = EngineConfig::from_toml_str("render_distance = 3\nsmooth_lighting = false\n")
            .unwrap();
        assert_eq!(cfg.render_distance, 3);
        assert!(!cfg.smooth_lighting);
        assert_eq!(cfg.chunk_updates, 4);
        assert_eq!(cfg.light_steps_per_tick, 4096);
        assert_eq!(cfg.save_dir, PathBuf::from("save"));
        assert_eq!(cfg.unload_distance(), 6);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(EngineConfig::from_toml_str("render_distance = \"far\"").is_err());
    }
}
