//! Chunk persistence and radius-based streaming.
#![forbid(unsafe_code)]

mod error;
pub mod generate;
pub mod nbt;
pub mod region;
mod save;

pub use error::SaveError;
pub use generate::{FlatGenerator, TerrainGenerator};
pub use save::{SaveStats, SaveSystem};
