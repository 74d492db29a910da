//! World façade: block edits, lighting, per-tick meshing and day/night.
#![forbid(unsafe_code)]

mod clock;
mod config;
mod raycast;
mod world;

pub use clock::{DAYLIGHT_MIN, DayClock};
pub use config::EngineConfig;
pub use raycast::{HIT_RANGE, HitRay, RayHit};
pub use world::{TickStats, World};
