use std::error::Error;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use hashbrown::HashMap;
use strata_blocks::{AIR, BlockRegistry};
use strata_chunk::{BlockPos, CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_WIDTH, ChunkCoord, LocalPos};
use strata_geom::Vec3;
use strata_io::region::{chunk_path, legacy_path};
use strata_io::{FlatGenerator, SaveSystem, nbt};
use strata_world::{EngineConfig, World};

const TICK_SECONDS: f32 = 1.0 / 20.0;
const STREAM_PER_TICK: usize = 2;

#[derive(Parser, Debug)]
#[command(name = "strata", about = "Headless driver for the chunked voxel engine")]
struct Cli {
    /// Engine settings (TOML). Defaults apply to missing keys.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Block type definitions (TOML).
    #[arg(long, global = true, default_value = "assets/blocks.toml")]
    blocks: PathBuf,
    /// Overrides `save_dir` from the config.
    #[arg(long, global = true)]
    save_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream a world around a walking player, edit it, and save.
    Simulate {
        #[arg(long, default_value_t = 600)]
        ticks: u32,
        /// Overrides `render_distance` from the config.
        #[arg(long)]
        radius: Option<i32>,
        /// Player movement per tick in blocks, as `DX,DZ`.
        #[arg(long, default_value = "0.5,0")]
        walk: Walk,
    },
    /// Print a saved chunk's block histogram and column heights.
    Inspect {
        #[arg(allow_hyphen_values = true)]
        x: i32,
        #[arg(allow_hyphen_values = true)]
        z: i32,
    },
}

#[derive(Clone, Copy, Debug)]
struct Walk {
    dx: f32,
    dz: f32,
}

impl FromStr for Walk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dx, dz) = s
            .split_once(',')
            .ok_or_else(|| format!("expected DX,DZ, got '{s}'"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f32>()
                .map_err(|e| format!("bad walk component '{v}': {e}"))
        };
        Ok(Walk {
            dx: parse(dx)?,
            dz: parse(dz)?,
        })
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &cli.save_dir {
        config.save_dir = dir.clone();
    }
    let reg = Arc::new(BlockRegistry::load_from_path(&cli.blocks)?);
    log::info!("{} block types from {}", reg.len(), cli.blocks.display());

    match cli.command {
        Command::Simulate {
            ticks,
            radius,
            walk,
        } => {
            if let Some(r) = radius {
                config.render_distance = r;
            }
            simulate(reg, config, ticks, walk)
        }
        Command::Inspect { x, z } => inspect(&reg, &config, ChunkCoord::column(x, z)),
    }
}

fn simulate(
    reg: Arc<BlockRegistry>,
    config: EngineConfig,
    ticks: u32,
    walk: Walk,
) -> Result<(), Box<dyn Error>> {
    let light = reg
        .id_by_name("glowstone")
        .ok_or("no 'glowstone' block type registered")?;
    let mut save = SaveSystem::new(config.save_dir.clone(), Box::new(FlatGenerator::new(&reg)));
    let mut world = World::new(Arc::clone(&reg), config);

    let mut player = Vec3::new(8.5, 66.0, 8.5);
    save.load(&mut world, player, 1);

    let mut placed: Option<BlockPos> = None;
    let (mut rebuilt, mut merged, mut light_steps, mut streamed) = (0, 0, 0, 0);
    for tick in 0..ticks {
        player.x += walk.dx;
        player.z += walk.dz;
        save.update_streaming(&mut world, player);
        streamed += save.stream_next(&mut world, STREAM_PER_TICK);

        if tick == ticks / 3 {
            let pos = BlockPos::containing(player).offset(2, 0, 0);
            if world.set_block(pos, light) {
                log::info!("placed light at {pos:?}, light={}", world.get_light(pos));
                placed = Some(pos);
            }
        }
        if tick == 2 * ticks / 3 {
            if let Some(pos) = placed.take() {
                world.set_block(pos, AIR);
                log::info!("removed light at {pos:?}, light={}", world.get_light(pos));
            }
        }

        let stats = world.tick(TICK_SECONDS);
        rebuilt += stats.subchunks_rebuilt;
        merged += stats.chunks_merged;
        light_steps += stats.light_steps;
        if tick % 100 == 0 {
            log::info!(
                "tick {tick}: {} resident, {} queued, daylight {:.2}",
                world.store().len(),
                save.pending(),
                world.daylight()
            );
        }
    }

    let written = save.save_all(&mut world);
    let s = save.stats();
    println!("ticks            {ticks}");
    println!("resident chunks  {}", world.store().len());
    println!("streamed chunks  {streamed}");
    println!("subchunks built  {rebuilt}");
    println!("chunks merged    {merged}");
    println!("light steps      {light_steps}");
    println!(
        "disk             {} loaded, {} legacy, {} generated, {} saved ({} at exit), {} failed",
        s.loaded, s.legacy, s.generated, s.saved, written, s.failed
    );
    Ok(())
}

fn inspect(
    reg: &BlockRegistry,
    config: &EngineConfig,
    coord: ChunkCoord,
) -> Result<(), Box<dyn Error>> {
    let path = chunk_path(&config.save_dir, coord);
    let blocks = if path.is_file() {
        nbt::decode_blocks(&nbt::read_payload(&path)?)?
    } else {
        let legacy = legacy_path(&config.save_dir, coord);
        if !legacy.is_file() {
            return Err(format!("no saved chunk at {}", path.display()).into());
        }
        nbt::decode_legacy(&std::fs::read(&legacy)?)
    };

    let mut counts: HashMap<u8, usize> = HashMap::new();
    for &b in &blocks {
        *counts.entry(b).or_default() += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    println!("chunk ({}, {}) from {}", coord.cx, coord.cz, path.display());
    for (id, n) in counts {
        let fallback = if id == AIR { "air" } else { "?" };
        let name = reg.get(id).map_or(fallback, |t| t.name.as_str());
        println!("{id:>4} {name:<16} {n}");
    }

    println!("column heights (top non-air y, -1 if empty):");
    for z in 0..CHUNK_LENGTH {
        let row: Vec<String> = (0..CHUNK_WIDTH)
            .map(|x| {
                let top = (0..CHUNK_HEIGHT)
                    .rev()
                    .find(|&y| blocks[LocalPos::new(x, y, z).index()] != AIR)
                    .map_or(-1, |y| y as i32);
                format!("{top:>4}")
            })
            .collect();
        println!("{}", row.join(""));
    }
    Ok(())
}
