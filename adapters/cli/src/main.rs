#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates and inspects underwater cave levels.

mod layout_transfer;
mod logger;
mod preview;

use std::{fs, path::PathBuf};

use abyssal_core::{CellCoord, Event, GenerationConfig, MirroredCellCenter, RejectionReason};
use abyssal_system_generation::{Generation, Generator};
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::layout_transfer::CaveLayout;

#[derive(Debug, Parser)]
#[command(name = "abyssal")]
#[command(about = "Generate connected underwater cave levels", version)]
struct Cli {
    /// Raise log verbosity (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one seeded generation and print the result
    Generate(GenerateArgs),
    /// Print the map stored in a layout string
    Inspect {
        /// Layout string produced by `generate --export`
        layout: String,
    },
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Random seed for reproducible generation
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// TOML file overriding the shipped level preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long)]
    width: Option<u32>,

    /// Grid height in cells
    #[arg(long)]
    height: Option<u32>,

    /// World units covered by one cell
    #[arg(long, default_value_t = 1.0)]
    cell_size: f32,

    /// Skip the ASCII map
    #[arg(long)]
    no_map: bool,

    /// Print the layout string instead of the map and summary
    #[arg(long)]
    export: bool,
}

/// Entry point for the abyssal command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::install(logger::level_for(cli.verbose, cli.quiet))?;

    match cli.command {
        Command::Generate(args) => generate(&args),
        Command::Inspect { layout } => inspect(&layout),
    }
}

fn generate(args: &GenerateArgs) -> Result<()> {
    if !(args.cell_size.is_finite() && args.cell_size > 0.0) {
        bail!("cell size must be a positive number, got {}", args.cell_size);
    }

    let config = load_config(args)?;
    let mapping = MirroredCellCenter::new(config.carve.width, config.carve.height, args.cell_size);
    let mut generator = Generator::new(config).context("invalid generation configuration")?;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut events = Vec::new();

    let generation = generator
        .generate(&mut rng, &mapping, &mut events)
        .with_context(|| format!("generation failed for seed {}", args.seed))?;
    let layout = CaveLayout::from_generation(&generation);

    if args.export {
        println!("{}", layout.encode()?);
        return Ok(());
    }

    if !args.no_map {
        let route_cells: Vec<CellCoord> = generation
            .routes()
            .iter()
            .flat_map(|route| route.path.cells().iter().copied())
            .collect();
        print!("{}", preview::render_map(&layout, &route_cells));
        println!();
    }
    print_summary(args.seed, &generation, &events, &layout);
    Ok(())
}

fn inspect(value: &str) -> Result<()> {
    let layout = CaveLayout::decode(value).context("could not read layout string")?;
    let grid = layout.to_grid();

    print!("{}", preview::render_map(&layout, &[]));
    println!();
    println!(
        "{}x{} cave, {} open cells ({:.1}%)",
        grid.width(),
        grid.height(),
        grid.open_count(),
        grid.density()
    );
    for feature in &layout.features {
        println!(
            "  {} {:<10} {}",
            preview::feature_symbol(feature.kind),
            feature.kind,
            feature.cell
        );
    }
    println!("fingerprint {}", preview::fingerprint(&layout));
    Ok(())
}

fn load_config(args: &GenerateArgs) -> Result<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config at {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse config toml at {}", path.display()))?
        }
        None => GenerationConfig::default(),
    };

    if let Some(width) = args.width {
        config.carve.width = width;
    }
    if let Some(height) = args.height {
        config.carve.height = height;
    }
    Ok(config)
}

fn print_summary(seed: u64, generation: &Generation, events: &[Event], layout: &CaveLayout) {
    let grid = generation.grid();
    let rejected = events
        .iter()
        .filter(|event| matches!(event, Event::AttemptRejected { .. }))
        .count();
    let placement_failures = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::AttemptRejected {
                    reason: RejectionReason::PlacementFailed { .. },
                    ..
                }
            )
        })
        .count();

    println!(
        "seed {seed}: {}x{} cave, {} open cells ({:.1}%)",
        grid.width(),
        grid.height(),
        grid.open_count(),
        grid.density()
    );
    println!(
        "accepted on attempt {} ({rejected} rejected, {placement_failures} by placement)",
        generation.attempts()
    );

    println!("features:");
    for feature in generation.features() {
        println!(
            "  {} {:<10} {:<10} world ({:.2}, {:.2})",
            preview::feature_symbol(feature.kind),
            feature.kind,
            feature.cell.to_string(),
            feature.position.x,
            feature.position.y
        );
    }

    println!("routes:");
    for route in generation.routes() {
        println!(
            "  {:<24} {} -> {}, {} nodes",
            route.name,
            route.from,
            route.to,
            route.path.len()
        );
    }

    println!("fingerprint {}", preview::fingerprint(layout));
}
