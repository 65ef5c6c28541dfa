use std::{
    fs::{self, File},
    io::{stdout, BufReader, Write},
    thread,
    time::Instant,
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use common::progress::Progress;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

use args::Args;
use slicer::{
    geometry::BoundingBox,
    mesh::load_mesh,
    slicer::{SliceSummary, Slicer},
};

mod args;

fn main() -> Result<()> {
    let filter = filter::Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target("slicer", LevelFilter::DEBUG)
        .with_target("common", LevelFilter::DEBUG);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.volume_config()?;
    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let file = File::open(&args.mesh)
        .with_context(|| format!("Failed to open `{}`", args.mesh.display()))?;
    let mut mesh = load_mesh(BufReader::new(file))
        .with_context(|| format!("Failed to load `{}`", args.mesh.display()))?;
    mesh.scale(args.scale);
    mesh.translate(args.translate);

    println!(
        "Loaded `{}`. {{ facets: {} }}",
        args.mesh.display(),
        mesh.facet_count()
    );

    let start = config.grid_start() - config.voxel_size / 2.0;
    let volume = BoundingBox::from_points(&[
        start,
        start + config.grid.map(|x| x as f32).component_mul(&config.voxel_size),
    ]);
    match mesh.bounds() {
        Some(bounds) if !volume.contains(&bounds) => {
            warn!("Model extends outside of the volume grid and will be cut off")
        }
        None => warn!("Model has no facets"),
        _ => {}
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create `{}`", args.output.display()))?;

    let now = Instant::now();
    let slicer = Slicer::new(mesh, config);
    let progress = Progress::new();

    // Slice on another thread so this one can report progress
    let summary = thread::scope(|s| -> Result<SliceSummary> {
        let worker = s.spawn(|| {
            slicer.slice_layers(0..slicer.layer_count(), &progress, |layer, image| {
                let path = args.output.join(format!("slice{layer}.png"));
                image
                    .save(&path)
                    .with_context(|| format!("Failed to write `{}`", path.display()))
            })
        });

        while !progress.is_finished() && !worker.is_finished() {
            let completed = progress.wait();
            print!(
                "\rLayer: {}/{}, {:.1}%",
                completed,
                progress.total(),
                progress.fraction() * 100.0
            );
            stdout().flush()?;
        }

        worker
            .join()
            .map_err(|_| anyhow!("Slicing thread panicked"))?
    })?;

    match summary.top_layer {
        Some(top) => println!("\nReached the top of the model at slice {top}"),
        None => println!("\nModel extends past the last slice"),
    }
    println!(
        "Done. Wrote {} slices in {:.1?}",
        summary.layers,
        now.elapsed()
    );

    Ok(())
}
