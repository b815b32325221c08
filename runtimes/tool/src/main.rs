use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use bsp_transform::{all_transforms, create_transform, Context, ContextOptions, Transform};
use clap::Parser;
use tracing::{info, Level};
use vmf::EntityGraph;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Entity dump to transform (JSON array of entities)
    input: PathBuf,

    /// Where to write the transformed entities. Defaults to stdout
    #[arg(short, long, default_value = None)]
    output: Option<PathBuf>,

    /// Only run the named transforms, instead of every registered one
    #[arg(short, long = "transform")]
    transforms: Vec<String>,

    #[arg(short, long)]
    verbose: bool,

    /// Log every remap before applying it
    #[arg(long = "dump-remaps")]
    dump_remaps: bool,

    /// Run the transforms but leave connections untouched
    #[arg(long = "skip-apply")]
    skip_apply: bool,

    #[arg(long = "max-remap-depth", default_value_t = ContextOptions::default().max_remap_depth)]
    max_remap_depth: usize,
}

fn select_transforms(names: &[String]) -> Vec<Box<dyn Transform>> {
    if names.is_empty() {
        return all_transforms();
    }

    let mut transforms: Vec<Box<dyn Transform>> =
        names.iter().filter_map(|name| create_transform(name)).collect();
    transforms.sort_by_key(|transform| transform.priority());
    transforms
}

pub fn main() -> Result<()> {
    let args = Args::parse();

    let max_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();

    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let graph = EntityGraph::from_json(&json)
        .with_context(|| format!("parsing {}", args.input.display()))?;
    info!("loaded {} entities from {}", graph.len(), args.input.display());

    let options = ContextOptions {
        max_remap_depth: args.max_remap_depth,
    };
    let mut ctx = Context::with_options(graph, options);

    let transforms = select_transforms(&args.transforms);
    for transform in &transforms {
        info!("running {} (priority {})", transform.name(), transform.priority());
        transform.run(&mut ctx);
    }

    if args.verbose {
        for id in ctx.graph().entity_ids() {
            vmf::util::log_entity(ctx.graph(), id);
        }
    }

    if args.dump_remaps {
        let mut remaps: Vec<_> = ctx.io_remaps().collect();
        remaps.sort_by(|a, b| a.0.cmp(b.0));
        for ((name, input), entry) in remaps {
            let destinations: Vec<String> = entry
                .outputs
                .iter()
                .map(|out| format!("{}.{} (+{}s)", out.target, out.input, out.delay))
                .collect();
            info!(
                "remap {}.{} -> [{}] remove={}",
                name,
                input,
                destinations.join(", "),
                entry.remove
            );
        }
    }

    if args.skip_apply {
        info!("skipping {} pending remaps", ctx.io_remap_count());
    } else {
        let rewritten = ctx.apply_io_remaps();
        info!("rewrote {} connections", rewritten);
    }

    let result = ctx.graph().to_json()?;
    match &args.output {
        Some(path) => fs::write(path, result)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout();
            writeln!(stdout, "{result}")?;
        }
    }

    Ok(())
}
