use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use watermark_removal::selector::LineSelector;
use watermark_removal::{
    pipeline, Method, Outcome, PipelineOptions, Region, RegionSelector, Selection,
};

#[derive(Parser)]
#[command(
    name = "watermark-remove",
    about = "Remove rectangular watermarks from images via inpainting",
    version,
    after_help = "Methods:\n  \
                  lama   : deep inpainting model, best quality (default)\n  \
                  ns     : diffusion fill, fast (alias: opencv)\n  \
                  telea  : fast-marching fill, fastest\n\n\
                  Examples:\n  \
                  watermark-remove photo.png --region 100,50,200,30\n  \
                  watermark-remove photo.png --multi --method telea\n  \
                  watermark-remove photo.png --select --preview"
)]
struct Cli {
    /// Input image file
    input: PathBuf,

    /// Output image file (default: {stem}_no_watermark{ext})
    output: Option<PathBuf>,

    /// Watermark region as x,y,w,h (repeatable)
    #[arg(long, value_name = "X,Y,W,H", conflicts_with_all = ["select", "multi"])]
    region: Vec<String>,

    /// Pick a single region interactively
    #[arg(long, conflicts_with = "multi")]
    select: bool,

    /// Pick multiple regions interactively
    #[arg(long)]
    multi: bool,

    /// Inpainting method: lama, ns, opencv or telea
    #[arg(short, long, default_value = "lama")]
    method: String,

    /// Classical fill neighborhood radius
    #[arg(long, default_value_t = 5)]
    radius: u32,

    /// Mask edge feathering radius
    #[arg(long, default_value_t = 0)]
    feather: u32,

    /// Path to the LaMa ONNX weight file
    #[arg(long)]
    model: Option<PathBuf>,

    /// Show a before/after preview instead of writing a file
    #[arg(long)]
    preview: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.region.is_empty() && !cli.select && !cli.multi {
        eprintln!("Error: no watermark region specified");
        eprintln!("  --region x,y,w,h     explicit coordinates (repeatable)");
        eprintln!("  --select             pick a single region");
        eprintln!("  --multi              pick multiple regions");
        process::exit(1);
    }

    let regions = match gather_regions(&cli) {
        Ok(Some(regions)) => regions,
        Ok(None) => {
            eprintln!("Selection cancelled.");
            return;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let opts = PipelineOptions {
        method: Method::parse(&cli.method),
        radius: cli.radius,
        feather: cli.feather,
        model: cli.model.clone(),
        preview: cli.preview,
    };

    match pipeline::run(&cli.input, cli.output.as_deref(), &regions, &opts) {
        Ok(Outcome::Written(path)) => {
            eprintln!("Done! Saved: {}", path.display());
        }
        Ok(Outcome::Preview(preview)) => {
            // Rendering is the display collaborator's job; without one
            // attached, report the composition and write nothing.
            eprintln!(
                "Preview composed ({}x{}); no display attached, nothing written.",
                preview.width(),
                preview.height()
            );
        }
        Ok(Outcome::NothingToDo) => {
            eprintln!("No region covers the image; nothing to do.");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Resolve the region set from flags or interactive selection.
///
/// `Ok(None)` means the selection was cancelled.
fn gather_regions(cli: &Cli) -> watermark_removal::Result<Option<Vec<Region>>> {
    if !cli.region.is_empty() {
        let mut regions = Vec::with_capacity(cli.region.len());
        for literal in &cli.region {
            regions.push(literal.parse::<Region>()?);
        }
        return Ok(Some(regions));
    }

    // Selection needs the image up front; the pipeline reloads it later,
    // as the original tool did.
    let image = pipeline::load_image(Path::new(&cli.input))?;
    let stdin = std::io::stdin();
    let mut selector = LineSelector::new(BufReader::new(stdin.lock()), cli.multi);
    match selector.select(&image)? {
        Selection::Cancelled => Ok(None),
        Selection::Regions(regions) => Ok(Some(regions)),
    }
}
