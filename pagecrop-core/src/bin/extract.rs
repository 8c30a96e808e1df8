use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use ab_glyph::FontVec;
use clap::Parser;
use tracing::{info, warn};

use pagecrop_core::consts::SYSTEM_FONT_PATHS;
use pagecrop_core::detector::PredictionsFileDetector;
use pagecrop_core::sources::{ImageDirSource, PageRasterSource};
use pagecrop_core::{ExtractorConfigBuilder, PageAssembler};

#[derive(Parser)]
#[command(name = "extract")]
#[command(about = "Page-layout region extraction tool")]
struct Args {
    #[arg(help = "Directory of rasterized page images")]
    pages: PathBuf,

    #[arg(help = "Layout predictions JSON file (one batch per page)")]
    predictions: PathBuf,

    #[arg(short, long, default_value = "figures", help = "Output image directory")]
    output: PathBuf,

    #[arg(short, long, default_value = ".", help = "Work directory for relative paths")]
    work_dir: PathBuf,

    #[arg(long, default_value = "0", help = "First page of the window (0-based)")]
    start_page: usize,

    #[arg(long, help = "Last page of the window, inclusive")]
    end_page: Option<usize>,

    #[arg(long, help = "Emit absolute artifact paths")]
    absolute_paths: bool,

    #[arg(long, help = "TrueType font for annotation labels")]
    font: Option<PathBuf>,
}

fn load_font(path: Option<&PathBuf>) -> Option<FontVec> {
    let candidates: Vec<PathBuf> = match path {
        Some(path) => vec![path.clone()],
        None => SYSTEM_FONT_PATHS.iter().map(PathBuf::from).collect(),
    };

    for candidate in candidates {
        if let Ok(data) = std::fs::read(&candidate)
            && let Ok(font) = FontVec::try_from_vec(data)
        {
            info!("using annotation font {}", candidate.display());
            return Some(font);
        }
    }

    warn!("no annotation font found, path labels will be skipped");
    None
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = ExtractorConfigBuilder::default()
        .work_dir(args.work_dir.clone())
        .image_dir(args.output.clone())
        .relative_path(!args.absolute_paths)
        .start_page(args.start_page)
        .font(load_font(args.font.as_ref()).map(Arc::new))
        .build()?;

    let source = ImageDirSource::new(&args.pages);
    let rasters = source.load_pages(args.start_page, args.end_page)?;
    info!("loaded {} page rasters from {}", rasters.len(), args.pages.display());

    let detector = PredictionsFileDetector::new(&args.predictions);

    let assembler = PageAssembler::new(config);
    let parsed = assembler.parse(rasters, &detector)?.into_parsed_data();

    println!("{}", serde_json::to_string_pretty(&parsed)?);

    Ok(())
}
