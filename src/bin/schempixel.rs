use clap::error::ErrorKind;
use clap::Parser;
use console::style;
use schempixel::{ConvertError, ConvertSettings, Converter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Convert an image into block pixel art saved as a .schem schematic.
#[derive(Parser, Debug)]
#[command(name = "schempixel", version, about)]
struct Args {
    /// Input image (PNG, JPEG, BMP or GIF)
    input: PathBuf,

    /// Output schematic; `.schem` is appended when missing
    output: PathBuf,

    /// Target width in blocks (requires HEIGHT)
    #[arg(requires = "height")]
    width: Option<usize>,

    /// Target height in blocks
    height: Option<usize>,

    /// JSON settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Palette sources to use, comma separated (e.g. wool,concrete)
    #[arg(long, value_delimiter = ',')]
    blocks: Option<Vec<String>>,

    /// Directory containing palette source files
    #[arg(long)]
    block_dir: Option<PathBuf>,

    /// Shrink WIDTH x HEIGHT to the image's aspect ratio
    #[arg(long)]
    keep_ratio: bool,

    /// Write uncompressed NBT
    #[arg(long)]
    no_compress: bool,
}

fn settings_from_args(args: &Args) -> schempixel::Result<ConvertSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| {
                ConvertError::InvalidSettings(format!("{}: {}", path.display(), e))
            })?;
            ConvertSettings::from_json(&json)?
        }
        None => ConvertSettings::default(),
    };
    if let Some(blocks) = &args.blocks {
        settings.selected_blocks = blocks.clone();
    }
    if let Some(dir) = &args.block_dir {
        settings.block_dir = dir.clone();
    }
    if args.keep_ratio {
        settings.keep_aspect_ratio = true;
    }
    if args.no_compress {
        settings.compress = false;
    }
    Ok(settings)
}

fn run(args: &Args) -> schempixel::Result<()> {
    let settings = settings_from_args(args)?;
    let target = args.width.zip(args.height);
    let converter = Converter::new(settings);
    let summary = converter.convert(&args.input, &args.output, target)?;

    println!(
        "{} Converted {} in {:.2}s",
        style("✓").green().bold(),
        args.input.display(),
        summary.elapsed.as_secs_f64()
    );
    println!("  Size:    {} x {} blocks", summary.width, summary.height);
    println!("  Blocks:  {}", summary.block_count);
    println!("  Palette: {} block types", summary.palette_len);
    if summary.fallback_cells > 0 {
        println!(
            "  {} {} cells used the fallback block",
            style("!").yellow().bold(),
            summary.fallback_cells
        );
    }
    println!("  Output:  {}", style(summary.output_path.display()).cyan());
    Ok(())
}

/// Help and version requests succeed; every other argument error exits with 1.
fn exit_code_for(err: &clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Printing to the terminal can only fail if it is gone.
            let _ = e.print();
            return exit_code_for(&e);
        }
    };
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
