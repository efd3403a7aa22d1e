//! Provides the `photoquad-cli` tool for inspecting and previewing images.
//!
//! Usage:
//! - `photoquad-cli info <files...> [--formats rgba8,rgb8]`
//! - `photoquad-cli render <files...> [-o out.png] [--width 1024] [--height 512]`
//!
//! Logging is controlled with `RUST_LOG` and defaults to `warn`.
//!
//! # Examples
//! ```text
//! photoquad-cli info photo.jpg
//! photoquad-cli render photo.jpg scan.png -o preview.png
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use image::{ImageBuffer, Rgba};
use photoquad::formats::shared::exif::OrientationCode;
use photoquad::formats::shared::pixel::{plan_conversion, Conversion, SupportedFormats};
use photoquad::formats::{self, BitDepth, ChannelLayout, LoadError};
use photoquad::renderer;
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "photoquad-cli",
    about = "Inspect images and render them as EXIF-oriented quads"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one JSON line of metadata per image
    Info {
        /// Input image paths
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Pixel formats the target device samples directly, comma separated
        /// (e.g. "rgba8,rgb8,gray16")
        #[arg(long, default_value = "rgba8")]
        formats: SupportedFormats,
    },

    /// Render images side by side into a PNG
    Render {
        /// Input image paths
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output PNG path
        #[arg(short, long, default_value = "photoquad.png")]
        output: PathBuf,

        /// Output width in pixels
        #[arg(long, default_value_t = 1024)]
        width: u32,

        /// Output height in pixels
        #[arg(long, default_value_t = 512)]
        height: u32,
    },
}

#[derive(Serialize)]
struct ImageReport<'a> {
    path: &'a Path,
    width: u32,
    height: u32,
    layout: ChannelLayout,
    bit_depth: BitDepth,
    orientation: Option<OrientationCode>,
    needs_conversion: bool,
    displayable: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Info { files, formats } => info(&files, &formats),
        Commands::Render {
            files,
            output,
            width,
            height,
        } => render(&files, &output, width, height),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn info(files: &[PathBuf], supported: &SupportedFormats) -> Result<(), LoadError> {
    for path in files {
        let loaded = formats::read_image_from_path(path)?;
        let image = &loaded.image;
        let plan = plan_conversion(image.layout, image.bit_depth, |l, d| supported.contains(l, d));

        let report = ImageReport {
            path,
            width: image.width,
            height: image.height,
            layout: image.layout,
            bit_depth: image.bit_depth,
            orientation: loaded.orientation,
            needs_conversion: matches!(plan, Ok(c) if c != Conversion::Identity),
            displayable: plan.is_ok(),
        };
        let line = serde_json::to_string(&report)
            .map_err(|e| LoadError::InvalidData(format!("Failed to serialize report: {}", e)))?;
        println!("{}", line);
    }
    Ok(())
}

fn render(files: &[PathBuf], output: &Path, width: u32, height: u32) -> Result<(), LoadError> {
    let images = files
        .iter()
        .map(|path| formats::read_image_from_path(path))
        .collect::<Result<Vec<_>, _>>()?;

    eprintln!(
        "Rendering {} image(s) ({}x{})...",
        images.len(),
        width,
        height
    );
    let pixels = renderer::render_images(&images, width, height)?;

    let img: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_raw(width, height, pixels)
        .ok_or_else(|| LoadError::InvalidData("Pixel buffer size mismatch".to_string()))?;
    img.save(output)?;

    eprintln!("Saved {}", output.display());
    Ok(())
}
