use clap::{Parser, Subcommand};
use hajj_photos::compliance::{self, FaceDetector, FixedDetector, PixelBox};
use hajj_photos::imaging::{ImageBackend, RustBackend};
use hajj_photos::session::{DirectoryExport, Session, TransformUpdate};
use hajj_photos::{config, output};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn version_string() -> &'static str {
    let commit = env!("HAJJ_PHOTOS_COMMIT");
    if commit.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{} ({commit})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "hajj-photos")]
#[command(about = "Prepare a compliant 200×200 portrait photo under 1 MB")]
#[command(long_about = "\
Prepare a compliant 200×200 portrait photo under 1 MB

Converts an existing JPG/JPEG photo into a square 200×200 JPEG that fits the
byte budget, with optional zoom and pan of the crop. HEIC/HEIF photos are
recognized but must be exported as JPG first.

The crop works on a 240px preview square: at zoom 1 the photo covers the
square, zoom magnifies up to 3×, and pan offsets move the photo in preview
pixels (positive X moves it right). Panning past an edge pins the crop there.

Run 'hajj-photos requirements' for the full photo requirements and
'hajj-photos gen-config' for a documented hajj-photos.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults apply if it does not exist)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop, resize and compress a photo into the output file
    Convert {
        /// JPG/JPEG (or HEIC/HEIF) photo
        input: PathBuf,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Zoom factor, clamped to the configured range
        #[arg(long)]
        zoom: Option<f64>,
        /// Horizontal pan in preview pixels
        #[arg(long, allow_hyphen_values = true)]
        pan_x: Option<f64>,
        /// Vertical pan in preview pixels
        #[arg(long, allow_hyphen_values = true)]
        pan_y: Option<f64>,
    },
    /// Score a still photo against the framing and background checks
    Analyze {
        image: PathBuf,
        /// Face box in image pixels as X,Y,W,H (repeatable; largest wins)
        #[arg(long, value_parser = parse_face_box)]
        face: Vec<PixelBox>,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock hajj-photos.toml with all options documented
    GenConfig,
    /// Print the photo requirements
    Requirements,
}

fn parse_face_box(s: &str) -> Result<PixelBox, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in face box: {e}"))?;
    match parts[..] {
        [x, y, width, height] if width > 0.0 && height > 0.0 => Ok(PixelBox {
            x,
            y,
            width,
            height,
        }),
        [_, _, _, _] => Err("face box width and height must be positive".to_string()),
        _ => Err(format!("expected X,Y,W,H, got {s:?}")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            input,
            out,
            zoom,
            pan_x,
            pan_y,
        } => {
            let config = config::load_config(&cli.config)?;
            convert(&input, &out, config, TransformUpdate {
                zoom,
                offset_x: pan_x,
                offset_y: pan_y,
            })?;
        }
        Command::Analyze { image, face, json } => {
            let config = config::load_config(&cli.config)?;
            let bytes = std::fs::read(&image)?;
            let frame = RustBackend::new().decode(&bytes)?;
            let mut detector = FixedDetector::new(face);
            let detections = detector.detect(frame.pixels(), Duration::ZERO)?;
            let snapshot =
                compliance::analyze_detections(frame.pixels(), &detections, &config.compliance);
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                output::print_snapshot(&snapshot);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Requirements => {
            let config = config::load_config(&cli.config)?;
            output::print_requirements(&config);
        }
    }

    Ok(())
}

fn convert(
    input: &Path,
    out: &Path,
    config: config::AppConfig,
    transform: TransformUpdate,
) -> Result<(), Box<dyn std::error::Error>> {
    let max_bytes = config.encoder.max_bytes;
    let mut session = Session::new(RustBackend::new(), config);
    session.load_file(input)?;
    if transform != TransformUpdate::default() {
        session.update_transform(transform)?;
    }

    if let (Some(source), Some(crop)) = (session.source(), session.crop()) {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        for line in output::format_source(&name, source.dimensions(), crop, &session.transform()) {
            println!("{}", line);
        }
    }

    session.convert()?;
    let saved = session.download(&mut DirectoryExport::new(out))?;
    if let Some(result) = session.result() {
        output::print_convert_result(
            result,
            &session.output_file_name(),
            max_bytes,
            Some(&saved),
        );
    }
    Ok(())
}
