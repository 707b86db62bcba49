//! CLI binary for sixup.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ImposeConfig`, writes the sheet, and optionally dispatches it.

use anyhow::{Context, Result};
use clap::Parser;
use sixup::{
    impose, ColorMode, CropMode, ImposeConfig, Mailer, PlacementPolicy, SourceImage,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Impose a label onto the default 9-inch sheet
  sixup label.jpg

  # Name the output explicitly
  sixup label.jpg -o mango_sheet.pdf

  # Press-ready: CMYK, auto-crop, 600 dpi
  sixup --color cmyk --crop auto --dpi 600 label.png

  # Derive the filename from the label text (needs tesseract on PATH)
  sixup --recognize label.jpg

  # E-mail the sheet to prepress instead of saving it
  sixup --recognize --email label.jpg

  # Centered layout on a 10-inch sheet
  sixup --placement centered --sheet-side 10 label.jpg

  # JSON stats on stdout
  sixup --json label.jpg > stats.json

CROP MODES:
  none         keep the full frame (default)
  auto         trim the light border around the printed area
  <mm>         shave a fixed strip off every edge, e.g. --crop 3.5

ENVIRONMENT VARIABLES (e-mail dispatch):
  SIXUP_SMTP_HOST       SMTP server hostname (default smtp.gmail.com)
  SIXUP_SMTP_PORT       Implicit-TLS port (default 465)
  SIXUP_SMTP_USER       Account and sender address (required)
  SIXUP_SMTP_PASSWORD   Account password (required)
  SIXUP_RECIPIENT       Destination address (required)
"#;

/// Impose six copies of a label image onto a square PDF sheet.
#[derive(Parser, Debug)]
#[command(
    name = "sixup",
    version,
    about = "Impose six copies of a label image onto a square PDF sheet",
    long_about = "Takes one label image (JPEG or PNG), normalises it for print, and lays six \
copies out in a 2x3 grid on a single-page square PDF with hairline cutting guides. The sheet \
can be named from the label text via OCR and dispatched by e-mail.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Label image path (.jpg, .jpeg, or .png).
    input: PathBuf,

    /// Write the PDF to this path instead of the derived filename.
    #[arg(short, long, env = "SIXUP_OUTPUT")]
    output: Option<PathBuf>,

    /// Raster resolution in dots per inch (300-600).
    #[arg(long, env = "SIXUP_DPI", default_value_t = 450,
          value_parser = clap::value_parser!(u32).range(300..=600))]
    dpi: u32,

    /// Colour mode: rgb, gray, cmyk.
    #[arg(long, env = "SIXUP_COLOR", value_enum, default_value = "rgb")]
    color: ColorArg,

    /// Crop mode: none, auto, or a millimetre trim like 3.5.
    #[arg(long, env = "SIXUP_CROP", default_value = "none")]
    crop: String,

    /// JPEG quality for CMYK output (85-95).
    #[arg(long, env = "SIXUP_JPEG_QUALITY", default_value_t = 95,
          value_parser = clap::value_parser!(u8).range(85..=95))]
    jpeg_quality: u8,

    /// Sheet side length in inches.
    #[arg(long, env = "SIXUP_SHEET_SIDE", default_value_t = 9.0)]
    sheet_side: f32,

    /// Placement policy: gripper, centered.
    #[arg(long, env = "SIXUP_PLACEMENT", value_enum, default_value = "gripper")]
    placement: PlacementArg,

    /// Gripper edge reserve in millimetres (gripper placement only).
    #[arg(long, env = "SIXUP_GRIPPER_MM", default_value_t = 10.0)]
    gripper_mm: f32,

    /// Gap between cells in millimetres (gripper placement only).
    #[arg(long, env = "SIXUP_GUTTER_MM", default_value_t = 8.0)]
    gutter_mm: f32,

    /// Explicit margins in points: top,left,h_gap,v_gap. Overrides --placement.
    #[arg(long, env = "SIXUP_MARGINS")]
    margins: Option<String>,

    /// Derive the filename from the label text via OCR.
    #[arg(short, long, env = "SIXUP_RECOGNIZE")]
    recognize: bool,

    /// E-mail the sheet using the SIXUP_SMTP_* environment variables.
    #[arg(short, long, env = "SIXUP_EMAIL")]
    email: bool,

    /// Output structured JSON stats instead of the summary line.
    #[arg(long, env = "SIXUP_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SIXUP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SIXUP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ColorArg {
    Rgb,
    Gray,
    Cmyk,
}

impl From<ColorArg> for ColorMode {
    fn from(v: ColorArg) -> Self {
        match v {
            ColorArg::Rgb => ColorMode::Rgb,
            ColorArg::Gray => ColorMode::Gray,
            ColorArg::Cmyk => ColorMode::Cmyk,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PlacementArg {
    Gripper,
    Centered,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;

    // ── Impose ───────────────────────────────────────────────────────────
    let src = SourceImage::open(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let output = impose(&src, &config).context("Imposition failed")?;

    // ── Dispatch and/or save ─────────────────────────────────────────────
    if cli.email {
        let mailer = Mailer::from_env().context("E-mail dispatch is not configured")?;
        mailer
            .send(&output)
            .with_context(|| format!("Failed to dispatch '{}'", output.filename))?;
        if !cli.quiet && !cli.json {
            eprintln!(
                "{} Dispatched {}",
                green("✔"),
                bold(&output.filename)
            );
        }
    }

    // E-mail-only runs skip the disk write unless -o asks for one.
    let out_path = match (&cli.output, cli.email) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => None,
        (None, false) => Some(PathBuf::from(&output.filename)),
    };

    if let Some(ref path) = out_path {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        std::fs::write(path, &output.pdf)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&output.stats)
            .context("Failed to serialise stats")?;
        println!("{json}");
    } else if !cli.quiet {
        if let Some(ref path) = out_path {
            eprintln!(
                "{}  {} KB  {}ms  →  {}",
                green("✔"),
                output.approx_kib(),
                output.stats.total_duration_ms,
                bold(&path.display().to_string()),
            );
        }
        eprintln!(
            "   {}  {}",
            cyan(&format!(
                "{}x{} px",
                output.stats.label_px_width, output.stats.label_px_height
            )),
            dim(&format!(
                "{} raster, {} KB embedded once",
                output.stats.encoded_format,
                output.stats.encoded_bytes.div_ceil(1024)
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `ImposeConfig`.
fn build_config(cli: &Cli) -> Result<ImposeConfig> {
    let placement = if let Some(ref margins) = cli.margins {
        parse_margins(margins)?
    } else {
        match cli.placement {
            PlacementArg::Gripper => PlacementPolicy::GripperGutter {
                gripper_mm: cli.gripper_mm,
                gutter_mm: cli.gutter_mm,
            },
            PlacementArg::Centered => PlacementPolicy::Centered,
        }
    };

    ImposeConfig::builder()
        .dpi(cli.dpi)
        .color_mode(cli.color.clone().into())
        .crop(parse_crop(&cli.crop)?)
        .jpeg_quality(cli.jpeg_quality)
        .sheet_side_in(cli.sheet_side)
        .placement(placement)
        .recognize(cli.recognize)
        .build()
        .context("Invalid configuration")
}

/// Parse `--crop` string into `CropMode`.
fn parse_crop(s: &str) -> Result<CropMode> {
    match s.trim().to_lowercase().as_str() {
        "none" => Ok(CropMode::None),
        "auto" => Ok(CropMode::Auto),
        mm => {
            let mm: f32 = mm.parse().with_context(|| {
                format!("Invalid crop mode '{s}': expected none, auto, or a millimetre value")
            })?;
            Ok(CropMode::TrimMm(mm))
        }
    }
}

/// Parse `--margins` string ("top,left,h_gap,v_gap" in points).
fn parse_margins(s: &str) -> Result<PlacementPolicy> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f32>()
                .context(format!("Invalid margin value: '{}'", p.trim()))
        })
        .collect::<Result<Vec<_>>>()?;

    if parts.len() != 4 {
        anyhow::bail!(
            "Invalid margins '{}': expected four comma-separated values (top,left,h_gap,v_gap)",
            s
        );
    }

    Ok(PlacementPolicy::Margins {
        top: parts[0],
        left: parts[1],
        h_gap: parts[2],
        v_gap: parts[3],
    })
}
