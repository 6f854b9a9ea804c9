//! Headless front end: opens one image in an editor session, applies the
//! edits named on the command line and saves the result into a directory.
//!
//!   pictor -i shot.png -o out/ --ratio 4-3 --crop 10,10,400,300 --filter blur=12
//!   pictor -i photo.jpg -o out/ --text "Hello" --font DejaVuSans.ttf

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use pictor::config::load_editor_config;
use pictor::filter::FilterKind;
use pictor::geometry::{Rect, Size};
use pictor::selection::MirrorAxis;
use pictor::text::FontMeasure;
use pictor::upload::{CompletionHandle, DirectoryCompletion, UploadedImage};
use pictor::{logging, EditorSession};

#[derive(Parser, Debug)]
#[command(name = "pictor", about = "Crop, filter and annotate an image without a GUI")]
struct CliArgs {
    /// Image to edit.
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Directory the edited file is written to, under the input's file name.
    #[arg(short, long, value_name = "DIR")]
    output_dir: PathBuf,

    /// Viewport the session is laid out in, as WIDTHxHEIGHT.
    #[arg(long, default_value = "1280x800", value_name = "WxH")]
    viewport: String,

    /// Crop aspect ratio: free, 1-1, 4-3, 3-4, 19-9 or square.
    #[arg(long, value_name = "RATIO")]
    ratio: Option<String>,

    /// Crop region in source pixels, as X,Y,WIDTH,HEIGHT.
    #[arg(long, value_name = "X,Y,W,H")]
    crop: Option<String>,

    /// Filter to enable, optionally with a value (e.g. `blur=12`). Repeatable.
    #[arg(long = "filter", value_name = "NAME[=VALUE]")]
    filters: Vec<String>,

    #[arg(long, value_name = "AXIS")]
    mirror: Option<String>,

    /// Rotation in degrees, clockwise.
    #[arg(long, allow_hyphen_values = true)]
    rotate: Option<f64>,

    /// Text to place in the middle of the view.
    #[arg(long)]
    text: Option<String>,

    /// TrueType/OpenType font used to measure and draw text.
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init();
    let args = CliArgs::parse();
    let config = load_editor_config();

    let upload = UploadedImage::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create {}", args.output_dir.display()))?;
    let viewport = parse_viewport(&args.viewport)?;

    let completion = CompletionHandle::new(DirectoryCompletion::new(&args.output_dir));
    let mut session = EditorSession::open(upload, completion, viewport, config);
    if let Some(path) = &args.font {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
        let measure = FontMeasure::from_bytes(bytes)
            .with_context(|| format!("invalid font {}", path.display()))?;
        session = session.with_font(measure.font().clone());
    }

    if args.ratio.is_some() || args.crop.is_some() {
        crop(&mut session, args.ratio.as_deref(), args.crop.as_deref())?;
    }

    if let Some(axis) = &args.mirror {
        let axis = match axis.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "h" => MirrorAxis::Horizontal,
            "vertical" | "v" => MirrorAxis::Vertical,
            other => bail!("unknown mirror axis {other:?}"),
        };
        session.mirror_selected(axis);
    }
    if let Some(degrees) = args.rotate {
        session.rotate_selected(degrees);
    }

    for entry in &args.filters {
        let (name, value) = match entry.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (entry.as_str(), None),
        };
        let kind = FilterKind::parse(name).with_context(|| format!("unknown filter {name:?}"))?;
        if session.toggle_filter(kind) != Some(true) {
            bail!("filter {name:?} could not be enabled");
        }
        if let Some(value) = value {
            session.set_filter_value(value);
        }
    }

    if let Some(content) = &args.text {
        let id = session.add_text().context("text could not be added")?;
        if session.begin_text_edit(id)? {
            if let Some(edit) = session.text_edit_mut() {
                edit.buffer.set_text(content.replace("\\n", "\n"));
            }
            session.commit_text_edit();
        }
    }

    let file = session.save()?;
    tracing::info!(
        path = %args.output_dir.join(&file.name).display(),
        bytes = file.bytes.len(),
        "done"
    );
    Ok(())
}

fn crop(session: &mut EditorSession, ratio: Option<&str>, region: Option<&str>) -> Result<()> {
    session.clear_selection();
    session.start_crop()?;
    if let Some(token) = ratio {
        session.set_crop_ratio(token);
    }
    if let Some(region) = region {
        let values: Vec<f64> = region
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("invalid crop region {region:?}"))?;
        let [x, y, width, height] = values[..] else {
            bail!("crop region needs four values, got {region:?}");
        };
        let image = session
            .crop()
            .map(|crop| crop.frozen().bounds())
            .context("crop session missing")?;
        session.resize_crop_selector(Rect::new(image.x + x, image.y + y, width, height));
    }
    let applied = session.apply_crop()?;
    tracing::info!(?applied, "crop applied");
    Ok(())
}

fn parse_viewport(raw: &str) -> Result<Size> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .with_context(|| format!("viewport must look like 1280x800, got {raw:?}"))?;
    let width: f64 = width.trim().parse().context("invalid viewport width")?;
    let height: f64 = height.trim().parse().context("invalid viewport height")?;
    if width <= 0.0 || height <= 0.0 {
        bail!("viewport must be positive, got {raw:?}");
    }
    Ok(Size::new(width, height))
}
