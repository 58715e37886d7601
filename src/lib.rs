use anyhow::{Context, Result, anyhow};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{info, warn};

pub mod logging;
pub mod overlay;
mod paths;
pub mod record;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use overlay::{
    OverlayEngine, OverlayError, OverlayOutcome, OverlayPreview, Rendered, SkipReason,
};
pub use record::{DescriptionRecord, ExtraField, Field};
pub use settings::Settings;

#[derive(Debug, Clone)]
pub struct Config {
    pub images: Vec<PathBuf>,
    pub record_path: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub preview: bool,
    pub stamp: bool,
    pub settings_path: Option<PathBuf>,
}

/// Per-image report lines plus the number of images that could not be processed.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub lines: Vec<String>,
    pub failures: usize,
}

pub fn run(config: Config) -> Result<BatchReport> {
    let settings = settings::load_settings(config.settings_path.as_deref())?;
    run_with_settings(&config, &settings)
}

pub fn run_with_settings(config: &Config, settings: &Settings) -> Result<BatchReport> {
    if config.images.is_empty() {
        return Err(anyhow!("no images given"));
    }
    let mut record = match &config.record_path {
        Some(path) => DescriptionRecord::load(path)?,
        None if config.preview => DescriptionRecord::enabled(),
        None => return Err(anyhow!("a description record is required (--record)")),
    };
    if config.stamp {
        record = record.with_capture_stamp(OffsetDateTime::now_utc());
    }

    let engine = OverlayEngine::from_settings(settings);
    let mut report = BatchReport::default();

    if !config.preview {
        fs::create_dir_all(&config.out_dir).with_context(|| {
            format!(
                "failed to create output directory: {}",
                config.out_dir.display()
            )
        })?;
    }

    for input in &config.images {
        let result = if config.preview {
            preview_one(&engine, &record, input)
        } else {
            annotate_one(&engine, &record, input, &config.out_dir, settings.jpeg_quality)
        };
        match result {
            Ok(line) => report.lines.push(line),
            Err(err) => {
                warn!("{}: {:#}", input.display(), err);
                report.lines.push(format!("{}: error: {:#}", input.display(), err));
                report.failures += 1;
            }
        }
    }

    Ok(report)
}

fn preview_one(engine: &OverlayEngine, record: &DescriptionRecord, input: &Path) -> Result<String> {
    let (width, height) = image::image_dimensions(input)
        .with_context(|| format!("failed to read image size: {}", input.display()))?;
    let preview = engine.preview(width, height, record);
    serde_json::to_string_pretty(&preview).with_context(|| "failed to serialize preview")
}

fn annotate_one(
    engine: &OverlayEngine,
    record: &DescriptionRecord,
    input: &Path,
    out_dir: &Path,
    jpeg_quality: u8,
) -> Result<String> {
    let file_name = input
        .file_name()
        .ok_or_else(|| anyhow!("not a file: {}", input.display()))?;
    let output = out_dir.join(file_name);
    if same_file(input, &output) {
        return Err(anyhow!(
            "output would overwrite the input: {}",
            output.display()
        ));
    }

    let image =
        image::open(input).with_context(|| format!("failed to decode image: {}", input.display()))?;
    let rendered = engine.render(&image, Some(record));
    save_image(&rendered.image, &output, jpeg_quality)?;
    info!("{} -> {}", input.display(), output.display());
    Ok(format!(
        "{} -> {} ({})",
        input.display(),
        output.display(),
        rendered.outcome
    ))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Writes `image` in the format implied by the extension; JPEG output drops
/// alpha and uses `jpeg_quality`.
pub fn save_image(image: &DynamicImage, output: &Path, jpeg_quality: u8) -> Result<()> {
    let format = ImageFormat::from_path(output)
        .with_context(|| format!("unknown image format: {}", output.display()))?;
    if format == ImageFormat::Jpeg {
        let file = fs::File::create(output)
            .with_context(|| format!("failed to create image: {}", output.display()))?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), jpeg_quality);
        DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(encoder)
            .with_context(|| format!("failed to encode image: {}", output.display()))?;
        return Ok(());
    }
    image
        .save_with_format(output, format)
        .with_context(|| format!("failed to write image: {}", output.display()))
}
