use crate::OcrResult;
use crate::config::OcrOptions;
use crate::result::OcrPage;
use crate::tsv::parse_tsv;
use anyhow::{Context, bail};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// A recognizer that turns one decoded image into an [`OcrPage`].
///
/// Calls are blocking and made one image at a time.
pub trait OcrBackend {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Run OCR on an already loaded image.
    fn recognize_image(&mut self, image: &RgbImage) -> OcrResult<OcrPage>;

    /// Run OCR on an image file. Transparent pixels are composited onto
    /// white first, matching what the highlighting pipeline feeds in.
    fn recognize_path(&mut self, image_path: &Path) -> OcrResult<OcrPage> {
        let image = image::open(image_path)
            .with_context(|| format!("failed to open image at {:?}", image_path))?;
        self.recognize_image(&onto_white(&image))
    }
}

fn onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

impl<B: OcrBackend + ?Sized> OcrBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn recognize_image(&mut self, image: &RgbImage) -> OcrResult<OcrPage> {
        (**self).recognize_image(image)
    }
}

/// OCR engine backed by the `tesseract` command line tool.
///
/// Images are piped through stdin as PNG, so the caller's decoded (and
/// alpha-flattened) pixels are what gets recognized.
pub struct TesseractEngine {
    options: OcrOptions,
    version: String,
}

impl TesseractEngine {
    /// Build an engine with default options.
    pub fn new() -> OcrResult<Self> {
        Self::with_options(OcrOptions::default())
    }

    /// Build an engine with custom options, failing when the binary cannot
    /// be executed.
    pub fn with_options(options: OcrOptions) -> OcrResult<Self> {
        let version = read_version(&options.binary)?;
        debug!(binary = ?options.binary, %version, "tesseract available");
        Ok(Self { options, version })
    }

    /// First line of `tesseract --version`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn options(&self) -> &OcrOptions {
        &self.options
    }

    fn run(&self, png: &[u8], output_config: Option<&str>) -> OcrResult<String> {
        let mut command = Command::new(&self.options.binary);
        command.arg("stdin").arg("stdout").args(self.options.common_args());
        if let Some(config) = output_config {
            command.arg(config);
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start {:?}", self.options.binary))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(png)
                .context("failed to pipe image into tesseract")?;
        }

        let output = child
            .wait_with_output()
            .context("failed to wait for tesseract")?;
        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrBackend for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize_image(&mut self, image: &RgbImage) -> OcrResult<OcrPage> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .context("failed to encode image for tesseract")?;

        let full_text = self.run(&png, None).context("text recognition failed")?;
        let tsv = self
            .run(&png, Some("tsv"))
            .context("word box recognition failed")?;
        let tokens = parse_tsv(&tsv)?;
        debug!(tokens = tokens.len(), "tesseract pass complete");

        Ok(OcrPage::new(full_text, tokens))
    }
}

fn read_version(binary: &Path) -> OcrResult<String> {
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .with_context(|| format!("failed to execute {:?}; is Tesseract installed?", binary))?;
    if !output.status.success() {
        bail!("{:?} --version exited with {}", binary, output.status);
    }
    // Older releases print the banner on stderr.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let banner = if stdout.trim().is_empty() { stderr } else { stdout };
    Ok(banner.lines().next().unwrap_or_default().trim().to_string())
}

/// Convenience function to run OCR without manually managing the engine.
pub fn recognize_image(image_path: impl AsRef<Path>, options: Option<OcrOptions>) -> OcrResult<OcrPage> {
    let mut engine = match options {
        Some(opts) => TesseractEngine::with_options(opts)?,
        None => TesseractEngine::new()?,
    };
    engine.recognize_path(image_path.as_ref())
}
