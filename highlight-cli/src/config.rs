use anyhow::{Context, Result};
use clap::ValueEnum;
use image_proc::TextMetrics;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Which renderings are produced for each image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Outline only; text stays readable.
    #[default]
    Visible,
    /// White block inside the outline.
    Cover,
    /// Visible answer key plus covered exam.
    Both,
}

/// Optional JSON run file. Every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub keywords: Vec<String>,
    pub mode: Option<Mode>,
    pub number: bool,
    pub delete_unmatched: bool,
    pub min_confidence: Option<f32>,
    pub erase_min_confidence: Option<f32>,
    pub language: Option<String>,
    pub tesseract: Option<PathBuf>,
    pub page_segmentation: Option<u8>,
    pub engine_mode: Option<u8>,
    pub font: Option<PathBuf>,
    pub label_metrics: Option<TextMetrics>,
}

pub fn load_config(path: &Path) -> Result<RunConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: RunConfig = serde_json::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Read one keyword per line, skipping blanks.
pub fn load_keywords_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read keywords {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: RunConfig =
            serde_json::from_str(r#"{"keywords": ["femur"], "mode": "both", "label_metrics": "bounding-box"}"#)
                .unwrap();
        assert_eq!(cfg.keywords, ["femur"]);
        assert_eq!(cfg.mode, Some(Mode::Both));
        assert_eq!(cfg.label_metrics, Some(TextMetrics::BoundingBox));
        assert!(!cfg.number);
        assert!(cfg.tesseract.is_none());
    }

    #[test]
    fn tesseract_modes_are_read() {
        let cfg: RunConfig =
            serde_json::from_str(r#"{"page_segmentation": 11, "engine_mode": 1}"#).unwrap();
        assert_eq!((cfg.page_segmentation, cfg.engine_mode), (Some(11), Some(1)));
        assert_eq!(RunConfig::default().engine_mode, None);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(serde_json::from_str::<RunConfig>(r#"{"mode": "hidden"}"#).is_err());
    }

    #[test]
    fn keywords_file_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        fs::write(&path, "femur\n\n  sutura lacrimal  \n").unwrap();
        assert_eq!(load_keywords_file(&path).unwrap(), ["femur", "sutura lacrimal"]);
    }
}
