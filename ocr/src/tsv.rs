//! Parser for Tesseract's `tsv` output.
//!
//! Header columns: `level page_num block_num par_num line_num word_num
//! left top width height conf text`. Layout rows (pages, blocks, lines)
//! carry `conf = -1` and no text; they are kept as noise tokens so the
//! word-box filter decides what survives.

use crate::OcrResult;
use crate::result::{BoundingBox, RawToken};
use anyhow::{Context, anyhow};
use csv::{ReaderBuilder, StringRecord};

struct Columns {
    left: usize,
    top: usize,
    width: usize,
    height: usize,
    conf: usize,
    text: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> OcrResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| anyhow!("tesseract tsv is missing the `{name}` column"))
        };
        Ok(Self {
            left: find("left")?,
            top: find("top")?,
            width: find("width")?,
            height: find("height")?,
            conf: find("conf")?,
            text: find("text")?,
        })
    }
}

/// Parse TSV text into raw tokens in output order.
pub fn parse_tsv(tsv: &str) -> OcrResult<Vec<RawToken>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(true)
        .from_reader(tsv.as_bytes());

    let headers = reader.headers().context("failed to read tsv header")?.clone();
    let columns = Columns::locate(&headers)?;

    let mut tokens = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("malformed tsv row {}", line + 2))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let int = |idx: usize, name: &str| -> OcrResult<i64> {
            let raw = record.get(idx).unwrap_or("").trim();
            raw.parse::<i64>()
                .with_context(|| format!("invalid `{name}` value {raw:?} on tsv row {}", line + 2))
        };
        let conf_raw = record.get(columns.conf).unwrap_or("").trim();
        let confidence = conf_raw
            .parse::<f32>()
            .with_context(|| format!("invalid `conf` value {conf_raw:?} on tsv row {}", line + 2))?;
        let bbox = BoundingBox::from_signed(
            int(columns.left, "left")?,
            int(columns.top, "top")?,
            int(columns.width, "width")?,
            int(columns.height, "height")?,
        );
        let text = record.get(columns.text).unwrap_or("");
        tokens.push(RawToken::new(text, confidence, bbox));
    }

    Ok(tokens)
}
