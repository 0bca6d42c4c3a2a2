use std::path::{Path, PathBuf};

/// How to invoke the Tesseract binary.
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Path or name of the `tesseract` executable.
    pub binary: PathBuf,
    /// Language pack passed with `-l`.
    pub language: String,
    /// Page segmentation mode (`--psm`); `None` keeps the engine default.
    pub page_segmentation: Option<u8>,
    /// OCR engine mode (`--oem`); `None` keeps the engine default.
    pub engine_mode: Option<u8>,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_segmentation: None,
            engine_mode: None,
        }
    }
}

impl OcrOptions {
    pub fn with_binary(mut self, binary: impl AsRef<Path>) -> Self {
        self.binary = binary.as_ref().to_path_buf();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_page_segmentation(mut self, psm: Option<u8>) -> Self {
        self.page_segmentation = psm;
        self
    }

    /// Select the recognizer: `0` legacy, `1` LSTM, `2` both, `3` default.
    pub fn with_engine_mode(mut self, oem: Option<u8>) -> Self {
        self.engine_mode = oem;
        self
    }

    /// Arguments shared by every recognition call, after input/output.
    pub(crate) fn common_args(&self) -> Vec<String> {
        let mut args = vec!["-l".to_string(), self.language.clone()];
        if let Some(psm) = self.page_segmentation {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        if let Some(oem) = self.engine_mode {
            args.push("--oem".to_string());
            args.push(oem.to_string());
        }
        args
    }
}

