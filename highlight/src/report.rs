/// Outcome for one image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageReport {
    pub success: bool,
    /// Match regions found (every occurrence of every phrase).
    pub occurrences: usize,
    /// Whether any phrase passed the whole-text check.
    pub keyword_present: bool,
    /// Regions covered in the most-covered output.
    pub covered: usize,
}

impl ImageReport {
    pub fn failed() -> Self {
        Self::default()
    }

    pub fn no_keyword() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn found(occurrences: usize, covered: usize) -> Self {
        Self {
            success: true,
            occurrences,
            keyword_present: true,
            covered,
        }
    }

    /// `(success, occurrences_found, any_keyword_present)`.
    pub fn decision(&self) -> (bool, usize, bool) {
        (self.success, self.occurrences, self.keyword_present)
    }

    /// Whether a delete-unmatched policy should drop this image's outputs.
    pub fn should_discard(&self) -> bool {
        self.success && !self.keyword_present
    }
}

/// Running totals over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
    pub without_keywords: usize,
    pub deleted: usize,
    pub occurrences: usize,
}

impl BatchSummary {
    pub fn record(&mut self, report: &ImageReport) {
        if !report.success {
            self.failed += 1;
            return;
        }
        self.processed += 1;
        self.occurrences += report.occurrences;
        if !report.keyword_present {
            self.without_keywords += 1;
        }
    }

    pub fn record_deleted(&mut self) {
        self.deleted += 1;
    }

    pub fn with_keywords(&self) -> usize {
        self.processed - self.without_keywords
    }

    /// Human-readable report lines, in display order.
    pub fn lines(&self, deletion_enabled: bool) -> Vec<String> {
        let mut lines = vec![
            format!("Images processed: {}", self.processed),
            format!("Images with occurrences: {}", self.with_keywords()),
            format!("Images without occurrences: {}", self.without_keywords),
        ];
        if deletion_enabled {
            lines.push(format!("Images deleted: {}", self.deleted));
        }
        lines.push(format!("Images with errors: {}", self.failed));
        lines.push(format!("Occurrences highlighted: {}", self.occurrences));
        lines
    }
}
