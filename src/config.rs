//! Configuration for layout detection, ordering, cleaning and conversion.
//!
//! Every threshold used by the pipeline lives here rather than as a constant,
//! so that atypical layouts (narrow gutters, three-column pages) can be tuned
//! without code changes. All sections deserialize with defaults for missing
//! fields, so a JSON config file only needs to name what it changes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Column layout detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum gutter width as a fraction of page width.
    pub min_gap_ratio: f32,

    /// Maximum number of columns reported for a page.
    pub max_columns: usize,

    /// Width of one density bin, in points.
    pub bin_width: f32,

    /// A bin counts as empty when its density is at most this fraction of the peak.
    pub noise_ratio: f32,

    /// Runs wider than this fraction of the content width do not vote in the
    /// density profile (titles, captions spanning the gutter).
    pub spanning_width_ratio: f32,

    /// Largest gap between words of one line, as a multiple of the text height.
    pub word_gap_ratio: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_gap_ratio: 0.05,
            max_columns: 2,
            bin_width: 2.0,
            noise_ratio: 0.1,
            spanning_width_ratio: 0.6,
            word_gap_ratio: 1.0,
        }
    }
}

/// How lines from different columns are sequenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadingMode {
    /// Row by row: left line, right line, next row.
    #[default]
    RowInterleaved,
    /// Column blocks: the whole left column, then the right one, restarting
    /// after every full-width separator.
    ColumnMajor,
}

/// Reading-order reconstruction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Vertical distance (points) within which runs share a row.
    pub row_tolerance: f32,

    /// Line sequencing across columns.
    pub mode: ReadingMode,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            mode: ReadingMode::RowInterleaved,
        }
    }
}

/// Header/footer and noise removal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Fraction of pages a margin line must appear on to be dropped.
    pub repetition_threshold: f32,

    /// Never treat a line as repeated unless it is seen on at least this many pages.
    pub min_repeat_pages: usize,

    /// Height of the top and bottom margin bands as a fraction of page height.
    pub margin_band_ratio: f32,

    /// Drop standalone page numbers ("12", "Page 12", "- 12 -").
    pub strip_page_numbers: bool,

    /// Drop lines shorter than this many characters.
    pub min_line_chars: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            repetition_threshold: 0.5,
            min_repeat_pages: 2,
            margin_band_ratio: 0.1,
            strip_page_numbers: true,
            min_line_chars: 3,
        }
    }
}

/// Which backends the converter tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendPolicy {
    /// Primary first, fallback once on failure or degenerate output.
    #[default]
    PrimaryFirst,
    /// Skip the primary backend entirely.
    FallbackOnly,
}

/// Document conversion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Minimum fraction of total page area that extracted runs must cover
    /// before the primary result is trusted.
    pub degenerate_area_ratio: f32,

    /// Per-document time budget in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Backend selection.
    pub backend_policy: BackendPolicy,

    /// Text placed between pages in the assembled document.
    pub page_separator: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            degenerate_area_ratio: 0.01,
            timeout_ms: None,
            backend_policy: BackendPolicy::PrimaryFirst,
            page_separator: "\n\n".to_string(),
        }
    }
}

impl ConversionConfig {
    /// Time budget as a duration, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflowConfig {
    /// Column detection.
    pub detection: DetectionConfig,
    /// Reading order.
    pub ordering: OrderingConfig,
    /// Text cleaning.
    pub cleaning: CleaningConfig,
    /// Conversion policy.
    pub conversion: ConversionConfig,
}

impl ReflowConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the minimum gutter width (fraction of page width).
    pub fn with_min_gap_ratio(mut self, ratio: f32) -> Self {
        self.detection.min_gap_ratio = ratio;
        self
    }

    /// Set the maximum column count.
    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.detection.max_columns = max_columns;
        self
    }

    /// Set the row bucket tolerance in points.
    pub fn with_row_tolerance(mut self, tolerance: f32) -> Self {
        self.ordering.row_tolerance = tolerance;
        self
    }

    /// Set the reading mode.
    pub fn with_reading_mode(mut self, mode: ReadingMode) -> Self {
        self.ordering.mode = mode;
        self
    }

    /// Set the header/footer repetition threshold (fraction of pages).
    pub fn with_repetition_threshold(mut self, threshold: f32) -> Self {
        self.cleaning.repetition_threshold = threshold;
        self
    }

    /// Set the degenerate-page area threshold.
    pub fn with_degenerate_area_ratio(mut self, ratio: f32) -> Self {
        self.conversion.degenerate_area_ratio = ratio;
        self
    }

    /// Set the per-document time budget.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.conversion.timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    /// Set the backend policy.
    pub fn with_backend_policy(mut self, policy: BackendPolicy) -> Self {
        self.conversion.backend_policy = policy;
        self
    }

    /// Check that all values are in range.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        if !(0.0..1.0).contains(&d.min_gap_ratio) {
            return Err(Error::InvalidConfig(format!(
                "min_gap_ratio must be in [0, 1), got {}",
                d.min_gap_ratio
            )));
        }
        if d.max_columns == 0 {
            return Err(Error::InvalidConfig("max_columns must be at least 1".to_string()));
        }
        if d.bin_width <= 0.0 || !d.bin_width.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "bin_width must be positive, got {}",
                d.bin_width
            )));
        }
        if !(0.0..1.0).contains(&d.noise_ratio) {
            return Err(Error::InvalidConfig(format!(
                "noise_ratio must be in [0, 1), got {}",
                d.noise_ratio
            )));
        }
        if !(d.spanning_width_ratio > 0.0 && d.spanning_width_ratio <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "spanning_width_ratio must be in (0, 1], got {}",
                d.spanning_width_ratio
            )));
        }
        if d.word_gap_ratio < 0.0 || !d.word_gap_ratio.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "word_gap_ratio must be non-negative, got {}",
                d.word_gap_ratio
            )));
        }
        if self.ordering.row_tolerance < 0.0 || !self.ordering.row_tolerance.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "row_tolerance must be non-negative, got {}",
                self.ordering.row_tolerance
            )));
        }
        let c = &self.cleaning;
        if !(0.0..=1.0).contains(&c.repetition_threshold) {
            return Err(Error::InvalidConfig(format!(
                "repetition_threshold must be in [0, 1], got {}",
                c.repetition_threshold
            )));
        }
        if !(0.0..=0.5).contains(&c.margin_band_ratio) {
            return Err(Error::InvalidConfig(format!(
                "margin_band_ratio must be in [0, 0.5], got {}",
                c.margin_band_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.conversion.degenerate_area_ratio) {
            return Err(Error::InvalidConfig(format!(
                "degenerate_area_ratio must be in [0, 1], got {}",
                self.conversion.degenerate_area_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReflowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.max_columns, 2);
        assert_eq!(config.detection.min_gap_ratio, 0.05);
        assert_eq!(config.conversion.backend_policy, BackendPolicy::PrimaryFirst);
        assert!(config.conversion.timeout().is_none());
    }

    #[test]
    fn test_builders() {
        let config = ReflowConfig::new()
            .with_max_columns(3)
            .with_row_tolerance(5.0)
            .with_timeout(Some(Duration::from_secs(2)))
            .with_backend_policy(BackendPolicy::FallbackOnly);

        assert_eq!(config.detection.max_columns, 3);
        assert_eq!(config.ordering.row_tolerance, 5.0);
        assert_eq!(config.conversion.timeout(), Some(Duration::from_secs(2)));
        assert_eq!(config.conversion.backend_policy, BackendPolicy::FallbackOnly);
    }

    #[test]
    fn test_rejects_zero_columns() {
        let config = ReflowConfig::new().with_max_columns(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_out_of_range_gap() {
        let config = ReflowConfig::new().with_min_gap_ratio(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_spanning_ratio() {
        for ratio in [-0.5, 0.0, 1.5, f32::NAN] {
            let mut config = ReflowConfig::new();
            config.detection.spanning_width_ratio = ratio;
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "accepted spanning_width_ratio {}",
                ratio
            );
        }

        let mut config = ReflowConfig::new();
        config.detection.spanning_width_ratio = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_word_gap() {
        let mut config = ReflowConfig::new();
        config.detection.word_gap_ratio = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "detection": { "max_columns": 3 }, "ordering": { "mode": "ColumnMajor" } }"#;
        let config: ReflowConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.detection.max_columns, 3);
        assert_eq!(config.detection.min_gap_ratio, 0.05);
        assert_eq!(config.ordering.mode, ReadingMode::ColumnMajor);
        assert_eq!(config.cleaning, CleaningConfig::default());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reflow.json");
        std::fs::write(&path, r#"{ "cleaning": { "repetition_threshold": 0.8 } }"#).unwrap();

        let config = ReflowConfig::from_json_file(&path).unwrap();
        assert_eq!(config.cleaning.repetition_threshold, 0.8);
    }

    #[test]
    fn test_from_json_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(ReflowConfig::from_json_file(&path), Err(Error::InvalidConfig(_))));
    }
}
