//! Split report types.

use serde::Serialize;
use std::fmt;

use crate::conversion::ClassCount;

/// A partition of the dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Train,
    Val,
}

impl Segment {
    pub const ALL: [Segment; 2] = [Segment::Train, Segment::Val];

    /// Directory name under the output root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Segment::Train => "train",
            Segment::Val => "val",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Summary of one split run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SplitReport {
    pub images_root: String,
    pub labels_root: String,
    pub output_root: String,
    pub seed: u64,
    pub train_ratio: f64,
    pub total_images: usize,
    pub segments: Vec<SegmentSummary>,
    /// Path of the written dataset descriptor, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_yaml: Option<String>,
    pub issues: Vec<SplitIssue>,
}

impl SplitReport {
    pub fn segment(&self, segment: Segment) -> Option<&SegmentSummary> {
        self.segments.iter().find(|s| s.segment == segment)
    }

    pub fn missing_label_count(&self) -> usize {
        self.segments.iter().map(|s| s.missing_labels).sum()
    }
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Split {} image(s) from {} into {} (seed {}, train ratio {})",
            self.total_images, self.images_root, self.output_root, self.seed, self.train_ratio
        )?;
        for summary in &self.segments {
            writeln!(
                f,
                "  {}: {} image(s), {} label file(s), {} without label, {} object(s)",
                summary.segment,
                summary.images,
                summary.labels,
                summary.missing_labels,
                summary.objects
            )?;
            for class in &summary.classes {
                writeln!(f, "    {} {}: {}", class.class_id, class.name, class.objects)?;
            }
        }
        if let Some(path) = &self.data_yaml {
            writeln!(f, "  dataset descriptor: {}", path)?;
        }

        if !self.issues.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", self.issues.len())?;
            for issue in &self.issues {
                writeln!(f, "  - {}", issue)?;
            }
        }

        Ok(())
    }
}

/// Counts for one segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub images: usize,
    /// Label files copied.
    pub labels: usize,
    /// Images copied without a label file.
    pub missing_labels: usize,
    /// Objects in the copied label files.
    pub objects: usize,
    pub classes: Vec<ClassCount>,
}

/// A tolerated anomaly found while splitting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitIssue {
    pub code: SplitIssueCode,
    /// Path relative to the images or labels root.
    pub path: String,
    pub message: String,
}

impl SplitIssue {
    pub fn new(code: SplitIssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SplitIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.code, self.path, self.message)
    }
}

/// Stable issue codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitIssueCode {
    /// The image has no label file; it was copied as a background image.
    MissingLabel,
    /// A label file could not be parsed; it was copied but not counted.
    InvalidLabelFile,
    /// A label line uses a class id outside the class map.
    UnknownClassId,
}
