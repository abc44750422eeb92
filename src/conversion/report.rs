//! Conversion report types.
//!
//! A run produces one [`ConversionReport`]: batch counts, objects per class,
//! and a per-file issue list with stable codes for programmatic consumers.

use serde::Serialize;
use std::fmt;

/// Summary of one conversion run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Root the annotation files were read from.
    pub annotations_root: String,
    /// Root the label files were written to.
    pub output_root: String,
    pub counts: ConversionCounts,
    /// Objects written per class, in class id order.
    pub classes: Vec<ClassCount>,
    /// Issues in relative-path order.
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    pub fn new(annotations_root: impl Into<String>, output_root: impl Into<String>) -> Self {
        Self {
            annotations_root: annotations_root.into(),
            output_root: output_root.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    /// Files that were skipped (error-level issues).
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    /// Returns true if every discovered file produced a label file.
    pub fn is_complete(&self) -> bool {
        self.counts.skipped == 0
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Converted {} of {} annotation file(s) from {} into {}",
            self.counts.written,
            self.counts.discovered,
            self.annotations_root,
            self.output_root
        )?;
        writeln!(
            f,
            "  label files: {} ({} background), skipped: {}",
            self.counts.written, self.counts.background, self.counts.skipped
        )?;
        writeln!(f, "  objects: {}", self.counts.objects)?;
        for class in &self.classes {
            writeln!(f, "    {} {}: {}", class.class_id, class.name, class.objects)?;
        }

        for (title, severity) in [
            ("Errors", ConversionSeverity::Error),
            ("Warnings", ConversionSeverity::Warning),
        ] {
            let issues: Vec<&ConversionIssue> = self
                .issues
                .iter()
                .filter(|i| i.severity == severity)
                .collect();
            if issues.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{} ({}):", title, issues.len())?;
            for issue in issues {
                writeln!(f, "  - {}", issue)?;
            }
        }

        Ok(())
    }
}

/// Batch counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    /// Annotation files found under the root.
    pub discovered: usize,
    /// Label files written, background ones included.
    pub written: usize,
    /// Label files written empty.
    pub background: usize,
    /// Annotation files that could not be read or parsed.
    pub skipped: usize,
    /// Label lines written.
    pub objects: usize,
}

/// Objects written for one class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    pub class_id: u32,
    pub name: String,
    pub objects: usize,
}

/// One problem with one annotation file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    /// Annotation path relative to the annotations root.
    pub path: String,
    pub message: String,
}

impl ConversionIssue {
    /// An issue that caused the file to be skipped.
    pub fn error(
        code: ConversionIssueCode,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: ConversionSeverity::Error,
            code,
            path: path.into(),
            message: message.into(),
        }
    }

    /// An anomaly that was tolerated; the label file was still written.
    pub fn warning(
        code: ConversionIssueCode,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConversionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.code, self.path, self.message)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    Error,
    Warning,
}

/// Stable issue codes.
///
/// These codes are part of the JSON report and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// The file could not be read.
    UnreadableAnnotation,
    /// The file is not well-formed JSON.
    InvalidAnnotationJson,
    /// Required fields are missing or have the wrong shape.
    MalformedAnnotation,
    /// A written box has min > max on some axis.
    BoxInverted,
    /// A written box extends past the image bounds.
    BoxOutOfBounds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_issues_by_severity() {
        let mut report = ConversionReport::new("annotations", "labels");
        report.add(ConversionIssue::error(
            ConversionIssueCode::MalformedAnnotation,
            "a.json",
            "missing field `Width`",
        ));
        report.add(ConversionIssue::warning(
            ConversionIssueCode::BoxInverted,
            "b.json",
            "leftEye box is inverted",
        ));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn display_lists_errors_before_warnings() {
        let mut report = ConversionReport::new("annotations", "labels");
        report.counts = ConversionCounts {
            discovered: 3,
            written: 2,
            background: 1,
            skipped: 1,
            objects: 2,
        };
        report.add(ConversionIssue::warning(
            ConversionIssueCode::BoxOutOfBounds,
            "b.json",
            "phone box exceeds 640x480",
        ));
        report.add(ConversionIssue::error(
            ConversionIssueCode::InvalidAnnotationJson,
            "c.json",
            "EOF while parsing",
        ));

        let text = report.to_string();
        assert!(text.contains("Converted 2 of 3 annotation file(s)"));
        assert!(text.contains("(1 background), skipped: 1"));
        let errors_at = text.find("Errors (1):").expect("errors section");
        let warnings_at = text.find("Warnings (1):").expect("warnings section");
        assert!(errors_at < warnings_at);
        assert!(text.contains("[InvalidAnnotationJson] c.json: EOF while parsing"));
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = ConversionReport::new("annotations", "labels");
        report.add(ConversionIssue::error(
            ConversionIssueCode::UnreadableAnnotation,
            "a.json",
            "permission denied",
        ));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"severity\":\"error\""));
        assert!(json.contains("\"code\":\"unreadable_annotation\""));
        assert!(json.contains("\"path\":\"a.json\""));
    }
}
