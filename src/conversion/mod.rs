//! Annotation -> YOLO label conversion pipeline.
//!
//! Walks the annotation root, and for every `*.json` record parses it,
//! derives detections, normalizes their boxes and writes one label file at
//! the record's relative path (extension swapped to `.txt`) under the output
//! root. Unreadable or malformed records are reported and skipped; filesystem
//! errors on the output side abort the run.

pub mod report;

pub use report::{
    ClassCount, ConversionCounts, ConversionIssue, ConversionIssueCode, ConversionReport,
    ConversionSeverity,
};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::error::{DmsLabelError, FilenameCollision};
use crate::ir::io_annotation_json::{read_annotation_json, ANNOTATION_EXTENSION};
use crate::ir::io_yolo::{label_path_for, write_label_file, LabelLine};
use crate::ir::{AnnotationRecord, ClassMap};
use crate::rules::{derive_detections, Detection};
use crate::utils::{
    collect_files_with_extensions, create_progress_bar, ensure_output_disjoint, rel_string,
    reset_output_root,
};

/// Conversion options.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Directory searched recursively for annotation files.
    pub annotations_root: PathBuf,
    /// Directory the label tree is written to; wiped at the start of a run.
    pub output_root: PathBuf,
    pub class_map: ClassMap,
    pub show_progress: bool,
}

impl ConvertOptions {
    pub fn new(annotations_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            annotations_root: annotations_root.into(),
            output_root: output_root.into(),
            class_map: ClassMap::default(),
            show_progress: false,
        }
    }
}

/// What happened to one annotation file.
#[derive(Clone, Debug)]
pub enum FileOutcome {
    /// A label file was written (possibly empty).
    Written {
        rel_path: String,
        lines: Vec<LabelLine>,
        warnings: Vec<ConversionIssue>,
    },
    /// The record could not be read or parsed; no label file was written.
    Skipped(ConversionIssue),
}

/// Convert every annotation under `opts.annotations_root`.
pub fn convert_dataset(opts: &ConvertOptions) -> Result<ConversionReport, DmsLabelError> {
    let root = &opts.annotations_root;
    if !root.is_dir() {
        return Err(DmsLabelError::DirectoryWalk {
            path: root.clone(),
            message: "annotation root is not a directory".to_string(),
        });
    }
    ensure_output_disjoint(&opts.output_root, root)?;

    let files = collect_files_with_extensions(root, &[ANNOTATION_EXTENSION])?;
    if files.is_empty() {
        return Err(DmsLabelError::EmptyInput {
            root: root.clone(),
            what: "annotation files (*.json)",
        });
    }
    info!(
        "Found {} annotation file(s) under {}",
        files.len(),
        root.display()
    );

    let collisions = find_label_collisions(&files, root, &opts.output_root);
    if !collisions.is_empty() {
        return Err(DmsLabelError::FilenameCollision { collisions });
    }

    reset_output_root(&opts.output_root)?;

    let pb = create_progress_bar(files.len() as u64, "Convert", opts.show_progress);
    let outcomes = files
        .par_iter()
        .map(|path| {
            let outcome = convert_file(path, root, &opts.output_root, &opts.class_map);
            pb.inc(1);
            outcome
        })
        .collect::<Result<Vec<_>, _>>()?;
    pb.finish_and_clear();

    let report = build_report(opts, files.len(), outcomes);
    info!(
        "Wrote {} label file(s) ({} background), skipped {}",
        report.counts.written, report.counts.background, report.counts.skipped
    );
    Ok(report)
}

/// Records whose label files would be written to the same path.
///
/// `a.json` and `a.JSON` both map to `a.txt`. Paths are compared
/// case-insensitively, as in the split planner.
pub fn find_label_collisions(
    files: &[PathBuf],
    annotations_root: &Path,
    output_root: &Path,
) -> Vec<FilenameCollision> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    let mut collisions = Vec::new();

    for path in files {
        let path = path.as_path();
        let rel = path.strip_prefix(annotations_root).unwrap_or(path);
        let destination = label_path_for(output_root, rel);
        let key = rel_string(output_root, &destination).to_lowercase();
        match seen.get(&key) {
            Some(first) => collisions.push(FilenameCollision {
                destination,
                first: first.to_path_buf(),
                second: path.to_path_buf(),
            }),
            None => {
                seen.insert(key, path);
            }
        }
    }

    collisions
}

/// Convert one annotation file located under `annotations_root`.
///
/// Record-level problems come back as [`FileOutcome::Skipped`]; only output
/// filesystem errors are returned as `Err`.
pub fn convert_file(
    record_path: &Path,
    annotations_root: &Path,
    output_root: &Path,
    class_map: &ClassMap,
) -> Result<FileOutcome, DmsLabelError> {
    let rel_path = record_path.strip_prefix(annotations_root).map_err(|_| {
        DmsLabelError::DirectoryWalk {
            path: record_path.to_path_buf(),
            message: format!(
                "annotation is outside the annotation root {}",
                annotations_root.display()
            ),
        }
    })?;
    let rel = rel_string(annotations_root, record_path);

    let record = match read_annotation_json(record_path) {
        Ok(record) => record,
        Err(err) => {
            let Some(code) = skip_code(&err) else {
                return Err(err);
            };
            error!("Skipping {}: {}", rel, err);
            return Ok(FileOutcome::Skipped(ConversionIssue::error(
                code,
                rel,
                err.to_string(),
            )));
        }
    };

    let detections = derive_detections(&record);
    let warnings = box_warnings(&record, &detections, &rel);
    let lines = to_label_lines(&record, &detections, class_map);

    let label_path = label_path_for(output_root, rel_path);
    write_label_file(&label_path, &lines)?;
    debug!("{} -> {} object(s)", rel, lines.len());

    Ok(FileOutcome::Written {
        rel_path: rel,
        lines,
        warnings,
    })
}

/// Derive and normalize the label lines for one record.
pub fn derive_label_lines(record: &AnnotationRecord, class_map: &ClassMap) -> Vec<LabelLine> {
    to_label_lines(record, &derive_detections(record), class_map)
}

fn to_label_lines(
    record: &AnnotationRecord,
    detections: &[Detection],
    class_map: &ClassMap,
) -> Vec<LabelLine> {
    detections
        .iter()
        .map(|d| LabelLine::new(class_map.id(d.class), d.bbox.normalize(record.image_size)))
        .collect()
}

fn skip_code(err: &DmsLabelError) -> Option<ConversionIssueCode> {
    match err {
        DmsLabelError::AnnotationRead { .. } => Some(ConversionIssueCode::UnreadableAnnotation),
        DmsLabelError::AnnotationJsonParse { .. } => {
            Some(ConversionIssueCode::InvalidAnnotationJson)
        }
        DmsLabelError::MalformedAnnotation { .. } => Some(ConversionIssueCode::MalformedAnnotation),
        _ => None,
    }
}

fn box_warnings(
    record: &AnnotationRecord,
    detections: &[Detection],
    rel: &str,
) -> Vec<ConversionIssue> {
    let size = record.image_size;
    let mut warnings = Vec::new();

    for d in detections {
        let b = d.bbox;
        let issue = if !b.is_ordered() {
            ConversionIssue::warning(
                ConversionIssueCode::BoxInverted,
                rel,
                format!(
                    "{} box [{}, {}, {}, {}] has min > max; written unchanged",
                    d.source, b.xmin, b.ymin, b.xmax, b.ymax
                ),
            )
        } else if !b.is_within(size) {
            ConversionIssue::warning(
                ConversionIssueCode::BoxOutOfBounds,
                rel,
                format!(
                    "{} box [{}, {}, {}, {}] exceeds {}x{}; written unclamped",
                    d.source, b.xmin, b.ymin, b.xmax, b.ymax, size.width, size.height
                ),
            )
        } else {
            continue;
        };
        warn!("{}: {}", rel, issue.message);
        warnings.push(issue);
    }

    warnings
}

fn build_report(
    opts: &ConvertOptions,
    discovered: usize,
    outcomes: Vec<FileOutcome>,
) -> ConversionReport {
    let mut report = ConversionReport::new(
        opts.annotations_root.display().to_string(),
        opts.output_root.display().to_string(),
    );
    report.counts.discovered = discovered;

    let labels = opts.class_map.labels();
    let mut per_class = vec![0usize; labels.len()];

    for outcome in outcomes {
        match outcome {
            FileOutcome::Written {
                lines, warnings, ..
            } => {
                report.counts.written += 1;
                if lines.is_empty() {
                    report.counts.background += 1;
                }
                report.counts.objects += lines.len();
                for line in &lines {
                    if let Some(count) = per_class.get_mut(line.class_id as usize) {
                        *count += 1;
                    }
                }
                report.issues.extend(warnings);
            }
            FileOutcome::Skipped(issue) => {
                report.counts.skipped += 1;
                report.add(issue);
            }
        }
    }

    report.classes = labels
        .iter()
        .zip(per_class)
        .map(|(label, objects)| ClassCount {
            class_id: opts.class_map.id(*label),
            name: label.name().to_string(),
            objects,
        })
        .collect();

    report
}
