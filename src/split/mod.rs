//! Deterministic train/validation split of an images + labels tree.
//!
//! Images are discovered recursively, sorted by relative path, shuffled with a
//! seeded [`StdRng`] and cut at `floor(count * train_ratio)`. Each image and
//! its label file (same relative path, `.txt` extension, under the labels
//! root) are then copied flat into `<output>/<train|val>/{images,labels}/`.
//!
//! Everything that can make the run fail (bad options, no images, missing
//! labels in strict mode, flattening collisions) is checked before the output
//! root is touched.

pub mod report;

pub use report::{Segment, SegmentSummary, SplitIssue, SplitIssueCode, SplitReport};

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use crate::conversion::ClassCount;
use crate::error::{DmsLabelError, FilenameCollision};
use crate::ir::io_yolo::{label_path_for, read_label_file, LABEL_EXTENSION};
use crate::ir::ClassMap;
use crate::utils::{
    collect_files_with_extensions, create_progress_bar, ensure_output_disjoint, rel_string,
    reset_output_root,
};

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 42;

/// Fraction of images assigned to `train` when none is given.
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

/// Image extensions discovered by default (matched case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// Split options.
#[derive(Clone, Debug)]
pub struct SplitOptions {
    pub images_root: PathBuf,
    pub labels_root: PathBuf,
    /// Wiped at the start of the copy phase.
    pub output_root: PathBuf,
    /// Fraction of images assigned to `train`, in (0, 1).
    pub train_ratio: f64,
    pub seed: u64,
    pub image_extensions: Vec<String>,
    /// Fail instead of warning when an image has no label file.
    pub require_labels: bool,
    /// Write `data.yaml` into the output root.
    pub write_data_yaml: bool,
    pub class_map: ClassMap,
    pub show_progress: bool,
}

impl SplitOptions {
    pub fn new(
        images_root: impl Into<PathBuf>,
        labels_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            images_root: images_root.into(),
            labels_root: labels_root.into(),
            output_root: output_root.into(),
            train_ratio: DEFAULT_TRAIN_RATIO,
            seed: DEFAULT_SEED,
            image_extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            require_labels: false,
            write_data_yaml: false,
            class_map: ClassMap::default(),
            show_progress: false,
        }
    }
}

/// Validate split options before running.
pub fn validate_split_options(opts: &SplitOptions) -> Result<(), DmsLabelError> {
    if !(opts.train_ratio > 0.0 && opts.train_ratio < 1.0) {
        return Err(DmsLabelError::InvalidSplitParams {
            message: format!(
                "train ratio must be in the open interval (0, 1), got {}",
                opts.train_ratio
            ),
        });
    }

    if opts.image_extensions.iter().all(|e| e.trim().is_empty()) {
        return Err(DmsLabelError::InvalidSplitParams {
            message: "at least one image extension is required".to_string(),
        });
    }

    Ok(())
}

/// An image and its label file, if one exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitEntry {
    pub image: PathBuf,
    /// Image path relative to the images root, `/`-separated.
    pub rel_path: String,
    pub label: Option<PathBuf>,
}

/// The train/val partition of a sorted image list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitPlan {
    pub train: Vec<SplitEntry>,
    pub val: Vec<SplitEntry>,
}

impl SplitPlan {
    pub fn entries(&self, segment: Segment) -> &[SplitEntry] {
        match segment {
            Segment::Train => &self.train,
            Segment::Val => &self.val,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of items assigned to `train` out of `total`.
pub fn train_count(total: usize, train_ratio: f64) -> usize {
    ((total as f64 * train_ratio).floor() as usize).min(total)
}

/// Shuffle `items` with `seed` and cut at [`train_count`].
///
/// The result depends only on the input order and the seed, so callers must
/// pass items in a canonical order.
pub fn partition<T>(mut items: Vec<T>, train_ratio: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let cut = train_count(items.len(), train_ratio);
    let val = items.split_off(cut);
    (items, val)
}

/// Build the split plan for entries already in canonical order.
pub fn plan_split(entries: Vec<SplitEntry>, train_ratio: f64, seed: u64) -> SplitPlan {
    let (train, val) = partition(entries, train_ratio, seed);
    SplitPlan { train, val }
}

/// Discover images and pair each with its label file, sorted by relative path.
pub fn discover_entries(opts: &SplitOptions) -> Result<Vec<SplitEntry>, DmsLabelError> {
    let extensions: Vec<&str> = opts
        .image_extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.'))
        .filter(|e| !e.is_empty())
        .collect();

    let images = collect_files_with_extensions(&opts.images_root, &extensions)?;
    let mut entries = Vec::with_capacity(images.len());
    for image in images {
        let rel = image.strip_prefix(&opts.images_root).map_err(|_| {
            DmsLabelError::DirectoryWalk {
                path: image.clone(),
                message: format!(
                    "image is outside the images root {}",
                    opts.images_root.display()
                ),
            }
        })?;
        let label_path = label_path_for(&opts.labels_root, rel);
        let label = label_path.is_file().then_some(label_path);

        entries.push(SplitEntry {
            rel_path: rel_string(&opts.images_root, &image),
            image,
            label,
        });
    }

    Ok(entries)
}

/// Sources that would share a destination in the flattened output.
///
/// Images are keyed by their lowercased file stem: each image's label is
/// copied to `labels/<stem>.txt`, so `x.jpg` and `x.png` in one segment would
/// share a label file even though the images themselves do not clash. Names
/// are compared case-insensitively so that the flattened output stays valid
/// on case-insensitive filesystems.
pub fn find_collisions(plan: &SplitPlan, output_root: &Path) -> Vec<FilenameCollision> {
    let mut collisions = Vec::new();

    for segment in Segment::ALL {
        let images_dir = segment_dir(output_root, segment, "images");
        let labels_dir = segment_dir(output_root, segment, "labels");
        let mut seen: HashMap<String, &Path> = HashMap::new();

        for entry in plan.entries(segment) {
            let image = entry.image.as_path();
            let (Some(name), Some(stem)) = (image.file_name(), image.file_stem()) else {
                continue;
            };
            match seen.get(&lowercase(stem)) {
                Some(first) => {
                    let same_name = first.file_name().map(lowercase) == Some(lowercase(name));
                    let destination = if same_name {
                        images_dir.join(name)
                    } else {
                        labels_dir.join(format!("{}.{}", stem.to_string_lossy(), LABEL_EXTENSION))
                    };
                    collisions.push(FilenameCollision {
                        destination,
                        first: first.to_path_buf(),
                        second: image.to_path_buf(),
                    });
                }
                None => {
                    seen.insert(lowercase(stem), image);
                }
            }
        }
    }

    collisions
}

fn lowercase(name: &OsStr) -> String {
    name.to_string_lossy().to_lowercase()
}

fn segment_dir(output_root: &Path, segment: Segment, kind: &str) -> PathBuf {
    output_root.join(segment.dir_name()).join(kind)
}

/// Split the dataset described by `opts` and copy it into the output root.
pub fn split_dataset(opts: &SplitOptions) -> Result<SplitReport, DmsLabelError> {
    validate_split_options(opts)?;

    if !opts.images_root.is_dir() {
        return Err(DmsLabelError::DirectoryWalk {
            path: opts.images_root.clone(),
            message: "images root is not a directory".to_string(),
        });
    }
    if !opts.labels_root.is_dir() {
        warn!(
            "Labels root {} does not exist; every image will be copied without a label",
            opts.labels_root.display()
        );
    }
    ensure_output_disjoint(&opts.output_root, &opts.images_root)?;
    ensure_output_disjoint(&opts.output_root, &opts.labels_root)?;

    let entries = discover_entries(opts)?;
    if entries.is_empty() {
        return Err(DmsLabelError::EmptyInput {
            root: opts.images_root.clone(),
            what: "images",
        });
    }

    if opts.require_labels {
        if let Some(entry) = entries.iter().find(|e| e.label.is_none()) {
            return Err(DmsLabelError::MissingLabel {
                image: entry.image.clone(),
                expected: label_path_for(&opts.labels_root, Path::new(&entry.rel_path)),
            });
        }
    }

    let total = entries.len();
    let plan = plan_split(entries, opts.train_ratio, opts.seed);
    info!(
        "Total images: {}, train: {}, val: {}",
        total,
        plan.train.len(),
        plan.val.len()
    );

    let collisions = find_collisions(&plan, &opts.output_root);
    if !collisions.is_empty() {
        return Err(DmsLabelError::FilenameCollision { collisions });
    }

    let mut report = SplitReport {
        images_root: opts.images_root.display().to_string(),
        labels_root: opts.labels_root.display().to_string(),
        output_root: opts.output_root.display().to_string(),
        seed: opts.seed,
        train_ratio: opts.train_ratio,
        total_images: total,
        ..Default::default()
    };

    reset_output_root(&opts.output_root)?;
    for segment in Segment::ALL {
        for kind in ["images", "labels"] {
            let dir = segment_dir(&opts.output_root, segment, kind);
            fs::create_dir_all(&dir).map_err(DmsLabelError::file_io(&dir))?;
        }
    }

    for segment in Segment::ALL {
        report
            .segments
            .push(copy_segment(opts, segment, plan.entries(segment), &mut report.issues)?);
    }

    if opts.write_data_yaml {
        let path = write_data_yaml(&opts.output_root, &opts.class_map)?;
        report.data_yaml = Some(path.display().to_string());
    }

    Ok(report)
}

struct CopiedEntry {
    label_copied: bool,
    class_ids: Vec<u32>,
    issue: Option<SplitIssue>,
}

fn copy_segment(
    opts: &SplitOptions,
    segment: Segment,
    entries: &[SplitEntry],
    issues: &mut Vec<SplitIssue>,
) -> Result<SegmentSummary, DmsLabelError> {
    let images_dir = segment_dir(&opts.output_root, segment, "images");
    let labels_dir = segment_dir(&opts.output_root, segment, "labels");

    for entry in entries.iter().filter(|e| e.label.is_none()) {
        warn!("{}: no label file; copied as a background image", entry.rel_path);
        issues.push(SplitIssue::new(
            SplitIssueCode::MissingLabel,
            entry.rel_path.clone(),
            "no label file; copied as a background image",
        ));
    }

    let pb = create_progress_bar(
        entries.len() as u64,
        segment.dir_name(),
        opts.show_progress,
    );
    let copied = entries
        .par_iter()
        .map(|entry| {
            let result = copy_entry(entry, &images_dir, &labels_dir, opts);
            pb.inc(1);
            result
        })
        .collect::<Result<Vec<_>, _>>()?;
    pb.finish_and_clear();

    let labels = opts.class_map.labels();
    let mut per_class = vec![0usize; labels.len()];
    let mut summary = SegmentSummary {
        segment,
        images: entries.len(),
        labels: 0,
        missing_labels: 0,
        objects: 0,
        classes: Vec::new(),
    };

    for item in copied {
        if item.label_copied {
            summary.labels += 1;
        } else {
            summary.missing_labels += 1;
        }
        summary.objects += item.class_ids.len();
        for id in item.class_ids {
            if let Some(count) = per_class.get_mut(id as usize) {
                *count += 1;
            }
        }
        issues.extend(item.issue);
    }

    summary.classes = labels
        .iter()
        .zip(per_class)
        .map(|(label, objects)| ClassCount {
            class_id: opts.class_map.id(*label),
            name: label.name().to_string(),
            objects,
        })
        .collect();

    info!(
        "{}: copied {} image(s) and {} label file(s)",
        segment, summary.images, summary.labels
    );
    Ok(summary)
}

fn copy_entry(
    entry: &SplitEntry,
    images_dir: &Path,
    labels_dir: &Path,
    opts: &SplitOptions,
) -> Result<CopiedEntry, DmsLabelError> {
    copy_into(&entry.image, images_dir)?;

    let Some(label) = &entry.label else {
        return Ok(CopiedEntry {
            label_copied: false,
            class_ids: Vec::new(),
            issue: None,
        });
    };
    copy_into(label, labels_dir)?;

    let label_rel = rel_string(&opts.labels_root, label);
    let class_count = opts.class_map.labels().len() as u32;
    let (class_ids, issue) = match read_label_file(label) {
        Ok(lines) => {
            let class_ids: Vec<u32> = lines.iter().map(|l| l.class_id).collect();
            let issue = class_ids.iter().find(|id| **id >= class_count).map(|id| {
                SplitIssue::new(
                    SplitIssueCode::UnknownClassId,
                    label_rel.clone(),
                    format!("class id {} is outside the class map", id),
                )
            });
            (class_ids, issue)
        }
        Err(err @ DmsLabelError::LabelParse { .. }) => {
            warn!("{}: {}", label_rel, err);
            let issue = SplitIssue::new(SplitIssueCode::InvalidLabelFile, label_rel, err.to_string());
            (Vec::new(), Some(issue))
        }
        Err(err) => return Err(err),
    };

    Ok(CopiedEntry {
        label_copied: true,
        class_ids,
        issue,
    })
}

fn copy_into(source: &Path, dest_dir: &Path) -> Result<(), DmsLabelError> {
    let Some(name) = source.file_name() else {
        return Err(DmsLabelError::DirectoryWalk {
            path: source.to_path_buf(),
            message: "source has no file name".to_string(),
        });
    };
    let dest = dest_dir.join(name);
    fs::copy(source, &dest).map_err(DmsLabelError::file_io(&dest))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct DataYaml {
    path: String,
    train: String,
    val: String,
    nc: usize,
    names: BTreeMap<u32, String>,
}

/// Write the `data.yaml` dataset descriptor consumed by the training tool.
pub fn write_data_yaml(output_root: &Path, class_map: &ClassMap) -> Result<PathBuf, DmsLabelError> {
    let root = fs::canonicalize(output_root).map_err(DmsLabelError::file_io(output_root))?;
    let descriptor = DataYaml {
        path: root.to_string_lossy().into_owned(),
        train: format!("{}/images", Segment::Train.dir_name()),
        val: format!("{}/images", Segment::Val.dir_name()),
        nc: class_map.labels().len(),
        names: class_map
            .labels()
            .iter()
            .map(|label| (class_map.id(*label), label.name().to_string()))
            .collect(),
    };

    let path = output_root.join("data.yaml");
    let yaml = serde_yaml::to_string(&descriptor).map_err(|source| DmsLabelError::DataYamlWrite {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, yaml).map_err(DmsLabelError::file_io(&path))?;
    Ok(path)
}
