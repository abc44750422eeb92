//! YOLO label files: one `class cx cy w h` line per object.
//!
//! Floats are written with six decimals. Every line ends with `\n`, and an
//! image without objects gets an empty file rather than no file.

use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::bbox::NormalizedBox;
use crate::error::DmsLabelError;

/// File extension of label files.
pub const LABEL_EXTENSION: &str = "txt";

/// One object in a label file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelLine {
    pub class_id: u32,
    pub bbox: NormalizedBox,
}

impl LabelLine {
    pub fn new(class_id: u32, bbox: NormalizedBox) -> Self {
        Self { class_id, bbox }
    }
}

impl fmt::Display for LabelLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id,
            positive_zero(self.bbox.cx),
            positive_zero(self.bbox.cy),
            positive_zero(self.bbox.w),
            positive_zero(self.bbox.h)
        )
    }
}

// -0.0 formats as "-0.000000"; write it as 0.
fn positive_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Path of the label file for `rel_path` (a record or image path relative to
/// its root) under `labels_root`.
pub fn label_path_for(labels_root: &Path, rel_path: &Path) -> PathBuf {
    labels_root.join(rel_path).with_extension(LABEL_EXTENSION)
}

/// Write `lines` to `path`, creating parent directories as needed.
///
/// An existing file is truncated.
pub fn write_label_file(path: &Path, lines: &[LabelLine]) -> Result<(), DmsLabelError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(DmsLabelError::file_io(parent))?;
    }

    let file = fs::File::create(path).map_err(DmsLabelError::file_io(path))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line).map_err(DmsLabelError::file_io(path))?;
    }
    writer.flush().map_err(DmsLabelError::file_io(path))?;

    Ok(())
}

/// Read every object from a label file.
pub fn read_label_file(path: &Path) -> Result<Vec<LabelLine>, DmsLabelError> {
    let content = fs::read_to_string(path).map_err(DmsLabelError::file_io(path))?;

    let mut lines = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(parsed) = parse_label_line(line, path, line_idx + 1)? {
            lines.push(parsed);
        }
    }
    Ok(lines)
}

/// Parse one label line; blank lines yield `None`.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<LabelLine>, DmsLabelError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();
    if tokens.len() != 5 {
        return Err(DmsLabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("expected 5 tokens, found {}", tokens.len()),
        });
    }

    let class_id = tokens[0]
        .parse::<u32>()
        .map_err(|_| DmsLabelError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(LabelLine::new(
        class_id,
        NormalizedBox::from_cxcywh(cx, cy, w, h),
    )))
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, DmsLabelError> {
    raw.parse::<f64>().map_err(|_| DmsLabelError::LabelParse {
        path: file_path.to_path_buf(),
        line: line_num,
        message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(class_id: u32, cx: f64, cy: f64, w: f64, h: f64) -> LabelLine {
        LabelLine::new(class_id, NormalizedBox::from_cxcywh(cx, cy, w, h))
    }

    #[test]
    fn label_line_uses_six_decimals() {
        let l = line(0, 0.1875, 110.0 / 480.0, 0.0625, 20.0 / 480.0);
        assert_eq!(l.to_string(), "0 0.187500 0.229167 0.062500 0.041667");
    }

    #[test]
    fn label_line_never_writes_negative_zero() {
        let l = line(3, -0.0, 0.5, -0.0, 0.25);
        assert_eq!(l.to_string(), "3 0.000000 0.500000 0.000000 0.250000");
    }

    #[test]
    fn label_path_swaps_extension_under_root() {
        let path = label_path_for(Path::new("out"), Path::new("day/cam1/img_01.json"));
        assert_eq!(path, Path::new("out/day/cam1/img_01.txt"));
    }

    #[test]
    fn write_creates_parents_and_empty_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("a/b/empty.txt");

        write_label_file(&path, &[]).expect("write empty label file");

        assert!(path.is_file());
        assert_eq!(fs::read(&path).expect("read label file").len(), 0);
    }

    #[test]
    fn write_then_read_keeps_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("labels.txt");
        let lines = vec![line(2, 0.5, 0.5, 0.25, 0.25), line(0, 0.1, 0.2, 0.05, 0.05)];

        write_label_file(&path, &lines).expect("write label file");
        let content = fs::read_to_string(&path).expect("read label file");
        assert_eq!(
            content,
            "2 0.500000 0.500000 0.250000 0.250000\n0 0.100000 0.200000 0.050000 0.050000\n"
        );

        let restored = read_label_file(&path).expect("read label file");
        assert_eq!(restored, lines);
    }

    #[test]
    fn parse_label_line_skips_blank_rows() {
        let parsed = parse_label_line("   ", Path::new("a.txt"), 2).expect("parse should succeed");
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_label_line_rejects_wrong_token_counts() {
        let short = parse_label_line("0 0.1 0.2", Path::new("a.txt"), 3).unwrap_err();
        assert!(matches!(short, DmsLabelError::LabelParse { line: 3, .. }));

        let long = parse_label_line("0 0.1 0.2 0.3 0.4 0.5", Path::new("a.txt"), 4).unwrap_err();
        assert!(matches!(long, DmsLabelError::LabelParse { line: 4, .. }));
    }

    #[test]
    fn parse_label_line_rejects_negative_class() {
        let err = parse_label_line("-1 0.1 0.2 0.3 0.4", Path::new("a.txt"), 1).unwrap_err();
        assert!(err.to_string().contains("class_id"));
    }
}
