//! Filesystem helpers shared by the conversion and split pipelines.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use crate::error::DmsLabelError;

/// Recursively collect regular files under `root` whose extension matches one
/// of `extensions` (ASCII case-insensitive), sorted by relative path.
pub fn collect_files_with_extensions(
    root: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, DmsLabelError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| DmsLabelError::DirectoryWalk {
            path: root.to_path_buf(),
            message: source.to_string(),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_by_cached_key(|path| rel_string(root, path));
    Ok(files)
}

pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// `path` relative to `root`, with `/` separators on every platform.
pub fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Delete `path` if it exists and create it again, empty.
pub fn reset_output_root(path: &Path) -> Result<(), DmsLabelError> {
    if path.exists() {
        log::warn!(
            "Output directory {} already exists; deleting and recreating it",
            path.display()
        );
        fs::remove_dir_all(path).map_err(DmsLabelError::file_io(path))?;
    }
    fs::create_dir_all(path).map_err(DmsLabelError::file_io(path))
}

/// Fail if `output` and `input` overlap.
///
/// An output containing the input would be deleted by the reset; an output
/// inside the input would be walked as input on the next run.
pub fn ensure_output_disjoint(output: &Path, input: &Path) -> Result<(), DmsLabelError> {
    let output_abs = resolve(output);
    let input_abs = resolve(input);
    if input_abs.starts_with(&output_abs) || output_abs.starts_with(&input_abs) {
        return Err(DmsLabelError::OutputOverlapsInput {
            output: output.to_path_buf(),
            input: input.to_path_buf(),
        });
    }
    Ok(())
}

// Canonical form of a path that may not exist yet: canonicalize the deepest
// existing ancestor and append the rest.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => resolve(parent).join(name),
        _ => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// Progress bar on stderr, or a hidden one when `visible` is false.
pub fn create_progress_bar(len: u64, label: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_files_filters_and_sorts() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path();
        fs::create_dir_all(root.join("b/nested")).expect("create dirs");
        fs::create_dir_all(root.join("a")).expect("create dirs");
        fs::write(root.join("b/nested/z.JSON"), "{}").expect("write");
        fs::write(root.join("a/y.json"), "{}").expect("write");
        fs::write(root.join("a/notes.txt"), "").expect("write");

        let files = collect_files_with_extensions(root, &["json"]).expect("collect");
        let rel: Vec<String> = files.iter().map(|f| rel_string(root, f)).collect();
        assert_eq!(rel, vec!["a/y.json", "b/nested/z.JSON"]);
    }

    #[test]
    fn reset_output_root_removes_stale_content() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let out = temp.path().join("out");
        fs::create_dir_all(out.join("old")).expect("create dirs");
        fs::write(out.join("old/stale.txt"), "0 0.5 0.5 0.1 0.1\n").expect("write");

        reset_output_root(&out).expect("reset");

        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).expect("read dir").count(), 0);
    }

    #[test]
    fn output_containing_input_is_refused() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let input = temp.path().join("data/annotations");
        fs::create_dir_all(&input).expect("create input");

        let err = ensure_output_disjoint(&temp.path().join("data"), &input).unwrap_err();
        assert!(matches!(err, DmsLabelError::OutputOverlapsInput { .. }));
        assert!(ensure_output_disjoint(&input, &input).is_err());

        ensure_output_disjoint(&temp.path().join("data/labels"), &input)
            .expect("sibling output is fine");
    }

    #[test]
    fn output_inside_input_is_refused() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let input = temp.path().join("dataset/images");
        fs::create_dir_all(&input).expect("create input");

        let err = ensure_output_disjoint(&input.join("out"), &input).unwrap_err();
        assert!(matches!(err, DmsLabelError::OutputOverlapsInput { .. }));
    }
}
