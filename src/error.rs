use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for dmslabel operations.
#[derive(Debug, Error)]
pub enum DmsLabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error at {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read annotation {path}: {source}")]
    AnnotationRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse annotation JSON from {path}: {source}")]
    AnnotationJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed annotation {path}: {message}")]
    MalformedAnnotation { path: PathBuf, message: String },

    #[error("Failed to parse label file {path} at line {line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to walk directory {path}: {message}")]
    DirectoryWalk { path: PathBuf, message: String },

    #[error("No {what} found under {root}")]
    EmptyInput { root: PathBuf, what: &'static str },

    #[error(
        "{} pair(s) of files would be written to the same destination:\n{}",
        collisions.len(),
        CollisionList(collisions)
    )]
    FilenameCollision { collisions: Vec<FilenameCollision> },

    #[error("Image {image} has no corresponding label file (expected {expected})")]
    MissingLabel { image: PathBuf, expected: PathBuf },

    #[error("Invalid split parameters: {message}")]
    InvalidSplitParams { message: String },

    #[error("Invalid class map: {message}")]
    InvalidClassMap { message: String },

    #[error("Output {output} overlaps the input {input}")]
    OutputOverlapsInput { output: PathBuf, input: PathBuf },

    #[error("Failed to write dataset descriptor to {path}: {source}")]
    DataYamlWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize report as JSON: {source}")]
    ReportSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Conversion finished with {skipped} skipped annotation(s)")]
    ConversionFailed { skipped: usize },
}

impl DmsLabelError {
    /// Wraps an IO error with the path it happened at.
    pub(crate) fn file_io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| DmsLabelError::FileIo { path, source }
    }
}

/// Two source files that would be written to the same destination path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilenameCollision {
    pub destination: PathBuf,
    pub first: PathBuf,
    pub second: PathBuf,
}

impl fmt::Display for FilenameCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <- {} and {}",
            self.destination.display(),
            self.first.display(),
            self.second.display()
        )
    }
}

struct CollisionList<'a>(&'a [FilenameCollision]);

impl fmt::Display for CollisionList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, collision) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}", collision)?;
        }
        Ok(())
    }
}
