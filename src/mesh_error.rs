//! MeshRegridError: Unified error type for mesh-regrid public APIs
//!
//! Validation and resource failures surface here and stop a run. Per-cell
//! geometry problems do not: they are reported as
//! [`CellDefect`](crate::data::mapping::CellDefect)s next to the result.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for mesh-regrid operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshRegridError {
    /// A value vector does not line up with the mesh it describes.
    #[error("{mesh} mesh has {cells} cells but {values} values were supplied")]
    LengthMismatch {
        mesh: &'static str,
        cells: usize,
        values: usize,
    },
    /// A configuration value is out of its legal range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A configuration document could not be decoded.
    #[error("could not parse configuration: {0}")]
    ConfigParse(String),
    /// A mapping table line could not be parsed (1-based line number).
    #[error("malformed mapping record on line {line}: {message}")]
    MappingParse { line: usize, message: String },
    /// A value table line could not be parsed (1-based line number).
    #[error("malformed value on line {line}: {message}")]
    ValueParse { line: usize, message: String },
    /// Input ended before a header line was seen.
    #[error("missing header line")]
    MissingHeader,
    /// A value table header does not name the requested column.
    #[error("column `{0}` not found in header")]
    MissingColumn(String),
    /// The same (source, target) pair appeared twice in one mapping.
    #[error("duplicate mapping record for source {source_index}, target {target_index}")]
    DuplicateRecord {
        source_index: usize,
        target_index: usize,
    },
    /// A stored fraction is zero, negative, or not finite.
    #[error("record for source {source_index}, target {target_index} has unusable fraction {fraction}")]
    InvalidFraction {
        source_index: usize,
        target_index: usize,
        fraction: f64,
    },
    /// A record points past the end of the requested output vector.
    #[error("mapping targets cell {target} but the output has only {len} cells")]
    TargetOutOfRange { target: usize, len: usize },
    /// Rectilinear grid axes were unusable.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    /// The run was cancelled through its [`CancelToken`](crate::algs::parallel::CancelToken).
    #[error("regridding cancelled")]
    Cancelled,
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
    /// Any of the above, attributed to the file it came from.
    #[error("{}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<MeshRegridError>,
    },
}

impl MeshRegridError {
    /// Attach the offending file path to this error.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        MeshRegridError::InFile {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with any file attribution peeled off.
    pub fn root(&self) -> &MeshRegridError {
        match self {
            MeshRegridError::InFile { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<std::io::Error> for MeshRegridError {
    fn from(err: std::io::Error) -> Self {
        MeshRegridError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_file_keeps_path_and_root() {
        let err = MeshRegridError::MappingParse {
            line: 3,
            message: "expected 3 fields, found 2".into(),
        }
        .in_file("weights.csv");
        let msg = err.to_string();
        assert!(msg.starts_with("weights.csv: "), "{msg}");
        assert!(msg.contains("line 3"), "{msg}");
        assert!(matches!(err.root(), MeshRegridError::MappingParse { line: 3, .. }));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MeshRegridError = io.into();
        assert_eq!(err, MeshRegridError::Io("gone".into()));
    }
}
