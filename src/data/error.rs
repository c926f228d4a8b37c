use std::path::{Path, PathBuf};

/// Fatal failures while reading a place table. Any of these aborts the
/// pipeline before markers are built.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot open {}: {source}", .path.display())]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required column(s): {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("failed to parse {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LoadError {
    pub fn missing_file(path: &Path, source: std::io::Error) -> Self {
        LoadError::MissingFile {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(path: &Path, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        LoadError::Malformed {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_mismatch_names_every_column() {
        let err = LoadError::SchemaMismatch {
            missing: vec!["纬度".to_string(), "经度".to_string()],
        };
        assert_eq!(err.to_string(), "missing required column(s): 纬度, 经度");
    }

    #[test]
    fn malformed_accepts_plain_messages() {
        let err = LoadError::malformed(Path::new("places.json"), "Expected top-level JSON array");
        assert!(err.to_string().contains("places.json"));
        assert!(err.to_string().contains("top-level JSON array"));
    }
}
