use std::path::PathBuf;
use std::process::ExitStatus;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A required template page does not exist.
    #[error("Template missing: {}", .0.display())]
    MissingTemplate(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// The converter program could not be started at all.
    #[error("Failed to run converter `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Conversion failed for {} ({status})", notebook.display())]
    Conversion {
        notebook: PathBuf,
        status: ExitStatus,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize tree: {0}")]
    Json(#[from] serde_json::Error),

    /// `--clean` would delete an input of the build.
    #[error("Refusing to clean {}: it contains {}", out.display(), inner.display())]
    UnsafeClean { out: PathBuf, inner: PathBuf },
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
