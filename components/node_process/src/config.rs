//! Host environment configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("cannot read config file {path}: {message}")]
    Io {
        /// File that failed to load
        path: PathBuf,
        /// Underlying I/O error
        message: String,
    },

    /// The configuration is not valid JSON for [`HostEnvironment`]
    #[error("invalid config: {0}")]
    Parse(String),

    /// A field has an unusable value
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Directories and limits shared by every process of a host.
///
/// Each process gets its own sandbox below these directories, keyed by
/// its label:
/// - `/home` maps to `<files_dir>/<namespace>/_<label>`
/// - `/home/temp` maps to `<cache_dir or files_dir>/<namespace>/_<label>_temp`
/// - `/home/public` maps to `public_dir` (read-only) when configured
///
/// # Examples
///
/// ```
/// use node_process::HostEnvironment;
///
/// let env = HostEnvironment::from_json_str(r#"{ "files_dir": "/data/app", "io_threads": 4 }"#).unwrap();
/// assert_eq!(env.io_threads, 4);
/// assert_eq!(env.namespace, "__org.corten.node__");
/// assert_eq!(
///     env.home_dir("worker"),
///     std::path::Path::new("/data/app/__org.corten.node__/_worker")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEnvironment {
    /// Application-private files directory
    pub files_dir: PathBuf,
    /// Directory for temporary files; defaults to `files_dir`
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Shared read-only directory exposed as `/home/public`
    #[serde(default)]
    pub public_dir: Option<PathBuf>,
    /// Directory segment separating this host's data from other users of `files_dir`
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Worker threads per process for file system calls
    #[serde(default = "default_io_threads")]
    pub io_threads: usize,
    /// Maximum script call depth, sized for a `DEFAULT_STACK_SIZE` thread
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Arguments exposed as `process.argv`
    #[serde(default)]
    pub argv: Vec<String>,
}

fn default_namespace() -> String {
    "__org.corten.node__".to_string()
}

fn default_io_threads() -> usize {
    2
}

fn default_max_call_depth() -> usize {
    512
}

impl HostEnvironment {
    /// Creates an environment rooted at `files_dir` with default settings.
    pub fn new(files_dir: impl Into<PathBuf>) -> Self {
        Self {
            files_dir: files_dir.into(),
            cache_dir: None,
            public_dir: None,
            namespace: default_namespace(),
            io_threads: default_io_threads(),
            max_call_depth: default_max_call_depth(),
            argv: Vec::new(),
        }
    }

    /// Loads an environment from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// Parses an environment from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let env: HostEnvironment =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        env.validate()?;
        Ok(env)
    }

    /// Sets the temporary files directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Sets the read-only public directory.
    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = Some(dir.into());
        self
    }

    /// Sets the namespace segment.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the number of I/O worker threads.
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Sets the maximum call depth.
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Sets `process.argv`.
    pub fn with_argv<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv = argv.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the settings that cannot be expressed in the type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_path_segment(&self.namespace) {
            return Err(ConfigError::Invalid {
                field: "namespace",
                reason: format!("'{}' is not a single directory name", self.namespace),
            });
        }
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "io_threads",
                reason: "at least one worker thread is required".to_string(),
            });
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_call_depth",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Real directory behind `/home` for processes labelled `label`.
    pub fn home_dir(&self, label: &str) -> PathBuf {
        self.files_dir
            .join(&self.namespace)
            .join(format!("_{}", label))
    }

    /// Real directory behind `/home/temp` for processes labelled `label`.
    pub fn temp_dir(&self, label: &str) -> PathBuf {
        self.cache_dir
            .as_ref()
            .unwrap_or(&self.files_dir)
            .join(&self.namespace)
            .join(format!("_{}_temp", label))
    }
}

/// A label or namespace must name exactly one directory.
pub(crate) fn is_path_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(&['/', '\\', '\0'][..])
}
