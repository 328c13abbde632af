//! Virtual file system roots for one process
//!
//! Script sees a small virtual tree; every path is normalized lexically and
//! mapped onto a real directory before any I/O happens:
//!
//! | virtual path   | real directory                                   | access     |
//! |----------------|--------------------------------------------------|------------|
//! | `/home`        | `<files_dir>/<namespace>/_<label>`               | read-write |
//! | `/home/temp`   | `<cache_dir or files_dir>/<namespace>/_<label>_temp` | read-write |
//! | `/home/public` | `public_dir`                                     | read-only  |
//!
//! Relative paths resolve against `/home`, the process working directory.

use crate::config::{is_path_segment, ConfigError, HostEnvironment};
use crate::error::{ProcessError, ProcessResult};
use crate::fs::{ErrorCode, FsError};
use std::path::{Path, PathBuf};

/// Virtual working directory of every process.
pub const HOME: &str = "/home";

/// What a call intends to do with a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read or list
    Read,
    /// Create, modify or remove
    Write,
}

#[derive(Debug, Clone)]
struct Mount {
    prefix: &'static str,
    root: Option<PathBuf>,
    writable: bool,
}

/// The directories one process may touch.
#[derive(Debug, Clone)]
pub struct Sandbox {
    mounts: Vec<Mount>,
}

impl Sandbox {
    /// Creates the sandbox directories for `label`.
    pub fn provision(env: &HostEnvironment, label: &str) -> ProcessResult<Self> {
        if !is_path_segment(label) {
            return Err(ConfigError::Invalid {
                field: "label",
                reason: format!("'{}' is not a single directory name", label),
            }
            .into());
        }
        let home = create_root(&env.home_dir(label))?;
        let temp = create_root(&env.temp_dir(label))?;
        let public = env
            .public_dir
            .as_ref()
            .map(|dir| dir.canonicalize().unwrap_or_else(|_| dir.clone()));

        log::debug!("sandbox for '{}' at {}", label, home.display());
        // Longest prefix first.
        Ok(Self {
            mounts: vec![
                Mount {
                    prefix: "/home/public",
                    root: public,
                    writable: false,
                },
                Mount {
                    prefix: "/home/temp",
                    root: Some(temp),
                    writable: true,
                },
                Mount {
                    prefix: HOME,
                    root: Some(home),
                    writable: true,
                },
            ],
        })
    }

    /// Real directory behind `/home`.
    pub fn home(&self) -> &Path {
        self.mount_root(HOME)
    }

    /// Real directory behind `/home/temp`.
    pub fn temp(&self) -> &Path {
        self.mount_root("/home/temp")
    }

    fn mount_root(&self, prefix: &str) -> &Path {
        self.mounts
            .iter()
            .find(|m| m.prefix == prefix)
            .and_then(|m| m.root.as_deref())
            .unwrap_or_else(|| Path::new(""))
    }

    /// Maps a script path to a real path, enforcing the mount policy.
    ///
    /// Errors carry `syscall` and the path as given.
    pub fn resolve(&self, path: &str, access: Access, syscall: &'static str) -> Result<PathBuf, FsError> {
        let denied = || FsError::new(ErrorCode::Eacces, syscall, path);
        if path.is_empty() {
            return Err(FsError::new(ErrorCode::Enoent, syscall, path));
        }
        if path.contains('\0') {
            return Err(FsError::new(ErrorCode::Einval, syscall, path));
        }

        let virtual_path = normalize(path);
        let (mount, rest) = self
            .mounts
            .iter()
            .find_map(|m| strip_mount(&virtual_path, m.prefix).map(|rest| (m, rest)))
            .ok_or_else(denied)?;
        let root = match &mount.root {
            Some(root) => root,
            None if access == Access::Read => {
                return Err(FsError::new(ErrorCode::Enoent, syscall, path))
            }
            None => return Err(denied()),
        };
        // Mount points themselves are never replaced or removed.
        if access == Access::Write && (!mount.writable || rest.is_empty()) {
            return Err(denied());
        }

        let real = rest
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(root.clone(), |real, part| real.join(part));
        check_contained(&real, root, syscall, path)?;
        Ok(real)
    }
}

fn create_root(dir: &Path) -> ProcessResult<PathBuf> {
    let provisioning = |e: std::io::Error| ProcessError::Provisioning {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };
    std::fs::create_dir_all(dir).map_err(provisioning)?;
    dir.canonicalize().map_err(provisioning)
}

/// Lexically normalizes `path` into an absolute virtual path.
///
/// `..` never climbs above `/`.
///
/// ```
/// use node_process::sandbox::normalize;
///
/// assert_eq!(normalize("a/./b/../c.txt"), "/home/a/c.txt");
/// assert_eq!(normalize("/home/../../etc"), "/etc");
/// ```
pub fn normalize(path: &str) -> String {
    let absolute = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", HOME, path)
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in absolute.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

fn strip_mount<'a>(virtual_path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = virtual_path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// Rejects paths whose nearest existing ancestor resolves (through
/// symlinks) outside the mount root.
fn check_contained(real: &Path, root: &Path, syscall: &'static str, path: &str) -> Result<(), FsError> {
    let mut candidate = real;
    while std::fs::symlink_metadata(candidate).is_err() {
        if candidate == root {
            return Ok(());
        }
        match candidate.parent() {
            Some(parent) => candidate = parent,
            None => return Ok(()),
        }
    }
    let canonical = candidate
        .canonicalize()
        .map_err(|e| FsError::from_io(&e, syscall, path))?;
    if canonical.starts_with(root) {
        Ok(())
    } else {
        Err(FsError::new(ErrorCode::Eacces, syscall, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox(dir: &Path) -> Sandbox {
        Sandbox::provision(&HostEnvironment::new(dir), "unit").unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("."), "/home");
        assert_eq!(normalize("./x/"), "/home/x");
        assert_eq!(normalize("../../.."), "/");
        assert_eq!(normalize("/home/temp/../public"), "/home/public");
    }

    #[test]
    fn test_relative_paths_land_in_home() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox(dir.path());
        let real = sandbox.resolve("notes/a.txt", Access::Write, "open").unwrap();
        assert_eq!(real, sandbox.home().join("notes").join("a.txt"));
        assert!(sandbox.home().ends_with("__org.corten.node__/_unit"));
    }

    #[test]
    fn test_temp_mount() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox(dir.path());
        let real = sandbox.resolve("/home/temp/x", Access::Write, "open").unwrap();
        assert_eq!(real, sandbox.temp().join("x"));
    }

    #[test]
    fn test_outside_mounts_is_eacces() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox(dir.path());
        for path in ["/etc/passwd", "../../secret", "/", "/home/../tmp"] {
            let error = sandbox.resolve(path, Access::Read, "open").unwrap_err();
            assert_eq!(error.code, ErrorCode::Eacces, "{}", path);
            assert_eq!(error.path, path);
        }
    }

    #[test]
    fn test_mount_roots_are_not_writable() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox(dir.path());
        assert!(sandbox.resolve("/home", Access::Read, "scandir").is_ok());
        let error = sandbox.resolve("/home/temp", Access::Write, "rmdir").unwrap_err();
        assert_eq!(error.code, ErrorCode::Eacces);
    }

    #[test]
    fn test_unconfigured_public_mount() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox(dir.path());
        let read = sandbox.resolve("/home/public/a", Access::Read, "open").unwrap_err();
        assert_eq!(read.code, ErrorCode::Enoent);
        let write = sandbox.resolve("/home/public/a", Access::Write, "open").unwrap_err();
        assert_eq!(write.code, ErrorCode::Eacces);
    }

    #[test]
    fn test_public_mount_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        std::fs::write(public.path().join("shared.txt"), "x").unwrap();
        let env = HostEnvironment::new(dir.path()).with_public_dir(public.path());
        let sandbox = Sandbox::provision(&env, "unit").unwrap();
        assert!(sandbox.resolve("/home/public/shared.txt", Access::Read, "open").is_ok());
        let error = sandbox
            .resolve("/home/public/shared.txt", Access::Write, "open")
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::Eacces);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_is_eacces() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let sandbox = sandbox(dir.path());
        std::os::unix::fs::symlink(outside.path(), sandbox.home().join("link")).unwrap();
        let error = sandbox.resolve("link/file.txt", Access::Write, "open").unwrap_err();
        assert_eq!(error.code, ErrorCode::Eacces);
    }

    #[test]
    fn test_bad_label_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Sandbox::provision(&HostEnvironment::new(dir.path()), "../x");
        assert!(matches!(result, Err(ProcessError::Config(_))));
    }
}
