//! Blocking file system operations on virtual paths.
//!
//! Every operation resolves its path through the [`Sandbox`] first, so
//! permission errors and I/O errors come back through the same channel.
//! The async script API runs these on the I/O workers.

use super::error::{ErrorCode, FsError};
use crate::sandbox::{Access, Sandbox};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::time::UNIX_EPOCH;

/// Metadata returned by [`stat`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    /// Size in bytes
    pub size: u64,
    /// Modification time in milliseconds since the epoch
    pub mtime_ms: f64,
    /// Regular file
    pub is_file: bool,
    /// Directory
    pub is_directory: bool,
}

/// Creates or truncates `path` and writes `data`.
pub fn write_file(sandbox: &Sandbox, path: &str, data: &[u8]) -> Result<(), FsError> {
    let real = sandbox.resolve(path, Access::Write, "open")?;
    if real.is_dir() {
        return Err(FsError::new(ErrorCode::Eisdir, "open", path));
    }
    fs::write(&real, data).map_err(|e| FsError::from_io(&e, "open", path))
}

/// Appends `data` to `path`, creating it if needed.
pub fn append_file(sandbox: &Sandbox, path: &str, data: &[u8]) -> Result<(), FsError> {
    let real = sandbox.resolve(path, Access::Write, "open")?;
    if real.is_dir() {
        return Err(FsError::new(ErrorCode::Eisdir, "open", path));
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&real)
        .and_then(|mut file| file.write_all(data))
        .map_err(|e| FsError::from_io(&e, "open", path))
}

/// Reads the whole file.
pub fn read_file(sandbox: &Sandbox, path: &str) -> Result<Vec<u8>, FsError> {
    let real = sandbox.resolve(path, Access::Read, "open")?;
    if real.is_dir() {
        return Err(FsError::new(ErrorCode::Eisdir, "read", path));
    }
    fs::read(&real).map_err(|e| FsError::from_io(&e, "open", path))
}

/// Lists directory entry names in sorted order.
pub fn readdir(sandbox: &Sandbox, path: &str) -> Result<Vec<String>, FsError> {
    let real = sandbox.resolve(path, Access::Read, "scandir")?;
    if real.exists() && !real.is_dir() {
        return Err(FsError::new(ErrorCode::Enotdir, "scandir", path));
    }
    let io_error = |e: std::io::Error| FsError::from_io(&e, "scandir", path);
    let mut names = Vec::new();
    for entry in fs::read_dir(&real).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Creates a directory; with `recursive`, creates missing parents and
/// accepts an existing directory.
pub fn mkdir(sandbox: &Sandbox, path: &str, recursive: bool) -> Result<(), FsError> {
    let real = sandbox.resolve(path, Access::Write, "mkdir")?;
    let result = if recursive {
        fs::create_dir_all(&real)
    } else {
        fs::create_dir(&real)
    };
    result.map_err(|e| FsError::from_io(&e, "mkdir", path))
}

/// Removes a file.
pub fn unlink(sandbox: &Sandbox, path: &str) -> Result<(), FsError> {
    let real = sandbox.resolve(path, Access::Write, "unlink")?;
    if fs::symlink_metadata(&real).map(|m| m.is_dir()).unwrap_or(false) {
        return Err(FsError::new(ErrorCode::Eisdir, "unlink", path));
    }
    fs::remove_file(&real).map_err(|e| FsError::from_io(&e, "unlink", path))
}

/// Removes an empty directory.
pub fn rmdir(sandbox: &Sandbox, path: &str) -> Result<(), FsError> {
    let real = sandbox.resolve(path, Access::Write, "rmdir")?;
    let io_error = |e: std::io::Error| FsError::from_io(&e, "rmdir", path);
    let metadata = fs::symlink_metadata(&real).map_err(io_error)?;
    if !metadata.is_dir() {
        return Err(FsError::new(ErrorCode::Enotdir, "rmdir", path));
    }
    if fs::read_dir(&real).map_err(io_error)?.next().is_some() {
        return Err(FsError::new(ErrorCode::Enotempty, "rmdir", path));
    }
    fs::remove_dir(&real).map_err(io_error)
}

/// Moves `from` to `to`; both must be writable.
pub fn rename(sandbox: &Sandbox, from: &str, to: &str) -> Result<(), FsError> {
    let with_dest = |e: FsError| e.with_dest(to);
    let source = sandbox.resolve(from, Access::Write, "rename").map_err(with_dest)?;
    let target = sandbox
        .resolve(to, Access::Write, "rename")
        .map_err(|e| FsError { path: from.to_string(), ..e }.with_dest(to))?;
    fs::rename(&source, &target).map_err(|e| FsError::from_io(&e, "rename", from).with_dest(to))
}

/// Reads metadata, following symlinks.
pub fn stat(sandbox: &Sandbox, path: &str) -> Result<Stats, FsError> {
    let real = sandbox.resolve(path, Access::Read, "stat")?;
    let metadata = fs::metadata(&real).map_err(|e| FsError::from_io(&e, "stat", path))?;
    let mtime_ms = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_secs_f64() * 1000.0)
        .unwrap_or(0.0);
    Ok(Stats {
        size: metadata.len(),
        mtime_ms,
        is_file: metadata.is_file(),
        is_directory: metadata.is_dir(),
    })
}

/// True if `path` is accessible and exists.
pub fn exists(sandbox: &Sandbox, path: &str) -> bool {
    sandbox
        .resolve(path, Access::Read, "access")
        .map(|real| real.exists())
        .unwrap_or(false)
}
