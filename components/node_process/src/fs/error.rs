//! POSIX-style file system errors

use std::fmt;
use std::io;
use thiserror::Error;

/// Error codes surfaced to script as `err.code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Permission denied, including every path outside the sandbox
    Eacces,
    /// No such file or directory
    Enoent,
    /// File already exists
    Eexist,
    /// Illegal operation on a directory
    Eisdir,
    /// Not a directory
    Enotdir,
    /// Directory not empty
    Enotempty,
    /// Invalid argument
    Einval,
    /// Any other I/O failure
    Eio,
}

impl ErrorCode {
    /// The code string, e.g. `"EACCES"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Eacces => "EACCES",
            ErrorCode::Enoent => "ENOENT",
            ErrorCode::Eexist => "EEXIST",
            ErrorCode::Eisdir => "EISDIR",
            ErrorCode::Enotdir => "ENOTDIR",
            ErrorCode::Enotempty => "ENOTEMPTY",
            ErrorCode::Einval => "EINVAL",
            ErrorCode::Eio => "EIO",
        }
    }

    /// Negative errno, as Node reports it in `err.errno`.
    pub fn errno(self) -> i32 {
        let errno = match self {
            ErrorCode::Eacces => libc::EACCES,
            ErrorCode::Enoent => libc::ENOENT,
            ErrorCode::Eexist => libc::EEXIST,
            ErrorCode::Eisdir => libc::EISDIR,
            ErrorCode::Enotdir => libc::ENOTDIR,
            ErrorCode::Enotempty => libc::ENOTEMPTY,
            ErrorCode::Einval => libc::EINVAL,
            ErrorCode::Eio => libc::EIO,
        };
        -errno
    }

    /// Human-readable description used in messages.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::Eacces => "permission denied",
            ErrorCode::Enoent => "no such file or directory",
            ErrorCode::Eexist => "file already exists",
            ErrorCode::Eisdir => "illegal operation on a directory",
            ErrorCode::Enotdir => "not a directory",
            ErrorCode::Enotempty => "directory not empty",
            ErrorCode::Einval => "invalid argument",
            ErrorCode::Eio => "i/o error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed file system call.
///
/// `path` (and `dest` for renames) is the path as script passed it, never
/// the real location inside the sandbox.
///
/// # Examples
///
/// ```
/// use node_process::{ErrorCode, FsError};
///
/// let error = FsError::new(ErrorCode::Eacces, "open", "/etc/passwd");
/// assert_eq!(error.to_string(), "EACCES: permission denied, open '/etc/passwd'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {}, {syscall} '{path}'{}", .code.description(), dest_suffix(.dest))]
pub struct FsError {
    /// Error code
    pub code: ErrorCode,
    /// Name of the failed system call (`open`, `scandir`, ...)
    pub syscall: &'static str,
    /// Path argument
    pub path: String,
    /// Second path argument of `rename`
    pub dest: Option<String>,
}

impl FsError {
    /// Creates an error for a single-path call.
    pub fn new(code: ErrorCode, syscall: &'static str, path: impl Into<String>) -> Self {
        Self {
            code,
            syscall,
            path: path.into(),
            dest: None,
        }
    }

    /// Adds the destination path of a rename.
    pub fn with_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Maps an OS error to its POSIX code.
    pub fn from_io(error: &io::Error, syscall: &'static str, path: impl Into<String>) -> Self {
        Self::new(code_for(error), syscall, path)
    }
}

fn code_for(error: &io::Error) -> ErrorCode {
    match error.raw_os_error() {
        Some(libc::EACCES) | Some(libc::EPERM) | Some(libc::EROFS) => ErrorCode::Eacces,
        Some(libc::ENOENT) => ErrorCode::Enoent,
        Some(libc::EEXIST) => ErrorCode::Eexist,
        Some(libc::EISDIR) => ErrorCode::Eisdir,
        Some(libc::ENOTDIR) => ErrorCode::Enotdir,
        Some(libc::ENOTEMPTY) => ErrorCode::Enotempty,
        Some(libc::EINVAL) => ErrorCode::Einval,
        Some(_) => ErrorCode::Eio,
        None => match error.kind() {
            io::ErrorKind::NotFound => ErrorCode::Enoent,
            io::ErrorKind::PermissionDenied => ErrorCode::Eacces,
            io::ErrorKind::AlreadyExists => ErrorCode::Eexist,
            io::ErrorKind::InvalidInput => ErrorCode::Einval,
            _ => ErrorCode::Eio,
        },
    }
}

fn dest_suffix(dest: &Option<String>) -> String {
    match dest {
        Some(dest) => format!(" -> '{}'", dest),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_kinds_map_to_codes() {
        let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(FsError::from_io(&not_found, "open", "a").code, ErrorCode::Enoent);
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "no");
        assert_eq!(FsError::from_io(&denied, "open", "a").code, ErrorCode::Eacces);
        let other = io::Error::new(io::ErrorKind::Other, "?");
        assert_eq!(FsError::from_io(&other, "open", "a").code, ErrorCode::Eio);
    }

    #[test]
    fn test_rename_message_names_both_paths() {
        let error = FsError::new(ErrorCode::Enoent, "rename", "a.txt").with_dest("b.txt");
        assert_eq!(
            error.to_string(),
            "ENOENT: no such file or directory, rename 'a.txt' -> 'b.txt'"
        );
    }

    #[test]
    fn test_os_errors_map_by_errno() {
        let cases = [
            (libc::ENOTDIR, ErrorCode::Enotdir),
            (libc::EISDIR, ErrorCode::Eisdir),
            (libc::ENOTEMPTY, ErrorCode::Enotempty),
            (libc::EEXIST, ErrorCode::Eexist),
            (libc::EROFS, ErrorCode::Eacces),
            (libc::ENOSPC, ErrorCode::Eio),
        ];
        for (raw, code) in cases {
            let error = io::Error::from_raw_os_error(raw);
            assert_eq!(FsError::from_io(&error, "open", "a").code, code);
        }
    }

    #[test]
    fn test_errno_matches_the_platform() {
        assert_eq!(ErrorCode::Enotempty.errno(), -libc::ENOTEMPTY);
        assert_eq!(ErrorCode::Enoent.errno(), -2);
        assert_eq!(ErrorCode::Eacces.errno(), -13);
    }

    #[test]
    fn test_message_without_dest() {
        let error = FsError::new(ErrorCode::Enotempty, "rmdir", "logs");
        assert_eq!(error.to_string(), "ENOTEMPTY: directory not empty, rmdir 'logs'");
    }
}
