//! Launcher for the buggy target: reads a whole file, strips one trailing
//! newline and execs the target with the content as its only argument.

use std::{
    collections::TryReserveError,
    convert::Infallible,
    env,
    ffi::{CStr, CString},
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
};

use log::debug;
use nix::{errno::Errno, unistd::execv};
use thiserror::Error;

#[cfg(not(feature = "fortify"))]
pub const TARGET: &str = "./buggy";
#[cfg(feature = "fortify")]
pub const TARGET: &str = "./buggy_fortify";

/// Overrides the compiled in [`TARGET`] when set.
pub const TARGET_ENV: &str = "BUGGY_TARGET";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("fopen: {0}")]
    Open(#[source] io::Error),
    #[error("fread: {0}")]
    Read(#[source] io::Error),
    #[error("malloc: {0}")]
    Alloc(#[from] TryReserveError),
    #[error("malloc: a {0} byte file does not fit in memory")]
    TooLarge(u64),
    #[error("execv: {0}")]
    Exec(#[from] Errno),
    #[error("execv: target path {0:?} contains a NUL byte")]
    TargetPath(PathBuf),
}

/// Path of the executable the launcher replaces itself with.
pub fn target_path() -> PathBuf {
    env::var_os(TARGET_ENV)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(TARGET))
}

/// The file content as the C string the target will see: it ends at the first
/// NUL byte, and a single trailing newline is removed.
pub fn trim_argument(mut content: Vec<u8>) -> CString {
    if let Some(nul) = content.iter().position(|&b| b == 0) {
        content.truncate(nul);
    }
    if content.last() == Some(&b'\n') {
        content.pop();
    }
    // SAFETY: no NUL left after the truncation above
    unsafe { CString::from_vec_unchecked(content) }
}

/*
 * Reads the whole input file into one buffer
 *
 * @param path - file handed to us on the command line
 *
 * The size is taken by seeking to the end and back, and the buffer for it
 * (plus the terminator) is reserved up front so running out of memory is an
 * error rather than an abort. The file is closed before returning on every path.
 */
pub fn read_input(path: &Path) -> Result<CString, LaunchError> {
    let mut file = File::open(path).map_err(LaunchError::Open)?;

    let size = file.seek(SeekFrom::End(0)).map_err(LaunchError::Read)?;
    file.seek(SeekFrom::Start(0)).map_err(LaunchError::Read)?;

    let capacity = usize::try_from(size)
        .ok()
        .and_then(|size| size.checked_add(1))
        .ok_or(LaunchError::TooLarge(size))?;

    let mut content = Vec::new();
    content.try_reserve_exact(capacity)?;

    file.take(size)
        .read_to_end(&mut content)
        .map_err(LaunchError::Read)?;
    debug!("read {} of {size} bytes from {}", content.len(), path.display());

    Ok(trim_argument(content))
}

/// Replaces the current process image with `target`, passing `argument` as
/// `argv[1]`. Only ever returns on failure.
pub fn exec_target(target: &Path, argument: &CStr) -> Result<Infallible, LaunchError> {
    let path = CString::new(target.as_os_str().as_bytes())
        .map_err(|_| LaunchError::TargetPath(target.to_owned()))?;
    debug!("exec {} with a {} byte argument", target.display(), argument.count_bytes());

    let argv = [path.as_c_str(), argument];
    execv(&path, &argv).map_err(LaunchError::from)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn input_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp input");
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn strips_exactly_one_newline() {
        assert_eq!(trim_argument(b"secret123\n".to_vec()).as_bytes(), b"secret123");
        assert_eq!(trim_argument(b"secret123".to_vec()).as_bytes(), b"secret123");
        assert_eq!(trim_argument(b"two\n\n".to_vec()).as_bytes(), b"two\n");
        assert_eq!(trim_argument(b"space \n".to_vec()).as_bytes(), b"space ");
        assert_eq!(trim_argument(b"\r\n".to_vec()).as_bytes(), b"\r");
        assert_eq!(trim_argument(b"\n".to_vec()).as_bytes(), b"");
        assert_eq!(trim_argument(Vec::new()).as_bytes(), b"");
    }

    #[test]
    fn content_ends_at_first_nul() {
        assert_eq!(trim_argument(b"abc\0def\n".to_vec()).as_bytes(), b"abc");
        assert_eq!(trim_argument(b"abc\n\0def".to_vec()).as_bytes(), b"abc");
    }

    #[test]
    fn reads_whole_file() {
        let file = input_file(b"secret123\n");
        assert_eq!(read_input(file.path()).unwrap().as_bytes(), b"secret123");

        let big = vec![b'A'; 64 * 1024];
        let file = input_file(&big);
        assert_eq!(read_input(file.path()).unwrap().as_bytes(), &big[..]);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(&dir.path().join("nope")).unwrap_err();

        assert!(matches!(err, LaunchError::Open(ref e) if e.kind() == io::ErrorKind::NotFound));
        assert!(err.to_string().starts_with("fopen: "));
    }

    #[test]
    fn failed_exec_returns_the_errno() {
        let dir = tempfile::tempdir().unwrap();
        let argument = CString::new("secret123").unwrap();

        let Err(err) = exec_target(&dir.path().join("missing_target"), &argument);
        assert!(matches!(err, LaunchError::Exec(Errno::ENOENT)));
    }

    #[test]
    fn target_path_with_nul_is_rejected() {
        let argument = CString::new("x").unwrap();
        let target = PathBuf::from(std::ffi::OsStr::from_bytes(b"./bug\0gy"));

        let Err(err) = exec_target(&target, &argument);
        assert!(matches!(err, LaunchError::TargetPath(_)));
    }

    #[test]
    #[cfg(not(feature = "fortify"))]
    fn default_target_is_the_plain_build() {
        assert_eq!(TARGET, "./buggy");
    }

    #[test]
    #[cfg(feature = "fortify")]
    fn fortify_selects_the_checked_build() {
        assert_eq!(TARGET, "./buggy_fortify");
    }
}
