//! A deliberately vulnerable command line target.
//!
//! The input argument is copied into a fixed size buffer on the stack without
//! a bounds check and then compared with a hard coded secret. Running it with
//! an argument longer than the buffer smashes the stack, which is what the
//! launcher, the mutator and the fuzzers in this workspace are built to find.

mod frame;

use std::{
    ffi::{CString, OsString},
    io::{self, Write},
    os::unix::ffi::OsStringExt,
};

use log::debug;
use thiserror::Error;

pub use frame::{FortifyError, GUARD_BYTE, GUARD_LEN, StackFrame};

/// What the buffer has to hold for the secret branch to be taken.
pub const SECRET: &[u8] = b"secret123";

/// Capacity of the large variant, needs a long argument to overflow.
pub const WIDE_CAPACITY: usize = 100;
/// Capacity of the small variant, five characters are already too many.
pub const NARROW_CAPACITY: usize = 5;

#[cfg(not(feature = "small_buffer"))]
pub const BUFFER_CAPACITY: usize = WIDE_CAPACITY;
#[cfg(feature = "small_buffer")]
pub const BUFFER_CAPACITY: usize = NARROW_CAPACITY;

/// How the argument gets into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    /// `strcpy`: no bounds check at all
    Unchecked,
    /// `__strcpy_chk`: checked against the capacity, error instead of writing
    Fortified,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Verdict<'a> {
    Secret,
    Echo(&'a [u8]),
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Fortify(#[from] FortifyError),
}

/// Turns raw argument bytes into the C string `argv` would carry: everything
/// after the first NUL is dropped.
pub fn c_argument(mut bytes: Vec<u8>) -> CString {
    if let Some(nul) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(nul);
    }
    // SAFETY: truncated at the first NUL above
    unsafe { CString::from_vec_unchecked(bytes) }
}

/// Number of leading bytes of `input` that agree with the secret.
pub fn secret_prefix_len(input: &[u8]) -> usize {
    input
        .iter()
        .zip(SECRET)
        .take_while(|(a, b)| a == b)
        .count()
}

/// Compares the buffer, as a NUL terminated string, with the secret.
pub fn evaluate<const CAP: usize>(frame: &StackFrame<CAP>) -> Verdict<'_> {
    let contents = frame.contents();
    if contents == SECRET {
        Verdict::Secret
    } else {
        Verdict::Echo(contents)
    }
}

/*
 * Main body of the target
 *
 * @param mode  - how the argument is copied into the frame
 * @param args  - the full argv, program name included
 * @param out   - where the verdict gets printed (stdout in the binaries)
 *
 * Returns Ok for the usage, secret and echo paths alike. The only error paths
 * are a failing writer and a fortified copy that refused to overflow.
 */
pub fn run<const CAP: usize, W: Write>(
    mode: CopyMode,
    mut args: Vec<OsString>,
    out: &mut W,
) -> Result<(), TargetError> {
    if args.len() != 2 {
        let program = args
            .first()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| "buggy".to_owned());
        writeln!(out, "Usage: {program} <input>")?;
        return Ok(());
    }

    let input = c_argument(args.swap_remove(1).into_vec());

    let mut frame = StackFrame::<CAP>::new();
    let written = match mode {
        // SAFETY: none, the argument length is never compared with CAP
        CopyMode::Unchecked => unsafe { frame.unchecked_copy(&input) },
        CopyMode::Fortified => frame.fortified_copy(&input)?,
    };
    debug!("copied {written} bytes into a {CAP} byte buffer");

    if frame.overflowed() {
        debug!("neighbouring buffers were overwritten");
    }

    match evaluate(&frame) {
        Verdict::Secret => writeln!(out, "You found the secret!")?,
        Verdict::Echo(contents) => {
            out.write_all(b"Input was: ")?;
            out.write_all(contents)?;
            out.write_all(b"\n")?;
        }
    }

    Ok(())
}
