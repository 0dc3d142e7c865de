use std::{ffi::CStr, slice};

use thiserror::Error;

/// Size of the buffers on either side of the input buffer.
pub const GUARD_LEN: usize = 16;

/// Byte the neighbouring buffers are filled with so a stray write shows up.
pub const GUARD_BYTE: u8 = 0xCC;

/// Returned by [`StackFrame::fortified_copy`] instead of writing out of bounds.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("buffer overflow detected: {needed} bytes into a {capacity} byte buffer")]
pub struct FortifyError {
    pub needed: usize,
    pub capacity: usize,
}

/*
 * The locals of the target laid out the way the C compiler would put them:
 *
 *   [ guard_before: 16 ][ buf: CAP ][ guard_after: 16 ]
 *
 * repr(C) pins the order so an overrun of `buf` always lands in `guard_after`
 * first, and only after that walks off the frame into the caller's stack.
 */
#[repr(C)]
pub struct StackFrame<const CAP: usize> {
    guard_before: [u8; GUARD_LEN],
    buf: [u8; CAP],
    guard_after: [u8; GUARD_LEN],
}

impl<const CAP: usize> StackFrame<CAP> {
    pub const fn new() -> Self {
        Self {
            guard_before: [GUARD_BYTE; GUARD_LEN],
            buf: [0; CAP],
            guard_after: [GUARD_BYTE; GUARD_LEN],
        }
    }

    pub const fn capacity(&self) -> usize {
        CAP
    }

    // Pointer to `buf` that keeps the provenance of the whole frame
    fn buf_ptr(&mut self) -> *mut u8 {
        let this = self as *mut Self;
        unsafe { (&raw mut (*this).buf).cast::<u8>() }
    }

    /// Copies `src` and its NUL terminator into the buffer, byte by byte,
    /// without ever looking at `CAP`. Returns the number of bytes written.
    ///
    /// # Safety
    ///
    /// `src.to_bytes_with_nul().len()` bytes are written starting at the
    /// buffer. Up to `CAP + GUARD_LEN` of them stay inside the frame and
    /// clobber `guard_after`; anything longer writes past the frame, which is
    /// undefined behaviour.
    pub unsafe fn unchecked_copy(&mut self, src: &CStr) -> usize {
        let dst = self.buf_ptr();
        let mut from = src.as_ptr().cast::<u8>();
        let mut written = 0;

        loop {
            unsafe {
                let byte = from.read();
                dst.add(written).write(byte);
                written += 1;
                if byte == 0 {
                    return written;
                }
                from = from.add(1);
            }
        }
    }

    /// The checked counterpart of [`Self::unchecked_copy`]: refuses to write
    /// anything when `src` plus its terminator does not fit in `CAP`.
    pub fn fortified_copy(&mut self, src: &CStr) -> Result<usize, FortifyError> {
        let bytes = src.to_bytes_with_nul();
        if bytes.len() > CAP {
            return Err(FortifyError {
                needed: bytes.len(),
                capacity: CAP,
            });
        }

        self.buf[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    // `buf` followed by `guard_after`, the part of the frame a copy can reach
    fn reachable(&self) -> &[u8] {
        let this = self as *const Self;
        // repr(C) with only u8 arrays: no padding, `guard_after` directly follows `buf`
        unsafe {
            let start = (&raw const (*this).buf).cast::<u8>();
            slice::from_raw_parts(start, CAP + GUARD_LEN)
        }
    }

    /// The buffer read as a C string. An overrun copy shows up here in full
    /// as long as its terminator is still inside the frame.
    pub fn contents(&self) -> &[u8] {
        let reachable = self.reachable();
        match CStr::from_bytes_until_nul(reachable) {
            Ok(s) => s.to_bytes(),
            Err(_) => reachable,
        }
    }

    pub fn guards_intact(&self) -> bool {
        self.guard_before
            .iter()
            .chain(self.guard_after.iter())
            .all(|&b| b == GUARD_BYTE)
    }

    /// True once something wrote outside `buf`.
    pub fn overflowed(&self) -> bool {
        !self.guards_intact()
    }
}

impl<const CAP: usize> Default for StackFrame<CAP> {
    fn default() -> Self {
        Self::new()
    }
}
