//! AFL++ custom mutator entry points.
//!
//! Build the cdylib and point `AFL_CUSTOM_MUTATOR_LIBRARY` at it. afl-fuzz
//! calls `afl_custom_init` once, `afl_custom_fuzz` for every mutation and
//! `afl_custom_deinit` on shutdown, threading the returned handle through.

use std::ffi::{c_uint, c_void};

use env_logger::Env;
use log::{debug, info};

use crate::BigInputMutator;

// There is no main() in a plugin, so the logger is set up on load
fn init_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
}

// What afl-fuzz shows on stderr when the library is loaded
fn loaded_message(seed: c_uint) -> String {
    format!("[mutator] BigBomb mutator loaded (seed={seed})")
}

/// Allocates the mutator state and returns it as the opaque handle.
#[unsafe(no_mangle)]
pub extern "C" fn afl_custom_init(_afl: *mut c_void, seed: c_uint) -> *mut c_void {
    init_logging();
    info!("{}", loaded_message(seed));

    Box::into_raw(Box::new(BigInputMutator::new(seed))).cast()
}

/*
 * Called by afl-fuzz for each fuzzing attempt
 *
 * @param data         - handle returned by afl_custom_init
 * @param buf          - the input to mutate, owned by afl-fuzz
 * @param buf_size     - length of buf
 * @param out_buf      - receives the pointer to the mutated data
 * @param add_buf      - second input for splicing, unused
 * @param add_buf_size - length of add_buf, unused
 * @param max_size     - upper bound afl-fuzz accepts, not enforced
 *
 * Returns the length of the data *out_buf points at.
 */
/// # Safety
///
/// `data` must come from [`afl_custom_init`] and not have been passed to
/// [`afl_custom_deinit`]. `out_buf` must be valid for a pointer write.
/// The buffer handed out on the first call stays valid until deinit.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afl_custom_fuzz(
    data: *mut c_void,
    buf: *mut u8,
    buf_size: usize,
    out_buf: *mut *mut u8,
    _add_buf: *mut u8,
    _add_buf_size: usize,
    _max_size: usize,
) -> usize {
    let Some(mutator) = (unsafe { data.cast::<BigInputMutator>().as_mut() }) else {
        return 0;
    };
    if out_buf.is_null() {
        return 0;
    }

    let (ptr, len) = match mutator.take_turn() {
        Some(big) => {
            debug!(
                "[mutator] replacing a {buf_size} byte input with {} bytes",
                big.len()
            );
            (big.as_mut_ptr(), big.len())
        }
        None => (buf, buf_size),
    };

    unsafe { out_buf.write(ptr) };
    len
}

/// Releases the state allocated by [`afl_custom_init`].
///
/// # Safety
///
/// `data` must come from [`afl_custom_init`] and is invalid afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afl_custom_deinit(data: *mut c_void) {
    if data.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(data.cast::<BigInputMutator>()) });
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;
    use crate::{BIG_INPUT_LEN, FILL_BYTE, Phase};

    #[test]
    fn init_starts_in_first_run() {
        let handle = afl_custom_init(ptr::null_mut(), 42);
        let mutator = unsafe { &*handle.cast::<BigInputMutator>() };

        assert_eq!(mutator.phase(), Phase::FirstRun);
        assert_eq!(mutator.seed(), 42);

        unsafe { afl_custom_deinit(handle) };
    }

    #[test]
    fn load_message_carries_the_seed() {
        assert_eq!(
            loaded_message(1337),
            "[mutator] BigBomb mutator loaded (seed=1337)"
        );
    }

    #[test]
    fn null_handle_produces_nothing() {
        let mut input = *b"abc";
        let mut out: *mut u8 = ptr::null_mut();
        let len = unsafe {
            afl_custom_fuzz(
                ptr::null_mut(),
                input.as_mut_ptr(),
                input.len(),
                &mut out,
                ptr::null_mut(),
                0,
                BIG_INPUT_LEN,
            )
        };

        assert_eq!(len, 0);
        assert!(out.is_null());
        unsafe { afl_custom_deinit(ptr::null_mut()) };
    }

    #[test]
    fn big_buffer_outlives_the_call() {
        let handle = afl_custom_init(ptr::null_mut(), 0);
        let mut input = *b"xyz";
        let mut out: *mut u8 = ptr::null_mut();

        let len = unsafe {
            afl_custom_fuzz(
                handle,
                input.as_mut_ptr(),
                input.len(),
                &mut out,
                ptr::null_mut(),
                0,
                0,
            )
        };
        // a passthrough call in between must not free the first answer
        let mut other: *mut u8 = ptr::null_mut();
        unsafe {
            afl_custom_fuzz(
                handle,
                input.as_mut_ptr(),
                input.len(),
                &mut other,
                ptr::null_mut(),
                0,
                0,
            )
        };

        let big = unsafe { std::slice::from_raw_parts(out, len) };
        assert!(big.iter().all(|&b| b == FILL_BYTE));

        unsafe { afl_custom_deinit(handle) };
    }
}
