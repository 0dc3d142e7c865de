use std::{ffi::c_void, ptr, slice};

use big_input_mutator::{
    BIG_INPUT_LEN, FILL_BYTE,
    afl::{afl_custom_deinit, afl_custom_fuzz, afl_custom_init},
};

// Drives the entry points the way afl-fuzz does
fn fuzz(handle: *mut c_void, input: &mut [u8]) -> (*mut u8, usize) {
    let mut out: *mut u8 = ptr::null_mut();
    let len = unsafe {
        afl_custom_fuzz(
            handle,
            input.as_mut_ptr(),
            input.len(),
            &mut out,
            ptr::null_mut(),
            0,
            1 << 20,
        )
    };
    (out, len)
}

#[test]
fn first_call_returns_big_input_then_passes_through() {
    let handle = afl_custom_init(ptr::null_mut(), 7);
    assert!(!handle.is_null());

    let mut input = b"hello".to_vec();
    let (out, len) = fuzz(handle, &mut input);
    assert_eq!(len, BIG_INPUT_LEN);
    assert_ne!(out, input.as_mut_ptr());
    let big = unsafe { slice::from_raw_parts(out, len) };
    assert!(big.iter().all(|&b| b == FILL_BYTE));

    for _ in 0..3 {
        let (out, len) = fuzz(handle, &mut input);
        assert_eq!(out, input.as_mut_ptr());
        assert_eq!(len, input.len());
    }
    assert_eq!(input, b"hello");

    unsafe { afl_custom_deinit(handle) };
}

#[test]
fn handles_are_independent() {
    let first = afl_custom_init(ptr::null_mut(), 1);
    let second = afl_custom_init(ptr::null_mut(), 2);
    let mut input = vec![b'x'; 16];

    assert_eq!(fuzz(first, &mut input).1, BIG_INPUT_LEN);
    assert_eq!(fuzz(first, &mut input).1, 16);
    assert_eq!(fuzz(second, &mut input).1, BIG_INPUT_LEN);

    unsafe {
        afl_custom_deinit(first);
        afl_custom_deinit(second);
    }
}
