use std::ptr::write;

use buggy::{BUFFER_CAPACITY, StackFrame, Verdict};
use libafl::executors::ExitKind;
use log::{debug, info};

pub const MAP_SIZE: usize = 16;

// Coverage map, there is no instrumentation in the target so it is marked by hand
pub static mut SIGNALS: [u8; MAP_SIZE] = [0; MAP_SIZE];
// Ptr to coverage map
pub static mut SIGNALS_PTR: *mut u8 = unsafe { SIGNALS.as_mut_ptr() };

fn mark_signal(idx: usize) {
    unsafe { write(SIGNALS_PTR.add(idx), 1) };
}

/*
 * One execution of the target's logic on a fuzzer input
 *
 * @param input - raw testcase bytes, turned into the argv string the target would get
 *
 * Signal 0 is marked on every run and signal i + 1 once the first i + 1 bytes
 * match the secret, which gives the fuzzer a gradient towards it. The copy is
 * the fortified one: an input that would run over the buffer is reported as a
 * crash instead of smashing the fuzzer's own stack.
 */
pub fn run_target(input: &[u8]) -> ExitKind {
    let argument = buggy::c_argument(input.to_vec());

    mark_signal(0);
    let matched = buggy::secret_prefix_len(argument.as_bytes());
    for idx in 1..=matched {
        mark_signal(idx);
    }

    let mut frame = StackFrame::<BUFFER_CAPACITY>::new();
    match frame.fortified_copy(&argument) {
        Ok(_) => {
            if buggy::evaluate(&frame) == Verdict::Secret {
                info!("input reached the secret branch");
            }
            ExitKind::Ok
        }
        Err(e) => {
            debug!("{e}");
            ExitKind::Crash
        }
    }
}
