//! A custom mutator that hands the fuzzer one oversized input and then gets
//! out of the way.
//!
//! The very first fuzz call ignores the input it was given and answers with
//! 1024 bytes of `'A'`, enough to run over any small stack buffer in the
//! target. Every call after that returns the input untouched.
//!
//! The cdylib exports the AFL++ custom mutator entry points (see [`afl`]); with
//! the `libafl` feature the same state machine is a LibAFL `Mutator` too.

pub mod afl;
#[cfg(feature = "libafl")]
mod libafl_mutator;

use std::borrow::Cow;

/// Length of the one big input.
pub const BIG_INPUT_LEN: usize = 1024;
/// Byte the big input is made of.
pub const FILL_BYTE: u8 = b'A';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing produced yet, the next call returns the big input
    FirstRun,
    /// The big input went out, inputs are passed through from now on
    Passthrough,
}

#[derive(Debug)]
pub struct BigInputMutator {
    phase: Phase,
    seed: u32,
    big: Vec<u8>,
    #[cfg_attr(not(feature = "libafl"), allow(dead_code))]
    name: Cow<'static, str>,
}

impl BigInputMutator {
    pub fn new(seed: u32) -> Self {
        Self {
            phase: Phase::FirstRun,
            seed,
            big: Vec::new(),
            name: Cow::Borrowed("BigInputMutator"),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    // Advances the state machine, handing out the big input exactly once.
    // The buffer stays owned by the mutator so a pointer to it outlives the call.
    fn take_turn(&mut self) -> Option<&mut [u8]> {
        match self.phase {
            Phase::FirstRun => {
                self.phase = Phase::Passthrough;
                self.big = vec![FILL_BYTE; BIG_INPUT_LEN];
                Some(&mut self.big)
            }
            Phase::Passthrough => None,
        }
    }

    /// One fuzzing round: the big input the first time, `input` afterwards.
    pub fn fuzz<'a>(&'a mut self, input: &'a [u8]) -> &'a [u8] {
        match self.take_turn() {
            Some(big) => big,
            None => input,
        }
    }
}
